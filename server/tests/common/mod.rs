//! In-memory stand-in for the ticketing deployment.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use ticketing_client::api::TicketState;
use ticketing_client::{ClientError, EventView, NewEvent, PermissionGrant, TicketView, TicketingApi};

struct FakeEvent {
    view: EventView,
    price: u64,
    supply: u64,
    sold: u64,
    markup: u64,
}

#[derive(Default)]
struct FakeChain {
    events: BTreeMap<u64, FakeEvent>,
    tickets: BTreeMap<u64, TicketView>,
    owners: BTreeMap<Pubkey, Vec<u64>>,
    grants: Vec<PermissionGrant>,
}

pub struct FakeTicketing {
    wallet: Pubkey,
    chain: Mutex<FakeChain>,
}

impl FakeTicketing {
    pub fn new() -> Self {
        Self {
            wallet: Pubkey::new_unique(),
            chain: Mutex::new(FakeChain::default()),
        }
    }

    /// An event created outside the server, only reachable by probing.
    pub fn seed_event(&self, name: &str, supply: u64) -> u64 {
        let id = self.seed_pending_event(name, supply);
        self.activate(id);
        id
    }

    /// An event whose ciphertexts the MXE has not taken over yet.
    pub fn seed_pending_event(&self, name: &str, supply: u64) -> u64 {
        let mut chain = self.chain.lock().unwrap();
        let id = chain.events.len() as u64 + 1;
        chain.events.insert(
            id,
            FakeEvent {
                view: EventView {
                    id,
                    organizer: self.wallet.to_string(),
                    name: name.into(),
                    event_date: 2_000_000_000,
                    resale_allowed: false,
                    active: false,
                },
                price: 10,
                supply,
                sold: 0,
                markup: 0,
            },
        );
        id
    }

    pub fn activate(&self, event_id: u64) {
        if let Some(event) = self.chain.lock().unwrap().events.get_mut(&event_id) {
            event.view.active = true;
        }
    }

    pub fn grants(&self) -> usize {
        self.chain.lock().unwrap().grants.len()
    }
}

#[async_trait]
impl TicketingApi for FakeTicketing {
    fn wallet(&self) -> Pubkey {
        self.wallet
    }

    async fn create_event(&self, request: NewEvent) -> Result<EventView, ClientError> {
        request.validate(0)?;
        let mut chain = self.chain.lock().unwrap();
        let id = chain.events.len() as u64 + 1;
        let view = EventView {
            id,
            organizer: self.wallet.to_string(),
            name: request.name,
            event_date: request.event_date,
            resale_allowed: request.resale_allowed,
            active: true,
        };
        chain.events.insert(
            id,
            FakeEvent {
                view: view.clone(),
                price: request.price,
                supply: request.supply,
                sold: 0,
                markup: request.resale_markup_percent,
            },
        );
        Ok(view)
    }

    async fn event(&self, event_id: u64) -> Result<Option<EventView>, ClientError> {
        let chain = self.chain.lock().unwrap();
        Ok(chain.events.get(&event_id).map(|e| e.view.clone()))
    }

    async fn purchase_ticket(&self, event_id: u64) -> Result<TicketView, ClientError> {
        let mut chain = self.chain.lock().unwrap();
        let event = chain
            .events
            .get_mut(&event_id)
            .ok_or_else(|| ClientError::Program("event not found".into()))?;
        if event.sold >= event.supply {
            return Err(ClientError::SoldOut(event_id));
        }
        event.sold += 1;

        let id = chain.tickets.len() as u64 + 1;
        let ticket = TicketView {
            id,
            event_id,
            owner: self.wallet.to_string(),
            status: TicketState::Sold,
            transfer_count: 0,
        };
        chain.tickets.insert(id, ticket.clone());
        chain.owners.entry(self.wallet).or_default().push(id);
        Ok(ticket)
    }

    async fn ticket(&self, ticket_id: u64) -> Result<Option<TicketView>, ClientError> {
        Ok(self.chain.lock().unwrap().tickets.get(&ticket_id).cloned())
    }

    async fn tickets_of(&self, owner: Pubkey) -> Result<Vec<u64>, ClientError> {
        let chain = self.chain.lock().unwrap();
        Ok(chain.owners.get(&owner).cloned().unwrap_or_default())
    }

    async fn transfer_ticket(&self, ticket_id: u64, to: Pubkey) -> Result<TicketView, ClientError> {
        let mut chain = self.chain.lock().unwrap();
        let owner = self.wallet.to_string();
        let ticket = chain
            .tickets
            .get_mut(&ticket_id)
            .filter(|t| t.owner == owner)
            .ok_or_else(|| ClientError::Program("not owner".into()))?;
        ticket.owner = to.to_string();
        ticket.transfer_count += 1;
        let ticket = ticket.clone();

        if let Some(ids) = chain.owners.get_mut(&self.wallet) {
            ids.retain(|id| *id != ticket_id);
        }
        chain.owners.entry(to).or_default().push(ticket_id);
        Ok(ticket)
    }

    async fn prove_ownership(&self, ticket_id: u64) -> Result<bool, ClientError> {
        let chain = self.chain.lock().unwrap();
        let owner = self.wallet.to_string();
        Ok(chain.tickets.get(&ticket_id).is_some_and(|t| t.owner == owner))
    }

    async fn ticket_price(&self, ticket_id: u64) -> Result<u64, ClientError> {
        let chain = self.chain.lock().unwrap();
        chain
            .tickets
            .get(&ticket_id)
            .and_then(|t| chain.events.get(&t.event_id))
            .map(|e| e.price)
            .ok_or_else(|| ClientError::Program("ticket not found".into()))
    }

    async fn resale_quote(&self, ticket_id: u64) -> Result<u64, ClientError> {
        let chain = self.chain.lock().unwrap();
        let event = chain
            .tickets
            .get(&ticket_id)
            .and_then(|t| chain.events.get(&t.event_id))
            .ok_or_else(|| ClientError::Program("ticket not found".into()))?;
        if !event.view.resale_allowed {
            return Err(ClientError::Program("resale not allowed".into()));
        }
        Ok(event.price * (100 + event.markup) / 100)
    }

    async fn sales_count(&self, event_id: u64) -> Result<u64, ClientError> {
        let chain = self.chain.lock().unwrap();
        chain
            .events
            .get(&event_id)
            .map(|e| e.sold)
            .ok_or_else(|| ClientError::Program("event not found".into()))
    }

    async fn set_permission(&self, grant: PermissionGrant) -> Result<(), ClientError> {
        grant.to_args()?;
        self.chain.lock().unwrap().grants.push(grant);
        Ok(())
    }

    async fn balance(&self, _address: Pubkey) -> Result<u64, ClientError> {
        Ok(5_000_000_000)
    }
}
