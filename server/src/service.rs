use std::collections::BTreeMap;

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use ticketing_client::api::TicketState;
use ticketing_client::{EventView, NewEvent, PermissionGrant, TicketView, TicketingApi};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::store::{MirrorStore, WalletRecord};

#[derive(Debug, Clone, Serialize)]
pub struct WalletInfo {
    #[serde(flatten)]
    pub record: WalletRecord,
    pub lamports: u64,
}

/// Cache-first view of the chain. Reads fall through to the chain on a miss;
/// writes go to the chain and then refresh the cache. Entities the MXE has
/// not settled yet are served but never cached, so they are re-read until
/// they are.
pub struct Mirror<A> {
    api: A,
    store: MirrorStore,
    probe_window: u64,
}

impl<A: TicketingApi> Mirror<A> {
    pub fn new(api: A, probe_window: u64) -> Self {
        Self {
            api,
            store: MirrorStore::new(),
            probe_window,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &MirrorStore {
        &self.store
    }

    async fn remember_event(&self, event: &EventView) {
        if event.active {
            self.store.put_event(event.clone()).await;
        }
    }

    async fn remember_ticket(&self, ticket: &TicketView) {
        if ticket.status != TicketState::Pending {
            self.store.put_ticket(ticket.clone()).await;
        }
    }

    // ==================== EVENTS ====================

    /// Cached events plus whatever the chain holds in the id gaps, walking
    /// ids from 1 until the first unknown one. At most `probe_window` ids
    /// are looked up on the chain per call.
    pub async fn list_events(&self) -> Result<Vec<EventView>, ApiError> {
        let mut events: BTreeMap<u64, EventView> = self
            .store
            .events()
            .await
            .into_iter()
            .map(|event| (event.id, event))
            .collect();

        let mut lookups = 0;
        let mut event_id = 1;
        while lookups < self.probe_window {
            if !events.contains_key(&event_id) {
                lookups += 1;
                let Some(event) = self.api.event(event_id).await? else {
                    break;
                };
                self.remember_event(&event).await;
                events.insert(event_id, event);
            }
            event_id += 1;
        }
        debug!(lookups, listed = events.len(), "listed events");
        Ok(events.into_values().collect())
    }

    pub async fn event(&self, event_id: u64) -> Result<EventView, ApiError> {
        if let Some(event) = self.store.event(event_id).await {
            return Ok(event);
        }
        let event = self
            .api
            .event(event_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("event {event_id}")))?;
        self.remember_event(&event).await;
        Ok(event)
    }

    pub async fn create_event(&self, request: NewEvent) -> Result<EventView, ApiError> {
        let event = self.api.create_event(request).await?;
        info!(event_id = event.id, "event created");
        self.remember_event(&event).await;
        Ok(event)
    }

    pub async fn purchase(&self, event_id: u64) -> Result<TicketView, ApiError> {
        self.event(event_id).await?;
        let ticket = self.api.purchase_ticket(event_id).await?;
        info!(event_id, ticket_id = ticket.id, "ticket purchased");
        self.remember_ticket(&ticket).await;
        Ok(ticket)
    }

    pub async fn sales_count(&self, event_id: u64) -> Result<u64, ApiError> {
        self.event(event_id).await?;
        Ok(self.api.sales_count(event_id).await?)
    }

    // ==================== TICKETS ====================

    /// With an owner, membership comes from the owner's on-chain index;
    /// without one, from the cache and a walk of the uncached ids.
    pub async fn list_tickets(&self, owner: Option<Pubkey>) -> Result<Vec<TicketView>, ApiError> {
        let Some(owner) = owner else {
            let mut tickets: BTreeMap<u64, TicketView> = self
                .store
                .tickets()
                .await
                .into_iter()
                .map(|ticket| (ticket.id, ticket))
                .collect();

            let mut lookups = 0;
            let mut ticket_id = 1;
            while lookups < self.probe_window {
                if !tickets.contains_key(&ticket_id) {
                    lookups += 1;
                    let Some(ticket) = self.api.ticket(ticket_id).await? else {
                        break;
                    };
                    self.remember_ticket(&ticket).await;
                    tickets.insert(ticket_id, ticket);
                }
                ticket_id += 1;
            }
            debug!(lookups, listed = tickets.len(), "listed tickets");
            return Ok(tickets.into_values().collect());
        };

        let mut tickets = Vec::new();
        for ticket_id in self.api.tickets_of(owner).await? {
            tickets.push(self.ticket(ticket_id).await?);
        }
        Ok(tickets)
    }

    pub async fn ticket(&self, ticket_id: u64) -> Result<TicketView, ApiError> {
        if let Some(ticket) = self.store.ticket(ticket_id).await {
            return Ok(ticket);
        }
        let ticket = self
            .api
            .ticket(ticket_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("ticket {ticket_id}")))?;
        self.remember_ticket(&ticket).await;
        Ok(ticket)
    }

    pub async fn transfer(&self, ticket_id: u64, to: Pubkey) -> Result<TicketView, ApiError> {
        let ticket = self.api.transfer_ticket(ticket_id, to).await?;
        info!(ticket_id, %to, "ticket transferred");
        self.remember_ticket(&ticket).await;
        Ok(ticket)
    }

    pub async fn prove(&self, ticket_id: u64) -> Result<bool, ApiError> {
        Ok(self.api.prove_ownership(ticket_id).await?)
    }

    pub async fn price(&self, ticket_id: u64) -> Result<u64, ApiError> {
        Ok(self.api.ticket_price(ticket_id).await?)
    }

    pub async fn resale_quote(&self, ticket_id: u64) -> Result<u64, ApiError> {
        Ok(self.api.resale_quote(ticket_id).await?)
    }

    // ==================== ACCESS ====================

    pub async fn set_permission(&self, grant: PermissionGrant) -> Result<(), ApiError> {
        let operation = grant.operation.clone();
        self.api.set_permission(grant).await?;
        info!(%operation, "permission written");
        Ok(())
    }

    pub async fn connect_wallet(&self, address: Pubkey, now: i64) -> Result<WalletInfo, ApiError> {
        let lamports = self.api.balance(address).await?;
        let record = self.store.connect_wallet(address.to_string(), now).await;
        Ok(WalletInfo { record, lamports })
    }

    pub async fn balance(&self, address: Pubkey) -> Result<u64, ApiError> {
        Ok(self.api.balance(address).await?)
    }
}
