//! Client flows against a scripted ledger that plays the MXE's part.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use anchor_lang::{AccountSerialize, AnchorDeserialize, Discriminator, Event};
use async_trait::async_trait;
use private_ticketing::constants::*;
use private_ticketing::events::{
    EncryptedValueForUser, EventCreated, OwnershipProof, PurchaseRequested, ValueKind,
};
use private_ticketing::instruction;
use private_ticketing::state::{EventAccount, EventStatus, Registry, Ticket, TicketStatus};
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use ticketing_client::logs::encode_event;
use ticketing_client::{
    pda, ArciumManifest, ClientError, EncryptionKey, Ledger, NewEvent, PollConfig,
    TicketingClient,
};

const MXE_SECRET: [u8; 32] = [7; 32];
const USER_SECRET: [u8; 32] = [3; 32];

/// What the chain does in response to one submitted transaction.
#[derive(Default)]
struct Script {
    logs: Vec<String>,
    /// Logs of the MXE callback transaction that follows
    callback: Option<Vec<String>>,
    /// Unrelated program transactions landing after the callback
    traffic_after: usize,
    writes: Vec<(Pubkey, Vec<u8>)>,
}

#[derive(Default)]
struct Chain {
    accounts: HashMap<Pubkey, Vec<u8>>,
    logs: HashMap<Signature, Vec<String>>,
    /// Oldest first
    history: Vec<Signature>,
    scripts: VecDeque<Script>,
    submitted: Vec<Instruction>,
    return_data: Option<Vec<u8>>,
}

impl Chain {
    fn record(&mut self, logs: Vec<String>) -> Signature {
        let mut bytes = [0u8; 64];
        bytes[..8].copy_from_slice(&(self.history.len() as u64 + 1).to_le_bytes());
        let signature = Signature::from(bytes);
        self.logs.insert(signature, logs);
        self.history.push(signature);
        signature
    }
}

struct ScriptedLedger {
    payer: Pubkey,
    chain: Mutex<Chain>,
}

impl ScriptedLedger {
    fn new(payer: Pubkey) -> Self {
        Self {
            payer,
            chain: Mutex::new(Chain::default()),
        }
    }

    fn put<T: AccountSerialize>(&self, address: Pubkey, account: &T) {
        self.chain
            .lock()
            .unwrap()
            .accounts
            .insert(address, serialize(account));
    }

    fn push_script(&self, script: Script) {
        self.chain.lock().unwrap().scripts.push_back(script);
    }

    /// A callback that landed before the client started waiting.
    fn past_transaction(&self, logs: Vec<String>) {
        self.chain.lock().unwrap().record(logs);
    }

    fn submitted(&self) -> Vec<Instruction> {
        self.chain.lock().unwrap().submitted.clone()
    }
}

#[async_trait]
impl Ledger for ScriptedLedger {
    fn payer(&self) -> Pubkey {
        self.payer
    }

    async fn submit(&self, instructions: Vec<Instruction>) -> Result<Signature, ClientError> {
        let mut chain = self.chain.lock().unwrap();
        chain.submitted.extend(instructions);
        let script = chain.scripts.pop_front().unwrap_or_default();
        let signature = chain.record(script.logs);
        if let Some(callback) = script.callback {
            chain.record(callback);
        }
        for _ in 0..script.traffic_after {
            chain.record(Vec::new());
        }
        for (address, data) in script.writes {
            chain.accounts.insert(address, data);
        }
        Ok(signature)
    }

    async fn simulate(&self, _: Vec<Instruction>) -> Result<Option<Vec<u8>>, ClientError> {
        Ok(self.chain.lock().unwrap().return_data.clone())
    }

    async fn transaction_logs(&self, signature: &Signature) -> Result<Vec<String>, ClientError> {
        Ok(self
            .chain
            .lock()
            .unwrap()
            .logs
            .get(signature)
            .cloned()
            .unwrap_or_default())
    }

    async fn recent_signatures(
        &self,
        _: &Pubkey,
        before: Option<Signature>,
        limit: usize,
    ) -> Result<Vec<Signature>, ClientError> {
        let chain = self.chain.lock().unwrap();
        let end = match before {
            Some(cursor) => chain
                .history
                .iter()
                .position(|signature| *signature == cursor)
                .unwrap_or(0),
            None => chain.history.len(),
        };
        Ok(chain.history[..end].iter().rev().take(limit).copied().collect())
    }

    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, ClientError> {
        Ok(self.chain.lock().unwrap().accounts.get(address).cloned())
    }

    async fn balance(&self, _: &Pubkey) -> Result<u64, ClientError> {
        Ok(1_000_000_000)
    }
}

fn serialize<T: AccountSerialize>(account: &T) -> Vec<u8> {
    let mut data = Vec::new();
    account.try_serialize(&mut data).unwrap();
    data
}

fn manifest(mxe_public: [u8; 32]) -> ArciumManifest {
    let key = Pubkey::new_unique;
    ArciumManifest {
        arcium_program: key(),
        mxe_program: key(),
        mxe_account: key(),
        cluster_account: key(),
        pool_account: key(),
        clock_account: key(),
        mempool_account: key(),
        executing_pool: key(),
        cluster_offset: 0,
        mxe_x25519_pubkey: hex::encode(mxe_public),
        comp_defs: [
            INIT_EVENT_COMP,
            PURCHASE_TICKET_COMP,
            PROVE_OWNERSHIP_COMP,
            REVEAL_TICKET_PRICE_COMP,
            QUOTE_RESALE_COMP,
            REVEAL_SALES_COMP,
        ]
        .iter()
        .map(|name| (name.to_string(), key().to_string()))
        .collect(),
    }
}

struct Harness {
    client: TicketingClient<ScriptedLedger>,
    mxe: EncryptionKey,
    user: EncryptionKey,
    program_id: Pubkey,
}

impl Harness {
    fn new() -> Self {
        let mxe = EncryptionKey::from_bytes(MXE_SECRET);
        let user = EncryptionKey::from_bytes(USER_SECRET);
        let program_id = private_ticketing::ID;
        let client = TicketingClient::new(
            ScriptedLedger::new(Pubkey::new_unique()),
            program_id,
            manifest(mxe.public_key()),
            EncryptionKey::from_bytes(USER_SECRET),
            PollConfig {
                attempts: 3,
                interval: Duration::ZERO,
            },
        );
        let harness = Self {
            client,
            mxe,
            user,
            program_id,
        };
        harness.put_registry(1, 1);
        harness
    }

    fn ledger(&self) -> &ScriptedLedger {
        self.client.ledger()
    }

    fn wallet(&self) -> Pubkey {
        self.client.wallet()
    }

    fn put_registry(&self, next_event_id: u64, next_ticket_id: u64) {
        self.ledger().put(
            pda::registry(&self.program_id),
            &Registry {
                authority: self.wallet(),
                mxe_program_id: Pubkey::new_unique(),
                next_event_id,
                next_ticket_id,
                bump: 255,
            },
        );
    }

    /// A value the MXE re-encrypted for this wallet.
    fn sealed_for_user(&self, value: u64, nonce: [u8; 16]) -> [u8; 32] {
        self.mxe
            .shared_cipher(&self.user.public_key())
            .encrypt_fields(&[value], &nonce)
            .unwrap()[0]
    }

    fn ticket(&self, ticket_id: u64, status: TicketStatus) -> Ticket {
        Ticket {
            ticket_id,
            event_id: 1,
            owner: self.wallet(),
            price_ct: [0; 32],
            price_nonce: [0; 16],
            status,
            transfer_count: 0,
            purchased_at: 0,
            bump: 255,
        }
    }
}

fn active_event(event_id: u64, organizer: Pubkey) -> EventAccount {
    EventAccount {
        event_id,
        organizer,
        name: "Concert".into(),
        event_date: 2_000_000_000,
        price_ct: [0; 32],
        total_supply_ct: [0; 32],
        tickets_sold_ct: [0; 32],
        resale_markup_ct: [0; 32],
        secrets_nonce: [0; 16],
        resale_allowed: false,
        status: EventStatus::Active,
        purchase_in_flight: false,
        pending_ticket_id: 0,
        purchase_requested_at: 0,
        created_at: 0,
        bump: 255,
    }
}

fn instruction_args<T: AnchorDeserialize>(ix: &Instruction) -> T {
    T::try_from_slice(&ix.data[8..]).unwrap()
}

#[tokio::test]
async fn test_create_event_encrypts_for_the_mxe() {
    let h = Harness::new();
    let organizer = h.wallet();
    h.ledger().push_script(Script {
        logs: vec![encode_event(&EventCreated {
            event_id: 1,
            organizer,
            name: "Concert".into(),
            event_date: 2_000_000_000,
            resale_allowed: false,
        })],
        writes: vec![(
            pda::event(&h.program_id, 1),
            serialize(&active_event(1, organizer)),
        )],
        ..Default::default()
    });

    let event = h
        .client
        .create_event(&NewEvent {
            name: "Concert".into(),
            event_date: 2_000_000_000,
            price: 50,
            supply: 100,
            resale_allowed: false,
            resale_markup_percent: 0,
        })
        .await
        .unwrap();
    assert_eq!(event.event_id, 1);
    assert_eq!(event.status, EventStatus::Active);

    let submitted = h.ledger().submitted();
    assert_eq!(submitted.len(), 1);
    let args: instruction::CreateEvent = instruction_args(&submitted[0]);
    let mxe_side = h.mxe.shared_cipher(&args.enc_pubkey);
    assert_eq!(mxe_side.decrypt_field(&args.price_ct, &args.nonce, 0).unwrap(), 50);
    assert_eq!(mxe_side.decrypt_field(&args.supply_ct, &args.nonce, 1).unwrap(), 100);
    assert_eq!(mxe_side.decrypt_field(&args.markup_ct, &args.nonce, 2).unwrap(), 0);
}

#[tokio::test]
async fn test_rejected_purchase_reports_sold_out() {
    let h = Harness::new();
    h.put_registry(2, 7);
    h.ledger().push_script(Script {
        logs: vec![encode_event(&PurchaseRequested {
            event_id: 1,
            ticket_id: 7,
            buyer: h.wallet(),
        })],
        writes: vec![(
            pda::ticket(&h.program_id, 7),
            serialize(&h.ticket(7, TicketStatus::Rejected)),
        )],
        ..Default::default()
    });

    let result = h.client.purchase_ticket(1).await;
    assert!(matches!(result, Err(ClientError::SoldOut(1))));
}

#[tokio::test]
async fn test_sold_purchase_returns_ticket() {
    let h = Harness::new();
    h.put_registry(2, 4);
    h.ledger().push_script(Script {
        logs: vec![encode_event(&PurchaseRequested {
            event_id: 1,
            ticket_id: 4,
            buyer: h.wallet(),
        })],
        writes: vec![(
            pda::ticket(&h.program_id, 4),
            serialize(&h.ticket(4, TicketStatus::Sold)),
        )],
        ..Default::default()
    });

    let ticket = h.client.purchase_ticket(1).await.unwrap();
    assert_eq!(ticket.ticket_id, 4);
    assert_eq!(ticket.owner, h.wallet());
}

#[tokio::test]
async fn test_price_is_opened_from_the_new_callback_only() {
    let h = Harness::new();
    let nonce = [5; 16];
    let delivery = |value: u64| {
        encode_event(&EncryptedValueForUser {
            kind: ValueKind::TicketPrice,
            subject_id: 3,
            user: h.wallet(),
            value: h.sealed_for_user(value, nonce),
            nonce,
        })
    };
    // Answer to an earlier request for the same ticket
    h.ledger().past_transaction(vec![delivery(99)]);
    h.ledger().push_script(Script {
        callback: Some(vec![delivery(50)]),
        ..Default::default()
    });

    assert_eq!(h.client.get_my_ticket_price(3).await.unwrap(), 50);
}

#[tokio::test]
async fn test_callback_buried_under_later_traffic_is_found() {
    let h = Harness::new();
    let nonce = [6; 16];
    h.ledger().push_script(Script {
        callback: Some(vec![encode_event(&EncryptedValueForUser {
            kind: ValueKind::SalesCount,
            subject_id: 1,
            user: h.wallet(),
            value: h.sealed_for_user(12, nonce),
            nonce,
        })]),
        traffic_after: 130,
        ..Default::default()
    });

    assert_eq!(h.client.get_sales_count(1).await.unwrap(), 12);
}

#[tokio::test]
async fn test_value_for_another_user_is_ignored() {
    let h = Harness::new();
    let nonce = [5; 16];
    h.ledger().push_script(Script {
        callback: Some(vec![encode_event(&EncryptedValueForUser {
            kind: ValueKind::SalesCount,
            subject_id: 1,
            user: Pubkey::new_unique(),
            value: h.sealed_for_user(1, nonce),
            nonce,
        })]),
        ..Default::default()
    });

    let result = h.client.get_sales_count(1).await;
    assert!(matches!(result, Err(ClientError::Timeout(_))));
}

#[tokio::test]
async fn test_missing_callback_times_out() {
    let h = Harness::new();
    h.ledger().push_script(Script::default());

    let result = h.client.get_sales_count(1).await;
    assert!(matches!(result, Err(ClientError::Timeout(_))));
}

#[tokio::test]
async fn test_ownership_proof_opens_to_ticket_id() {
    let h = Harness::new();
    let nonce = [9; 16];
    h.ledger().push_script(Script {
        callback: Some(vec![encode_event(&OwnershipProof {
            ticket_id: 3,
            holder: h.wallet(),
            encrypted_proof: h.sealed_for_user(3, nonce),
            nonce,
        })]),
        ..Default::default()
    });

    assert!(h.client.prove_ownership(3).await.unwrap());
}

#[tokio::test]
async fn test_my_ticket_ids_come_from_return_data() {
    let h = Harness::new();
    assert!(h.client.get_my_ticket_ids().await.unwrap().is_empty());

    h.ledger().chain.lock().unwrap().return_data =
        Some(anchor_lang::AnchorSerialize::try_to_vec(&vec![1u64, 4]).unwrap());
    assert_eq!(h.client.get_my_ticket_ids().await.unwrap(), vec![1, 4]);
}

#[tokio::test]
async fn test_clear_stale_targets_the_pending_ticket() {
    let h = Harness::new();
    let mut event = active_event(1, h.wallet());
    assert!(matches!(
        h.client.clear_stale_purchase(1).await,
        Err(ClientError::InvalidInput(_))
    ));

    h.ledger().put(pda::event(&h.program_id, 1), &event);
    assert!(matches!(
        h.client.clear_stale_purchase(1).await,
        Err(ClientError::InvalidInput(_))
    ));

    event.purchase_in_flight = true;
    event.pending_ticket_id = 6;
    h.ledger().put(pda::event(&h.program_id, 1), &event);
    assert_eq!(h.client.clear_stale_purchase(1).await.unwrap(), 6);

    let submitted = h.ledger().submitted();
    assert_eq!(submitted.len(), 1);
    assert!(submitted[0]
        .accounts
        .iter()
        .any(|meta| meta.pubkey == pda::ticket(&h.program_id, 6) && meta.is_writable));
}

#[tokio::test]
async fn test_quote_requires_existing_ticket() {
    let h = Harness::new();
    let result = h.client.quote_resale_price(42).await;
    assert!(matches!(result, Err(ClientError::InvalidInput(_))));
}

#[test]
fn test_event_record_discriminator_is_stable() {
    let record = EventCreated {
        event_id: 1,
        organizer: Pubkey::default(),
        name: String::new(),
        event_date: 0,
        resale_allowed: false,
    };
    assert!(record.data().starts_with(EventCreated::DISCRIMINATOR));
}
