//! In-memory mirror of on-chain entities.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ticketing_client::{EventView, TicketView};
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRecord {
    pub address: String,
    pub connected_at: i64,
}

#[derive(Default)]
pub struct MirrorStore {
    events: RwLock<BTreeMap<u64, EventView>>,
    tickets: RwLock<BTreeMap<u64, TicketView>>,
    wallets: RwLock<BTreeMap<String, WalletRecord>>,
}

impl MirrorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_event(&self, event: EventView) {
        self.events.write().await.insert(event.id, event);
    }

    pub async fn event(&self, event_id: u64) -> Option<EventView> {
        self.events.read().await.get(&event_id).cloned()
    }

    /// Ordered by id
    pub async fn events(&self) -> Vec<EventView> {
        self.events.read().await.values().cloned().collect()
    }

    pub async fn put_ticket(&self, ticket: TicketView) {
        self.tickets.write().await.insert(ticket.id, ticket);
    }

    pub async fn ticket(&self, ticket_id: u64) -> Option<TicketView> {
        self.tickets.read().await.get(&ticket_id).cloned()
    }

    pub async fn tickets(&self) -> Vec<TicketView> {
        self.tickets.read().await.values().cloned().collect()
    }

    /// Keeps the first connection time of a returning wallet.
    pub async fn connect_wallet(&self, address: String, now: i64) -> WalletRecord {
        self.wallets
            .write()
            .await
            .entry(address.clone())
            .or_insert(WalletRecord {
                address,
                connected_at: now,
            })
            .clone()
    }

    pub async fn wallet(&self, address: &str) -> Option<WalletRecord> {
        self.wallets.read().await.get(address).cloned()
    }
}
