use std::str::FromStr;

use async_trait::async_trait;
use private_ticketing::constants::MAX_EVENT_NAME_LEN;
use private_ticketing::state::{EventAccount, EventStatus, SetPermissionArgs, Ticket, TicketStatus};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::client::TicketingClient;
use crate::error::ClientError;
use crate::ledger::Ledger;

/// Public projection of an event; the ciphertext fields stay private.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventView {
    pub id: u64,
    pub organizer: String,
    pub name: String,
    pub event_date: i64,
    pub resale_allowed: bool,
    pub active: bool,
}

impl From<&EventAccount> for EventView {
    fn from(event: &EventAccount) -> Self {
        Self {
            id: event.event_id,
            organizer: event.organizer.to_string(),
            name: event.name.clone(),
            event_date: event.event_date,
            resale_allowed: event.resale_allowed,
            active: event.status == EventStatus::Active,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketState {
    Pending,
    Sold,
    Rejected,
}

impl From<TicketStatus> for TicketState {
    fn from(status: TicketStatus) -> Self {
        match status {
            TicketStatus::Pending => TicketState::Pending,
            TicketStatus::Sold => TicketState::Sold,
            TicketStatus::Rejected => TicketState::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketView {
    pub id: u64,
    pub event_id: u64,
    pub owner: String,
    pub status: TicketState,
    pub transfer_count: u32,
}

impl From<&Ticket> for TicketView {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.ticket_id,
            event_id: ticket.event_id,
            owner: ticket.owner.to_string(),
            status: ticket.status.into(),
            transfer_count: ticket.transfer_count,
        }
    }
}

/// Plaintext event parameters; encrypted for the MXE before submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    pub name: String,
    pub event_date: i64,
    pub price: u64,
    pub supply: u64,
    #[serde(default)]
    pub resale_allowed: bool,
    #[serde(default)]
    pub resale_markup_percent: u64,
}

impl NewEvent {
    pub fn validate(&self, now: i64) -> Result<(), ClientError> {
        if self.name.is_empty() || self.name.len() > MAX_EVENT_NAME_LEN {
            return Err(ClientError::InvalidInput(format!(
                "event name must be 1..={MAX_EVENT_NAME_LEN} bytes"
            )));
        }
        if self.event_date <= now {
            return Err(ClientError::InvalidInput(
                "event date must be in the future".into(),
            ));
        }
        Ok(())
    }
}

fn enabled() -> bool {
    true
}

/// Permission condition as written by an operator. `caller: None` targets
/// the wildcard entry that applies to every caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    #[serde(default)]
    pub caller: Option<String>,
    pub operation: String,
    #[serde(default = "enabled")]
    pub active: bool,
    #[serde(default)]
    pub valid_from: i64,
    #[serde(default)]
    pub valid_until: i64,
    #[serde(default)]
    pub force_allow: bool,
    #[serde(default)]
    pub force_deny: bool,
    #[serde(default)]
    pub uint_parameter: u64,
    #[serde(default)]
    pub address_parameter: Option<String>,
    #[serde(default)]
    pub string_parameter: Option<String>,
    /// Event the grant is pinned to when written by that event's organizer
    #[serde(default)]
    pub scope_event: Option<u64>,
}

fn parse_pubkey(raw: &str) -> Result<Pubkey, ClientError> {
    Pubkey::from_str(raw).map_err(|_| ClientError::InvalidInput(format!("bad address {raw}")))
}

impl PermissionGrant {
    pub fn to_args(&self) -> Result<SetPermissionArgs, ClientError> {
        let args = SetPermissionArgs {
            caller: self.caller.as_deref().map(parse_pubkey).transpose()?.unwrap_or_default(),
            operation: self.operation.clone(),
            active: self.active,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            force_allow: self.force_allow,
            force_deny: self.force_deny,
            uint_parameter: self.uint_parameter,
            address_parameter: self
                .address_parameter
                .as_deref()
                .map(parse_pubkey)
                .transpose()?
                .unwrap_or_default(),
            string_parameter: self.string_parameter.clone().unwrap_or_default(),
        };
        args.validate()
            .map_err(|e| ClientError::InvalidInput(e.to_string()))?;
        Ok(args)
    }
}

/// Everything a front end needs from the ticketing deployment.
#[async_trait]
pub trait TicketingApi: Send + Sync {
    fn wallet(&self) -> Pubkey;

    async fn create_event(&self, request: NewEvent) -> Result<EventView, ClientError>;

    async fn event(&self, event_id: u64) -> Result<Option<EventView>, ClientError>;

    async fn purchase_ticket(&self, event_id: u64) -> Result<TicketView, ClientError>;

    async fn ticket(&self, ticket_id: u64) -> Result<Option<TicketView>, ClientError>;

    async fn tickets_of(&self, owner: Pubkey) -> Result<Vec<u64>, ClientError>;

    async fn transfer_ticket(&self, ticket_id: u64, to: Pubkey) -> Result<TicketView, ClientError>;

    async fn prove_ownership(&self, ticket_id: u64) -> Result<bool, ClientError>;

    async fn ticket_price(&self, ticket_id: u64) -> Result<u64, ClientError>;

    async fn resale_quote(&self, ticket_id: u64) -> Result<u64, ClientError>;

    async fn sales_count(&self, event_id: u64) -> Result<u64, ClientError>;

    async fn set_permission(&self, grant: PermissionGrant) -> Result<(), ClientError>;

    async fn balance(&self, address: Pubkey) -> Result<u64, ClientError>;
}

#[async_trait]
impl<L: Ledger> TicketingApi for TicketingClient<L> {
    fn wallet(&self) -> Pubkey {
        TicketingClient::wallet(self)
    }

    async fn create_event(&self, request: NewEvent) -> Result<EventView, ClientError> {
        request.validate(unix_now())?;
        let event = TicketingClient::create_event(self, &request).await?;
        Ok(EventView::from(&event))
    }

    async fn event(&self, event_id: u64) -> Result<Option<EventView>, ClientError> {
        Ok(TicketingClient::event(self, event_id)
            .await?
            .as_ref()
            .map(EventView::from))
    }

    async fn purchase_ticket(&self, event_id: u64) -> Result<TicketView, ClientError> {
        let ticket = TicketingClient::purchase_ticket(self, event_id).await?;
        Ok(TicketView::from(&ticket))
    }

    async fn ticket(&self, ticket_id: u64) -> Result<Option<TicketView>, ClientError> {
        Ok(TicketingClient::ticket(self, ticket_id)
            .await?
            .as_ref()
            .map(TicketView::from))
    }

    async fn tickets_of(&self, owner: Pubkey) -> Result<Vec<u64>, ClientError> {
        TicketingClient::tickets_of(self, &owner).await
    }

    async fn transfer_ticket(&self, ticket_id: u64, to: Pubkey) -> Result<TicketView, ClientError> {
        let ticket = TicketingClient::transfer_ticket(self, ticket_id, to).await?;
        Ok(TicketView::from(&ticket))
    }

    async fn prove_ownership(&self, ticket_id: u64) -> Result<bool, ClientError> {
        TicketingClient::prove_ownership(self, ticket_id).await
    }

    async fn ticket_price(&self, ticket_id: u64) -> Result<u64, ClientError> {
        self.get_my_ticket_price(ticket_id).await
    }

    async fn resale_quote(&self, ticket_id: u64) -> Result<u64, ClientError> {
        self.quote_resale_price(ticket_id).await
    }

    async fn sales_count(&self, event_id: u64) -> Result<u64, ClientError> {
        self.get_sales_count(event_id).await
    }

    async fn set_permission(&self, grant: PermissionGrant) -> Result<(), ClientError> {
        let args = grant.to_args()?;
        TicketingClient::set_permission(self, args, grant.scope_event).await?;
        Ok(())
    }

    async fn balance(&self, address: Pubkey) -> Result<u64, ClientError> {
        TicketingClient::balance(self, &address).await
    }
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concert() -> NewEvent {
        NewEvent {
            name: "Concert".into(),
            event_date: 2_000,
            price: 50,
            supply: 100,
            resale_allowed: true,
            resale_markup_percent: 10,
        }
    }

    #[test]
    fn test_new_event_rejects_past_date() {
        assert!(concert().validate(1_000).is_ok());
        assert!(matches!(
            concert().validate(2_000),
            Err(ClientError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_new_event_rejects_long_name() {
        let mut event = concert();
        event.name = "x".repeat(MAX_EVENT_NAME_LEN + 1);
        assert!(event.validate(0).is_err());
        event.name.clear();
        assert!(event.validate(0).is_err());
    }

    #[test]
    fn test_grant_defaults_to_active_wildcard() {
        let grant: PermissionGrant =
            serde_json::from_str(r#"{"operation":"op_purchase_ticket","force_allow":true}"#)
                .unwrap();
        let args = grant.to_args().unwrap();
        assert_eq!(args.caller, Pubkey::default());
        assert!(args.active);
        assert!(args.force_allow);
    }

    #[test]
    fn test_grant_rejects_unknown_operation() {
        let grant = PermissionGrant {
            operation: "op_refund".into(),
            ..Default::default()
        };
        assert!(matches!(grant.to_args(), Err(ClientError::InvalidInput(_))));
    }

    #[test]
    fn test_grant_rejects_bad_address() {
        let grant = PermissionGrant {
            caller: Some("not-a-key".into()),
            operation: "op_prove_ownership".into(),
            active: true,
            ..Default::default()
        };
        assert!(grant.to_args().is_err());
    }

    #[test]
    fn test_ticket_view_hides_price() {
        let ticket = Ticket {
            ticket_id: 3,
            event_id: 1,
            owner: Pubkey::new_unique(),
            price_ct: [9; 32],
            price_nonce: [1; 16],
            status: TicketStatus::Sold,
            transfer_count: 1,
            purchased_at: 0,
            bump: 255,
        };
        let json = serde_json::to_value(TicketView::from(&ticket)).unwrap();
        assert_eq!(json["status"], "sold");
        assert!(json.get("price_ct").is_none());
    }
}
