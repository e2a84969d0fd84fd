use std::collections::HashSet;
use std::time::Duration;

use anchor_lang::{AccountDeserialize, AnchorDeserialize, Event, InstructionData, ToAccountMetas};
use private_ticketing::constants::*;
use private_ticketing::events::{
    EncryptedValueForUser, EventCreated, OwnershipProof, PurchaseRequested, TicketTransferred,
    ValueKind,
};
use private_ticketing::state::{
    EventAccount, EventStatus, OwnerTickets, Registry, SetPermissionArgs, Ticket, TicketStatus,
};
use private_ticketing::composite_accounts::MxeQueue as MxeAccounts;
use private_ticketing::{accounts, instruction};
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::system_program;
use tracing::{debug, info, warn};

use crate::api::NewEvent;
use crate::cipher::{random_nonce, EncryptionKey, SharedCipher};
use crate::config::ArciumManifest;
use crate::error::ClientError;
use crate::ledger::Ledger;
use crate::logs::{decode_events, first_event};
use crate::pda;

/// Signatures fetched per page when looking for a callback
const CALLBACK_WINDOW: usize = 50;

/// Pages walked back per poll before giving up on reaching a known signature
const CALLBACK_MAX_PAGES: usize = 20;

/// Bounds how long the client waits for the MXE to call back.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            attempts: 60,
            interval: Duration::from_secs(1),
        }
    }
}

pub struct TicketingClient<L> {
    ledger: L,
    program_id: Pubkey,
    manifest: ArciumManifest,
    key: EncryptionKey,
    poll: PollConfig,
}

impl<L: Ledger> TicketingClient<L> {
    pub fn new(
        ledger: L,
        program_id: Pubkey,
        manifest: ArciumManifest,
        key: EncryptionKey,
        poll: PollConfig,
    ) -> Self {
        Self {
            ledger,
            program_id,
            manifest,
            key,
            poll,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn wallet(&self) -> Pubkey {
        self.ledger.payer()
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    fn cipher(&self) -> Result<SharedCipher, ClientError> {
        Ok(self.key.shared_cipher(&self.manifest.mxe_public_key()?))
    }

    fn mxe_accounts(&self, computation: &str, offset: u64) -> Result<MxeAccounts, ClientError> {
        let manifest = &self.manifest;
        Ok(MxeAccounts {
            sign_seed: pda::sign_seed(&self.program_id),
            arcium_program: manifest.arcium_program,
            mxe_account: manifest.mxe_account,
            cluster_account: manifest.cluster_account,
            pool_account: manifest.pool_account,
            clock_account: manifest.clock_account,
            mempool_account: manifest.mempool_account,
            executing_pool: manifest.executing_pool,
            computation_account: pda::computation_account(
                &manifest.arcium_program,
                manifest.cluster_offset,
                offset,
            ),
            comp_def_account: manifest.comp_def(computation)?,
        })
    }

    fn instruction(&self, accounts: impl ToAccountMetas, data: impl InstructionData) -> Instruction {
        Instruction {
            program_id: self.program_id,
            accounts: accounts.to_account_metas(None),
            data: data.data(),
        }
    }

    fn permission_pair(&self, caller: &Pubkey, operation: &str) -> (Pubkey, Pubkey) {
        (
            pda::permission(&self.program_id, caller, operation),
            pda::permission(&self.program_id, &Pubkey::default(), operation),
        )
    }

    async fn fetch<T: AccountDeserialize>(&self, address: &Pubkey) -> Result<Option<T>, ClientError> {
        match self.ledger.account_data(address).await? {
            Some(data) if !data.is_empty() => T::try_deserialize(&mut data.as_slice())
                .map(Some)
                .map_err(|_| ClientError::Decode(*address)),
            _ => Ok(None),
        }
    }

    async fn registry_or_err(&self) -> Result<Registry, ClientError> {
        self.registry()
            .await?
            .ok_or_else(|| ClientError::Config("registry is not initialized".into()))
    }

    async fn logged<E>(&self, signature: &Signature, name: &'static str) -> Result<E, ClientError>
    where
        E: Event + AnchorDeserialize,
    {
        let logs = self.ledger.transaction_logs(signature).await?;
        first_event(&logs).ok_or(ClientError::MissingLog(name))
    }

    async fn seen_signatures(&self) -> Result<HashSet<Signature>, ClientError> {
        Ok(self
            .ledger
            .recent_signatures(&self.program_id, None, CALLBACK_WINDOW)
            .await?
            .into_iter()
            .collect())
    }

    /// Program signatures that landed since the newest one in `seen`,
    /// paging back until a known signature or the end of history.
    async fn unseen_signatures(
        &self,
        seen: &HashSet<Signature>,
    ) -> Result<Vec<Signature>, ClientError> {
        let mut fresh = Vec::new();
        let mut before = None;
        for _ in 0..CALLBACK_MAX_PAGES {
            let page = self
                .ledger
                .recent_signatures(&self.program_id, before, CALLBACK_WINDOW)
                .await?;
            let full = page.len() == CALLBACK_WINDOW;
            before = page.last().copied();
            for signature in page {
                if seen.contains(&signature) {
                    return Ok(fresh);
                }
                fresh.push(signature);
            }
            if !full {
                return Ok(fresh);
            }
        }
        warn!(count = fresh.len(), "stopped paging before reaching a known signature");
        Ok(fresh)
    }

    /// Polls the program's transactions that were not in `seen` for a
    /// callback record accepted by `matches`.
    async fn await_callback<E, F>(
        &self,
        mut seen: HashSet<Signature>,
        what: &str,
        matches: F,
    ) -> Result<E, ClientError>
    where
        E: Event + AnchorDeserialize,
        F: Fn(&E) -> bool,
    {
        for attempt in 1..=self.poll.attempts {
            let fresh = self.unseen_signatures(&seen).await?;
            for signature in fresh {
                seen.insert(signature);
                let logs = self.ledger.transaction_logs(&signature).await?;
                if let Some(record) = decode_events::<E>(&logs).into_iter().find(|e| matches(e)) {
                    debug!(%signature, what, "callback observed");
                    return Ok(record);
                }
            }
            debug!(attempt, what, "callback not seen yet");
            tokio::time::sleep(self.poll.interval).await;
        }
        Err(ClientError::Timeout(what.to_string()))
    }

    async fn await_account<T, F>(&self, address: Pubkey, what: &str, done: F) -> Result<T, ClientError>
    where
        T: AccountDeserialize,
        F: Fn(&T) -> bool,
    {
        for attempt in 1..=self.poll.attempts {
            if let Some(account) = self.fetch::<T>(&address).await? {
                if done(&account) {
                    return Ok(account);
                }
            }
            debug!(attempt, what, "account not settled yet");
            tokio::time::sleep(self.poll.interval).await;
        }
        Err(ClientError::Timeout(what.to_string()))
    }

    /// Submits a computation that ends in an `EncryptedValueForUser` for
    /// this wallet and opens the value.
    async fn request_value(
        &self,
        ix: Instruction,
        kind: ValueKind,
        subject_id: u64,
    ) -> Result<u64, ClientError> {
        let seen = self.seen_signatures().await?;
        let user = self.wallet();
        self.ledger.submit(vec![ix]).await?;

        let delivered: EncryptedValueForUser = self
            .await_callback(seen, "encrypted value", |record: &EncryptedValueForUser| {
                record.kind == kind && record.subject_id == subject_id && record.user == user
            })
            .await?;
        self.cipher()?
            .decrypt_field(&delivered.value, &delivered.nonce, 0)
    }

    // ==================== READS ====================

    pub async fn registry(&self) -> Result<Option<Registry>, ClientError> {
        self.fetch(&pda::registry(&self.program_id)).await
    }

    pub async fn event(&self, event_id: u64) -> Result<Option<EventAccount>, ClientError> {
        self.fetch(&pda::event(&self.program_id, event_id)).await
    }

    pub async fn ticket(&self, ticket_id: u64) -> Result<Option<Ticket>, ClientError> {
        self.fetch(&pda::ticket(&self.program_id, ticket_id)).await
    }

    /// Ticket ids held by any owner, read from their index account.
    pub async fn tickets_of(&self, owner: &Pubkey) -> Result<Vec<u64>, ClientError> {
        let book: Option<OwnerTickets> = self
            .fetch(&pda::owner_tickets(&self.program_id, owner))
            .await?;
        Ok(book.map(|b| b.ticket_ids).unwrap_or_default())
    }

    /// The wallet's own ticket ids, as returned by the program.
    pub async fn get_my_ticket_ids(&self) -> Result<Vec<u64>, ClientError> {
        let owner = self.wallet();
        let ix = self.instruction(
            accounts::GetMyTicketIds {
                owner,
                owner_tickets: pda::owner_tickets(&self.program_id, &owner),
            },
            instruction::GetMyTicketIds {},
        );
        match self.ledger.simulate(vec![ix]).await? {
            Some(data) => Vec::<u64>::try_from_slice(&data)
                .map_err(|e| ClientError::Rpc(format!("return data: {e}"))),
            None => Ok(Vec::new()),
        }
    }

    pub async fn balance(&self, address: &Pubkey) -> Result<u64, ClientError> {
        self.ledger.balance(address).await
    }

    // ==================== WRITES ====================

    pub async fn initialize(&self, mxe_program_id: Option<Pubkey>) -> Result<Signature, ClientError> {
        let mxe_program_id = mxe_program_id.unwrap_or(self.manifest.mxe_program);
        let ix = self.instruction(
            accounts::Initialize {
                authority: self.wallet(),
                registry: pda::registry(&self.program_id),
                system_program: system_program::ID,
            },
            instruction::Initialize { mxe_program_id },
        );
        let signature = self.ledger.submit(vec![ix]).await?;
        info!(%signature, %mxe_program_id, "registry initialized");
        Ok(signature)
    }

    /// Creates an event and waits until the MXE has taken over its secrets.
    pub async fn create_event(&self, request: &NewEvent) -> Result<EventAccount, ClientError> {
        let registry = self.registry_or_err().await?;
        let event_id = registry.next_event_id;
        let offset: u64 = rand::random();
        let nonce = random_nonce();
        let secrets = self.cipher()?.encrypt_fields(
            &[request.price, request.supply, request.resale_markup_percent],
            &nonce,
        )?;

        let ix = self.instruction(
            accounts::CreateEvent {
                organizer: self.wallet(),
                registry: pda::registry(&self.program_id),
                event: pda::event(&self.program_id, event_id),
                mxe: self.mxe_accounts(INIT_EVENT_COMP, offset)?,
                system_program: system_program::ID,
            },
            instruction::CreateEvent {
                computation_offset: offset,
                name: request.name.clone(),
                event_date: request.event_date,
                price_ct: secrets[0],
                supply_ct: secrets[1],
                resale_allowed: request.resale_allowed,
                markup_ct: secrets[2],
                enc_pubkey: self.key.public_key(),
                nonce,
            },
        );
        let signature = self.ledger.submit(vec![ix]).await?;
        let created: EventCreated = self.logged(&signature, "EventCreated").await?;
        info!(event_id = created.event_id, %signature, "event created, awaiting MXE");

        self.await_account(
            pda::event(&self.program_id, created.event_id),
            "event activation",
            |event: &EventAccount| event.status == EventStatus::Active,
        )
        .await
    }

    /// Buys one ticket; `SoldOut` when the MXE finds no supply left.
    pub async fn purchase_ticket(&self, event_id: u64) -> Result<Ticket, ClientError> {
        let registry = self.registry_or_err().await?;
        let buyer = self.wallet();
        let offset: u64 = rand::random();
        let (caller_permission, wildcard_permission) =
            self.permission_pair(&buyer, OP_PURCHASE_TICKET);

        let ix = self.instruction(
            accounts::PurchaseTicket {
                buyer,
                registry: pda::registry(&self.program_id),
                event: pda::event(&self.program_id, event_id),
                ticket: pda::ticket(&self.program_id, registry.next_ticket_id),
                owner_tickets: pda::owner_tickets(&self.program_id, &buyer),
                caller_permission,
                wildcard_permission,
                holder_prove: pda::permission(&self.program_id, &buyer, OP_PROVE_OWNERSHIP),
                holder_transfer: pda::permission(&self.program_id, &buyer, OP_TRANSFER_TICKET),
                holder_price: pda::permission(&self.program_id, &buyer, OP_GET_TICKET_PRICE),
                mxe: self.mxe_accounts(PURCHASE_TICKET_COMP, offset)?,
                system_program: system_program::ID,
            },
            instruction::PurchaseTicket {
                computation_offset: offset,
                event_id,
            },
        );
        let signature = self.ledger.submit(vec![ix]).await?;
        let requested: PurchaseRequested = self.logged(&signature, "PurchaseRequested").await?;
        info!(event_id, ticket_id = requested.ticket_id, "purchase queued");

        let ticket: Ticket = self
            .await_account(
                pda::ticket(&self.program_id, requested.ticket_id),
                "purchase result",
                |ticket: &Ticket| ticket.status != TicketStatus::Pending,
            )
            .await?;
        if ticket.status == TicketStatus::Rejected {
            warn!(event_id, ticket_id = ticket.ticket_id, "event sold out");
            return Err(ClientError::SoldOut(event_id));
        }
        Ok(ticket)
    }

    pub async fn transfer_ticket(&self, ticket_id: u64, to: Pubkey) -> Result<Ticket, ClientError> {
        let owner = self.wallet();
        let (caller_permission, wildcard_permission) =
            self.permission_pair(&owner, OP_TRANSFER_TICKET);
        let ticket_address = pda::ticket(&self.program_id, ticket_id);

        let ix = self.instruction(
            accounts::TransferTicket {
                owner,
                ticket: ticket_address,
                from_tickets: pda::owner_tickets(&self.program_id, &owner),
                to_tickets: pda::owner_tickets(&self.program_id, &to),
                caller_permission,
                wildcard_permission,
                recipient_prove: pda::permission(&self.program_id, &to, OP_PROVE_OWNERSHIP),
                recipient_transfer: pda::permission(&self.program_id, &to, OP_TRANSFER_TICKET),
                recipient_price: pda::permission(&self.program_id, &to, OP_GET_TICKET_PRICE),
                system_program: system_program::ID,
            },
            instruction::TransferTicket { ticket_id, to },
        );
        let signature = self.ledger.submit(vec![ix]).await?;
        let transferred: TicketTransferred = self.logged(&signature, "TicketTransferred").await?;
        info!(ticket_id, from = %transferred.from, to = %transferred.to, "ticket transferred");

        self.ticket(ticket_id)
            .await?
            .ok_or(ClientError::Decode(ticket_address))
    }

    /// True when the MXE's proof opens to this ticket id under our key.
    pub async fn prove_ownership(&self, ticket_id: u64) -> Result<bool, ClientError> {
        let holder = self.wallet();
        let offset: u64 = rand::random();
        let nonce = random_nonce();
        let (caller_permission, wildcard_permission) =
            self.permission_pair(&holder, OP_PROVE_OWNERSHIP);

        let ix = self.instruction(
            accounts::ProveOwnership {
                holder,
                registry: pda::registry(&self.program_id),
                ticket: pda::ticket(&self.program_id, ticket_id),
                caller_permission,
                wildcard_permission,
                mxe: self.mxe_accounts(PROVE_OWNERSHIP_COMP, offset)?,
                system_program: system_program::ID,
            },
            instruction::ProveOwnership {
                computation_offset: offset,
                ticket_id,
                enc_pubkey: self.key.public_key(),
                nonce,
            },
        );

        let seen = self.seen_signatures().await?;
        self.ledger.submit(vec![ix]).await?;
        let proof: OwnershipProof = self
            .await_callback(seen, "ownership proof", |proof: &OwnershipProof| {
                proof.ticket_id == ticket_id && proof.holder == holder
            })
            .await?;

        let opened = self
            .cipher()?
            .decrypt_field(&proof.encrypted_proof, &proof.nonce, 0)?;
        Ok(opened == ticket_id)
    }

    fn ticket_price_accounts(
        &self,
        ticket_id: u64,
        offset: u64,
        computation: &str,
    ) -> Result<accounts::GetTicketPrice, ClientError> {
        let holder = self.wallet();
        let (caller_permission, wildcard_permission) =
            self.permission_pair(&holder, OP_GET_TICKET_PRICE);
        Ok(accounts::GetTicketPrice {
            holder,
            registry: pda::registry(&self.program_id),
            ticket: pda::ticket(&self.program_id, ticket_id),
            caller_permission,
            wildcard_permission,
            mxe: self.mxe_accounts(computation, offset)?,
            system_program: system_program::ID,
        })
    }

    pub async fn get_my_ticket_price(&self, ticket_id: u64) -> Result<u64, ClientError> {
        let offset: u64 = rand::random();
        let ix = self.instruction(
            self.ticket_price_accounts(ticket_id, offset, REVEAL_TICKET_PRICE_COMP)?,
            instruction::GetMyTicketPrice {
                computation_offset: offset,
                ticket_id,
                enc_pubkey: self.key.public_key(),
                nonce: random_nonce(),
            },
        );
        self.request_value(ix, ValueKind::TicketPrice, ticket_id).await
    }

    pub async fn quote_resale_price(&self, ticket_id: u64) -> Result<u64, ClientError> {
        let ticket = self
            .ticket(ticket_id)
            .await?
            .ok_or_else(|| ClientError::InvalidInput(format!("ticket {ticket_id} does not exist")))?;
        let offset: u64 = rand::random();
        let ix = self.instruction(
            accounts::QuoteResalePrice {
                price: self.ticket_price_accounts(ticket_id, offset, QUOTE_RESALE_COMP)?,
                event: pda::event(&self.program_id, ticket.event_id),
            },
            instruction::QuoteResalePrice {
                computation_offset: offset,
                ticket_id,
                enc_pubkey: self.key.public_key(),
                nonce: random_nonce(),
            },
        );
        self.request_value(ix, ValueKind::ResaleQuote, ticket_id).await
    }

    pub async fn get_sales_count(&self, event_id: u64) -> Result<u64, ClientError> {
        let offset: u64 = rand::random();
        let ix = self.instruction(
            accounts::GetSalesCount {
                organizer: self.wallet(),
                registry: pda::registry(&self.program_id),
                event: pda::event(&self.program_id, event_id),
                mxe: self.mxe_accounts(REVEAL_SALES_COMP, offset)?,
                system_program: system_program::ID,
            },
            instruction::GetSalesCount {
                computation_offset: offset,
                event_id,
                enc_pubkey: self.key.public_key(),
                nonce: random_nonce(),
            },
        );
        self.request_value(ix, ValueKind::SalesCount, event_id).await
    }

    /// Releases an event whose purchase guard outlived the timeout and
    /// returns the id of the ticket that was rejected.
    pub async fn clear_stale_purchase(&self, event_id: u64) -> Result<u64, ClientError> {
        let event = self
            .event(event_id)
            .await?
            .ok_or_else(|| ClientError::InvalidInput(format!("event {event_id} does not exist")))?;
        if !event.purchase_in_flight {
            return Err(ClientError::InvalidInput(format!(
                "event {event_id} has no purchase in flight"
            )));
        }
        let ticket_id = event.pending_ticket_id;

        let ix = self.instruction(
            accounts::ClearStalePurchase {
                signer: self.wallet(),
                registry: pda::registry(&self.program_id),
                event: pda::event(&self.program_id, event_id),
                ticket: pda::ticket(&self.program_id, ticket_id),
            },
            instruction::ClearStalePurchase { event_id },
        );
        let signature = self.ledger.submit(vec![ix]).await?;
        info!(%signature, event_id, ticket_id, "stale purchase cleared");
        Ok(ticket_id)
    }

    pub async fn set_permission(
        &self,
        args: SetPermissionArgs,
        scope_event: Option<u64>,
    ) -> Result<Signature, ClientError> {
        let ix = self.instruction(
            accounts::SetPermission {
                setter: self.wallet(),
                registry: pda::registry(&self.program_id),
                condition: pda::permission(&self.program_id, &args.caller, &args.operation),
                scope_event: scope_event.map(|id| pda::event(&self.program_id, id)),
                system_program: system_program::ID,
            },
            instruction::SetPermission { args },
        );
        let signature = self.ledger.submit(vec![ix]).await?;
        info!(%signature, "permission updated");
        Ok(signature)
    }
}
