//! The chain as the client sees it.

use std::str::FromStr;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_client::GetConfirmedSignaturesForAddress2Config;
use solana_client::rpc_config::RpcTransactionConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;
use solana_transaction_status::option_serializer::OptionSerializer;
use solana_transaction_status::UiTransactionEncoding;
use tracing::debug;

use crate::error::ClientError;

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Fee payer and signer of every submitted transaction
    fn payer(&self) -> Pubkey;

    /// Sends one transaction and waits until it is confirmed.
    async fn submit(&self, instructions: Vec<Instruction>) -> Result<Signature, ClientError>;

    /// Simulates a transaction and returns the program's return data.
    async fn simulate(&self, instructions: Vec<Instruction>) -> Result<Option<Vec<u8>>, ClientError>;

    /// Empty for transactions that failed, since their effects were rolled back.
    async fn transaction_logs(&self, signature: &Signature) -> Result<Vec<String>, ClientError>;

    /// Newest first, strictly older than `before` when it is given.
    async fn recent_signatures(
        &self,
        address: &Pubkey,
        before: Option<Signature>,
        limit: usize,
    ) -> Result<Vec<Signature>, ClientError>;

    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, ClientError>;

    async fn balance(&self, address: &Pubkey) -> Result<u64, ClientError>;
}

pub struct RpcLedger {
    rpc: RpcClient,
    payer: Keypair,
}

impl RpcLedger {
    pub fn new(rpc_url: String, payer: Keypair) -> Self {
        Self {
            rpc: RpcClient::new_with_commitment(rpc_url, CommitmentConfig::confirmed()),
            payer,
        }
    }

    async fn signed(&self, instructions: &[Instruction]) -> Result<Transaction, ClientError> {
        let blockhash = self.rpc.get_latest_blockhash().await?;
        Ok(Transaction::new_signed_with_payer(
            instructions,
            Some(&self.payer.pubkey()),
            &[&self.payer],
            blockhash,
        ))
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    fn payer(&self) -> Pubkey {
        self.payer.pubkey()
    }

    async fn submit(&self, instructions: Vec<Instruction>) -> Result<Signature, ClientError> {
        let tx = self.signed(&instructions).await?;
        let signature = self.rpc.send_and_confirm_transaction(&tx).await?;
        debug!(%signature, "transaction confirmed");
        Ok(signature)
    }

    async fn simulate(&self, instructions: Vec<Instruction>) -> Result<Option<Vec<u8>>, ClientError> {
        let tx = self.signed(&instructions).await?;
        let response = self.rpc.simulate_transaction(&tx).await?;
        if let Some(err) = response.value.err {
            return Err(ClientError::Program(err.to_string()));
        }
        match response.value.return_data {
            Some(return_data) => {
                let (encoded, _) = return_data.data;
                let bytes = STANDARD
                    .decode(encoded)
                    .map_err(|e| ClientError::Rpc(format!("return data: {e}")))?;
                Ok(Some(bytes))
            }
            None => Ok(None),
        }
    }

    async fn transaction_logs(&self, signature: &Signature) -> Result<Vec<String>, ClientError> {
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Json),
            commitment: Some(CommitmentConfig::confirmed()),
            max_supported_transaction_version: Some(0),
        };
        let tx = self
            .rpc
            .get_transaction_with_config(signature, config)
            .await?;
        let logs = match tx.transaction.meta {
            Some(meta) if meta.err.is_none() => match meta.log_messages {
                OptionSerializer::Some(logs) => logs,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        Ok(logs)
    }

    async fn recent_signatures(
        &self,
        address: &Pubkey,
        before: Option<Signature>,
        limit: usize,
    ) -> Result<Vec<Signature>, ClientError> {
        let config = GetConfirmedSignaturesForAddress2Config {
            before,
            limit: Some(limit),
            commitment: Some(CommitmentConfig::confirmed()),
            ..Default::default()
        };
        let statuses = self
            .rpc
            .get_signatures_for_address_with_config(address, config)
            .await?;
        statuses
            .into_iter()
            .map(|status| {
                Signature::from_str(&status.signature)
                    .map_err(|e| ClientError::Rpc(format!("bad signature {}: {e}", status.signature)))
            })
            .collect()
    }

    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, ClientError> {
        let response = self
            .rpc
            .get_account_with_commitment(address, CommitmentConfig::confirmed())
            .await?;
        Ok(response.value.map(|account| account.data))
    }

    async fn balance(&self, address: &Pubkey) -> Result<u64, ClientError> {
        Ok(self.rpc.get_balance(address).await?)
    }
}
