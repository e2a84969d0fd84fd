use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair};

use crate::cipher::EncryptionKey;
use crate::client::{PollConfig, TicketingClient};
use crate::error::ClientError;
use crate::ledger::RpcLedger;

pub const KNOWN_CHAINS: [&str; 4] = ["localnet", "devnet", "testnet", "mainnet-beta"];

/// Connection settings shared by the CLI and the web server.
#[derive(Debug, Clone, Args)]
pub struct ClientConfig {
    /// Solana JSON-RPC endpoint
    #[arg(long, env = "TICKETING_RPC_URL", default_value = "http://127.0.0.1:8899")]
    pub rpc_url: String,

    /// Cluster name
    #[arg(long, env = "TICKETING_CHAIN", default_value = "localnet")]
    pub chain: String,

    /// Path to the account's JSON keypair
    #[arg(long, env = "TICKETING_KEYPAIR")]
    pub keypair: PathBuf,

    /// Hex x25519 secret; derived from the keypair when omitted
    #[arg(long, env = "TICKETING_ENCRYPTION_KEY")]
    pub encryption_key: Option<String>,

    /// Deployed program address
    #[arg(long, env = "TICKETING_PROGRAM_ID")]
    pub program_id: Option<Pubkey>,

    /// JSON file describing the MXE cluster accounts
    #[arg(long, env = "TICKETING_ARCIUM_MANIFEST")]
    pub arcium_manifest: PathBuf,

    /// How many times to poll for a callback before giving up
    #[arg(long, env = "TICKETING_POLL_ATTEMPTS", default_value_t = 60)]
    pub poll_attempts: u32,

    /// Milliseconds between polls
    #[arg(long, env = "TICKETING_POLL_INTERVAL_MS", default_value_t = 1000)]
    pub poll_interval_ms: u64,
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), ClientError> {
        if !KNOWN_CHAINS.contains(&self.chain.as_str()) {
            return Err(ClientError::Config(format!(
                "unknown chain {:?}, expected one of {}",
                self.chain,
                KNOWN_CHAINS.join(", ")
            )));
        }
        if self.poll_attempts == 0 {
            return Err(ClientError::Config("poll attempts must be at least 1".into()));
        }
        Ok(())
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id.unwrap_or(private_ticketing::ID)
    }

    pub fn poll(&self) -> PollConfig {
        PollConfig {
            attempts: self.poll_attempts,
            interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    pub fn load_keypair(&self) -> Result<Keypair, ClientError> {
        read_keypair_file(&self.keypair).map_err(|e| {
            ClientError::Config(format!("cannot read keypair {}: {e}", self.keypair.display()))
        })
    }

    pub fn load_encryption_key(&self, keypair: &Keypair) -> Result<EncryptionKey, ClientError> {
        match &self.encryption_key {
            Some(hex_secret) => EncryptionKey::from_hex(hex_secret),
            None => Ok(derive_encryption_key(keypair)),
        }
    }

    pub fn load_manifest(&self) -> Result<ArciumManifest, ClientError> {
        let raw = fs::read_to_string(&self.arcium_manifest).map_err(|e| {
            ClientError::Config(format!(
                "cannot read manifest {}: {e}",
                self.arcium_manifest.display()
            ))
        })?;
        ArciumManifest::from_json(&raw)
    }

    /// Builds a client against the configured RPC endpoint.
    pub fn connect(&self) -> Result<TicketingClient<RpcLedger>, ClientError> {
        self.validate()?;
        let keypair = self.load_keypair()?;
        let key = self.load_encryption_key(&keypair)?;
        let manifest = self.load_manifest()?;
        Ok(TicketingClient::new(
            RpcLedger::new(self.rpc_url.clone(), keypair),
            self.program_id(),
            manifest,
            key,
            self.poll(),
        ))
    }
}

/// A stable x25519 secret tied to the wallet, so results encrypted in one
/// session can be opened in the next.
pub fn derive_encryption_key(keypair: &Keypair) -> EncryptionKey {
    let mut hasher = Sha256::new();
    hasher.update(b"private-ticketing/x25519");
    hasher.update(&keypair.to_bytes()[..32]);
    EncryptionKey::from_bytes(hasher.finalize().into())
}

/// Addresses of the Arcium accounts a computation is queued against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArciumManifest {
    #[serde(with = "pubkey_str")]
    pub arcium_program: Pubkey,
    #[serde(with = "pubkey_str")]
    pub mxe_program: Pubkey,
    #[serde(with = "pubkey_str")]
    pub mxe_account: Pubkey,
    #[serde(with = "pubkey_str")]
    pub cluster_account: Pubkey,
    #[serde(with = "pubkey_str")]
    pub pool_account: Pubkey,
    #[serde(with = "pubkey_str")]
    pub clock_account: Pubkey,
    #[serde(with = "pubkey_str")]
    pub mempool_account: Pubkey,
    #[serde(with = "pubkey_str")]
    pub executing_pool: Pubkey,
    pub cluster_offset: u32,
    /// Hex x25519 public key of the MXE
    pub mxe_x25519_pubkey: String,
    /// Computation definition account per circuit instruction name
    pub comp_defs: BTreeMap<String, String>,
}

impl ArciumManifest {
    pub fn from_json(raw: &str) -> Result<Self, ClientError> {
        let manifest: Self = serde_json::from_str(raw)
            .map_err(|e| ClientError::Config(format!("invalid manifest: {e}")))?;
        manifest.mxe_public_key()?;
        Ok(manifest)
    }

    pub fn mxe_public_key(&self) -> Result<[u8; 32], ClientError> {
        let bytes = hex::decode(&self.mxe_x25519_pubkey)
            .map_err(|e| ClientError::Config(format!("mxe_x25519_pubkey: {e}")))?;
        bytes
            .try_into()
            .map_err(|_| ClientError::Config("mxe_x25519_pubkey must be 32 bytes".into()))
    }

    pub fn comp_def(&self, computation: &str) -> Result<Pubkey, ClientError> {
        let address = self.comp_defs.get(computation).ok_or_else(|| {
            ClientError::Config(format!("no computation definition for {computation}"))
        })?;
        address
            .parse()
            .map_err(|_| ClientError::Config(format!("bad address for {computation}: {address}")))
    }
}

mod pubkey_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use solana_sdk::pubkey::Pubkey;

    pub fn serialize<S: Serializer>(key: &Pubkey, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&key.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Pubkey, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
