use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("program rejected the transaction: {0}")]
    Program(String),

    #[error("event {0} is sold out")]
    SoldOut(u64),

    #[error("value could not be encrypted: {0}")]
    Encrypt(String),

    #[error("ciphertext could not be decrypted with this key")]
    Decrypt,

    #[error("no {0} record in the transaction logs")]
    MissingLog(&'static str),

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("account {0} could not be decoded")]
    Decode(Pubkey),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<solana_client::client_error::ClientError> for ClientError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        match err.get_transaction_error() {
            Some(tx_err) => ClientError::Program(tx_err.to_string()),
            None => ClientError::Rpc(err.to_string()),
        }
    }
}
