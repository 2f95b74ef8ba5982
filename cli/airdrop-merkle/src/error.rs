use thiserror::Error;

use crate::leaf::Namespace;

#[derive(Error, Debug)]
pub enum AirdropError {
    #[error("Cannot build a Merkle tree from an empty record set")]
    EmptyTree,
    #[error("No {namespace} leaf for address {address} with amount {amount}")]
    LeafNotFound {
        namespace: Namespace,
        address: String,
        amount: String,
    },
    #[error("Unknown airdrop round {index} ({rounds} rounds published)")]
    UnknownRound { index: u32, rounds: usize },
    #[error("Root mismatch for {namespace} round {index}: published {published}, built {built}")]
    RootMismatch {
        namespace: Namespace,
        index: u32,
        published: String,
        built: String,
    },
    #[error("Registry holds {native} native roots but {evm} evm roots")]
    UnevenRounds { native: usize, evm: usize },
    #[error("Duplicate record: address {address} with amount {amount}")]
    DuplicateRecord { address: String, amount: String },
    #[error("Invalid address '{0}': {1}")]
    InvalidAddress(String, &'static str),
    #[error("Invalid amount '{0}': {1}")]
    InvalidAmount(String, &'static str),
    #[error("Invalid hex: {0}")]
    InvalidHex(String),
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Claim message format binds a recipient but none was given")]
    MissingRecipient,
    #[error("Invalid record at line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },
    #[error("io Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serde Error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AirdropError>;
