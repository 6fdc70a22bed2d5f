//! Error types for tallychain

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// Querying the last block of a chain with no blocks. Unreachable after
    /// construction, since every ledger seals a genesis block.
    #[error("The chain is empty")]
    EmptyChain,
    #[error("Malformed peer payload: {0}")]
    MalformedPeerPayload(String),
    #[error("Peer unreachable: {0}")]
    PeerUnreachable(String),
    #[error("Invalid transfer input: {0}")]
    InvalidTransferInput(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, LedgerError>;
