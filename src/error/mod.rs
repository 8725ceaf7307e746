//! Error handling for the node
//!
//! Consensus failures are unit variants so callers can match on the exact
//! rule a block or transaction broke; transport and crypto failures carry
//! the underlying message.

use std::fmt;

/// Result type alias for chain operations
pub type Result<T> = std::result::Result<T, ChainError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ChainError {
    /// Block id does not extend the chain tip
    InvalidId,
    /// Previous-block hash does not match the chain tip
    InvalidPrevBlockHash,
    /// Block hash does not satisfy its target
    InvalidPow,
    /// Block timestamp is before its predecessor's
    InvalidTimestamp,
    /// Block target does not match the value derived for its position
    InvalidTarget,
    /// Transaction inputs do not cover fee plus outputs
    InsufficientInput,
    /// Transaction id is not strictly increasing for an involved wallet
    InvalidTransactionId,
    /// Applying a block would leave a wallet below zero
    NegativeBalance,
    /// No block accepted at the requested id
    UnknownBlock(u64),
    /// Signature or key failures
    Crypto(String),
    /// Peer connection errors
    Network(String),
    /// Control socket errors
    Ipc(String),
    /// Wire encode/decode errors
    Serialization(String),
    /// File I/O errors
    Io(String),
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::InvalidId => write!(f, "Block id is not valid"),
            ChainError::InvalidPrevBlockHash => {
                write!(f, "Hash of previous block is incorrect")
            }
            ChainError::InvalidPow => write!(f, "Proof of work is invalid"),
            ChainError::InvalidTimestamp => {
                write!(f, "Block was created before the previous one")
            }
            ChainError::InvalidTarget => {
                write!(f, "Block target does not match the retarget schedule")
            }
            ChainError::InsufficientInput => write!(f, "Insufficient input for output"),
            ChainError::InvalidTransactionId => write!(f, "Transaction id is non-sequential"),
            ChainError::NegativeBalance => {
                write!(f, "Transaction results in a negative balance")
            }
            ChainError::UnknownBlock(id) => write!(f, "Unknown block {id}"),
            ChainError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
            ChainError::Network(msg) => write!(f, "Network error: {msg}"),
            ChainError::Ipc(msg) => write!(f, "IPC error: {msg}"),
            ChainError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            ChainError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for ChainError {}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::Io(err.to_string())
    }
}

impl From<rsa::Error> for ChainError {
    fn from(err: rsa::Error) -> Self {
        ChainError::Crypto(err.to_string())
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::Serialization(err.to_string())
    }
}
