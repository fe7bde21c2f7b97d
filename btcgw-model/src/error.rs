//! Error types for the data model.

use thiserror::Error;

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors that can occur while decoding an anchor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The payload does not start with the `BBc1` signature.
    #[error("invalid anchor signature: {0}")]
    InvalidSignature(String),

    /// The version byte is not accepted in the current mode.
    #[error("invalid anchor version: {0}")]
    InvalidVersion(u8),

    /// The network byte does not name a known Bitcoin network.
    #[error("invalid anchor network: {0}")]
    InvalidNetwork(u8),
}
