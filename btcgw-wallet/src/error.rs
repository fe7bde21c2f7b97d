//! Error types for the wallet queue.

use thiserror::Error;

/// Result type for wallet operations.
pub type Result<T> = std::result::Result<T, WalletError>;

/// Errors that can occur in a wallet queue backend.
#[derive(Debug, Error)]
pub enum WalletError {
    /// The queue holds no spendable output.
    #[error("wallet queue is empty")]
    Empty,

    /// The backing store could not be opened.
    #[error("failed to open wallet store: {0}")]
    FailedToOpen(String),

    /// The persisted queue could not be read back.
    #[error("failed to load wallet: {0}")]
    FailedToLoad(String),

    /// The queue could not be written out.
    #[error("failed to save wallet: {0}")]
    FailedToSave(String),

    /// The head was consumed but the new state could not be persisted.
    #[error("could not consume next utxo: {0}")]
    CouldNotGetNext(String),

    /// The entry could not be appended durably; treat it as lost for
    /// bookkeeping and recover it operationally.
    #[error("could not add utxo: {0}")]
    CouldNotAdd(String),

    /// The backing store could not be closed cleanly.
    #[error("failed to close wallet store: {0}")]
    FailedToClose(String),
}
