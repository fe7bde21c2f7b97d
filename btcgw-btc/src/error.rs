//! Error types for the Bitcoin adapter.

use thiserror::Error;

use btcgw_model::BtcNet;

/// Result type for Bitcoin operations.
pub type Result<T> = std::result::Result<T, BtcError>;

/// Errors that can occur while talking to the node or building anchors.
#[derive(Debug, Error)]
pub enum BtcError {
    /// The node could not be reached at all.
    #[error("bitcoind unreachable: {0}")]
    Unreachable(String),

    /// Generic RPC failure (error code −1).
    #[error("rpc call failed: {0}")]
    Rpc(String),

    /// The transaction ID was rejected by the node (codes −5, −8).
    #[error("invalid transaction id: {0}")]
    InvalidTxId(String),

    /// No wallet is loaded on the node (code −18).
    #[error("wallet not loaded: {0}")]
    WalletNotLoaded(String),

    /// The node could not decode the raw transaction (code −22).
    #[error("transaction decode failed: {0}")]
    TxDecodeFailed(String),

    /// The referenced output is already spent (code −25).
    #[error("output missing or already spent: {0}")]
    TxAlreadySpent(String),

    /// The transaction already exists on chain (code −27).
    #[error("transaction already in chain: {0}")]
    TxAlreadyExists(String),

    /// An RPC error code outside the mapped set.
    #[error("unexpected rpc error code {code}: {message}")]
    UnexpectedRpcCode {
        /// The node's error code.
        code: i32,
        /// The node's error message.
        message: String,
    },

    /// A node response could not be interpreted.
    #[error("failed to decode node response: {0}")]
    FailedToDecode(String),

    /// The wallet refused to produce a complete signature.
    #[error("failed to sign transaction")]
    FailedToSign,

    /// The fee arguments were unusable.
    #[error("invalid fee: {0}")]
    InvalidFee(String),

    /// `balance − fee` would be negative.
    #[error("not enough balance: {0}")]
    NotEnoughBalance(String),

    /// The input has fewer confirmations than required.
    #[error("not enough confirmations: got {got}, need {need}")]
    NotEnoughConfirmations {
        /// Confirmations the input has.
        got: u64,
        /// Confirmations required before spending.
        need: u64,
    },

    /// The anchor targets a different network than this client.
    #[error("anchor network {anchor} does not match client network {client}")]
    InconsistentNetwork {
        /// Network the anchor carries.
        anchor: BtcNet,
        /// Network this client is configured for.
        client: BtcNet,
    },

    /// The transaction's OP_RETURN payload is not a valid anchor.
    #[error("invalid OP_RETURN payload: {0}")]
    InvalidOpReturn(String),
}

impl From<bitcoincore_rpc::Error> for BtcError {
    fn from(e: bitcoincore_rpc::Error) -> Self {
        use bitcoincore_rpc::jsonrpc;

        match e {
            bitcoincore_rpc::Error::JsonRpc(jsonrpc::Error::Rpc(rpc)) => match rpc.code {
                -1 => BtcError::Rpc(rpc.message),
                -5 | -8 => BtcError::InvalidTxId(rpc.message),
                -18 => BtcError::WalletNotLoaded(rpc.message),
                -22 => BtcError::TxDecodeFailed(rpc.message),
                -25 => BtcError::TxAlreadySpent(rpc.message),
                -27 => BtcError::TxAlreadyExists(rpc.message),
                code => BtcError::UnexpectedRpcCode {
                    code,
                    message: rpc.message,
                },
            },
            bitcoincore_rpc::Error::JsonRpc(jsonrpc::Error::Transport(t)) => {
                BtcError::Unreachable(t.to_string())
            }
            other => BtcError::Rpc(other.to_string()),
        }
    }
}
