//! Bitcoin node adapter for the BBc-1 gateway.
//!
//! Sends anchors to a Bitcoin Core node and reads them back:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │ put_anchor(utxo, addr, anchor)                                  │
//! │   gettransaction ─▶ received amount + confirmations (≥ 6)       │
//! │   createrawtransaction ─▶ 1 input, pay-back output, OP_RETURN   │
//! │   signrawtransactionwithwallet ─▶ sendrawtransaction ─▶ txid    │
//! │                                                                 │
//! │ get_anchor(btc_txid)                                            │
//! │   gettransaction ─▶ time, confirmations, raw hex                │
//! │   decoderawtransaction ─▶ OP_RETURN payload ─▶ Anchor           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The node is reached over JSON-RPC with a bounded transport timeout. The
//! adapter owns no per-request state: the UTXO to spend and the sending
//! address are parameters of [`BtcAnchor::put_anchor`].

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod client;
mod config;
mod error;
mod fee;
mod rpc;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

use async_trait::async_trait;

use btcgw_model::{Anchor, AnchorRecord};

pub use client::BtcAnchorClient;
pub use config::BtcConfig;
pub use error::{BtcError, Result};
pub use fee::{calc_fee, format_btc};
pub use rpc::BitcoinRpc;

#[cfg(any(test, feature = "mock"))]
pub use mock::MockBtc;

/// Transaction fee presets in satoshi.
pub const FEE_NORMAL: u64 = 20_000;
/// Larger fee preset for congested mempools.
pub const FEE_LARGE: u64 = 30_000;
/// Smaller fee preset.
pub const FEE_SMALL: u64 = 10_000;

/// Confirmations an input must have before it is spent.
pub const REQUIRED_CONFIRMATIONS: u64 = 6;

/// Sending and retrieving anchors, independent of how the node is reached.
#[async_trait]
pub trait BtcAnchor: Send + Sync {
    /// Anchor `anchor` by spending vout 0 of `utxo_txid` and paying the
    /// change back to `send_addr`. Returns the ID of the broadcast
    /// transaction in display-order bytes.
    async fn put_anchor(
        &self,
        utxo_txid: &[u8],
        send_addr: &str,
        anchor: &Anchor,
    ) -> Result<Vec<u8>>;

    /// Retrieve the anchor embedded in the given Bitcoin transaction.
    ///
    /// The returned record carries only on-chain data; the annotation
    /// fields are empty.
    async fn get_anchor(&self, btc_txid: &[u8]) -> Result<AnchorRecord>;
}
