//! Persistent UTXO queue for one sending Bitcoin address.
//!
//! Each anchor transaction spends exactly one unspent output and produces
//! exactly one change output back to the same address. This crate keeps
//! that chain as a durable FIFO: [`Wallet::next`] consumes the head,
//! [`Wallet::add`] appends the change of the transaction just sent.
//!
//! The persisted form is one document per address holding the full ordered
//! list; every mutation rewrites the whole document. Queue depth stays in
//! the low hundreds, and "the persisted state reflects the last completed
//! operation" is worth more than incremental writes.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod doc;
mod error;
mod memory;

use async_trait::async_trait;

pub use doc::DocWallet;
pub use error::{Result, WalletError};
pub use memory::{MemoryBackend, MemoryWallet};

/// A spendable output: the transaction that produced it (display-order
/// bytes, spending vout 0) and the address it pays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    /// Bitcoin transaction ID.
    pub txid: Vec<u8>,
    /// The sending address the output pays back to.
    pub address: String,
}

impl Utxo {
    /// Create a UTXO entry.
    pub fn new(txid: impl Into<Vec<u8>>, address: impl Into<String>) -> Self {
        Self {
            txid: txid.into(),
            address: address.into(),
        }
    }
}

/// The UTXO queue.
///
/// Callers performing a peek → spend → next → add sequence must hold
/// exclusive access across the whole sequence; the trait itself only
/// serializes individual operations.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// Return the head of the queue without removing it.
    /// [`WalletError::Empty`] when the queue is empty.
    async fn peek_next(&self) -> Result<Utxo>;

    /// Remove and return the head, persisting the new state before
    /// returning. If persistence fails the head is still consumed in
    /// memory and [`WalletError::CouldNotGetNext`] is returned; the caller
    /// must abort the enclosing send.
    async fn next(&self) -> Result<Utxo>;

    /// Append to the tail, persisting before returning. If persistence
    /// fails the entry must be treated as lost for bookkeeping (the chain
    /// still holds it) and [`WalletError::CouldNotAdd`] is returned.
    async fn add(&self, txid: &[u8], address: &str) -> Result<()>;

    /// Flush and release the backing handle.
    async fn close(&self) -> Result<()>;
}
