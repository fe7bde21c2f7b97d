//! Anchor records: an anchor plus its on-chain observations.

use chrono::{DateTime, Utc};

use crate::anchor::Anchor;

/// An [`Anchor`] together with the Bitcoin transaction that carries it and
/// optional annotations that never reach the chain.
///
/// `anchor` and `btc_txid` are immutable once the record is first stored;
/// `confirmations`, `domain_name`, and `note` are individually updatable.
/// The annotations cannot be restored from the chain if the datastore is
/// lost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorRecord {
    /// The anchor itself.
    pub anchor: Anchor,
    /// ID of the Bitcoin transaction whose `OP_RETURN` carries the anchor,
    /// as display-order bytes.
    pub btc_txid: Vec<u8>,
    /// Transaction time reported by the Bitcoin node.
    pub tx_time: DateTime<Utc>,
    /// Confirmations as of the most recent refresh.
    pub confirmations: u64,
    /// Human-readable BBc-1 domain name. Empty when unset.
    pub domain_name: String,
    /// Free-text note. Empty when unset.
    pub note: String,
}

impl AnchorRecord {
    /// Build a record from on-chain observations and optional annotations.
    pub fn new(
        anchor: Anchor,
        btc_txid: Vec<u8>,
        tx_time: DateTime<Utc>,
        confirmations: u64,
        domain_name: impl Into<String>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            anchor,
            btc_txid,
            tx_time,
            confirmations,
            domain_name: domain_name.into(),
            note: note.into(),
        }
    }

    /// The record-store key; see [`Anchor::cid`].
    pub fn cid(&self) -> String {
        self.anchor.cid()
    }
}
