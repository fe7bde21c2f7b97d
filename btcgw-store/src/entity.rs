//! Document mapping for anchor records.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use btcgw_model::{pad32, Anchor, AnchorRecord, BtcNet};

use crate::error::StoreError;

/// The store key for a `(domain_id, transaction_id)` pair:
/// both ids padded to 32 bytes and hex-encoded, 128 lowercase characters.
pub fn cid_of(domain_id: &[u8], transaction_id: &[u8]) -> String {
    let mut s = String::with_capacity(128);
    s.push_str(&hex::encode(pad32(domain_id)));
    s.push_str(&hex::encode(pad32(transaction_id)));
    s
}

/// An [`AnchorRecord`] flattened for document storage.
///
/// The key field `cid` packs both ids; they are stored again in separate
/// fields for query convenience. Timestamps are unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorEntity {
    /// Document key; see [`cid_of`].
    #[serde(rename = "_id")]
    pub cid: String,
    /// BBc-1 domain ID, 64 hex chars.
    #[serde(rename = "bbc1domid")]
    pub domain_id: String,
    /// BBc-1 transaction ID, 64 hex chars.
    #[serde(rename = "bbc1txid")]
    pub transaction_id: String,
    /// Anchor format version byte.
    #[serde(rename = "anchorver")]
    pub anchor_version: u8,
    /// Network tag byte.
    #[serde(rename = "btcnet")]
    pub btc_net: u8,
    /// Anchor timestamp, unix seconds.
    #[serde(rename = "anchortime")]
    pub anchor_time: i64,
    /// Bitcoin transaction ID, display-order hex.
    #[serde(rename = "btctxid")]
    pub btc_txid: String,
    /// Transaction time reported by the node, unix seconds.
    #[serde(rename = "txtime")]
    pub tx_time: i64,
    /// Confirmations as of the last refresh.
    pub confirmations: u64,
    /// Optional BBc-1 domain name; empty when unset.
    #[serde(rename = "bbc1dom", default)]
    pub domain_name: String,
    /// Optional note; empty when unset.
    #[serde(default)]
    pub note: String,
}

impl AnchorEntity {
    /// Flatten a record into its document form.
    pub fn from_record(r: &AnchorRecord) -> Self {
        Self {
            cid: r.cid(),
            domain_id: hex::encode(r.anchor.domain_id),
            transaction_id: hex::encode(r.anchor.transaction_id),
            anchor_version: r.anchor.version,
            btc_net: r.anchor.network.tag(),
            anchor_time: r.anchor.timestamp.timestamp(),
            btc_txid: hex::encode(&r.btc_txid),
            tx_time: r.tx_time.timestamp(),
            confirmations: r.confirmations,
            domain_name: r.domain_name.clone(),
            note: r.note.clone(),
        }
    }

    /// Rebuild the record this document was flattened from.
    pub fn into_record(self) -> Result<AnchorRecord, StoreError> {
        let corrupt = |reason: &str| StoreError::Corrupt {
            cid: self.cid.clone(),
            reason: reason.to_string(),
        };

        let domain_id =
            hex::decode(&self.domain_id).map_err(|_| corrupt("domain id is not hex"))?;
        let transaction_id = hex::decode(&self.transaction_id)
            .map_err(|_| corrupt("transaction id is not hex"))?;
        if domain_id.len() != 32 || transaction_id.len() != 32 {
            return Err(corrupt("id is not 32 bytes"));
        }
        let network =
            BtcNet::try_from(self.btc_net).map_err(|_| corrupt("unknown network tag"))?;
        let btc_txid =
            hex::decode(&self.btc_txid).map_err(|_| corrupt("bitcoin txid is not hex"))?;

        let anchor = Anchor {
            version: self.anchor_version,
            network,
            timestamp: DateTime::from_timestamp(self.anchor_time, 0)
                .ok_or_else(|| corrupt("anchor time out of range"))?,
            domain_id: pad32(&domain_id),
            transaction_id: pad32(&transaction_id),
        };

        Ok(AnchorRecord {
            anchor,
            btc_txid,
            tx_time: DateTime::from_timestamp(self.tx_time, 0)
                .ok_or_else(|| corrupt("transaction time out of range"))?,
            confirmations: self.confirmations,
            domain_name: self.domain_name,
            note: self.note,
        })
    }
}
