//! Mock adapter for tests and development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use btcgw_model::{decode_op_return, encode_op_return, Anchor, AnchorRecord, BtcNet, Mode};

use crate::error::{BtcError, Result};
use crate::BtcAnchor;

/// A [`BtcAnchor`] that keeps broadcast anchors in memory.
///
/// `put_anchor` encodes the anchor exactly like the real pipeline and
/// `get_anchor` decodes it back, so the codec is exercised end to end.
/// Confirmation counts are scripted: the n-th `get_anchor` call reports the
/// n-th entry of the sequence (the last entry repeats).
pub struct MockBtc {
    network: BtcNet,
    mode: Mode,
    confirmations: Vec<u64>,
    get_calls: AtomicUsize,
    counter: AtomicU64,
    anchors: Mutex<HashMap<Vec<u8>, ([u8; 80], DateTime<Utc>)>>,
}

impl MockBtc {
    /// Create a mock for `network` under the given version policy.
    pub fn new(network: BtcNet, mode: Mode) -> Self {
        Self {
            network,
            mode,
            confirmations: vec![0],
            get_calls: AtomicUsize::new(0),
            counter: AtomicU64::new(0),
            anchors: Mutex::new(HashMap::new()),
        }
    }

    /// Script the confirmation counts returned by successive
    /// `get_anchor` calls.
    pub fn with_confirmations(mut self, sequence: Vec<u64>) -> Self {
        if !sequence.is_empty() {
            self.confirmations = sequence;
        }
        self
    }

    /// Number of anchors broadcast so far.
    pub fn put_count(&self) -> usize {
        self.anchors.lock().len()
    }

    fn next_txid(&self) -> Vec<u8> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let mut txid = vec![0u8; 32];
        txid[24..].copy_from_slice(&n.to_be_bytes());
        txid
    }
}

#[async_trait]
impl BtcAnchor for MockBtc {
    async fn put_anchor(
        &self,
        _utxo_txid: &[u8],
        _send_addr: &str,
        anchor: &Anchor,
    ) -> Result<Vec<u8>> {
        if anchor.network != self.network {
            return Err(BtcError::InconsistentNetwork {
                anchor: anchor.network,
                client: self.network,
            });
        }
        let txid = self.next_txid();
        self.anchors
            .lock()
            .insert(txid.clone(), (encode_op_return(anchor), anchor.timestamp));
        Ok(txid)
    }

    async fn get_anchor(&self, btc_txid: &[u8]) -> Result<AnchorRecord> {
        let (payload, tx_time) = self
            .anchors
            .lock()
            .get(btc_txid)
            .copied()
            .ok_or_else(|| BtcError::InvalidTxId(hex::encode(btc_txid)))?;

        let call = self.get_calls.fetch_add(1, Ordering::SeqCst);
        let confirmations = *self
            .confirmations
            .get(call.min(self.confirmations.len() - 1))
            .unwrap_or(&0);

        let anchor = decode_op_return(&payload, self.mode)
            .map_err(|e| BtcError::InvalidOpReturn(e.to_string()))?;
        Ok(AnchorRecord::new(
            anchor,
            btc_txid.to_vec(),
            tx_time,
            confirmations,
            "",
            "",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(net: BtcNet) -> Anchor {
        Anchor::new(
            Mode::Production,
            net,
            DateTime::from_timestamp(1_612_363_134, 0).unwrap(),
            &[1; 32],
            &[2; 32],
        )
    }

    #[tokio::test]
    async fn put_then_get_roundtrips_the_anchor() {
        let mock = MockBtc::new(BtcNet::Testnet3, Mode::Production);
        let a = anchor(BtcNet::Testnet3);
        let txid = mock.put_anchor(&[0; 32], "addr", &a).await.unwrap();
        let record = mock.get_anchor(&txid).await.unwrap();
        assert_eq!(record.anchor, a);
        assert_eq!(record.btc_txid, txid);
        assert!(record.domain_name.is_empty());
        assert!(record.note.is_empty());
    }

    #[tokio::test]
    async fn scripted_confirmations() {
        let mock =
            MockBtc::new(BtcNet::Testnet3, Mode::Production).with_confirmations(vec![0, 7]);
        let txid = mock
            .put_anchor(&[0; 32], "addr", &anchor(BtcNet::Testnet3))
            .await
            .unwrap();
        assert_eq!(mock.get_anchor(&txid).await.unwrap().confirmations, 0);
        assert_eq!(mock.get_anchor(&txid).await.unwrap().confirmations, 7);
        // The last entry repeats.
        assert_eq!(mock.get_anchor(&txid).await.unwrap().confirmations, 7);
    }

    #[tokio::test]
    async fn wrong_network_is_rejected() {
        let mock = MockBtc::new(BtcNet::Testnet3, Mode::Production);
        let err = mock
            .put_anchor(&[0; 32], "addr", &anchor(BtcNet::Mainnet))
            .await
            .unwrap_err();
        assert!(matches!(err, BtcError::InconsistentNetwork { .. }));
    }

    #[tokio::test]
    async fn unknown_txid_is_rejected() {
        let mock = MockBtc::new(BtcNet::Testnet3, Mode::Production);
        assert!(matches!(
            mock.get_anchor(&[9; 32]).await,
            Err(BtcError::InvalidTxId(_))
        ));
    }
}
