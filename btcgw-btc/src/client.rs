//! Async adapter over the blocking RPC client.

use std::sync::Arc;

use async_trait::async_trait;

use btcgw_model::{Anchor, AnchorRecord};

use crate::config::BtcConfig;
use crate::error::{BtcError, Result};
use crate::rpc::BitcoinRpc;
use crate::BtcAnchor;

/// [`BtcAnchor`] implementation backed by a Bitcoin Core node.
///
/// Holds no per-request state; every call is a pure function of its
/// arguments and the startup configuration. RPC work runs on the blocking
/// pool so server tasks are never stalled.
pub struct BtcAnchorClient {
    rpc: Arc<BitcoinRpc>,
}

impl BtcAnchorClient {
    /// Build a client from `config`. Does not contact the node.
    pub fn new(config: BtcConfig) -> Result<Self> {
        Ok(Self {
            rpc: Arc::new(BitcoinRpc::new(config)?),
        })
    }

    /// The underlying RPC client.
    pub fn rpc(&self) -> &BitcoinRpc {
        &self.rpc
    }

    /// Liveness check against the node.
    pub async fn ping(&self) -> Result<()> {
        let rpc = Arc::clone(&self.rpc);
        run_blocking(move || rpc.ping()).await
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| BtcError::Rpc(format!("rpc worker failed: {e}")))?
}

#[async_trait]
impl BtcAnchor for BtcAnchorClient {
    async fn put_anchor(
        &self,
        utxo_txid: &[u8],
        send_addr: &str,
        anchor: &Anchor,
    ) -> Result<Vec<u8>> {
        let rpc = Arc::clone(&self.rpc);
        let utxo_txid = utxo_txid.to_vec();
        let send_addr = send_addr.to_string();
        let anchor = *anchor;
        run_blocking(move || rpc.put_anchor(&utxo_txid, &send_addr, &anchor)).await
    }

    async fn get_anchor(&self, btc_txid: &[u8]) -> Result<AnchorRecord> {
        let rpc = Arc::clone(&self.rpc);
        let btc_txid = btc_txid.to_vec();
        run_blocking(move || rpc.get_anchor(&btc_txid)).await
    }
}
