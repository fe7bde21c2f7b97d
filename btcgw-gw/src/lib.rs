//! Gateway orchestration for the BBc-1 Bitcoin gateway.
//!
//! [`GatewayImpl`] composes the Bitcoin adapter, the UTXO wallet queue,
//! and the record store, and hides them from applications:
//!
//! - `register_transaction`: mint an anchor and broadcast it.
//! - `store_record`: read an anchor back from the chain and persist it.
//! - `get_record`: look a record up in the store.
//! - `refresh_record`: re-check confirmations and update annotations.
//!
//! The wallet lock is held from peek to change-append, so sends from one
//! address are totally ordered and the head UTXO cannot be double-spent.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info};

use btcgw_btc::BtcAnchor;
use btcgw_model::{Anchor, AnchorRecord, BtcNet, Mode};
use btcgw_store::{Store, StoreError};
use btcgw_wallet::{Wallet, WalletError};

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Caller-facing gateway errors. Lower-layer causes are carried as text;
/// the cause chain is for logs, never for HTTP bodies.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The wallet queue holds no spendable output.
    #[error("no utxo available for anchoring")]
    NoUtxo,

    /// No record exists for the given ids.
    #[error("anchor record not found")]
    RecordNotFound,

    /// The anchor could not be broadcast, or the wallet queue is in doubt
    /// after a broadcast.
    #[error("could not put anchor: {0}")]
    CouldNotPutAnchor(String),

    /// The anchor could not be read back or persisted.
    #[error("could not store record: {0}")]
    CouldNotStoreRecord(String),

    /// The record could not be read from the store.
    #[error("could not get record: {0}")]
    CouldNotGetRecord(String),

    /// The record could not be refreshed.
    #[error("could not refresh record: {0}")]
    CouldNotRefreshRecord(String),

    /// Wallet or store handles could not be released cleanly.
    #[error("could not close gateway: {0}")]
    CouldNotClose(String),
}

/// Registering and retrieving anchored BBc-1 transactions.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Anchor `(domain_id, transaction_id)` into the block chain by
    /// sending a Bitcoin transaction; returns its ID.
    ///
    /// Not idempotent: a retry after a timeout mints a new anchor with a
    /// new timestamp.
    async fn register_transaction(&self, domain_id: &[u8], transaction_id: &[u8])
        -> Result<Vec<u8>>;

    /// Retrieve the anchor embedded in the given Bitcoin transaction and
    /// save it as a record.
    async fn store_record(&self, btc_txid: &[u8]) -> Result<()>;

    /// Get the record for the given ids from the store.
    async fn get_record(&self, domain_id: &[u8], transaction_id: &[u8]) -> Result<AnchorRecord>;

    /// Re-read the anchor's Bitcoin transaction and update the record's
    /// confirmation count; also set the domain name or note when given.
    ///
    /// Not atomic: the confirmation update can land even when a later
    /// annotation update fails.
    async fn refresh_record(
        &self,
        domain_id: &[u8],
        transaction_id: &[u8],
        domain_name: Option<&str>,
        note: Option<&str>,
    ) -> Result<()>;

    /// Release wallet and store handles.
    async fn close(&self) -> Result<()>;
}

/// The production [`Gateway`] composition.
pub struct GatewayImpl<B, W, S> {
    network: BtcNet,
    mode: Mode,
    btc: B,
    wallet: Mutex<W>,
    store: S,
}

impl<B, W, S> GatewayImpl<B, W, S>
where
    B: BtcAnchor,
    W: Wallet,
    S: Store,
{
    /// Compose a gateway. `network` must match the adapter's network;
    /// a mismatch fails every registration.
    pub fn new(network: BtcNet, mode: Mode, btc: B, wallet: W, store: S) -> Self {
        Self {
            network,
            mode,
            btc,
            wallet: Mutex::new(wallet),
            store,
        }
    }
}

#[async_trait]
impl<B, W, S> Gateway for GatewayImpl<B, W, S>
where
    B: BtcAnchor,
    W: Wallet,
    S: Store,
{
    async fn register_transaction(
        &self,
        domain_id: &[u8],
        transaction_id: &[u8],
    ) -> Result<Vec<u8>> {
        let anchor = Anchor::new(self.mode, self.network, Utc::now(), domain_id, transaction_id);

        // Exclusive use of the queue from peek to change-append.
        let wallet = self.wallet.lock().await;

        let utxo = match wallet.peek_next().await {
            Ok(utxo) => utxo,
            Err(WalletError::Empty) => return Err(GatewayError::NoUtxo),
            Err(e) => return Err(GatewayError::CouldNotPutAnchor(e.to_string())),
        };

        let btc_txid = self
            .btc
            .put_anchor(&utxo.txid, &utxo.address, &anchor)
            .await
            .map_err(|e| GatewayError::CouldNotPutAnchor(e.to_string()))?;

        // Past this point the transaction is on the wire; queue failures
        // leave state an operator must reconcile, so log the txid.
        if let Err(e) = wallet.next().await {
            error!(
                btc_txid = %hex::encode(&btc_txid),
                error = %e,
                "anchor broadcast but the spent utxo could not be consumed from the queue"
            );
            return Err(GatewayError::CouldNotPutAnchor(e.to_string()));
        }
        if let Err(e) = wallet.add(&btc_txid, &utxo.address).await {
            error!(
                btc_txid = %hex::encode(&btc_txid),
                error = %e,
                "anchor broadcast but the change utxo was not recorded; re-add it operationally"
            );
            return Err(GatewayError::CouldNotPutAnchor(e.to_string()));
        }

        info!(btc_txid = %hex::encode(&btc_txid), "anchor registered");
        Ok(btc_txid)
    }

    async fn store_record(&self, btc_txid: &[u8]) -> Result<()> {
        let record = self
            .btc
            .get_anchor(btc_txid)
            .await
            .map_err(|e| GatewayError::CouldNotStoreRecord(e.to_string()))?;
        self.store
            .put(&record)
            .await
            .map_err(|e| GatewayError::CouldNotStoreRecord(e.to_string()))
    }

    async fn get_record(&self, domain_id: &[u8], transaction_id: &[u8]) -> Result<AnchorRecord> {
        match self.store.get(domain_id, transaction_id).await {
            Ok(record) => Ok(record),
            Err(StoreError::NotFound(_)) => Err(GatewayError::RecordNotFound),
            Err(e) => Err(GatewayError::CouldNotGetRecord(e.to_string())),
        }
    }

    async fn refresh_record(
        &self,
        domain_id: &[u8],
        transaction_id: &[u8],
        domain_name: Option<&str>,
        note: Option<&str>,
    ) -> Result<()> {
        let old = self.get_record(domain_id, transaction_id).await?;
        let fresh = self
            .btc
            .get_anchor(&old.btc_txid)
            .await
            .map_err(|e| GatewayError::CouldNotRefreshRecord(e.to_string()))?;

        self.store
            .update_confirmations(domain_id, transaction_id, fresh.confirmations)
            .await
            .map_err(|e| GatewayError::CouldNotRefreshRecord(e.to_string()))?;
        if let Some(domain_name) = domain_name {
            self.store
                .update_domain_name(domain_id, transaction_id, domain_name)
                .await
                .map_err(|e| GatewayError::CouldNotRefreshRecord(e.to_string()))?;
        }
        if let Some(note) = note {
            self.store
                .update_note(domain_id, transaction_id, note)
                .await
                .map_err(|e| GatewayError::CouldNotRefreshRecord(e.to_string()))?;
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let wallet_result = self.wallet.lock().await.close().await;
        let store_result = self.store.close().await;
        match (wallet_result, store_result) {
            (Ok(()), Ok(())) => Ok(()),
            (w, s) => Err(GatewayError::CouldNotClose(format!(
                "wallet: {:?}, store: {:?}",
                w.err(),
                s.err()
            ))),
        }
    }
}
