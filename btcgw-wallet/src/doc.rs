//! MongoDB wallet backend: one document per sending address.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::ReplaceOptions;
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use crate::error::{Result, WalletError};
use crate::{Utxo, Wallet};

/// Default bound on a single save or load round-trip.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize, Deserialize)]
struct UtxoDoc {
    txid: String,
    addr: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct WalletDoc {
    #[serde(rename = "_id")]
    addr: String,
    utxos: Vec<UtxoDoc>,
}

/// A [`Wallet`] persisted as a single MongoDB document holding the full
/// ordered UTXO list. Every `next` and `add` rewrites the document.
pub struct DocWallet {
    address: String,
    collection: Collection<WalletDoc>,
    queue: Mutex<VecDeque<Utxo>>,
    op_timeout: Duration,
}

impl DocWallet {
    /// Connect to `uri`, bind to `db`/`collection`, and load the queue for
    /// `address`. A missing document starts an empty queue.
    pub async fn open(
        uri: &str,
        db: &str,
        collection: &str,
        address: impl Into<String>,
    ) -> Result<Self> {
        let address = address.into();
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| WalletError::FailedToOpen(e.to_string()))?;
        let collection = client.database(db).collection::<WalletDoc>(collection);

        let wallet = Self {
            address,
            collection,
            queue: Mutex::new(VecDeque::new()),
            op_timeout: DEFAULT_OP_TIMEOUT,
        };
        wallet.load().await?;
        Ok(wallet)
    }

    /// Override the per-operation deadline.
    pub fn with_op_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = timeout;
        self
    }

    async fn load(&self) -> Result<()> {
        let found = tokio::time::timeout(
            self.op_timeout,
            self.collection.find_one(doc! { "_id": &self.address }, None),
        )
        .await
        .map_err(|_| WalletError::FailedToLoad("load timed out".into()))?
        .map_err(|e| WalletError::FailedToLoad(e.to_string()))?;

        let Some(found) = found else {
            info!(address = %self.address, "no wallet document yet, starting empty");
            return Ok(());
        };

        let mut queue = VecDeque::with_capacity(found.utxos.len());
        for u in found.utxos {
            let txid = hex::decode(&u.txid)
                .map_err(|_| WalletError::FailedToLoad(format!("txid is not hex: {}", u.txid)))?;
            queue.push_back(Utxo::new(txid, u.addr));
        }
        *self.queue.lock().await = queue;
        Ok(())
    }

    async fn save(&self, queue: &VecDeque<Utxo>) -> std::result::Result<(), String> {
        let doc = WalletDoc {
            addr: self.address.clone(),
            utxos: queue
                .iter()
                .map(|u| UtxoDoc {
                    txid: hex::encode(&u.txid),
                    addr: u.address.clone(),
                })
                .collect(),
        };
        let options = ReplaceOptions::builder().upsert(true).build();
        tokio::time::timeout(
            self.op_timeout,
            self.collection
                .replace_one(doc! { "_id": &self.address }, &doc, options),
        )
        .await
        .map_err(|_| "save timed out".to_string())?
        .map_err(|e| e.to_string())?;
        Ok(())
    }
}

#[async_trait]
impl Wallet for DocWallet {
    async fn peek_next(&self) -> Result<Utxo> {
        self.queue
            .lock()
            .await
            .front()
            .cloned()
            .ok_or(WalletError::Empty)
    }

    async fn next(&self) -> Result<Utxo> {
        let mut queue = self.queue.lock().await;
        let head = queue.pop_front().ok_or(WalletError::Empty)?;
        self.save(&queue).await.map_err(WalletError::CouldNotGetNext)?;
        Ok(head)
    }

    async fn add(&self, txid: &[u8], address: &str) -> Result<()> {
        let mut queue = self.queue.lock().await;
        queue.push_back(Utxo::new(txid, address));
        self.save(&queue).await.map_err(WalletError::CouldNotAdd)?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let queue = self.queue.lock().await;
        self.save(&queue).await.map_err(WalletError::FailedToClose)
    }
}
