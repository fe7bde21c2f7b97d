//! MongoDB store backend.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::options::ReplaceOptions;
use mongodb::{Client, Collection};
use tracing::debug;

use btcgw_model::AnchorRecord;

use crate::entity::{cid_of, AnchorEntity};
use crate::error::{Result, StoreError};
use crate::traits::Store;

/// Default bound on a single store round-trip.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(30);

/// A [`Store`] backed by a MongoDB collection, one document per record,
/// keyed by the 128-hex cid.
pub struct MongoStore {
    collection: Collection<AnchorEntity>,
    op_timeout: Duration,
}

impl MongoStore {
    /// Connect to `uri` and bind the store to `db`/`collection`.
    ///
    /// The driver connects lazily; a bad URI fails here, an unreachable
    /// server fails at the first operation.
    pub async fn connect(uri: &str, db: &str, collection: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| StoreError::FailedToOpen(e.to_string()))?;
        Ok(Self {
            collection: client.database(db).collection(collection),
            op_timeout: DEFAULT_OP_TIMEOUT,
        })
    }

    /// Override the per-operation deadline.
    pub fn with_op_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = timeout;
        self
    }

    async fn bounded<T, F>(&self, fut: F) -> std::result::Result<T, String>
    where
        F: Future<Output = mongodb::error::Result<T>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(res) => res.map_err(|e| e.to_string()),
            Err(_) => Err(format!("timed out after {:?}", self.op_timeout)),
        }
    }

    async fn set_field(
        &self,
        domain_id: &[u8],
        transaction_id: &[u8],
        update: Document,
    ) -> Result<()> {
        let cid = cid_of(domain_id, transaction_id);
        let result = self
            .bounded(
                self.collection
                    .update_one(doc! { "_id": &cid }, doc! { "$set": update }, None),
            )
            .await
            .map_err(StoreError::FailedToUpdate)?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound(cid));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn put(&self, record: &AnchorRecord) -> Result<()> {
        let entity = AnchorEntity::from_record(record);
        let options = ReplaceOptions::builder().upsert(true).build();
        self.bounded(self.collection.replace_one(
            doc! { "_id": &entity.cid },
            &entity,
            options,
        ))
        .await
        .map_err(StoreError::FailedToPut)?;
        Ok(())
    }

    async fn get(&self, domain_id: &[u8], transaction_id: &[u8]) -> Result<AnchorRecord> {
        let cid = cid_of(domain_id, transaction_id);
        let entity = self
            .bounded(self.collection.find_one(doc! { "_id": &cid }, None))
            .await
            .map_err(StoreError::FailedToGet)?
            .ok_or(StoreError::NotFound(cid))?;
        entity.into_record()
    }

    async fn update_confirmations(
        &self,
        domain_id: &[u8],
        transaction_id: &[u8],
        confirmations: u64,
    ) -> Result<()> {
        self.set_field(
            domain_id,
            transaction_id,
            doc! { "confirmations": confirmations as i64 },
        )
        .await
    }

    async fn update_domain_name(
        &self,
        domain_id: &[u8],
        transaction_id: &[u8],
        domain_name: &str,
    ) -> Result<()> {
        self.set_field(domain_id, transaction_id, doc! { "bbc1dom": domain_name })
            .await
    }

    async fn update_note(
        &self,
        domain_id: &[u8],
        transaction_id: &[u8],
        note: &str,
    ) -> Result<()> {
        self.set_field(domain_id, transaction_id, doc! { "note": note })
            .await
    }

    async fn close(&self) -> Result<()> {
        // The driver has no explicit close; connections drop with the client.
        debug!("anchor store closed");
        Ok(())
    }
}
