//! In-memory store backend for tests and development.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use btcgw_model::AnchorRecord;

use crate::entity::{cid_of, AnchorEntity};
use crate::error::{Result, StoreError};
use crate::traits::Store;

/// A [`Store`] backed by a process-local map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entities: RwLock<HashMap<String, AnchorEntity>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.entities.read().len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.entities.read().is_empty()
    }

    fn update_field(
        &self,
        domain_id: &[u8],
        transaction_id: &[u8],
        apply: impl FnOnce(&mut AnchorEntity),
    ) -> Result<()> {
        let cid = cid_of(domain_id, transaction_id);
        let mut entities = self.entities.write();
        let entity = entities
            .get_mut(&cid)
            .ok_or_else(|| StoreError::NotFound(cid.clone()))?;
        apply(entity);
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn put(&self, record: &AnchorRecord) -> Result<()> {
        let entity = AnchorEntity::from_record(record);
        self.entities.write().insert(entity.cid.clone(), entity);
        Ok(())
    }

    async fn get(&self, domain_id: &[u8], transaction_id: &[u8]) -> Result<AnchorRecord> {
        let cid = cid_of(domain_id, transaction_id);
        let entity = self
            .entities
            .read()
            .get(&cid)
            .cloned()
            .ok_or(StoreError::NotFound(cid))?;
        entity.into_record()
    }

    async fn update_confirmations(
        &self,
        domain_id: &[u8],
        transaction_id: &[u8],
        confirmations: u64,
    ) -> Result<()> {
        self.update_field(domain_id, transaction_id, |e| {
            e.confirmations = confirmations;
        })
    }

    async fn update_domain_name(
        &self,
        domain_id: &[u8],
        transaction_id: &[u8],
        domain_name: &str,
    ) -> Result<()> {
        self.update_field(domain_id, transaction_id, |e| {
            e.domain_name = domain_name.to_string();
        })
    }

    async fn update_note(
        &self,
        domain_id: &[u8],
        transaction_id: &[u8],
        note: &str,
    ) -> Result<()> {
        self.update_field(domain_id, transaction_id, |e| {
            e.note = note.to_string();
        })
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
