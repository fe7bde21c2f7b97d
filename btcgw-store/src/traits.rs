//! The store trait.

use async_trait::async_trait;

use btcgw_model::AnchorRecord;

use crate::error::Result;

/// Persistence for anchor records, keyed by `(domain_id, transaction_id)`.
///
/// Backends must keep the update operations field-scoped: updating one
/// field never clobbers the others.
#[async_trait]
pub trait Store: Send + Sync {
    /// Add or replace a record. O(1) expected, idempotent on identical
    /// input.
    async fn put(&self, record: &AnchorRecord) -> Result<()>;

    /// Get the record for the given ids. O(1) expected. Returns
    /// [`StoreError::NotFound`] when absent.
    ///
    /// [`StoreError::NotFound`]: crate::StoreError::NotFound
    async fn get(&self, domain_id: &[u8], transaction_id: &[u8]) -> Result<AnchorRecord>;

    /// Update only the confirmation count.
    async fn update_confirmations(
        &self,
        domain_id: &[u8],
        transaction_id: &[u8],
        confirmations: u64,
    ) -> Result<()>;

    /// Update only the domain name. An empty string is a valid value.
    async fn update_domain_name(
        &self,
        domain_id: &[u8],
        transaction_id: &[u8],
        domain_name: &str,
    ) -> Result<()>;

    /// Update only the note.
    async fn update_note(&self, domain_id: &[u8], transaction_id: &[u8], note: &str)
        -> Result<()>;

    /// Flush and release the backend handle. Safe to call more than once.
    async fn close(&self) -> Result<()>;
}
