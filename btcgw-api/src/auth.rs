//! API-key authentication.
//!
//! Keys are 128-bit random identifiers (32 hex chars) with one of two
//! scopes: `register_all` grants every domain, `register_domain` only the
//! domain the key is bound to.

use std::collections::HashMap;

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::{Client, Collection};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Generate a fresh key: a UUIDv4 hex-encoded without hyphens.
pub fn new_api_key() -> String {
    hex::encode(Uuid::new_v4().as_bytes())
}

/// An API key with its scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    /// The key itself, 32 hex chars.
    #[serde(rename = "_id")]
    pub key: String,
    /// Whether the key may register under any domain.
    pub scope_register_all: bool,
    /// Whether the key may register under its bound domain.
    pub scope_register_domain: bool,
    /// The bound domain ID (hex) for `scope_register_domain`.
    #[serde(rename = "domid")]
    pub domain_id: String,
    /// Free-text note.
    #[serde(default)]
    pub note: String,
}

impl ApiKey {
    /// Whether the key authorizes a request under `domain_id`.
    pub fn allows(&self, domain_id: &str) -> bool {
        self.scope_register_all || (self.scope_register_domain && self.domain_id == domain_id)
    }
}

/// Errors from the key store.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The lookup itself failed (as opposed to an unknown key).
    #[error("could not authenticate: {0}")]
    CouldNotAuthenticate(String),

    /// The key could not be created.
    #[error("could not generate key: {0}")]
    CouldNotGenerateKey(String),

    /// The key could not be deleted.
    #[error("could not delete key: {0}")]
    CouldNotDeleteKey(String),

    /// The backing handle could not be released.
    #[error("could not close key store: {0}")]
    FailedToClose(String),
}

/// Storage and verification of API keys.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Whether `key` authorizes a request under `domain_id`. An unknown
    /// key is `Ok(false)`, not an error.
    async fn authorize(&self, key: &str, domain_id: &str) -> Result<bool, AuthError>;

    /// Create and persist a new key. A global-admin key ignores
    /// `domain_id`; otherwise the key is bound to it.
    async fn generate(
        &self,
        domain_id: &str,
        global_admin: bool,
        note: &str,
    ) -> Result<ApiKey, AuthError>;

    /// Delete a key. Deleting an unknown key is not an error.
    async fn delete(&self, key: &str) -> Result<(), AuthError>;

    /// Release the backing handle.
    async fn close(&self) -> Result<(), AuthError>;
}

fn build_key(domain_id: &str, global_admin: bool, note: &str) -> ApiKey {
    ApiKey {
        key: new_api_key(),
        scope_register_all: global_admin,
        scope_register_domain: !global_admin,
        domain_id: domain_id.to_string(),
        note: note.to_string(),
    }
}

/// In-memory key store for tests and development.
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    keys: RwLock<HashMap<String, ApiKey>>,
}

impl MemoryKeyStore {
    /// Create an empty key store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pre-built key, for seeding tests.
    pub fn insert(&self, key: ApiKey) {
        self.keys.write().insert(key.key.clone(), key);
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn authorize(&self, key: &str, domain_id: &str) -> Result<bool, AuthError> {
        Ok(self
            .keys
            .read()
            .get(key)
            .map(|k| k.allows(domain_id))
            .unwrap_or(false))
    }

    async fn generate(
        &self,
        domain_id: &str,
        global_admin: bool,
        note: &str,
    ) -> Result<ApiKey, AuthError> {
        let key = build_key(domain_id, global_admin, note);
        self.keys.write().insert(key.key.clone(), key.clone());
        Ok(key)
    }

    async fn delete(&self, key: &str) -> Result<(), AuthError> {
        self.keys.write().remove(key);
        Ok(())
    }

    async fn close(&self) -> Result<(), AuthError> {
        Ok(())
    }
}

/// MongoDB-backed key store, one document per key.
pub struct MongoKeyStore {
    collection: Collection<ApiKey>,
}

impl MongoKeyStore {
    /// Connect to `uri` and bind to `db`/`collection`.
    pub async fn connect(uri: &str, db: &str, collection: &str) -> Result<Self, AuthError> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| AuthError::CouldNotAuthenticate(e.to_string()))?;
        Ok(Self {
            collection: client.database(db).collection(collection),
        })
    }
}

#[async_trait]
impl KeyStore for MongoKeyStore {
    async fn authorize(&self, key: &str, domain_id: &str) -> Result<bool, AuthError> {
        if key.is_empty() {
            return Ok(false);
        }
        let found = self
            .collection
            .find_one(doc! { "_id": key }, None)
            .await
            .map_err(|e| AuthError::CouldNotAuthenticate(e.to_string()))?;
        Ok(found.map(|k| k.allows(domain_id)).unwrap_or(false))
    }

    async fn generate(
        &self,
        domain_id: &str,
        global_admin: bool,
        note: &str,
    ) -> Result<ApiKey, AuthError> {
        let key = build_key(domain_id, global_admin, note);
        self.collection
            .insert_one(&key, None)
            .await
            .map_err(|e| AuthError::CouldNotGenerateKey(e.to_string()))?;
        Ok(key)
    }

    async fn delete(&self, key: &str) -> Result<(), AuthError> {
        self.collection
            .delete_one(doc! { "_id": key }, None)
            .await
            .map_err(|e| AuthError::CouldNotDeleteKey(e.to_string()))?;
        Ok(())
    }

    async fn close(&self) -> Result<(), AuthError> {
        debug!("key store closed");
        Ok(())
    }
}
