//! HTTP API for the BBc-1 Bitcoin gateway.
//!
//! Routes:
//! - `POST   /anchors/domains/{dom}/transactions/{tx}`: register an anchor
//! - `GET    /anchors/domains/{dom}/transactions/{tx}`: fetch its record
//! - `PATCH  /anchors/domains/{dom}/transactions/{tx}`: refresh it
//! - `POST   /apikeys/create`: issue a domain-scoped API key
//! - `POST   /apikeys/delete`: revoke a key
//! - `GET    /healthz`: liveness
//!
//! Anchor routes require an `X-API-Key` header; keys carry either a global
//! `register_all` scope or a `register_domain` scope bound to one domain.

pub mod auth;
pub mod config;
pub mod error;
pub mod rest;
pub mod server;

pub use auth::{new_api_key, ApiKey, AuthError, KeyStore, MemoryKeyStore, MongoKeyStore};
pub use error::ServiceError;
pub use server::{router, serve, AppState};
