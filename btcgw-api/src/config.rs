//! Environment configuration for the server binary.

use std::env;

/// Database name holding all gateway collections.
pub const DB_NAME: &str = "btcgw";
/// Collection of anchor records, keyed by cid.
pub const ANCHOR_COLLECTION: &str = "anchors";
/// Collection of API keys, keyed by the key itself.
pub const APIKEY_COLLECTION: &str = "apikeys";
/// Collection of wallet UTXO queues, keyed by sending address.
pub const UTXO_COLLECTION: &str = "utxos";

/// Read an environment variable, falling back to `default` when unset.
pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Build the MongoDB Atlas connection string from `MONGO_USER`,
/// `MONGO_PASSWORD`, and `MONGO_HOSTNAME`.
pub fn mongo_uri() -> String {
    format!(
        "mongodb+srv://{}:{}@{}",
        env_or("MONGO_USER", ""),
        env_or("MONGO_PASSWORD", ""),
        env_or("MONGO_HOSTNAME", ""),
    )
}
