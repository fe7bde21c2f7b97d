//! Anchor record persistence.
//!
//! Anchor data, especially the Bitcoin transaction IDs, must be stored,
//! because finding an anchor without its transaction ID means walking the
//! whole block chain. This crate exposes a small [`Store`] trait
//! (put / get / field-scoped updates / close), a document entity mapping,
//! and two backends: [`MemoryStore`] for tests and [`MongoStore`] for
//! production.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod entity;
mod error;
mod memory;
mod mongo;
mod traits;

pub use entity::{cid_of, AnchorEntity};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use traits::Store;
