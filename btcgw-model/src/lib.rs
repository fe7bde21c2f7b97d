//! Data model for the BBc-1 Bitcoin gateway.
//!
//! This crate defines the anchor, the 80-byte attestation embedded in a
//! Bitcoin `OP_RETURN` output, together with its codec and the record type
//! that couples an anchor with its on-chain observations.
//!
//! # Wire Format
//!
//! ```text
//! ┌────────┬─────────┬─────────┬──────────┬───────────┬───────────┬──────────────┐
//! │ offset │ 0..4    │ 4       │ 5        │ 6..8      │ 8..16     │ 16..80       │
//! ├────────┼─────────┼─────────┼──────────┼───────────┼───────────┼──────────────┤
//! │ field  │ "BBc1"  │ version │ network  │ reserved  │ timestamp │ dom ‖ tx ids │
//! │        │         │         │          │ (zero)    │ (u64 BE)  │ (32 + 32)    │
//! └────────┴─────────┴─────────┴──────────┴───────────┴───────────┴──────────────┘
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod anchor;
mod error;
mod opret;
mod record;

pub use anchor::{pad32, Anchor, BtcNet, Mode, ANCHOR_VERSION, ANCHOR_VERSION_DEV};
pub use error::{ModelError, Result};
pub use opret::{decode_op_return, encode_op_return, ANCHOR_SIGNATURE, OP_RETURN_LEN};
pub use record::AnchorRecord;
