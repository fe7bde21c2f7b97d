//! The 80-byte `OP_RETURN` codec.

use chrono::DateTime;

use crate::anchor::{Anchor, BtcNet, Mode};
use crate::error::{ModelError, Result};

/// Length of an encoded anchor. Also the standard `OP_RETURN` payload limit.
pub const OP_RETURN_LEN: usize = 80;

/// ASCII `"BBc1"`, the first four bytes of every encoded anchor.
pub const ANCHOR_SIGNATURE: [u8; 4] = *b"BBc1";

/// Encode `anchor` into its 80-byte `OP_RETURN` payload. Never fails.
pub fn encode_op_return(anchor: &Anchor) -> [u8; OP_RETURN_LEN] {
    let mut out = [0u8; OP_RETURN_LEN];
    out[0..4].copy_from_slice(&ANCHOR_SIGNATURE);
    out[4] = anchor.version;
    out[5] = anchor.network.tag();
    // Bytes 6..8 are reserved and stay zero.
    out[8..16].copy_from_slice(&(anchor.timestamp.timestamp() as u64).to_be_bytes());
    out[16..48].copy_from_slice(&anchor.domain_id);
    out[48..80].copy_from_slice(&anchor.transaction_id);
    out
}

/// Decode an 80-byte `OP_RETURN` payload into an [`Anchor`].
///
/// Which version bytes are accepted depends on `mode`; see
/// [`Mode::accepts_version`].
pub fn decode_op_return(payload: &[u8; OP_RETURN_LEN], mode: Mode) -> Result<Anchor> {
    if payload[0..4] != ANCHOR_SIGNATURE {
        return Err(ModelError::InvalidSignature(hex::encode(&payload[0..4])));
    }

    let version = payload[4];
    if !mode.accepts_version(version) {
        return Err(ModelError::InvalidVersion(version));
    }
    let network = BtcNet::try_from(payload[5])?;

    let mut ts = [0u8; 8];
    ts.copy_from_slice(&payload[8..16]);
    let secs = u64::from_be_bytes(ts);
    let timestamp =
        DateTime::from_timestamp(secs as i64, 0).unwrap_or(DateTime::UNIX_EPOCH);

    let mut domain_id = [0u8; 32];
    domain_id.copy_from_slice(&payload[16..48]);
    let mut transaction_id = [0u8; 32];
    transaction_id.copy_from_slice(&payload[48..80]);

    Ok(Anchor {
        version,
        network,
        timestamp,
        domain_id,
        transaction_id,
    })
}
