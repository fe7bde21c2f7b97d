//! Anchor construction and the networks it can target.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::ModelError;
use crate::opret::encode_op_return;

/// Anchor version emitted in production.
pub const ANCHOR_VERSION: u8 = 1;

/// Anchor version reserved for development and tests. Never emitted in
/// production.
pub const ANCHOR_VERSION_DEV: u8 = 255;

/// A Bitcoin network an anchor can target.
///
/// The discriminants are the on-wire network tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BtcNet {
    /// Bitcoin testnet3.
    Testnet3 = 3,
    /// Bitcoin testnet4.
    Testnet4 = 4,
    /// Bitcoin mainnet.
    Mainnet = 255,
}

impl BtcNet {
    /// Get the network name.
    pub fn name(&self) -> &'static str {
        match self {
            BtcNet::Mainnet => "Mainnet",
            BtcNet::Testnet3 => "Testnet3",
            BtcNet::Testnet4 => "Testnet4",
        }
    }

    /// Get the on-wire tag.
    pub fn tag(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for BtcNet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for BtcNet {
    type Error = ModelError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            3 => Ok(BtcNet::Testnet3),
            4 => Ok(BtcNet::Testnet4),
            255 => Ok(BtcNet::Mainnet),
            other => Err(ModelError::InvalidNetwork(other)),
        }
    }
}

/// Process-wide anchor version policy, decided once at startup.
///
/// Production emits and accepts version [`ANCHOR_VERSION`] only; development
/// emits [`ANCHOR_VERSION_DEV`] and accepts both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Production policy.
    #[default]
    Production,
    /// Development policy.
    Development,
}

impl Mode {
    /// The version byte new anchors carry under this policy.
    pub fn anchor_version(self) -> u8 {
        match self {
            Mode::Production => ANCHOR_VERSION,
            Mode::Development => ANCHOR_VERSION_DEV,
        }
    }

    /// Whether `version` is accepted when decoding under this policy.
    pub fn accepts_version(self, version: u8) -> bool {
        match self {
            Mode::Production => version == ANCHOR_VERSION,
            Mode::Development => version == ANCHOR_VERSION || version == ANCHOR_VERSION_DEV,
        }
    }
}

/// Copy up to the first 32 bytes of `id`, zero-padding the remainder.
pub fn pad32(id: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let n = id.len().min(32);
    out[..n].copy_from_slice(&id[..n]);
    out
}

/// An anchor: the attestation written to a Bitcoin `OP_RETURN`.
///
/// Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    /// Anchor format version.
    pub version: u8,
    /// Target Bitcoin network.
    pub network: BtcNet,
    /// Wall-clock time the anchor was created, second precision.
    pub timestamp: DateTime<Utc>,
    /// BBc-1 domain ID, opaque.
    pub domain_id: [u8; 32],
    /// BBc-1 transaction ID, opaque.
    pub transaction_id: [u8; 32],
}

impl Anchor {
    /// Build an anchor.
    ///
    /// `domain_id` and `transaction_id` are fixed at 32 bytes: shorter input
    /// is zero-padded, longer input keeps only the first 32 bytes. The
    /// version byte comes from `mode`.
    pub fn new(
        mode: Mode,
        network: BtcNet,
        timestamp: DateTime<Utc>,
        domain_id: &[u8],
        transaction_id: &[u8],
    ) -> Self {
        Self {
            version: mode.anchor_version(),
            network,
            timestamp,
            domain_id: pad32(domain_id),
            transaction_id: pad32(transaction_id),
        }
    }

    /// The record-store key: `hex(domain_id) ‖ hex(transaction_id)`,
    /// 128 lowercase hex characters.
    pub fn cid(&self) -> String {
        let mut s = String::with_capacity(128);
        s.push_str(&hex::encode(self.domain_id));
        s.push_str(&hex::encode(self.transaction_id));
        s
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-------------Anchor-------------")?;
        writeln!(f, "       Version: {} | 0x{:02x}", self.version, self.version)?;
        writeln!(
            f,
            "       Network: {} | {} | 0x{:02x}",
            self.network.tag(),
            self.network,
            self.network.tag()
        )?;
        writeln!(
            f,
            "     Timestamp: {} | {} | 0x{:016x}",
            self.timestamp.timestamp(),
            self.timestamp,
            self.timestamp.timestamp()
        )?;
        writeln!(f, "      DomainID: {}", hex::encode(self.domain_id))?;
        writeln!(f, " TransactionID: {}", hex::encode(self.transaction_id))?;
        write!(f, "     OP_RETURN: {}", hex::encode(encode_op_return(self)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> DateTime<Utc> {
        DateTime::from_timestamp(1_612_363_134, 0).unwrap()
    }

    #[test]
    fn btcnet_tags_roundtrip() {
        for net in [BtcNet::Testnet3, BtcNet::Testnet4, BtcNet::Mainnet] {
            assert_eq!(BtcNet::try_from(net.tag()).unwrap(), net);
        }
        assert!(matches!(
            BtcNet::try_from(0),
            Err(ModelError::InvalidNetwork(0))
        ));
        assert!(matches!(
            BtcNet::try_from(42),
            Err(ModelError::InvalidNetwork(42))
        ));
    }

    #[test]
    fn mode_version_policy() {
        assert_eq!(Mode::Production.anchor_version(), 1);
        assert_eq!(Mode::Development.anchor_version(), 255);

        assert!(Mode::Production.accepts_version(1));
        assert!(!Mode::Production.accepts_version(255));
        assert!(!Mode::Production.accepts_version(0));

        assert!(Mode::Development.accepts_version(1));
        assert!(Mode::Development.accepts_version(255));
        assert!(!Mode::Development.accepts_version(2));
    }

    #[test]
    fn pad32_short_input() {
        let dom = hex::decode("23456789a0cdef0123406789abcde001").unwrap();
        let want =
            hex::decode("23456789a0cdef0123406789abcde00100000000000000000000000000000000")
                .unwrap();
        assert_eq!(pad32(&dom).as_slice(), want.as_slice());
    }

    #[test]
    fn pad32_long_input() {
        let dom = hex::decode(
            "6789abcde00123456780abcdef0120456789abc0ef0123456089abcdef0023456789a0cdef0123406789abcde00123456780abcdef0120456789abc0ef012345",
        )
        .unwrap();
        let want =
            hex::decode("6789abcde00123456780abcdef0120456789abc0ef0123456089abcdef002345")
                .unwrap();
        assert_eq!(pad32(&dom).as_slice(), want.as_slice());
    }

    #[test]
    fn new_anchor_pads_and_truncates() {
        let dom16 = hex::decode("23456789a0cdef0123406789abcde001").unwrap();
        let tx16 = hex::decode("3456789ab0def0123450789abcdef012").unwrap();
        let a = Anchor::new(Mode::Production, BtcNet::Mainnet, ts(), &dom16, &tx16);
        assert_eq!(a.version, 1);
        assert_eq!(a.network, BtcNet::Mainnet);
        assert_eq!(&a.domain_id[..16], dom16.as_slice());
        assert_eq!(a.domain_id[16..], [0u8; 16]);
        assert_eq!(&a.transaction_id[..16], tx16.as_slice());
        assert_eq!(a.transaction_id[16..], [0u8; 16]);
    }

    #[test]
    fn cid_is_128_lowercase_hex() {
        let a = Anchor::new(
            Mode::Production,
            BtcNet::Testnet3,
            ts(),
            &[0xAB; 32],
            &[0xCD; 32],
        );
        let cid = a.cid();
        assert_eq!(cid.len(), 128);
        assert!(cid.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert!(cid.starts_with(&"ab".repeat(32)));
        assert!(cid.ends_with(&"cd".repeat(32)));
    }

    #[test]
    fn display_mentions_op_return() {
        let a = Anchor::new(Mode::Production, BtcNet::Mainnet, ts(), &[1; 32], &[2; 32]);
        let s = a.to_string();
        assert!(s.contains("OP_RETURN"));
        assert!(s.contains("Mainnet"));
    }
}
