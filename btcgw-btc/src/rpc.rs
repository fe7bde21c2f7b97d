//! JSON-RPC wrapper around Bitcoin Core.

use std::str::FromStr;
use std::time::Duration;

use bitcoin::hashes::Hash as _;
use bitcoin::Txid;
use bitcoincore_rpc::json::{
    DecodeRawTransactionResult, GetTransactionResult, GetTransactionResultDetailCategory,
};
use bitcoincore_rpc::jsonrpc;
use bitcoincore_rpc::jsonrpc::simple_http::SimpleHttpTransport;
use bitcoincore_rpc::{Client, RpcApi};
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use tracing::debug;

use btcgw_model::{decode_op_return, encode_op_return, AnchorRecord, OP_RETURN_LEN};

use crate::config::BtcConfig;
use crate::error::{BtcError, Result};
use crate::fee::{calc_fee, format_btc};

/// Blocking client for the node's wallet and raw-transaction RPCs.
///
/// The transport timeout from [`BtcConfig`] bounds every call. All methods
/// block; [`crate::BtcAnchorClient`] runs them on the blocking pool.
pub struct BitcoinRpc {
    client: Client,
    config: BtcConfig,
}

impl BitcoinRpc {
    /// Build a client for the configured endpoint. Does not contact the
    /// node; call [`BitcoinRpc::ping`] to check it.
    pub fn new(config: BtcConfig) -> Result<Self> {
        let mut builder = SimpleHttpTransport::builder()
            .url(&config.rpc_url())
            .map_err(|e| BtcError::Unreachable(e.to_string()))?
            .timeout(Duration::from_secs(config.timeout_secs));
        if let Some(user) = config.rpc_user.as_deref() {
            builder = builder.auth(user, config.rpc_password.as_deref());
        }
        let client = Client::from_jsonrpc(jsonrpc::client::Client::with_transport(builder.build()));
        Ok(Self { client, config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &BtcConfig {
        &self.config
    }

    /// Liveness check against the node.
    pub fn ping(&self) -> Result<()> {
        self.client.ping()?;
        Ok(())
    }

    /// Balance of the node's default wallet as a decimal string.
    pub fn get_balance(&self) -> Result<String> {
        let amount = self.client.get_balance(None, None)?;
        Ok(format_btc(amount.to_btc()))
    }

    /// Fetch a wallet transaction.
    pub fn get_transaction(&self, txid: &[u8]) -> Result<GetTransactionResult> {
        let txid = parse_txid(txid)?;
        Ok(self.client.get_transaction(&txid, None)?)
    }

    /// Create a raw transaction spending vout 0 of `from_txid`, paying
    /// `balance − fee_sat` to `to_addr`, with a second output carrying
    /// `OP_RETURN payload`. Returns the unsigned transaction hex.
    pub fn create_raw_anchor(
        &self,
        from_txid: &[u8],
        balance: &str,
        to_addr: &str,
        fee_sat: u64,
        payload: &[u8],
    ) -> Result<String> {
        let amount = calc_fee(balance, fee_sat).map_err(|e| match e {
            BtcError::NotEnoughBalance(_) => e,
            other => BtcError::InvalidFee(other.to_string()),
        })?;

        let inputs = json!([{ "txid": hex::encode(from_txid), "vout": 0 }]);
        // The data output cannot be expressed through the typed helper, so
        // the arguments are built by hand.
        let mut pay = Map::new();
        pay.insert(to_addr.to_string(), Value::String(amount));
        let mut data = Map::new();
        data.insert("data".to_string(), Value::String(hex::encode(payload)));
        let outputs = Value::Array(vec![Value::Object(pay), Value::Object(data)]);

        let raw: String = self.client.call("createrawtransaction", &[inputs, outputs])?;
        Ok(raw)
    }

    /// Sign a raw transaction with the node's default wallet.
    pub fn sign_with_wallet(&self, raw_tx_hex: &str) -> Result<Vec<u8>> {
        let signed = self
            .client
            .sign_raw_transaction_with_wallet(raw_tx_hex, None, None)?;
        if !signed.complete {
            debug!(errors = ?signed.errors, "node returned an incomplete signature");
            return Err(BtcError::FailedToSign);
        }
        Ok(signed.hex)
    }

    /// Broadcast a signed raw transaction; returns its ID.
    pub fn send_raw(&self, signed_tx: &[u8]) -> Result<Vec<u8>> {
        let txid = self.client.send_raw_transaction(signed_tx)?;
        Ok(txid_bytes(&txid))
    }

    /// Decode a raw transaction without touching the chain.
    pub fn decode_raw(&self, raw_tx: &[u8]) -> Result<DecodeRawTransactionResult> {
        Ok(self.client.decode_raw_transaction(raw_tx, None)?)
    }

    /// The full anchor-send pipeline; see the crate docs.
    pub fn put_anchor(
        &self,
        utxo_txid: &[u8],
        send_addr: &str,
        anchor: &btcgw_model::Anchor,
    ) -> Result<Vec<u8>> {
        if anchor.network != self.config.network {
            return Err(BtcError::InconsistentNetwork {
                anchor: anchor.network,
                client: self.config.network,
            });
        }
        self.ping()?;

        let tx = self.get_transaction(utxo_txid)?;
        let balance = parse_transaction_received(&tx, send_addr)?;
        let confirmations = parse_transaction_confirmations(&tx);
        if confirmations < self.config.required_confirmations {
            return Err(BtcError::NotEnoughConfirmations {
                got: confirmations,
                need: self.config.required_confirmations,
            });
        }

        let payload = encode_op_return(anchor);
        let raw = self.create_raw_anchor(
            utxo_txid,
            &balance,
            send_addr,
            self.config.fee_sat,
            &payload,
        )?;
        let signed = self.sign_with_wallet(&raw)?;
        let txid = self.send_raw(&signed)?;
        debug!(txid = %hex::encode(&txid), "anchor transaction broadcast");
        Ok(txid)
    }

    /// The full anchor-read pipeline; see the crate docs.
    pub fn get_anchor(&self, btc_txid: &[u8]) -> Result<AnchorRecord> {
        self.ping()?;

        let tx = self.get_transaction(btc_txid)?;
        let tx_time = parse_transaction_time(&tx);
        let confirmations = parse_transaction_confirmations(&tx);

        let decoded = self.decode_raw(&tx.hex)?;
        let payload = parse_raw_transaction_op_return(&decoded)?;
        let payload: [u8; OP_RETURN_LEN] = payload.as_slice().try_into().map_err(|_| {
            BtcError::InvalidOpReturn(format!(
                "payload is {} bytes, want {}",
                payload.len(),
                OP_RETURN_LEN
            ))
        })?;
        let anchor = decode_op_return(&payload, self.config.mode)
            .map_err(|e| BtcError::InvalidOpReturn(e.to_string()))?;

        Ok(AnchorRecord::new(
            anchor,
            btc_txid.to_vec(),
            tx_time,
            confirmations,
            "",
            "",
        ))
    }
}

/// The amount the given address received in this transaction, formatted
/// with eight fractional digits. Only the first matching `details[]` entry
/// counts.
pub fn parse_transaction_received(tx: &GetTransactionResult, recv_addr: &str) -> Result<String> {
    for detail in &tx.details {
        if !matches!(detail.category, GetTransactionResultDetailCategory::Receive) {
            continue;
        }
        let Some(address) = detail.address.as_ref() else {
            continue;
        };
        if address.clone().assume_checked().to_string() != recv_addr {
            continue;
        }
        return Ok(format_btc(detail.amount.to_btc()));
    }
    Err(BtcError::FailedToDecode(format!(
        "no receive entry for {recv_addr}"
    )))
}

/// Confirmations of a wallet transaction. Conflicted transactions report
/// negative values; those count as zero.
pub fn parse_transaction_confirmations(tx: &GetTransactionResult) -> u64 {
    tx.info.confirmations.max(0) as u64
}

/// The node-reported time of a wallet transaction.
pub fn parse_transaction_time(tx: &GetTransactionResult) -> DateTime<Utc> {
    DateTime::from_timestamp(tx.info.time as i64, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

/// The payload of the first `OP_RETURN` output of a decoded transaction.
pub fn parse_raw_transaction_op_return(decoded: &DecodeRawTransactionResult) -> Result<Vec<u8>> {
    for vout in &decoded.vout {
        let Some(data) = vout.script_pub_key.asm.strip_prefix("OP_RETURN ") else {
            continue;
        };
        return hex::decode(data)
            .map_err(|_| BtcError::FailedToDecode("OP_RETURN payload is not hex".into()));
    }
    Err(BtcError::FailedToDecode("no OP_RETURN output".into()))
}

/// Parse display-order txid bytes into a [`Txid`].
fn parse_txid(bytes: &[u8]) -> Result<Txid> {
    Txid::from_str(&hex::encode(bytes)).map_err(|e| BtcError::InvalidTxId(e.to_string()))
}

/// Display-order bytes of a [`Txid`].
fn txid_bytes(txid: &Txid) -> Vec<u8> {
    let mut bytes = txid.to_byte_array().to_vec();
    bytes.reverse();
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use btcgw_model::{Anchor, BtcNet, Mode};

    const RECV_ADDR: &str = "tb1qhexc7d0fzex7lrzw3l0j2dmvhgegt02ckfdzjr";

    // gettransaction output for a confirmed wallet transaction carrying an
    // OP_RETURN, as Bitcoin Core emits it.
    const GET_TX: &str = r#"{"amount": 0.00000000, "fee": -0.00010000, "confirmations": 27320, "blockhash": "000000000000000ff93e985472a9e5d045ecbecb2f7c0c9785bc96a6273e6097", "blockheight": 1905423, "blockindex": 4, "blocktime": 1611334725, "txid": "57511f74c3836c0d4d62a6183fa54e600372e1aed5b5be2f78ef5b766a314a5d", "walletconflicts": [], "time": 1611334493, "timereceived": 1611334493, "bip125-replaceable": "no", "details": [{"address": "tb1qhexc7d0fzex7lrzw3l0j2dmvhgegt02ckfdzjr", "category": "send", "amount": -0.01158624, "label": "xxxxx", "vout": 0, "fee": -0.00010000, "abandoned": false}, {"category": "send", "amount": 0.00000000, "vout": 1, "fee": -0.00010000, "abandoned": false}, {"address": "tb1qhexc7d0fzex7lrzw3l0j2dmvhgegt02ckfdzjr", "category": "receive", "amount": 0.01158624, "label": "xxxxx", "vout": 0}], "hex": "0200000000010135658cd01fe92e0b81240d7a3157e2ef87389d92dcf783e170b8003cd3e9acc70000000000ffffffff02e0ad110000000000160014be4d8f35e9164def8c4e8fdf25376cba3285bd580000000000000000106a0e7468697320697320612070656e0a0247304402207081f817c5cfe5579c44b770ce13fe8b4aff04a241a666e2ad8a6cdf2f88286e02202176b0ae03924adb869b4c17ae3ef1bee12ed0a0798e7673bfeeeb290d954eb501210201f52ea462e04534e2e5f9be72a4bddd6e5fe7a001bc8bdba8a8dad392222d5300000000"}"#;

    // decoderawtransaction output for the transaction above.
    const DECODED_TX: &str = r#"{"txid": "57511f74c3836c0d4d62a6183fa54e600372e1aed5b5be2f78ef5b766a314a5d", "hash": "f7c8cf0c39a7d4c0a0c2ac4a70e6b934e5b757fe4e9c4f9a3e6d3d0e1c2b3a49", "version": 2, "size": 223, "vsize": 141, "weight": 562, "locktime": 0, "vin": [], "vout": [{"value": 0.01158624, "n": 0, "scriptPubKey": {"asm": "0 be4d8f35e9164def8c4e8fdf25376cba3285bd58", "hex": "0014be4d8f35e9164def8c4e8fdf25376cba3285bd58"}}, {"value": 0.00000000, "n": 1, "scriptPubKey": {"asm": "OP_RETURN 7468697320697320612070656e0a", "hex": "6a0e7468697320697320612070656e0a"}}]}"#;

    fn get_tx() -> GetTransactionResult {
        serde_json::from_str(GET_TX).unwrap()
    }

    fn decoded_tx() -> DecodeRawTransactionResult {
        serde_json::from_str(DECODED_TX).unwrap()
    }

    #[test]
    fn received_amount_for_address() {
        assert_eq!(parse_transaction_received(&get_tx(), RECV_ADDR).unwrap(), "0.01158624");
    }

    #[test]
    fn received_requires_matching_address() {
        let err = parse_transaction_received(&get_tx(), "tb1qunknown").unwrap_err();
        assert!(matches!(err, BtcError::FailedToDecode(_)));
    }

    #[test]
    fn confirmations_and_time() {
        let tx = get_tx();
        assert_eq!(parse_transaction_confirmations(&tx), 27_320);
        assert_eq!(parse_transaction_time(&tx).timestamp(), 1_611_334_493);
    }

    #[test]
    fn op_return_payload_extracted() {
        let payload = parse_raw_transaction_op_return(&decoded_tx()).unwrap();
        assert_eq!(payload, hex::decode("7468697320697320612070656e0a").unwrap());
    }

    #[test]
    fn missing_op_return_is_an_error() {
        let mut decoded = decoded_tx();
        decoded.vout.truncate(1);
        assert!(matches!(
            parse_raw_transaction_op_return(&decoded),
            Err(BtcError::FailedToDecode(_))
        ));
    }

    #[test]
    fn txid_bytes_roundtrip_display_order() {
        let display = "57511f74c3836c0d4d62a6183fa54e600372e1aed5b5be2f78ef5b766a314a5d";
        let bytes = hex::decode(display).unwrap();
        let txid = parse_txid(&bytes).unwrap();
        assert_eq!(txid.to_string(), display);
        assert_eq!(txid_bytes(&txid), bytes);
    }

    #[test]
    fn parse_txid_rejects_wrong_size() {
        assert!(matches!(
            parse_txid(&[0x12, 0x34]),
            Err(BtcError::InvalidTxId(_))
        ));
    }

    #[test]
    fn put_anchor_checks_network_first() {
        let rpc = BitcoinRpc::new(BtcConfig::new(BtcNet::Testnet3)).unwrap();
        let anchor = Anchor::new(
            Mode::Production,
            BtcNet::Mainnet,
            DateTime::from_timestamp(1_612_363_134, 0).unwrap(),
            &[1; 32],
            &[2; 32],
        );
        // Fails before any network traffic.
        let err = rpc.put_anchor(&[0x57; 32], RECV_ADDR, &anchor).unwrap_err();
        assert!(matches!(
            err,
            BtcError::InconsistentNetwork {
                anchor: BtcNet::Mainnet,
                client: BtcNet::Testnet3,
            }
        ));
    }
}
