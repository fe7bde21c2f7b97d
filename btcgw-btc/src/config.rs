//! Bitcoin client configuration.

use btcgw_model::{BtcNet, Mode};

use crate::{FEE_NORMAL, REQUIRED_CONFIRMATIONS};

/// Configuration for the Bitcoin adapter.
#[derive(Debug, Clone)]
pub struct BtcConfig {
    /// Target Bitcoin network.
    pub network: BtcNet,
    /// Anchor version policy.
    pub mode: Mode,
    /// RPC host.
    pub rpc_addr: String,
    /// RPC port.
    pub rpc_port: u16,
    /// RPC username, if the node requires auth.
    pub rpc_user: Option<String>,
    /// RPC password.
    pub rpc_password: Option<String>,
    /// Fee per anchor transaction, in satoshi.
    pub fee_sat: u64,
    /// Confirmations an input needs before it is spent.
    pub required_confirmations: u64,
    /// Transport timeout in seconds; bounds every node call.
    pub timeout_secs: u64,
}

impl BtcConfig {
    /// Create a configuration for `network` with that network's default
    /// RPC port.
    pub fn new(network: BtcNet) -> Self {
        Self {
            network,
            mode: Mode::Production,
            rpc_addr: "127.0.0.1".to_string(),
            rpc_port: default_rpc_port(network),
            rpc_user: None,
            rpc_password: None,
            fee_sat: FEE_NORMAL,
            required_confirmations: REQUIRED_CONFIRMATIONS,
            timeout_secs: 30,
        }
    }

    /// Set the RPC endpoint. Empty strings keep the defaults, matching how
    /// unset environment variables behave.
    pub fn with_endpoint(mut self, addr: &str, port: &str) -> Self {
        if !addr.is_empty() {
            self.rpc_addr = addr.to_string();
        }
        if let Ok(p) = port.parse::<u16>() {
            self.rpc_port = p;
        }
        self
    }

    /// Set RPC authentication. Empty strings mean no auth.
    pub fn with_auth(mut self, user: &str, password: &str) -> Self {
        if !user.is_empty() {
            self.rpc_user = Some(user.to_string());
            self.rpc_password = Some(password.to_string());
        }
        self
    }

    /// Set the anchor version policy.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the fee in satoshi.
    pub fn with_fee(mut self, fee_sat: u64) -> Self {
        self.fee_sat = fee_sat;
        self
    }

    /// Set the transport timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// The node's RPC URL.
    pub fn rpc_url(&self) -> String {
        format!("http://{}:{}", self.rpc_addr, self.rpc_port)
    }
}

fn default_rpc_port(network: BtcNet) -> u16 {
    match network {
        BtcNet::Mainnet => 8332,
        BtcNet::Testnet3 => 18332,
        BtcNet::Testnet4 => 48332,
    }
}
