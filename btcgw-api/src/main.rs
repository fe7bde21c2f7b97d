//! Anchor CRUD API server for the BBc-1 Ledger Subsystem.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use btcgw_api::config::{
    env_or, mongo_uri, ANCHOR_COLLECTION, APIKEY_COLLECTION, DB_NAME, UTXO_COLLECTION,
};
use btcgw_api::{serve, AppState, KeyStore, MongoKeyStore};
use btcgw_btc::{BtcAnchorClient, BtcConfig};
use btcgw_gw::{Gateway, GatewayImpl};
use btcgw_model::{BtcNet, Mode};
use btcgw_store::MongoStore;
use btcgw_wallet::DocWallet;

#[derive(Debug, Parser)]
#[command(name = "btcgw", about = "Anchor CRUD API server for the BBc-1 Ledger Subsystem")]
struct Args {
    /// HTTP listen port.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Use anchor version 255 and pretty-print HTTP response bodies.
    #[arg(long)]
    dev: bool,

    /// Bitcoin address used for sending anchor transactions.
    #[arg(long, required = true)]
    wallet: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mode = if args.dev {
        info!("development environment: anchors carry version 255");
        Mode::Development
    } else {
        info!("production environment");
        Mode::Production
    };

    let network = BtcNet::try_from(env_or("BITCOIN_NETWORK", "3").parse::<u8>()?)?;
    let btc_config = BtcConfig::new(network)
        .with_mode(mode)
        .with_endpoint(&env_or("BITCOIND_ADDR", ""), &env_or("BITCOIND_PORT", ""))
        .with_auth(
            &env_or("BITCOIND_RPC_USER", ""),
            &env_or("BITCOIND_RPC_PASSWORD", ""),
        );
    let btc = BtcAnchorClient::new(btc_config)?;

    let uri = mongo_uri();
    let store = MongoStore::connect(&uri, DB_NAME, ANCHOR_COLLECTION).await?;
    let wallet = DocWallet::open(&uri, DB_NAME, UTXO_COLLECTION, &args.wallet).await?;
    let keys: Arc<dyn KeyStore> =
        Arc::new(MongoKeyStore::connect(&uri, DB_NAME, APIKEY_COLLECTION).await?);

    let gateway: Arc<dyn Gateway> = Arc::new(GatewayImpl::new(network, mode, btc, wallet, store));
    let state = Arc::new(AppState::new(gateway.clone(), keys.clone(), args.dev));

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    serve(state, addr).await?;

    if let Err(e) = gateway.close().await {
        error!(error = %e, "gateway close failed");
    }
    if let Err(e) = keys.close().await {
        error!(error = %e, "key store close failed");
    }
    Ok(())
}
