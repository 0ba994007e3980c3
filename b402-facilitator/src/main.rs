//! B402 Facilitator HTTP server.
//!
//! # Usage
//!
//! ```bash
//! NETWORK=testnet \
//! RELAYER_PRIVATE_KEY=0x... \
//! B402_RELAYER_ADDRESS=0x... \
//! cargo run -p b402-facilitator --release
//! ```
//!
//! Configuration is environment-sourced (a `.env` file is honored); see
//! [`b402_facilitator::config`] for the full variable list. `RUST_LOG`
//! controls the log level filter (default: `info`).

use std::net::SocketAddr;
use std::sync::Arc;

use alloy_network::EthereumWallet;
use alloy_provider::ProviderBuilder;
use axum::http::Method;
use b402_evm::relayer::B402RelayerContract;
use b402_evm::tokens::ErcMetadataFetcher;
use tower_http::cors;
use tracing_subscriber::EnvFilter;

use b402_facilitator::config::FacilitatorConfig;
use b402_facilitator::events::EventLog;
use b402_facilitator::handlers;
use b402_facilitator::local::LocalFacilitator;
use b402_facilitator::util::SigDown;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("Facilitator failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = FacilitatorConfig::from_env()?;
    let signer_address = config.signer.address();
    tracing::info!(
        network = %config.network,
        chain_id = config.network.chain_id(),
        relayer_contract = %config.relayer_address,
        signer = %signer_address,
        rpc = %config.rpc_url,
        "Loaded configuration"
    );

    let wallet = EthereumWallet::from(config.signer.clone());
    let provider = ProviderBuilder::new()
        .wallet(wallet)
        .connect_http(config.rpc_url.clone());

    let relayer = B402RelayerContract::new(
        config.relayer_address,
        provider.clone(),
        config.settle_gas_limit,
        config.rpc_timeout,
        config.receipt_timeout,
    );
    let token_fetcher = ErcMetadataFetcher::new(provider, config.rpc_timeout);
    let events = EventLog::new(config.event_log_url.clone(), config.event_log_api_key.clone());

    let facilitator = LocalFacilitator::new(
        config.network,
        config.relayer_address,
        signer_address,
        Arc::new(relayer),
        Arc::new(token_fetcher),
        events,
    );
    let state: handlers::AppState = Arc::new(facilitator);

    let app = handlers::router(state).layer(
        cors::CorsLayer::new()
            .allow_origin(cors::Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(cors::Any),
    );

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Facilitator listening on http://{addr}");

    let sig_down = SigDown::try_new()?;
    let cancellation_token = sig_down.cancellation_token();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancellation_token.cancelled().await })
        .await?;

    tracing::info!("Facilitator shut down gracefully");
    Ok(())
}
