use axum::http::HeaderValue;
use axum::{
    routing::{get, post},
    Router,
};
use ethers::types::Address;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod constants;
mod error;
mod models;
mod services;
mod wallet;
mod websocket;

use config::Config;
use constants::API_VERSION;
use models::ScoreLimits;
use services::ScoreSubmission;
use wallet::{JsonRpcWallet, WalletProvider, WalletSession};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reaction_chain=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting Reaction Chain Backend");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("API Version: {}", API_VERSION);
    if config.is_testnet() {
        tracing::info!("Running against a test network");
    }
    tracing::info!(
        "Required network: {} ({})",
        config.chain_name,
        config.chain_id
    );

    // Wallet provider is optional; without it wallet calls report ProviderMissing
    let provider: Option<Arc<dyn WalletProvider>> = match &config.wallet_rpc_url {
        Some(url) => {
            let wallet = JsonRpcWallet::connect(
                url,
                Duration::from_millis(config.wallet_event_poll_ms),
                Duration::from_millis(config.receipt_poll_ms),
            )?;
            Some(Arc::new(wallet))
        }
        None => None,
    };

    let wallet = Arc::new(WalletSession::new(provider, config.chain_descriptor()));
    wallet.restore_session().await;
    let subscription = match wallet.subscribe() {
        Ok(subscription) => Some(subscription),
        Err(e) => {
            tracing::warn!("Wallet events unavailable: {}", e);
            None
        }
    };

    let contract_address = Address::from_str(&config.score_contract_address)
        .map_err(|e| anyhow::anyhow!("Invalid SCORE_CONTRACT_ADDRESS: {}", e))?;
    let submission = Arc::new(ScoreSubmission::new(
        contract_address,
        config.confirmations(),
        ScoreLimits {
            min_ms: config.min_score_ms,
            max_ms: config.max_score_ms,
        },
    ));

    let app_state = api::AppState {
        config: config.clone(),
        wallet,
        submission,
    };

    // Build router
    let app = build_router(app_state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(subscription) = subscription {
        subscription.dispose();
    }
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

fn build_router(state: api::AppState) -> Router {
    // CORS configuration
    let cors = cors_from_config(&state.config);

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        // Wallet
        .route("/api/v1/wallet", get(api::wallet::get_wallet))
        .route("/api/v1/wallet/connect", post(api::wallet::connect_wallet))
        .route(
            "/api/v1/wallet/disconnect",
            post(api::wallet::disconnect_wallet),
        )
        .route(
            "/api/v1/wallet/switch-network",
            post(api::wallet::switch_network),
        )
        .route("/api/v1/network", get(api::wallet::get_network))
        // Score submission
        .route("/api/v1/score/submit", post(api::score::submit_score))
        .route(
            "/api/v1/score/transaction",
            get(api::score::get_transaction),
        )
        .route("/api/v1/score/reset", post(api::score::reset_transaction))
        .route("/api/v1/score/stats", get(api::score::get_stats))
        // WebSocket endpoints
        .route("/ws/transactions", get(websocket::transactions::handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_from_config(config: &Config) -> CorsLayer {
    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return CorsLayer::very_permissive();
    }

    let allowed: Vec<HeaderValue> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins parsed; falling back to permissive");
        return CorsLayer::very_permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
