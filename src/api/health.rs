use axum::{extract::State, Json};
use serde::Serialize;
use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub provider: String,
    pub wallet: String,
    pub chain_id: u64,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider_status = if state.wallet.has_provider() {
        "configured".to_string()
    } else {
        "missing".to_string()
    };

    let wallet_status = if state.wallet.is_connected() {
        "connected".to_string()
    } else {
        "disconnected".to_string()
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        provider: provider_status,
        wallet: wallet_status,
        chain_id: state.config.chain_id,
    })
}
