use axum::{extract::State, Json};
use serde::Serialize;

use super::AppState;
use crate::{
    error::Result,
    models::ApiResponse,
    wallet::{ChainDescriptor, WalletSnapshot},
};

#[derive(Debug, Serialize)]
pub struct ConnectWalletResponse {
    pub address: String,
    pub wallet: WalletSnapshot,
}

/// GET /api/v1/wallet
pub async fn get_wallet(State(state): State<AppState>) -> Json<ApiResponse<WalletSnapshot>> {
    Json(ApiResponse::success(state.wallet.snapshot()))
}

/// POST /api/v1/wallet/connect
pub async fn connect_wallet(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ConnectWalletResponse>>> {
    let address = state.wallet.connect().await?;
    Ok(Json(ApiResponse::success(ConnectWalletResponse {
        address: format!("{:?}", address),
        wallet: state.wallet.snapshot(),
    })))
}

/// POST /api/v1/wallet/disconnect
pub async fn disconnect_wallet(State(state): State<AppState>) -> Json<ApiResponse<WalletSnapshot>> {
    state.wallet.disconnect();
    Json(ApiResponse::success(state.wallet.snapshot()))
}

/// POST /api/v1/wallet/switch-network
pub async fn switch_network(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<WalletSnapshot>>> {
    state.wallet.switch_network().await?;
    Ok(Json(ApiResponse::success(state.wallet.snapshot())))
}

/// GET /api/v1/network
pub async fn get_network(State(state): State<AppState>) -> Json<ApiResponse<ChainDescriptor>> {
    Json(ApiResponse::success(state.wallet.chain().clone()))
}
