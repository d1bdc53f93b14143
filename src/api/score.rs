use axum::{extract::State, Json};
use serde::Serialize;

use super::AppState;
use crate::{
    error::Result,
    models::{ApiResponse, ScoreStats, SubmitScoreRequest, TransactionRecord},
    wallet::ChainDescriptor,
};

#[derive(Debug, Serialize)]
pub struct TransactionView {
    #[serde(flatten)]
    pub record: TransactionRecord,
    pub is_submitting: bool,
    pub explorer_url: Option<String>,
}

fn transaction_view(
    record: TransactionRecord,
    is_submitting: bool,
    chain: &ChainDescriptor,
) -> TransactionView {
    let explorer_url = record
        .tx_hash_hex()
        .and_then(|hash| chain.explorer_tx_url(&hash));
    TransactionView {
        record,
        is_submitting,
        explorer_url,
    }
}

/// POST /api/v1/score/submit
pub async fn submit_score(
    State(state): State<AppState>,
    Json(req): Json<SubmitScoreRequest>,
) -> Result<Json<ApiResponse<TransactionView>>> {
    // Capability is read per call so a reconnect is picked up immediately
    let capability = state.wallet.capability();
    let record = state
        .submission
        .submit(req.score, capability.as_ref())
        .await?;

    Ok(Json(ApiResponse::success(transaction_view(
        record,
        state.submission.is_submitting(),
        state.wallet.chain(),
    ))))
}

/// GET /api/v1/score/transaction
pub async fn get_transaction(State(state): State<AppState>) -> Json<ApiResponse<TransactionView>> {
    Json(ApiResponse::success(transaction_view(
        state.submission.record(),
        state.submission.is_submitting(),
        state.wallet.chain(),
    )))
}

/// POST /api/v1/score/reset
pub async fn reset_transaction(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<TransactionView>>> {
    state.submission.reset()?;
    Ok(Json(ApiResponse::success(transaction_view(
        state.submission.record(),
        state.submission.is_submitting(),
        state.wallet.chain(),
    ))))
}

/// GET /api/v1/score/stats
pub async fn get_stats(State(state): State<AppState>) -> Json<ApiResponse<ScoreStats>> {
    let capability = state.wallet.capability();
    let stats = state.submission.stats(capability.as_ref()).await;
    Json(ApiResponse::success(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::models::{ScoreLimits, TxStatus};
    use crate::services::ScoreSubmission;
    use crate::wallet::chain::monad_testnet;
    use crate::wallet::mock::{account, MockWallet};
    use crate::wallet::{WalletProvider, WalletSession};
    use axum::{http::StatusCode, response::IntoResponse};
    use ethers::types::{Address, TxHash};
    use std::sync::Arc;

    async fn connected_state(wallet: Arc<MockWallet>) -> AppState {
        let provider: Arc<dyn WalletProvider> = wallet;
        let session = Arc::new(WalletSession::new(Some(provider), monad_testnet()));
        session.connect().await.unwrap();
        AppState {
            config: test_config(),
            wallet: session,
            submission: Arc::new(ScoreSubmission::new(
                Address::repeat_byte(0x2a),
                1,
                ScoreLimits {
                    min_ms: 1,
                    max_ms: 10_000,
                },
            )),
        }
    }

    #[test]
    fn transaction_view_links_explorer_when_hash_known() {
        let record = TransactionRecord {
            status: TxStatus::Pending,
            tx_hash: Some(TxHash::repeat_byte(0xab)),
            score: 184,
            ..TransactionRecord::default()
        };

        let view = transaction_view(record, true, &monad_testnet());

        let url = view.explorer_url.unwrap();
        assert!(url.starts_with("https://testnet-explorer.monad.xyz/tx/0xabab"));
        let json = serde_json::to_value(&view_without_url()).unwrap();
        assert_eq!(json["status"], "idle");
        assert_eq!(json["is_submitting"], false);
    }

    fn view_without_url() -> TransactionView {
        transaction_view(TransactionRecord::default(), false, &monad_testnet())
    }

    #[test]
    fn transaction_view_without_hash_has_no_link() {
        assert!(view_without_url().explorer_url.is_none());
    }

    #[tokio::test]
    async fn failed_submit_returns_error_body_and_records_failure() {
        let wallet = Arc::new(MockWallet::new(vec![account(1)], 666));
        *wallet.signer.receipt_status.lock().unwrap() = Some(0);
        let state = connected_state(wallet).await;

        let err = submit_score(State(state.clone()), Json(SubmitScoreRequest { score: 184 }))
            .await
            .unwrap_err();

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "TRANSACTION_FAILED");

        let Json(view) = get_transaction(State(state)).await;
        assert_eq!(view.data.record.status, TxStatus::Failed);
        assert_eq!(view.data.record.score, 184);
        assert!(view.data.record.error.is_some());
        assert!(!view.data.is_submitting);
        assert!(view.data.explorer_url.is_some());
    }

    #[tokio::test]
    async fn submit_without_wallet_is_not_connected() {
        let state = connected_state(Arc::new(MockWallet::new(vec![account(1)], 666))).await;
        state.wallet.disconnect();

        let err = submit_score(State(state.clone()), Json(SubmitScoreRequest { score: 184 }))
            .await
            .unwrap_err();

        assert_eq!(err, crate::error::AppError::NotConnected);
        let Json(view) = get_transaction(State(state)).await;
        assert_eq!(view.data.record.status, TxStatus::Idle);
    }
}
