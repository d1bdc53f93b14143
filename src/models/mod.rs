// src/models/mod.rs
pub mod score;
pub mod transaction;

pub use score::{ScoreLimits, ScoreStats, ScoreValue};
pub use transaction::{TransactionRecord, TxStatus};

use serde::{Deserialize, Serialize};

// ==================== API RESPONSE ====================
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

// ==================== REQUESTS ====================
#[derive(Debug, Deserialize)]
pub struct SubmitScoreRequest {
    pub score: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_response_success_sets_flag() {
        let response = ApiResponse::success("ok");
        assert!(response.success);
        assert_eq!(response.data, "ok");
    }

    #[test]
    fn submit_request_accepts_negative_for_validation() {
        let req: SubmitScoreRequest = serde_json::from_str(r#"{"score": -5}"#).unwrap();
        assert_eq!(req.score, -5);
    }
}
