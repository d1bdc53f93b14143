use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("No wallet provider available")]
    ProviderMissing,

    #[error("User rejected the request: {0}")]
    UserRejected(String),

    #[error("Network switch failed: {0}")]
    NetworkSwitchFailed(String),

    #[error("Wallet not connected")]
    NotConnected,

    #[error("A score submission is already in progress")]
    SubmissionInProgress,

    #[error("Invalid score: {0}")]
    InvalidScore(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ProviderMissing => "PROVIDER_MISSING",
            AppError::UserRejected(_) => "USER_REJECTED",
            AppError::NetworkSwitchFailed(_) => "NETWORK_SWITCH_FAILED",
            AppError::NotConnected => "NOT_CONNECTED",
            AppError::SubmissionInProgress => "SUBMISSION_IN_PROGRESS",
            AppError::InvalidScore(_) => "INVALID_SCORE",
            AppError::TransactionFailed(_) => "TRANSACTION_FAILED",
            AppError::TransportError(_) => "TRANSPORT_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::ProviderMissing => StatusCode::SERVICE_UNAVAILABLE,
            AppError::UserRejected(_) => StatusCode::FORBIDDEN,
            AppError::NetworkSwitchFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::NotConnected => StatusCode::UNAUTHORIZED,
            AppError::SubmissionInProgress => StatusCode::CONFLICT,
            AppError::InvalidScore(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::TransactionFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::TransportError(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
                details: None,
            },
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        // Error codes are part of the API contract read by the game UI
        assert_eq!(AppError::ProviderMissing.code(), "PROVIDER_MISSING");
        assert_eq!(AppError::NotConnected.code(), "NOT_CONNECTED");
        assert_eq!(
            AppError::SubmissionInProgress.code(),
            "SUBMISSION_IN_PROGRESS"
        );
    }

    #[test]
    fn into_response_maps_status() {
        let response = AppError::SubmissionInProgress.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = AppError::UserRejected("denied".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
