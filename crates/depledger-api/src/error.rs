//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Ledger errors are mapped by class:
//!
//! | Class | Status |
//! |---|---|
//! | Authorization | 403 |
//! | State | 409 |
//! | Integrity | 404 for unknown tokens and repositories, otherwise 422 |
//! | Value | 402 for insufficient funds, otherwise 422 |
//! | Internal | 500 |
//!
//! Malformed request bodies and path parameters are 400.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use depledger_state::{ErrorClass, LedgerError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// The single error this response reports.
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_LISTED", "BAD_REQUEST").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Ledger error class, present only for ledger rejections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<ErrorClass>,
}

/// Application-level error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body or path could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The ledger refused the operation.
    #[error("{0}")]
    Ledger(#[from] LedgerError),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Ledger(err) => (ledger_status(err), err.code()),
        }
    }
}

fn ledger_status(err: &LedgerError) -> StatusCode {
    match (err.class(), err) {
        (ErrorClass::Authorization, _) => StatusCode::FORBIDDEN,
        (ErrorClass::State, _) => StatusCode::CONFLICT,
        (
            ErrorClass::Integrity,
            LedgerError::UnknownToken { .. } | LedgerError::UnknownRepository { .. },
        ) => StatusCode::NOT_FOUND,
        (ErrorClass::Integrity, _) => StatusCode::UNPROCESSABLE_ENTITY,
        (ErrorClass::Value, LedgerError::InsufficientFunds { .. }) => StatusCode::PAYMENT_REQUIRED,
        (ErrorClass::Value, _) => StatusCode::UNPROCESSABLE_ENTITY,
        (ErrorClass::Internal, _) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let internal = status == StatusCode::INTERNAL_SERVER_ERROR;

        if internal {
            tracing::error!(error = %self, "internal server error");
        }
        let message = if internal {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };
        let class = match &self {
            Self::Ledger(err) if !internal => Some(err.class()),
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                class,
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depledger_core::{AccountId, Amount, RepositoryId, TokenRef};
    use depledger_state::JournalError;
    use http_body_util::BodyExt;

    fn token() -> TokenRef {
        TokenRef::new(RepositoryId::from_bytes([1; 20]), 1)
    }

    fn status(err: LedgerError) -> StatusCode {
        AppError::from(err).status_and_code().0
    }

    #[test]
    fn test_ledger_classes_map_to_statuses() {
        let account = AccountId::from_bytes([2; 20]);
        assert_eq!(status(LedgerError::NotRegistered { account }), StatusCode::FORBIDDEN);
        assert_eq!(status(LedgerError::NotListed { token: token() }), StatusCode::CONFLICT);
        assert_eq!(status(LedgerError::UnknownToken { token: token() }), StatusCode::NOT_FOUND);
        assert_eq!(
            status(LedgerError::DanglingReference { target: token() }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status(LedgerError::InvalidPrice), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            status(LedgerError::InsufficientFunds {
                account,
                balance: Amount::ZERO,
                required: Amount::from_whole(1),
            }),
            StatusCode::PAYMENT_REQUIRED
        );
    }

    #[test]
    fn test_bad_request_status_code() {
        let (status, code) = AppError::BadRequest("malformed JSON".into()).status_and_code();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "BAD_REQUEST");
    }

    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn test_into_response_ledger_error_carries_class() {
        let (status, body) =
            response_parts(AppError::from(LedgerError::AlreadyListed { token: token() })).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.error.code, "ALREADY_LISTED");
        assert_eq!(body.error.class, Some(ErrorClass::State));
        assert!(body.error.message.contains("already listed"));
    }

    #[tokio::test]
    async fn test_into_response_internal_hides_details() {
        let broken = JournalError::BrokenLink { sequence: 3 };
        let (status, body) = response_parts(AppError::from(LedgerError::from(broken))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.code, "JOURNAL_ERROR");
        assert_eq!(body.error.message, "An internal error occurred");
        assert!(body.error.class.is_none());
    }

    #[test]
    fn test_error_body_omits_absent_class() {
        let body = ErrorBody {
            error: ErrorDetail {
                code: "BAD_REQUEST".into(),
                message: "missing".into(),
                class: None,
            },
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("class"));
    }
}
