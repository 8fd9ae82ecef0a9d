//! HTTP mapping for the error taxonomy.
//!
//! Each error kind maps to one status code and a stable
//! `{error, message}` JSON payload. Internal failures are logged with their
//! cause and returned as an opaque 500; nothing from the database layer
//! reaches the client.

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Validation { .. } | Error::BudgetPercentageExceeded { .. } => {
                StatusCode::BAD_REQUEST
            }
            Error::Authentication { .. } => StatusCode::UNAUTHORIZED,
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::DuplicateCategoryName { .. }
            | Error::InvalidStatusTransition { .. }
            | Error::CannotUpdatePaidPayment
            | Error::PaymentAlreadySettled { .. }
            | Error::InsufficientRemainingIncome { .. } => StatusCode::CONFLICT,
            Error::Config { .. } | Error::Database(_) | Error::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(json!({ "error": self.code(), "message": message })),
        )
            .into_response()
    }
}
