//! HTTP mapping of the error taxonomy
//!
//! Each [`IndexError`] kind maps to a status code and produces a JSON body
//! `{"error": kind, "message": text}`. The taxonomy kind is always present,
//! so clients never have to parse prose to tell a missing collection from a
//! broken service.

use crate::error::IndexError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper that lets store errors flow out of handlers via `?`
#[derive(Debug)]
pub struct ApiError(pub IndexError);

impl From<IndexError> for ApiError {
    fn from(err: IndexError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            IndexError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            IndexError::NotFound(_) => StatusCode::NOT_FOUND,
            IndexError::DeadlineExceeded(_) => StatusCode::REQUEST_TIMEOUT,
            IndexError::BuildFailure { .. }
            | IndexError::Persistence { .. }
            | IndexError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {}", self.0);
        }

        let body = axum::Json(json!({
            "error": self.0.kind(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
