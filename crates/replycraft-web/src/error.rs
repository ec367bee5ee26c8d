//! Gateway failure taxonomy and its HTTP mapping.

use std::time::Duration;

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use replycraft::GenerationError;
use replycraft::request::InputDiagnostics;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Message returned for upstream and internal failures.
pub const GENERIC_FAILURE: &str = "Failed to generate replies. Please try again later.";

/// Every way a suggest-reply request can fail.
///
/// `Display` is for server logs. What the caller sees is decided by
/// [`IntoResponse`], which never includes upstream text.
#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("no client address available for rate limiting")]
    ClientUnidentifiable,

    #[error("invalid input: {0}")]
    InvalidInput(InputDiagnostics),

    #[error("upstream failure: {0}")]
    Upstream(#[from] GenerationError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ReplyError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::ClientUnidentifiable | Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<InputDiagnostics> for ReplyError {
    fn from(diagnostics: InputDiagnostics) -> Self {
        Self::InvalidInput(diagnostics)
    }
}

impl IntoResponse for ReplyError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Unauthorized => (status, Json(json!({"error": "Unauthorized"}))).into_response(),
            Self::RateLimited { retry_after } => {
                let mut response =
                    (status, Json(json!({"error": "Too Many Requests"}))).into_response();
                // Round up so a client waiting the advertised time is admitted.
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(secs.max(1)));
                response
            }
            Self::ClientUnidentifiable => (
                status,
                Json(json!({"error": "Could not determine client IP address."})),
            )
                .into_response(),
            Self::InvalidInput(details) => (
                status,
                Json(json!({"error": "Invalid input", "details": details})),
            )
                .into_response(),
            Self::Upstream(err) => {
                error!("Reply generation failed: {err}");
                (status, Json(json!({"error": GENERIC_FAILURE}))).into_response()
            }
            Self::Internal(msg) => {
                error!("Internal error: {msg}");
                (status, Json(json!({"error": GENERIC_FAILURE}))).into_response()
            }
        }
    }
}
