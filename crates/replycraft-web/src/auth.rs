//! Shared-secret authorization via the `x-api-key` header.

use axum::http::HeaderMap;
use tracing::{error, warn};

use crate::error::ReplyError;

/// Header carrying the caller's credential.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Check the caller's `x-api-key` against the configured secret.
///
/// A missing or empty server secret rejects every request.
pub fn authorize(secret: Option<&str>, headers: &HeaderMap) -> Result<(), ReplyError> {
    let Some(secret) = secret.filter(|s| !s.is_empty()) else {
        error!("API secret is not configured, rejecting request");
        return Err(ReplyError::Unauthorized);
    };

    let supplied = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match supplied {
        Some(key) if key == secret => Ok(()),
        Some(_) => {
            warn!("Rejected request with mismatched API key");
            Err(ReplyError::Unauthorized)
        }
        None => {
            warn!("Rejected request without API key");
            Err(ReplyError::Unauthorized)
        }
    }
}
