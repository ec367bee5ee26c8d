//! Errors raised while talking to the generation service.

use std::time::Duration;

use thiserror::Error;

/// Failure of a single generation call.
///
/// The `Display` text may include upstream payloads. It is meant for
/// server-side logs, never for a client response.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("generation API HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("generation API error: {0}")]
    Api(String),

    #[error("generation API returned no content")]
    EmptyResponse,

    #[error("completion is not valid JSON: {0}")]
    Malformed(String),

    #[error("completion does not match the output schema: {0}")]
    NonConforming(String),

    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_detail_for_logs() {
        let err = GenerationError::Http {
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(err.to_string(), "generation API HTTP 502: bad gateway");
    }

    #[test]
    fn timeout_display_names_the_bound() {
        let err = GenerationError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "generation timed out after 30s");
    }
}
