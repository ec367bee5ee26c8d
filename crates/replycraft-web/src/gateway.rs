//! Request orchestration: authorize, rate limit, validate, generate.
//!
//! The order is fixed. A bad credential is rejected before the body is
//! looked at, and only authorized callers consume rate-limit budget.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use replycraft::GenerationError;
use replycraft::generation::ReplyGenerator;
use replycraft::prompt::ReplyPrompt;
use replycraft::request::{ReplyRequest, ReplyResponse};
use tracing::{debug, info, instrument, warn};

use crate::auth;
use crate::client_ip::resolve_client_id;
use crate::error::ReplyError;
use crate::rate_limit::{RateLimitPolicy, RateLimiter};

/// Shared state behind `POST /api/suggest-reply`.
pub struct ReplyGateway {
    api_secret: Option<String>,
    limiter: RateLimiter,
    prompt: ReplyPrompt,
    generator: Arc<dyn ReplyGenerator>,
    generation_timeout: Duration,
}

impl std::fmt::Debug for ReplyGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyGateway")
            .field("api_secret", &self.api_secret.as_ref().map(|_| "<set>"))
            .field("limiter", &self.limiter)
            .field("generation_timeout", &self.generation_timeout)
            .finish_non_exhaustive()
    }
}

impl ReplyGateway {
    pub fn new(
        api_secret: Option<String>,
        policy: RateLimitPolicy,
        generator: Arc<dyn ReplyGenerator>,
        generation_timeout: Duration,
    ) -> Self {
        Self {
            api_secret,
            limiter: RateLimiter::new(policy),
            prompt: ReplyPrompt::new(),
            generator,
            generation_timeout,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), ReplyError> {
        auth::authorize(self.api_secret.as_deref(), headers)
    }

    pub fn check_rate(&self, client: &str) -> Result<(), ReplyError> {
        self.limiter.check(client).map_err(|limited| {
            warn!(client, "Too many requests");
            ReplyError::RateLimited {
                retry_after: limited.retry_after,
            }
        })
    }

    pub fn validate(&self, body: &[u8]) -> Result<ReplyRequest, ReplyError> {
        ReplyRequest::from_json_slice(body).map_err(|diagnostics| {
            debug!("Rejected invalid input: {diagnostics}");
            ReplyError::InvalidInput(diagnostics)
        })
    }

    /// Render the prompt and await the generator, bounded by the timeout.
    pub async fn generate(&self, request: &ReplyRequest) -> Result<ReplyResponse, ReplyError> {
        let prompt = self.prompt.render(request);
        let start = Instant::now();

        let response = tokio::time::timeout(self.generation_timeout, self.generator.generate(&prompt))
            .await
            .map_err(|_| GenerationError::Timeout(self.generation_timeout))??;

        info!(
            replies = response.replies.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Generated replies"
        );
        Ok(response)
    }

    /// Run the full pipeline for one request.
    #[instrument(skip_all, fields(client = tracing::field::Empty))]
    pub async fn handle(
        &self,
        peer: Option<SocketAddr>,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<ReplyResponse, ReplyError> {
        self.authorize(headers)?;

        let client = resolve_client_id(peer, headers)?;
        tracing::Span::current().record("client", client.as_str());
        self.check_rate(&client)?;

        let request = self.validate(body)?;
        self.generate(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use replycraft::generation::GenerationFuture;
    use replycraft::prompt::RenderedPrompt;
    use std::sync::Mutex;

    struct Canned {
        result: fn() -> Result<ReplyResponse, GenerationError>,
        seen: Mutex<Vec<String>>,
    }

    impl ReplyGenerator for Canned {
        fn generate(&self, prompt: &RenderedPrompt) -> GenerationFuture<'_> {
            self.seen.lock().unwrap().push(prompt.text.clone());
            let result = (self.result)();
            Box::pin(async move { result })
        }
    }

    fn gateway(result: fn() -> Result<ReplyResponse, GenerationError>) -> (ReplyGateway, Arc<Canned>) {
        let generator = Arc::new(Canned {
            result,
            seen: Mutex::new(Vec::new()),
        });
        let gateway = ReplyGateway::new(
            Some("s3cret".into()),
            RateLimitPolicy::default(),
            generator.clone(),
            Duration::from_secs(5),
        );
        (gateway, generator)
    }

    fn ok_replies() -> Result<ReplyResponse, GenerationError> {
        Ok(ReplyResponse {
            replies: vec!["sure".into()],
        })
    }

    fn authed() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("s3cret"));
        headers
    }

    fn peer() -> Option<SocketAddr> {
        Some("192.0.2.1:4000".parse().unwrap())
    }

    #[tokio::test]
    async fn happy_path_returns_generator_output() {
        let (gateway, generator) = gateway(ok_replies);
        let resp = gateway
            .handle(peer(), &authed(), br#"{"message": "hey"}"#)
            .await
            .unwrap();
        assert_eq!(resp.replies, ["sure"]);
        assert!(generator.seen.lock().unwrap()[0].contains("hey"));
    }

    #[tokio::test]
    async fn auth_checked_before_body() {
        let (gateway, generator) = gateway(ok_replies);
        let err = gateway
            .handle(peer(), &HeaderMap::new(), b"not json")
            .await
            .unwrap_err();
        assert!(matches!(err, ReplyError::Unauthorized));
        assert!(generator.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unauthorized_requests_do_not_consume_budget() {
        let (gateway, _) = gateway(ok_replies);
        for _ in 0..20 {
            let _ = gateway.handle(peer(), &HeaderMap::new(), b"{}").await;
        }
        assert_eq!(gateway.limiter().tracked_clients(), 0);
    }

    #[tokio::test]
    async fn invalid_body_with_valid_key_is_invalid_input() {
        let (gateway, generator) = gateway(ok_replies);
        let err = gateway
            .handle(peer(), &authed(), br#"{"message": ""}"#)
            .await
            .unwrap_err();
        let diagnostics = match err {
            ReplyError::InvalidInput(d) => d,
            other => panic!("expected InvalidInput, got {other:?}"),
        };
        assert_eq!(
            diagnostics.field_messages("message"),
            ["Message cannot be empty."]
        );
        assert!(generator.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unidentifiable_client_rejected() {
        let (gateway, _) = gateway(ok_replies);
        let err = gateway
            .handle(None, &authed(), br#"{"message": "hey"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, ReplyError::ClientUnidentifiable));
    }

    #[tokio::test]
    async fn generator_failure_is_upstream() {
        let (gateway, _) = gateway(|| Err(GenerationError::EmptyResponse));
        let err = gateway
            .handle(peer(), &authed(), br#"{"message": "hey"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, ReplyError::Upstream(GenerationError::EmptyResponse)));
    }

    #[tokio::test]
    async fn slow_generator_times_out() {
        struct Stalled;
        impl ReplyGenerator for Stalled {
            fn generate(&self, _prompt: &RenderedPrompt) -> GenerationFuture<'_> {
                Box::pin(async {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    ok_replies()
                })
            }
        }

        let gateway = ReplyGateway::new(
            Some("s3cret".into()),
            RateLimitPolicy::default(),
            Arc::new(Stalled),
            Duration::from_millis(50),
        );
        let err = gateway
            .generate(&ReplyRequest::new("hey"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReplyError::Upstream(GenerationError::Timeout(d)) if d == Duration::from_millis(50)
        ));
    }
}
