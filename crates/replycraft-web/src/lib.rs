//! HTTP gateway for `replycraft` reply suggestions.
//!
//! `replycraft-web` exposes a single endpoint, `POST /api/suggest-reply`,
//! that checks a shared-secret header, applies a per-client sliding-window
//! rate limit, validates the body, and forwards a rendered prompt to a
//! [`ReplyGenerator`].
//!
//! # Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use replycraft::prelude::*;
//! use replycraft_web::{WebConfig, spawn_web};
//!
//! let generator = OpenRouterGenerator::new(
//!     OpenRouterClient::new(openrouter_key)?,
//!     GeneratorConfig::default(),
//! );
//! let config = WebConfig {
//!     api_secret: Some(std::env::var("API_ROUTE_SECRET")?),
//!     ..Default::default()
//! };
//! let addr = spawn_web(config, Arc::new(generator)).await?;
//! println!("Listening on http://{addr}");
//! ```
//!
//! # Request flow
//!
//! ```text
//! x-api-key ──▶ authorize ──▶ client id ──▶ rate limit ──▶ validate ──▶ generate
//!                  401            400           429           400          500
//! ```
//!
//! Failures are mapped to fixed JSON bodies by [`ReplyError`]. Only
//! validation failures carry detail; everything else is opaque to the caller
//! and logged server-side.

mod api;
pub mod auth;
pub mod client_ip;
pub mod error;
pub mod gateway;
pub mod rate_limit;
mod server;

pub use error::ReplyError;
pub use gateway::ReplyGateway;
pub use rate_limit::{RateLimitPolicy, RateLimiter};

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use replycraft::generation::ReplyGenerator;
use tracing::warn;

/// Configuration for the web server.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Address to bind to. Default: `127.0.0.1:3001`.
    pub bind_addr: SocketAddr,
    /// Value callers must send in `x-api-key`. `None` rejects every request.
    pub api_secret: Option<String>,
    /// Per-client limit. Default: 10 requests per 60 s.
    pub rate_limit: RateLimitPolicy,
    /// Upper bound on a single generation call. Default: 30 s.
    pub generation_timeout: Duration,
    /// How often idle rate-limit entries are evicted. Default: 5 min.
    pub sweep_interval: Duration,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            api_secret: None,
            rate_limit: RateLimitPolicy::default(),
            generation_timeout: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(300),
        }
    }
}

/// Spawn the web server on a Tokio task.
///
/// Returns the bound address. The server and its idle-entry sweeper run
/// until the Tokio runtime shuts down.
pub async fn spawn_web(
    config: WebConfig,
    generator: Arc<dyn ReplyGenerator>,
) -> io::Result<SocketAddr> {
    if config.api_secret.as_deref().is_none_or(str::is_empty) {
        warn!("No API secret configured; every request will be rejected with 401");
    }

    let gateway = Arc::new(ReplyGateway::new(
        config.api_secret,
        config.rate_limit,
        generator,
        config.generation_timeout,
    ));
    server::spawn_sweeper(&gateway, config.sweep_interval);

    let router = server::build_router(gateway);
    server::start_server(router, config.bind_addr).await
}
