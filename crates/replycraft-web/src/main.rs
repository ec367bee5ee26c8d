//! Reply suggestion gateway server.
//!
//! Serves `POST /api/suggest-reply`, backed by OpenRouter.
//!
//! # Usage
//!
//! ```bash
//! API_ROUTE_SECRET=... OPENROUTER_KEY=sk-... cargo run -p replycraft-web
//! API_ROUTE_SECRET=... OPENROUTER_KEY=sk-... cargo run -p replycraft-web -- --port 8080
//! ```
//!
//! ```bash
//! curl -X POST http://127.0.0.1:3001/api/suggest-reply \
//!   -H "x-api-key: $API_ROUTE_SECRET" -H "content-type: application/json" \
//!   -d '{"message": "hey what'"'"'s up", "tone": "funny"}'
//! ```

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use replycraft::prelude::*;
use replycraft_web::{RateLimitPolicy, WebConfig, spawn_web};
use tracing::{Level, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Reply suggestion gateway.
#[derive(Parser)]
#[command(about = "HTTP gateway for context-aware reply suggestions")]
struct Args {
    /// Interface to bind.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: IpAddr,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3001)]
    port: u16,

    /// Shared secret callers must send in `x-api-key`. Without it every
    /// request is rejected.
    #[arg(long, env = "API_ROUTE_SECRET", hide_env_values = true)]
    api_secret: Option<String>,

    /// OpenRouter API key.
    #[arg(long, env = "OPENROUTER_KEY", hide_env_values = true)]
    openrouter_key: String,

    /// LLM model to use.
    #[arg(long, env = "REPLYCRAFT_MODEL", default_value = replycraft::DEFAULT_MODEL)]
    model: String,

    /// Requests allowed per client per window.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    rate_limit: u32,

    /// Rate-limit window length in seconds.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    rate_window_secs: u64,

    /// Upper bound on one generation call, in seconds.
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: u64,

    /// Log verbosity (error, warn, info, debug, trace).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(LevelFilter::from_level(args.log_level))
        .init();

    let timeout = Duration::from_secs(args.timeout_secs);

    // Outlasts the gateway timeout, which fires first.
    let client = OpenRouterClient::with_timeout(args.openrouter_key, timeout + Duration::from_secs(5))
        .map_err(|e| e.to_string())?;
    let generator = OpenRouterGenerator::new(
        client,
        GeneratorConfig {
            model: args.model.clone(),
            ..Default::default()
        },
    );

    let config = WebConfig {
        bind_addr: SocketAddr::new(args.host, args.port),
        api_secret: args.api_secret,
        rate_limit: RateLimitPolicy {
            max_requests: args.rate_limit as usize,
            window: Duration::from_secs(args.rate_window_secs),
        },
        generation_timeout: timeout,
        ..Default::default()
    };

    let addr = spawn_web(config, Arc::new(generator))
        .await
        .map_err(|e| format!("failed to bind: {e}"))?;
    info!(model = %args.model, "Listening on http://{addr}/api/suggest-reply");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("failed to wait for shutdown signal: {e}"))?;
    info!("Shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Args, clap::Error> {
        let mut argv = vec!["replycraft-web", "--openrouter-key", "sk-test"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv)
    }

    #[test]
    fn defaults_match_documented_limits() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.rate_limit, 10);
        assert_eq!(args.rate_window_secs, 60);
        assert_eq!(args.timeout_secs, 30);
    }

    #[test]
    fn zero_window_rejected() {
        assert!(parse(&["--rate-window-secs", "0"]).is_err());
        assert_eq!(parse(&["--rate-window-secs", "1"]).unwrap().rate_window_secs, 1);
    }

    #[test]
    fn zero_limit_and_timeout_rejected() {
        assert!(parse(&["--rate-limit", "0"]).is_err());
        assert!(parse(&["--timeout-secs", "0"]).is_err());
    }
}
