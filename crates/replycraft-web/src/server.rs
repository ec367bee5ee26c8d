//! Axum server setup and router construction.

use std::any::Any;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use axum::Router;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use tokio::task::JoinHandle;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};
use tracing::{debug, error};

use crate::api;
use crate::error::ReplyError;
use crate::gateway::ReplyGateway;

/// Build the full axum router.
pub fn build_router(gateway: Arc<ReplyGateway>) -> Router {
    // Browser extensions and the web app call from other origins.
    let cors = CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods(cors::Any)
        .allow_headers(cors::Any);

    Router::new()
        .route("/api/suggest-reply", post(api::post_suggest_reply))
        .with_state(gateway)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
}

/// A panicking handler answers with the generic 500 body.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    };
    ReplyError::Internal(format!("handler panicked: {detail}")).into_response()
}


/// Bind, start serving on a Tokio task, and return the bound address.
///
/// The peer address of each connection is exposed to handlers for rate
/// limiting.
pub async fn start_server(router: Router, bind_addr: SocketAddr) -> io::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        let service = router.into_make_service_with_connect_info::<SocketAddr>();
        if let Err(e) = axum::serve(listener, service).await {
            error!("Server stopped: {e}");
        }
    });

    Ok(addr)
}

/// Periodically evict idle rate-limit entries.
///
/// Stops once the gateway has been dropped.
pub fn spawn_sweeper(gateway: &Arc<ReplyGateway>, every: Duration) -> JoinHandle<()> {
    let gateway: Weak<ReplyGateway> = Arc::downgrade(gateway);
    let every = every.max(Duration::from_secs(1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(gateway) = gateway.upgrade() else {
                break;
            };
            let removed = gateway.limiter().evict_idle(Instant::now());
            if removed > 0 {
                debug!(
                    removed,
                    remaining = gateway.limiter().tracked_clients(),
                    "Evicted idle rate-limit entries"
                );
            }
        }
    })
}
