//! HTTP endpoint handlers.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::HeaderMap;
use replycraft::request::{InputDiagnostics, ReplyResponse};

use crate::client_ip::ClientAddr;
use crate::error::ReplyError;
use crate::gateway::ReplyGateway;

/// POST /api/suggest-reply: generate reply suggestions.
///
/// Requires `x-api-key`. Returns `{"replies": [...]}` on success and one of
/// the fixed error bodies in [`ReplyError`] otherwise.
pub async fn post_suggest_reply(
    State(gateway): State<Arc<ReplyGateway>>,
    ClientAddr(peer): ClientAddr,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ReplyResponse>, ReplyError> {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            // Credentials still take precedence over body problems.
            gateway.authorize(&headers)?;
            return Err(InputDiagnostics::form(rejection.body_text()).into());
        }
    };

    gateway.handle(peer, &headers, &body).await.map(Json)
}
