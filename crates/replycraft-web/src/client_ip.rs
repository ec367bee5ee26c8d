//! Client identity for rate limiting.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::request::Parts;

use crate::error::ReplyError;

pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Peer address of the connection, if the server was started with connect
/// info. Never rejects.
#[derive(Debug, Clone, Copy)]
pub struct ClientAddr(pub Option<SocketAddr>);

impl<S> FromRequestParts<S> for ClientAddr
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(Self(peer))
    }
}

/// Derive the rate-limit key for a request.
///
/// Prefers the observed peer IP. Falls back to the first entry of
/// `X-Forwarded-For`. Behind a reverse proxy every peer is the proxy itself,
/// so such deployments should strip connect info or terminate at a proxy that
/// rewrites the header.
pub fn resolve_client_id(peer: Option<SocketAddr>, headers: &HeaderMap) -> Result<String, ReplyError> {
    if let Some(addr) = peer {
        return Ok(addr.ip().to_string());
    }

    headers
        .get(FORWARDED_FOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty())
        .map(str::to_string)
        .ok_or(ReplyError::ClientUnidentifiable)
}
