//! Per-client sliding-window rate limiting.
//!
//! Each client key maps to the timestamps of its recent accepted requests.
//! A request is accepted when fewer than `max_requests` timestamps fall
//! inside the trailing window. Check and record happen under one lock, so
//! concurrent requests from the same client cannot both take the last slot.
//!
//! State is process-local and lost on restart.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

/// Limit applied to every client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Accepted requests allowed per window. Default: `10`.
    pub max_requests: usize,
    /// Length of the trailing window. Default: 60 s. A zero window admits
    /// everything.
    pub window: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

/// Returned when a client is over its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimited {
    /// Time until the oldest counted request leaves the window.
    pub retry_after: Duration,
}

/// In-memory sliding-window limiter keyed by client identifier.
#[derive(Debug)]
pub struct RateLimiter {
    policy: RateLimitPolicy,
    clients: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// Check `client` against the limit and record the request if accepted.
    pub fn check(&self, client: &str) -> Result<(), RateLimited> {
        self.check_at(client, Instant::now())
    }

    /// [`check`](Self::check) with an explicit clock reading.
    ///
    /// Rejected requests are not recorded.
    pub fn check_at(&self, client: &str, now: Instant) -> Result<(), RateLimited> {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        let window = self.policy.window;

        let stamps = clients.entry(client.to_string()).or_default();
        prune_window(stamps, now, window);

        if stamps.len() >= self.policy.max_requests {
            let retry_after = stamps
                .front()
                .map(|oldest| window.saturating_sub(now.saturating_duration_since(*oldest)))
                .unwrap_or(window);
            debug!(client, count = stamps.len(), "Rate limit exceeded");
            return Err(RateLimited { retry_after });
        }

        stamps.push_back(now);
        Ok(())
    }

    /// Drop clients with no timestamps left inside the window.
    ///
    /// Returns the number of entries removed.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        let window = self.policy.window;
        let before = clients.len();
        clients.retain(|_, stamps| {
            prune_window(stamps, now, window);
            !stamps.is_empty()
        });
        before - clients.len()
    }

    /// Number of clients currently holding state.
    pub fn tracked_clients(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

fn prune_window(stamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(front) = stamps.front() {
        if now.saturating_duration_since(*front) >= window {
            stamps.pop_front();
        } else {
            break;
        }
    }
}
