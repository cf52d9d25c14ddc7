//! Rate limiting middleware with per-method tiers.
//!
//! Each identifier (client IP) owns a log of request instants. A request is
//! admitted if, after discarding instants older than the window, fewer than
//! `max_requests` remain; the admitted instant is then recorded. A rejected
//! attempt is never recorded, so hammering a limit does not extend it.
//!
//! Mutating requests (POST/PUT/PATCH/DELETE) are checked against a strict
//! limiter, everything else against a lenient one. The two limiters are
//! fully independent.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;

use crate::config::RateLimitConfig;
use crate::http::error::ApiError;
use crate::observability::metrics;

/// Sliding-log request counter keyed by identifier.
///
/// The map is sharded (dashmap), so concurrent requests from unrelated
/// identifiers never contend on one lock, while the shard guard held across
/// purge/check/append makes the decision atomic per identifier: two
/// simultaneous requests at the boundary of the limit cannot both take the
/// last slot.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    log: DashMap<String, Vec<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: max_requests as usize,
            window,
            log: DashMap::new(),
        }
    }

    /// Decide whether a request from `identifier` at `now` is admitted.
    ///
    /// Admission records `now` into the identifier's log; rejection leaves
    /// the log untouched.
    pub fn is_allowed(&self, identifier: &str, now: Instant) -> bool {
        let mut entry = self.log.entry(identifier.to_string()).or_default();

        // Instants at or before `now - window` have left the trailing window.
        let cutoff = now.checked_sub(self.window);
        if let Some(cutoff) = cutoff {
            entry.retain(|&instant| instant > cutoff);
        }

        if entry.len() >= self.max_requests {
            return false;
        }

        entry.push(now);
        true
    }

    /// Window length in whole seconds, used as the Retry-After hint.
    pub fn window_seconds(&self) -> u64 {
        self.window.as_secs()
    }

    /// Evict identifiers whose logs are empty after purging.
    ///
    /// Without this the identifier map grows with every distinct client the
    /// process ever sees.
    pub fn sweep(&self, now: Instant) {
        let cutoff = now.checked_sub(self.window);
        self.log.retain(|_, log| {
            if let Some(cutoff) = cutoff {
                log.retain(|&instant| instant > cutoff);
            }
            !log.is_empty()
        });
    }

    /// Number of identifiers currently tracked.
    pub fn tracked_identifiers(&self) -> usize {
        self.log.len()
    }
}

/// Shared state for the rate-limit middleware: one limiter per tier.
pub struct RateLimiterState {
    pub read: RateLimiter,
    pub write: RateLimiter,
    enabled: bool,
}

impl RateLimiterState {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            read: RateLimiter::new(
                config.read_max_requests,
                Duration::from_secs(config.read_window_secs),
            ),
            write: RateLimiter::new(
                config.write_max_requests,
                Duration::from_secs(config.write_window_secs),
            ),
            enabled: config.enabled,
        }
    }

    /// Pick the limiter for an HTTP method: mutations get the strict tier.
    fn limiter_for(&self, method: &Method) -> (&RateLimiter, &'static str) {
        match *method {
            Method::POST | Method::PUT | Method::PATCH | Method::DELETE => (&self.write, "strict"),
            _ => (&self.read, "standard"),
        }
    }

    /// Run both sweeps.
    pub fn sweep(&self, now: Instant) {
        self.read.sweep(now);
        self.write.sweep(now);
    }
}

/// Middleware: consult the limiter before any handler runs.
///
/// Rejection short-circuits with 429 and a Retry-After hint; downstream
/// stages and the handler are skipped entirely.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<RateLimiterState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.enabled {
        return next.run(request).await;
    }

    let identifier = addr.ip().to_string();
    let (limiter, tier) = state.limiter_for(request.method());

    if limiter.is_allowed(&identifier, Instant::now()) {
        next.run(request).await
    } else {
        tracing::warn!(client = %identifier, tier = tier, "Rate limit exceeded");
        metrics::record_rate_limited(tier);
        ApiError::RateLimited {
            retry_after: limiter.window_seconds(),
        }
        .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(max, Duration::from_secs(window_secs))
    }

    #[test]
    fn admits_up_to_cap_then_rejects() {
        let rl = limiter(3, 60);
        let now = Instant::now();
        for _ in 0..3 {
            assert!(rl.is_allowed("10.0.0.1", now));
        }
        assert!(!rl.is_allowed("10.0.0.1", now));
    }

    #[test]
    fn capacity_returns_after_window() {
        let rl = limiter(2, 60);
        let start = Instant::now();
        assert!(rl.is_allowed("10.0.0.1", start));
        assert!(rl.is_allowed("10.0.0.1", start));
        assert!(!rl.is_allowed("10.0.0.1", start));

        // One second past the window, both slots are free again.
        let later = start + Duration::from_secs(61);
        assert!(rl.is_allowed("10.0.0.1", later));
        assert!(rl.is_allowed("10.0.0.1", later));
        assert!(!rl.is_allowed("10.0.0.1", later));
    }

    #[test]
    fn identifiers_do_not_interfere() {
        let rl = limiter(1, 60);
        let now = Instant::now();
        assert!(rl.is_allowed("10.0.0.1", now));
        assert!(!rl.is_allowed("10.0.0.1", now));
        assert!(rl.is_allowed("10.0.0.2", now));
    }

    #[test]
    fn rejected_attempts_are_not_counted() {
        let rl = limiter(2, 60);
        let start = Instant::now();
        assert!(rl.is_allowed("10.0.0.1", start));
        assert!(rl.is_allowed("10.0.0.1", start));

        // Hammer the limit mid-window; these must not push the window out.
        let mid = start + Duration::from_secs(30);
        for _ in 0..10 {
            assert!(!rl.is_allowed("10.0.0.1", mid));
        }

        // The two admitted instants expire on the original schedule.
        let later = start + Duration::from_secs(61);
        assert!(rl.is_allowed("10.0.0.1", later));
    }

    #[test]
    fn partial_window_frees_partial_capacity() {
        let rl = limiter(2, 60);
        let start = Instant::now();
        assert!(rl.is_allowed("10.0.0.1", start));
        assert!(rl.is_allowed("10.0.0.1", start + Duration::from_secs(30)));

        // At t=61 only the first instant has aged out: one slot.
        let t = start + Duration::from_secs(61);
        assert!(rl.is_allowed("10.0.0.1", t));
        assert!(!rl.is_allowed("10.0.0.1", t));
    }

    #[test]
    fn sweep_evicts_only_idle_identifiers() {
        let rl = limiter(5, 60);
        let start = Instant::now();
        assert!(rl.is_allowed("idle", start));
        assert!(rl.is_allowed("active", start + Duration::from_secs(50)));
        assert_eq!(rl.tracked_identifiers(), 2);

        rl.sweep(start + Duration::from_secs(70));
        assert_eq!(rl.tracked_identifiers(), 1);

        // "active" still has its instant; "idle" was dropped entirely.
        assert!(rl.is_allowed("active", start + Duration::from_secs(70)));
    }

    #[test]
    fn tiers_are_independent() {
        let state = RateLimiterState::new(&RateLimitConfig {
            enabled: true,
            read_max_requests: 5,
            read_window_secs: 60,
            write_max_requests: 1,
            write_window_secs: 60,
            sweep_interval_secs: 300,
        });
        let now = Instant::now();

        assert!(state.write.is_allowed("10.0.0.1", now));
        assert!(!state.write.is_allowed("10.0.0.1", now));
        // Exhausting the strict tier leaves the lenient tier untouched.
        for _ in 0..5 {
            assert!(state.read.is_allowed("10.0.0.1", now));
        }
        assert!(!state.read.is_allowed("10.0.0.1", now));
    }

    #[test]
    fn method_selects_tier() {
        let state = RateLimiterState::new(&RateLimitConfig::default());
        assert_eq!(state.limiter_for(&Method::GET).1, "standard");
        assert_eq!(state.limiter_for(&Method::HEAD).1, "standard");
        assert_eq!(state.limiter_for(&Method::POST).1, "strict");
        assert_eq!(state.limiter_for(&Method::PUT).1, "strict");
        assert_eq!(state.limiter_for(&Method::DELETE).1, "strict");
    }
}
