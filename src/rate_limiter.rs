// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Request Rate Limiter
 * Per-target token bucket with backoff when the target answers 429/503,
 * plus a clock of the time callers spent throttled
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorRateLimiter,
};
use nonzero_ext::*;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

type DirectLimiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Requests per minute allowed against a single host
    pub requests_per_minute: u32,

    /// Requests allowed back to back before pacing starts; defaults to the
    /// per-minute quota
    pub burst: Option<u32>,

    /// Pause after the target reports 429
    pub throttled_backoff: Duration,

    /// Pause after the target reports 503
    pub unavailable_backoff: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            burst: None,
            throttled_backoff: Duration::from_secs(2),
            unavailable_backoff: Duration::from_secs(5),
        }
    }
}

impl RateLimiterConfig {
    pub fn per_minute(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            ..Default::default()
        }
    }
}

#[derive(Debug)]
struct TargetState {
    limiter: Arc<DirectLimiter>,
    rate_limit_count: u32,
}

impl TargetState {
    fn new(config: &RateLimiterConfig) -> Self {
        let rate = NonZeroU32::new(config.requests_per_minute).unwrap_or(nonzero!(1u32));
        let burst = config.burst.and_then(NonZeroU32::new).unwrap_or(rate);

        Self {
            limiter: Arc::new(GovernorRateLimiter::direct(
                Quota::per_minute(rate).allow_burst(burst),
            )),
            rate_limit_count: 0,
        }
    }
}

/// Rate limiter keyed by target host
pub struct TargetRateLimiter {
    config: RateLimiterConfig,
    targets: RwLock<HashMap<String, TargetState>>,
}

impl TargetRateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        info!(
            "Initialized rate limiter: {} req/min per target",
            config.requests_per_minute
        );

        Self {
            config,
            targets: RwLock::new(HashMap::new()),
        }
    }

    fn extract_host(url: &str) -> String {
        Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Wait until the target's bucket has a token
    pub async fn wait_for_slot(&self, url: &str) {
        let host = Self::extract_host(url);

        let limiter = {
            let mut targets = self.targets.write().await;
            let state = targets
                .entry(host)
                .or_insert_with(|| TargetState::new(&self.config));
            Arc::clone(&state.limiter)
        };

        limiter.until_ready().await;
    }

    /// Note a throttling response from the target and back off
    pub async fn record_rate_limit(&self, url: &str, status_code: u16) {
        let host = Self::extract_host(url);

        {
            let mut targets = self.targets.write().await;
            let state = targets
                .entry(host.clone())
                .or_insert_with(|| TargetState::new(&self.config));
            state.rate_limit_count += 1;
            warn!(
                "Rate limited by {} (HTTP {}), {} times so far",
                host, status_code, state.rate_limit_count
            );
        }

        let backoff = match status_code {
            503 => self.config.unavailable_backoff,
            _ => self.config.throttled_backoff,
        };
        debug!("Backing off {:?} for {}", backoff, host);
        tokio::time::sleep(backoff).await;
    }

    pub async fn rate_limit_count(&self, url: &str) -> u32 {
        let host = Self::extract_host(url);
        self.targets
            .read()
            .await
            .get(&host)
            .map(|s| s.rate_limit_count)
            .unwrap_or(0)
    }
}

#[derive(Debug, Default)]
struct ThrottleState {
    waiters: usize,
    since: Option<Instant>,
    accumulated: Duration,
}

/// Wall time spent inside the limiter by a group of requests.
///
/// Overlapping waits from concurrent requests are counted once, so the
/// total never exceeds the elapsed time of the group.
#[derive(Debug, Clone, Default)]
pub struct ThrottleClock {
    state: Arc<Mutex<ThrottleState>>,
}

impl ThrottleClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a throttled span; it ends when the guard drops
    pub fn enter(&self) -> ThrottleGuard {
        let mut state = self.state.lock();
        if state.waiters == 0 {
            state.since = Some(Instant::now());
        }
        state.waiters += 1;
        ThrottleGuard {
            clock: self.clone(),
        }
    }

    pub fn waited(&self) -> Duration {
        let state = self.state.lock();
        state.accumulated + state.since.map(|since| since.elapsed()).unwrap_or_default()
    }

    pub fn is_throttled(&self) -> bool {
        self.state.lock().waiters > 0
    }
}

pub struct ThrottleGuard {
    clock: ThrottleClock,
}

impl Drop for ThrottleGuard {
    fn drop(&mut self) {
        let mut state = self.clock.state.lock();
        state.waiters = state.waiters.saturating_sub(1);
        if state.waiters == 0 {
            if let Some(since) = state.since.take() {
                state.accumulated += since.elapsed();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config(requests_per_minute: u32) -> RateLimiterConfig {
        RateLimiterConfig {
            requests_per_minute,
            burst: None,
            throttled_backoff: Duration::ZERO,
            unavailable_backoff: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_burst_within_quota_is_immediate() {
        let limiter = TargetRateLimiter::new(fast_config(60));

        let result = tokio::time::timeout(Duration::from_millis(500), async {
            for _ in 0..10 {
                limiter.wait_for_slot("https://example.com/a").await;
            }
        })
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_rate_limit_counted_per_host() {
        let limiter = TargetRateLimiter::new(fast_config(60));

        limiter.record_rate_limit("https://a.example.com/x", 429).await;
        limiter.record_rate_limit("https://a.example.com/y", 503).await;

        assert_eq!(limiter.rate_limit_count("https://a.example.com/").await, 2);
        assert_eq!(limiter.rate_limit_count("https://b.example.com/").await, 0);
    }

    #[tokio::test]
    async fn test_burst_override_paces_requests() {
        let limiter = TargetRateLimiter::new(RateLimiterConfig {
            burst: Some(1),
            ..fast_config(600)
        });

        let started = std::time::Instant::now();
        for _ in 0..3 {
            limiter.wait_for_slot("https://example.com/a").await;
        }

        // One token up front, then one every 100ms
        assert!(started.elapsed() >= Duration::from_millis(180));
    }

    #[tokio::test]
    async fn test_throttle_clock_counts_overlap_once() {
        let clock = ThrottleClock::new();
        assert_eq!(clock.waited(), Duration::ZERO);

        let first = clock.enter();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = clock.enter();
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(first);
        assert!(clock.is_throttled());
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(second);
        assert!(!clock.is_throttled());

        let waited = clock.waited();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(clock.waited(), waited);
        assert!(waited >= Duration::from_millis(300));
        assert!(waited < Duration::from_millis(600));
    }
}
