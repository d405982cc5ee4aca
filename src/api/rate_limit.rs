//! Fixed-window request limiting keyed by `(identifier, action)`.
//!
//! A window opens on the first request and admits `rule.requests` calls
//! until it expires; the next request after expiry opens a fresh window.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, warn};

use crate::config::RateLimitRule;

pub const ACTION_GLOBAL: &str = "global";
pub const ACTION_GET: &str = "get";
pub const ACTION_STORE: &str = "store";
pub const ACTION_STORE_WALLET: &str = "store_wallet";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited { retry_after_secs: u64 },
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    length: Duration,
    count: u32,
}

impl Window {
    fn is_open(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started_at) < self.length
    }
}

#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: RwLock<HashMap<(String, String), Window>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&self, identifier: &str, action: &str, rule: RateLimitRule) -> RateLimitDecision {
        self.check_at(identifier, action, rule, Instant::now())
    }

    pub fn check_at(
        &self,
        identifier: &str,
        action: &str,
        rule: RateLimitRule,
        now: Instant,
    ) -> RateLimitDecision {
        let mut windows = match self.windows.write() {
            Ok(windows) => windows,
            Err(_) => {
                // Limiter state is lost; admit rather than block every client
                warn!("Rate limiter lock poisoned, allowing {} for {}", action, identifier);
                return RateLimitDecision::Allowed;
            }
        };

        let key = (identifier.to_string(), action.to_string());
        match windows.get_mut(&key) {
            Some(window) if window.is_open(now) => {
                if window.count >= rule.requests {
                    let remaining = (window.started_at + window.length).saturating_duration_since(now);
                    let retry_after_secs = ceil_secs(remaining).max(1);
                    debug!("Rate limited {} for {} ({}s)", action, identifier, retry_after_secs);
                    return RateLimitDecision::Limited { retry_after_secs };
                }

                window.count += 1;
                RateLimitDecision::Allowed
            }
            _ => {
                windows.insert(
                    key,
                    Window {
                        started_at: now,
                        length: rule.window(),
                        count: 1,
                    },
                );
                RateLimitDecision::Allowed
            }
        }
    }

    /// Drop every window that has already expired.
    pub fn cleanup_expired(&self) {
        self.cleanup_expired_at(Instant::now());
    }

    pub fn cleanup_expired_at(&self, now: Instant) {
        if let Ok(mut windows) = self.windows.write() {
            let before = windows.len();
            windows.retain(|_, window| window.is_open(now));
            debug!("Rate limit cleanup removed {} windows", before - windows.len());
        }
    }

    /// Run a cleanup with the given probability; keeps the map bounded without a background task.
    pub fn maybe_cleanup(&self, probability: f64) {
        let probability = probability.clamp(0.0, 1.0);
        if rand::thread_rng().gen_bool(probability) {
            self.cleanup_expired();
        }
    }

    pub fn tracked_windows(&self) -> usize {
        self.windows.read().map(|w| w.len()).unwrap_or(0)
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(requests: u32, window_seconds: u64) -> RateLimitRule {
        RateLimitRule { requests, window_seconds }
    }

    #[test]
    fn test_allows_up_to_limit_then_rejects() {
        let limiter = RateLimiter::new();
        let start = Instant::now();
        let per_minute = rule(3, 60);

        for _ in 0..3 {
            assert_eq!(limiter.check_at("1.2.3.4", ACTION_STORE, per_minute, start), RateLimitDecision::Allowed);
        }

        let later = start + Duration::from_millis(20_500);
        assert_eq!(
            limiter.check_at("1.2.3.4", ACTION_STORE, per_minute, later),
            RateLimitDecision::Limited { retry_after_secs: 40 }
        );
    }

    #[test]
    fn test_window_expiry_starts_over() {
        let limiter = RateLimiter::new();
        let start = Instant::now();
        let hourly = rule(2, 3600);

        limiter.check_at("0xabc", ACTION_STORE_WALLET, hourly, start);
        limiter.check_at("0xabc", ACTION_STORE_WALLET, hourly, start);
        assert!(matches!(
            limiter.check_at("0xabc", ACTION_STORE_WALLET, hourly, start + Duration::from_secs(1800)),
            RateLimitDecision::Limited { retry_after_secs: 1800 }
        ));

        let next_hour = start + Duration::from_secs(3600);
        assert_eq!(limiter.check_at("0xabc", ACTION_STORE_WALLET, hourly, next_hour), RateLimitDecision::Allowed);
    }

    #[test]
    fn test_retry_after_is_at_least_one_second() {
        let limiter = RateLimiter::new();
        let start = Instant::now();
        let single = rule(1, 1);

        limiter.check_at("ip", ACTION_GET, single, start);
        assert_eq!(
            limiter.check_at("ip", ACTION_GET, single, start + Duration::from_millis(999)),
            RateLimitDecision::Limited { retry_after_secs: 1 }
        );
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new();
        let start = Instant::now();
        let single = rule(1, 60);

        assert_eq!(limiter.check_at("a", ACTION_GET, single, start), RateLimitDecision::Allowed);
        assert_eq!(limiter.check_at("b", ACTION_GET, single, start), RateLimitDecision::Allowed);
        assert_eq!(limiter.check_at("a", ACTION_STORE, single, start), RateLimitDecision::Allowed);
        assert!(matches!(
            limiter.check_at("a", ACTION_GET, single, start),
            RateLimitDecision::Limited { .. }
        ));
    }

    #[test]
    fn test_cleanup_removes_only_expired_windows() {
        let limiter = RateLimiter::new();
        let start = Instant::now();

        limiter.check_at("short", ACTION_GET, rule(5, 60), start);
        limiter.check_at("long", ACTION_GLOBAL, rule(5, 3600), start);
        assert_eq!(limiter.tracked_windows(), 2);

        limiter.cleanup_expired_at(start + Duration::from_secs(120));
        assert_eq!(limiter.tracked_windows(), 1);

        limiter.maybe_cleanup(0.0);
        assert_eq!(limiter.tracked_windows(), 1);
    }
}
