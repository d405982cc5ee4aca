use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::models::{PointsTrackerError, Result};

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CircuitState {
    Closed,    // Normal operation
    Open,      // Failing, don't try
    HalfOpen,  // Probing whether the upstream recovered
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub timeout_duration: Duration,
    pub half_open_max_calls: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            timeout_duration: Duration::from_secs(60),
            half_open_max_calls: 2,
        }
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    half_open_calls: u32,
    opened_at: Option<Instant>,
}

/// Guards the upstream price provider so a dead endpoint is not hammered on every request.
pub struct CircuitBreaker {
    inner: Mutex<BreakerState>,
    config: CircuitBreakerConfig,
    name: String,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                half_open_calls: 0,
                opened_at: None,
            }),
            config,
            name: name.into(),
        }
    }

    // State is plain counters; a panic mid-update cannot leave it unusable
    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Execute a future with circuit breaker protection
    pub async fn call<F, T, Fut>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut slot = HalfOpenSlot {
            breaker: self,
            held: self.admit()?,
        };

        let outcome = f().await;
        slot.held = false;

        match outcome {
            Ok(result) => {
                self.on_success();
                Ok(result)
            }
            Err(e) => {
                self.on_failure();
                Err(e)
            }
        }
    }

    /// Returns whether the call took one of the half-open probe slots.
    fn admit(&self) -> Result<bool> {
        let mut inner = self.lock();

        if inner.state == CircuitState::Open {
            let cooled_down = inner
                .opened_at
                .map(|at| at.elapsed() >= self.config.timeout_duration)
                .unwrap_or(true);
            if !cooled_down {
                return Err(PointsTrackerError::CircuitBreakerOpen(format!(
                    "Circuit breaker {} is open",
                    self.name
                )));
            }

            inner.state = CircuitState::HalfOpen;
            inner.success_count = 0;
            inner.half_open_calls = 0;
            info!("Circuit breaker {} transitioned to HALF_OPEN", self.name);
        }

        if inner.state == CircuitState::HalfOpen {
            if inner.half_open_calls >= self.config.half_open_max_calls {
                return Err(PointsTrackerError::CircuitBreakerOpen(format!(
                    "Circuit breaker {} half-open limit reached",
                    self.name
                )));
            }
            inner.half_open_calls += 1;
            return Ok(true);
        }

        Ok(false)
    }

    fn release_half_open_slot(&self) {
        let mut inner = self.lock();
        if inner.state == CircuitState::HalfOpen && inner.half_open_calls > 0 {
            inner.half_open_calls -= 1;
            warn!("Circuit breaker {} probe dropped before completing", self.name);
        }
    }

    fn on_success(&self) {
        let mut inner = self.lock();

        match inner.state {
            CircuitState::Closed => inner.failure_count = 0,
            CircuitState::HalfOpen => {
                inner.success_count += 1;
                if inner.success_count >= self.config.success_threshold {
                    inner.state = CircuitState::Closed;
                    inner.failure_count = 0;
                    inner.success_count = 0;
                    inner.half_open_calls = 0;
                    info!("Circuit breaker {} transitioned to CLOSED", self.name);
                }
            }
            CircuitState::Open => {
                warn!("Success recorded while circuit breaker {} is OPEN", self.name);
            }
        }
    }

    fn on_failure(&self) {
        let mut inner = self.lock();

        match inner.state {
            CircuitState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.config.failure_threshold {
                    Self::open(&mut inner);
                    error!(
                        "Circuit breaker {} transitioned to OPEN after {} failures",
                        self.name, self.config.failure_threshold
                    );
                }
            }
            CircuitState::HalfOpen => {
                Self::open(&mut inner);
                warn!("Circuit breaker {} transitioned back to OPEN from HALF_OPEN", self.name);
            }
            CircuitState::Open => inner.opened_at = Some(Instant::now()),
        }
    }

    fn open(inner: &mut BreakerState) {
        inner.state = CircuitState::Open;
        inner.opened_at = Some(Instant::now());
        inner.success_count = 0;
        inner.half_open_calls = 0;
    }

    /// Get current circuit breaker state for monitoring
    pub fn get_state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn get_failure_count(&self) -> u32 {
        self.lock().failure_count
    }
}

/// Hands a half-open slot back if the probe future is dropped mid-flight.
struct HalfOpenSlot<'a> {
    breaker: &'a CircuitBreaker,
    held: bool,
}

impl Drop for HalfOpenSlot<'_> {
    fn drop(&mut self) {
        if self.held {
            self.breaker.release_half_open_slot();
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
            backoff_multiplier: 2.0,
        }
    }
}

/// Retry with exponential backoff. At least one attempt is always made.
pub async fn retry_with_backoff<F, T, Fut, E>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    info!("Operation {} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(result);
            }
            Err(e) if attempt >= max_attempts => {
                error!("Operation {} failed after {} attempts: {}", operation_name, attempt, e);
                return Err(e);
            }
            Err(e) => {
                warn!("Operation {} failed on attempt {}: {}", operation_name, attempt, e);
                sleep(calculate_delay(config, attempt)).await;
                attempt += 1;
            }
        }
    }
}

fn calculate_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let delay_ms = config.base_delay.as_millis() as f64
        * config.backoff_multiplier.powi((attempt - 1) as i32);

    Duration::from_millis(delay_ms as u64).min(config.max_delay)
}
