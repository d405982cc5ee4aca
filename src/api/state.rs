use std::sync::Arc;

use crate::{
    config::{RateLimitRule, Settings},
    price::PriceService,
    store::SnapshotStore,
};
use super::{
    error::ApiError,
    rate_limit::{RateLimitDecision, RateLimiter},
};

pub struct AppState {
    settings: Settings,
    store: Arc<dyn SnapshotStore>,
    prices: PriceService,
    limiter: RateLimiter,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(settings: Settings, store: Arc<dyn SnapshotStore>, prices: PriceService) -> Self {
        Self {
            settings,
            store,
            prices,
            limiter: RateLimiter::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &dyn SnapshotStore {
        self.store.as_ref()
    }

    pub fn prices(&self) -> &PriceService {
        &self.prices
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Count a request against `rule`, mapping a rejection to a 429 carrying `message`.
    pub fn enforce(
        &self,
        identifier: &str,
        action: &str,
        rule: RateLimitRule,
        message: &str,
    ) -> Result<(), ApiError> {
        match self.limiter.check(identifier, action, rule) {
            RateLimitDecision::Allowed => Ok(()),
            RateLimitDecision::Limited { retry_after_secs } => Err(ApiError::RateLimited {
                message: message.to_string(),
                retry_after_secs,
            }),
        }
    }
}
