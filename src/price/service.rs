use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{
    config::PriceSettings,
    models::{CacheKey, CacheStats, PriceQuote, TtlCache, SOURCE_CACHE},
};
use super::{
    oracle::PriceSource,
    resilience::{retry_with_backoff, CircuitBreaker, CircuitBreakerConfig, CircuitState, RetryConfig},
};

/// Cached, breaker-guarded access to the token price. Never fails: when the
/// upstream is unavailable the configured fallback quote is returned instead.
pub struct PriceService {
    source: Arc<dyn PriceSource>,
    cache: TtlCache<PriceQuote>,
    breaker: CircuitBreaker,
    retry: RetryConfig,
    cache_key: String,
    fallback_price: f64,
}

impl PriceService {
    pub fn new(source: Arc<dyn PriceSource>, settings: &PriceSettings, fallback_price: f64) -> Self {
        Self {
            source,
            cache: TtlCache::new(Duration::from_secs(settings.cache_ttl_seconds)),
            breaker: CircuitBreaker::new(format!("{}_price", settings.token_id), CircuitBreakerConfig::default()),
            retry: RetryConfig {
                max_attempts: settings.max_retries,
                ..RetryConfig::default()
            },
            cache_key: CacheKey::price(&settings.token_id),
            fallback_price,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub async fn current_quote(&self) -> PriceQuote {
        if let Some(mut cached) = self.cache.get(&self.cache_key) {
            debug!("Serving cached price {}", cached.price);
            cached.source = SOURCE_CACHE.to_string();
            return cached;
        }

        self.fetch_and_cache().await
    }

    /// Drop any cached quote and go to the upstream.
    pub async fn refresh(&self) -> PriceQuote {
        self.cache.invalidate(&self.cache_key);
        self.fetch_and_cache().await
    }

    async fn fetch_and_cache(&self) -> PriceQuote {
        let result = self
            .breaker
            .call(|| retry_with_backoff(&self.retry, "price_fetch", || self.source.fetch_quote()))
            .await;

        match result {
            Ok(quote) => {
                info!("Fetched token price {} from {}", quote.price, quote.source);
                self.cache.cleanup_expired();
                self.cache.set(self.cache_key.clone(), quote.clone());
                quote
            }
            Err(e) => {
                // Fallbacks stay out of the cache so the next request retries upstream
                warn!("Price unavailable, using fallback {}: {}", self.fallback_price, e);
                PriceQuote::fallback(self.fallback_price)
            }
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.get_stats()
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.get_state()
    }
}
