use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::{
    analytics::{build_wallet_stats, MetricsCalculator},
    models::{PointsTrackerError, Result, WalletSnapshot, WalletStats},
    verification::WalletAddress,
};
use super::WalletBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The server asked us to back off; `retry_in` is what is left of it
    RateLimited { retry_in: Duration },
    /// Same wallet was loaded moments ago
    Duplicate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Loaded {
        stats: WalletStats,
        history: Vec<WalletSnapshot>,
    },
    NoData,
    Skipped(SkipReason),
}

/// Single-owner client session: validates input, throttles repeat searches
/// and honours server back-off before touching the backend.
pub struct RequestCoordinator<B: WalletBackend> {
    backend: B,
    calculator: MetricsCalculator,
    min_refresh: Duration,
    last_search: Option<(WalletAddress, Instant)>,
    rate_limited_until: Option<Instant>,
}

impl<B: WalletBackend> RequestCoordinator<B> {
    pub fn new(backend: B, calculator: MetricsCalculator, min_refresh: Duration) -> Self {
        Self {
            backend,
            calculator,
            min_refresh,
            last_search: None,
            rate_limited_until: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn rate_limited_until(&self) -> Option<Instant> {
        self.rate_limited_until
    }

    pub async fn search(&mut self, input: &str) -> Result<SearchOutcome> {
        self.search_at(input, Instant::now()).await
    }

    pub async fn search_at(&mut self, input: &str, now: Instant) -> Result<SearchOutcome> {
        let wallet = WalletAddress::parse(input)?;

        if let Some(until) = self.rate_limited_until {
            if now < until {
                debug!("Skipping search for {}, backing off", wallet);
                return Ok(SearchOutcome::Skipped(SkipReason::RateLimited {
                    retry_in: until - now,
                }));
            }
            self.rate_limited_until = None;
        }

        if let Some((last_wallet, at)) = &self.last_search {
            if *last_wallet == wallet && now.saturating_duration_since(*at) < self.min_refresh {
                return Ok(SearchOutcome::Skipped(SkipReason::Duplicate));
            }
        }

        let (wallet_data, price) =
            tokio::join!(self.backend.fetch_wallet(&wallet), self.backend.fetch_price());

        let response = match wallet_data {
            Ok(response) => response,
            Err(PointsTrackerError::RateLimitExceeded { action, retry_after_secs }) => {
                self.rate_limited_until = Some(now + Duration::from_secs(retry_after_secs));
                return Err(PointsTrackerError::RateLimitExceeded { action, retry_after_secs });
            }
            Err(e) => return Err(e),
        };

        let token_price = match price {
            Ok(quote) if quote.is_fallback() => {
                debug!("Server is serving the fallback price");
                None
            }
            Ok(quote) => quote.usable_price(),
            Err(e) => {
                warn!("Price fetch failed, using fallback: {}", e);
                None
            }
        };

        self.last_search = Some((wallet.clone(), now));

        if !response.has_data {
            info!("No data recorded for {} yet", wallet);
            return Ok(SearchOutcome::NoData);
        }

        match build_wallet_stats(&self.calculator, &response, token_price) {
            Some(stats) => Ok(SearchOutcome::Loaded {
                stats,
                history: response.history,
            }),
            None => Ok(SearchOutcome::NoData),
        }
    }
}
