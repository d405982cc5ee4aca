use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

pub const SOURCE_COINGECKO: &str = "coingecko";
pub const SOURCE_CACHE: &str = "cache";
pub const SOURCE_FALLBACK: &str = "fallback";

/// Token price as served by the price endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub price: f64,
    #[serde(default)]
    pub change_24h: f64,
    pub source: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl PriceQuote {
    pub fn live(price: f64, change_24h: f64, source: &str) -> Self {
        Self {
            price,
            change_24h,
            source: source.to_string(),
            timestamp: Some(Utc::now()),
        }
    }

    pub fn fallback(price: f64) -> Self {
        Self {
            price,
            change_24h: 0.0,
            source: SOURCE_FALLBACK.to_string(),
            timestamp: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == SOURCE_FALLBACK
    }

    /// Price the calculator may consume; anything non-positive means "use the fallback".
    pub fn usable_price(&self) -> Option<f64> {
        if self.price.is_finite() && self.price > 0.0 {
            Some(self.price)
        } else {
            None
        }
    }
}
