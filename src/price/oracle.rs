use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::{
    config::PriceSettings,
    models::{PointsTrackerError, PriceQuote, Result, SOURCE_COINGECKO},
};

/// Upstream token price provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_quote(&self) -> Result<PriceQuote>;
}

#[derive(Debug, Deserialize)]
struct SimplePrice {
    usd: Option<f64>,
    usd_24h_change: Option<f64>,
}

/// CoinGecko-compatible `simple/price` endpoint.
pub struct CoinGeckoSource {
    http_client: reqwest::Client,
    base_url: String,
    token_id: String,
}

impl CoinGeckoSource {
    pub fn new(settings: &PriceSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| PointsTrackerError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: settings.provider_url.trim_end_matches('/').to_string(),
            token_id: settings.token_id.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/simple/price?ids={}&vs_currencies=usd&include_24hr_change=true",
            self.base_url, self.token_id
        )
    }
}

/// Pull the token's quote out of a `simple/price` body. A missing or
/// non-positive `usd` counts as unavailable.
pub fn parse_simple_price(body: &str, token_id: &str) -> Result<PriceQuote> {
    let prices: HashMap<String, SimplePrice> = serde_json::from_str(body)?;

    let entry = prices
        .get(token_id)
        .ok_or_else(|| PointsTrackerError::PriceUnavailable(format!("No price data for {}", token_id)))?;

    match entry.usd {
        Some(price) if price.is_finite() && price > 0.0 => Ok(PriceQuote::live(
            price,
            entry.usd_24h_change.filter(|c| c.is_finite()).unwrap_or(0.0),
            SOURCE_COINGECKO,
        )),
        _ => Err(PointsTrackerError::PriceUnavailable(format!(
            "Invalid USD price for {}",
            token_id
        ))),
    }
}

#[async_trait]
impl PriceSource for CoinGeckoSource {
    async fn fetch_quote(&self) -> Result<PriceQuote> {
        let response = self
            .http_client
            .get(self.endpoint())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PointsTrackerError::PriceUnavailable(format!(
                "{} responded with {}",
                SOURCE_COINGECKO, status
            )));
        }

        let body = response.text().await?;
        debug!("Price response for {}: {}", self.token_id, body);
        parse_simple_price(&body, &self.token_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_price() {
        let quote = parse_simple_price(r#"{"spark":{"usd":0.0512,"usd_24h_change":-3.4}}"#, "spark").unwrap();
        assert_eq!(quote.price, 0.0512);
        assert_eq!(quote.change_24h, -3.4);
        assert_eq!(quote.source, SOURCE_COINGECKO);
        assert!(quote.timestamp.is_some());
    }

    #[test]
    fn test_parse_simple_price_without_change() {
        let quote = parse_simple_price(r#"{"spark":{"usd":1.5}}"#, "spark").unwrap();
        assert_eq!(quote.change_24h, 0.0);
    }

    #[test]
    fn test_parse_simple_price_unavailable() {
        for body in [r#"{}"#, r#"{"spark":{}}"#, r#"{"spark":{"usd":0}}"#, r#"{"other":{"usd":2.0}}"#] {
            let err = parse_simple_price(body, "spark").unwrap_err();
            assert!(matches!(err, PointsTrackerError::PriceUnavailable(_)), "body: {}", body);
        }

        assert!(matches!(
            parse_simple_price("not json", "spark"),
            Err(PointsTrackerError::SerializationError(_))
        ));
    }

    #[test]
    fn test_endpoint_format() {
        let settings = PriceSettings {
            provider_url: "https://api.example.com/api/v3/".to_string(),
            token_id: "spark".to_string(),
            cache_ttl_seconds: 300,
            timeout_seconds: 5,
            max_retries: 1,
        };
        let source = CoinGeckoSource::new(&settings).unwrap();
        assert_eq!(
            source.endpoint(),
            "https://api.example.com/api/v3/simple/price?ids=spark&vs_currencies=usd&include_24hr_change=true"
        );
    }
}
