use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::{
    config::ClientSettings,
    models::{PointsTrackerError, PriceQuote, Result, SnapshotSubmission, StoreResponse, WalletResponse},
    verification::WalletAddress,
};
use super::WalletBackend;

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    retry_after: Option<u64>,
}

/// reqwest client for the tracking service's HTTP API.
pub struct HttpBackend {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(settings: &ClientSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| PointsTrackerError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: settings.server_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    pub async fn store_snapshot(
        &self,
        wallet: &WalletAddress,
        submission: &SnapshotSubmission,
    ) -> Result<StoreResponse> {
        let mut body = serde_json::to_value(submission)?;
        body["action"] = json!("store");
        body["wallet_address"] = json!(wallet.as_str());

        let response = self.http_client.post(self.url("track-wallet")).json(&body).send().await?;
        let response = check_status(response, "store").await?;
        Ok(response.json().await?)
    }
}

/// Map non-success statuses to typed errors; 429 keeps the server's retry hint.
async fn check_status(response: Response, action: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let header_retry = response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let body: ErrorBody = response.json().await.unwrap_or_default();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = body
            .retry_after
            .or(header_retry)
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
            .max(1);
        warn!("{} rate limited for {}s", action, retry_after_secs);
        return Err(PointsTrackerError::RateLimitExceeded {
            action: action.to_string(),
            retry_after_secs,
        });
    }

    Err(PointsTrackerError::BackendError {
        status: status.as_u16(),
        message: body.error,
    })
}

#[async_trait]
impl WalletBackend for HttpBackend {
    async fn fetch_wallet(&self, wallet: &WalletAddress) -> Result<WalletResponse> {
        let response = self
            .http_client
            .post(self.url("track-wallet"))
            .json(&json!({ "action": "get", "wallet_address": wallet.as_str() }))
            .send()
            .await?;

        let response = check_status(response, "get").await?;
        let data: WalletResponse = response.json().await?;
        debug!("Fetched {} history rows for {}", data.history.len(), wallet);
        Ok(data)
    }

    async fn fetch_price(&self) -> Result<PriceQuote> {
        let response = self.http_client.get(self.url("price")).send().await?;
        let response = check_status(response, "price").await?;
        Ok(response.json().await?)
    }
}
