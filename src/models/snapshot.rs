use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// One point-in-time record of a wallet's standing on the points leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletSnapshot {
    pub wallet_address: String,
    pub total_points: f64,
    pub rank: Option<u64>,
    pub total_wallets: Option<u64>,
    /// Pre-formatted label such as "Top 2.3%"
    pub percentile: Option<String>,
    /// Sum of points across all wallets; zero or missing when the upstream scrape had gaps
    pub total_points_pool: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl WalletSnapshot {
    /// Pool value usable as a market-share denominator.
    pub fn valid_pool(&self) -> Option<f64> {
        self.total_points_pool.filter(|pool| *pool > 0.0)
    }
}

/// Wire contract of the `get` action: latest snapshot plus the recent history (oldest first).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletResponse {
    pub latest: Option<WalletSnapshot>,
    #[serde(default)]
    pub history: Vec<WalletSnapshot>,
    #[serde(default)]
    pub has_data: bool,
}

impl WalletResponse {
    pub fn new(latest: Option<WalletSnapshot>, history: Vec<WalletSnapshot>) -> Self {
        let has_data = latest.is_some();
        Self {
            latest,
            history,
            has_data,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Raw store request as it arrives from a scraper, before boundary validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotSubmission {
    pub total_points: Option<f64>,
    pub rank: Option<f64>,
    pub total_wallets: Option<f64>,
    pub percentile: Option<String>,
    pub total_points_pool: Option<f64>,
}

/// Reply to a successful `store` action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreResponse {
    pub success: bool,
    pub data: Vec<WalletSnapshot>,
}
