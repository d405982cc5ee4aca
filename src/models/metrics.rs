use serde::{Deserialize, Serialize};

/// Marker for "not enough history to say", distinct from a zero change.
pub const NO_DATA: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Neutral,
}

impl Direction {
    pub fn from_sign(value: f64) -> Self {
        if value > 0.0 {
            Direction::Up
        } else if value < 0.0 {
            Direction::Down
        } else {
            Direction::Neutral
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Direction::Up => "▲",
            Direction::Down => "▼",
            Direction::Neutral => "•",
        }
    }
}

/// Magnitude of a change plus the direction it went in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeIndicator {
    pub value: String,
    pub direction: Direction,
}

impl ChangeIndicator {
    pub fn new(value: impl Into<String>, direction: Direction) -> Self {
        Self {
            value: value.into(),
            direction,
        }
    }

    pub fn no_data() -> Self {
        Self::new(NO_DATA, Direction::Neutral)
    }

    pub fn is_no_data(&self) -> bool {
        self.value == NO_DATA
    }
}

impl Default for ChangeIndicator {
    fn default() -> Self {
        Self::no_data()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointsGrowth {
    /// e.g. "+20.00%"
    pub growth_percent: String,
    /// e.g. "+200,000"
    pub change_absolute: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolValues {
    pub current: Option<f64>,
    pub previous: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketShare {
    pub share: String,
    pub share_change: String,
    pub share_change_indicator: ChangeIndicator,
    /// Raw percentage-point difference; 0 when there is nothing to compare against
    pub share_change_numeric: f64,
}

impl MarketShare {
    pub fn no_data() -> Self {
        Self {
            share: NO_DATA.to_string(),
            share_change: NO_DATA.to_string(),
            share_change_indicator: ChangeIndicator::no_data(),
            share_change_numeric: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioEstimate {
    /// Scenario key such as "150M"
    pub scenario: String,
    pub token_supply: u64,
    /// "$" + grouped integer, or the no-data marker
    pub value: String,
}

/// Projected airdrop value per token-supply scenario, in configured order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AirdropEstimates(pub Vec<ScenarioEstimate>);

impl AirdropEstimates {
    pub fn get(&self, scenario: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|estimate| estimate.scenario == scenario)
            .map(|estimate| estimate.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScenarioEstimate> {
        self.0.iter()
    }

    pub fn is_no_data(&self) -> bool {
        self.0.iter().all(|estimate| estimate.value == NO_DATA)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaceStatus {
    Outpacing,
    Trailing,
    KeepingPace,
}

impl PaceStatus {
    pub fn message(&self) -> &'static str {
        match self {
            PaceStatus::Outpacing => "Wallet Share is OUTPACING the Total Points Pool",
            PaceStatus::Trailing => "Wallet Share is TRAILING the Total Points Pool",
            PaceStatus::KeepingPace => "Wallet Share is KEEPING PACE with the Total Points Pool",
        }
    }
}

/// Everything derived from one snapshot + history + price. Rebuilt on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub points_growth: String,
    pub points_change: String,
    pub rank_change: ChangeIndicator,
    pub percentile_change: ChangeIndicator,
    pub pool_share: String,
    pub pool_share_change: String,
    pub pool_share_change_indicator: ChangeIndicator,
    pub pool_share_change_numeric: f64,
    pub pace_status: PaceStatus,
    pub airdrop_estimates: AirdropEstimates,
    pub token_price: Option<f64>,
    pub effective_price: f64,
    pub total_points_pool_change: String,
    pub total_wallets_change: String,
}

/// Dashboard view: formatted totals plus the derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletStats {
    pub wallet_address: String,
    pub total_points: String,
    pub total_points_raw: f64,
    pub rank: String,
    pub percentile: String,
    pub total_wallets: String,
    pub total_points_pool: String,
    pub global_average: f64,
    pub last_updated: String,
    #[serde(flatten)]
    pub metrics: DerivedMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenProjection {
    pub conversion_rate: f64,
    pub tokens: f64,
    /// Only present with a live price; the projection never uses the fallback
    pub dollar_value: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRemaining {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl TimeRemaining {
    pub fn is_over(&self) -> bool {
        self.days == 0 && self.hours == 0 && self.minutes == 0 && self.seconds == 0
    }
}
