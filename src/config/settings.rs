use serde::{Deserialize, Serialize};
use config::{Config, ConfigError, File};
use chrono::{DateTime, TimeZone, Utc};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub app: AppSettings,
    pub calculation: CalculationSettings,
    pub rate_limits: RateLimitSettings,
    pub database: DatabaseSettings,
    pub price: PriceSettings,
    pub api: ApiSettings,
    pub history: HistorySettings,
    pub season: SeasonSettings,
    pub client: ClientSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub version: String,
    pub log_level: String,
}

/// Knobs of the metrics calculator. The fallback price is a degraded-mode
/// default and should track the oracle's typical range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationSettings {
    pub share_change_threshold: f64,
    pub percentile_threshold: f64,
    pub pace_threshold: f64,
    pub fallback_token_price: f64,
    pub supply_scenarios: Vec<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimitRule {
    pub requests: u32,
    pub window_seconds: u64,
}

impl RateLimitRule {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Per client IP, across all actions
    pub global: RateLimitRule,
    /// Per wallet address
    pub get: RateLimitRule,
    /// Per client IP
    pub store: RateLimitRule,
    /// Per wallet address, independent of the IP ceilings
    pub store_wallet: RateLimitRule,
    pub cleanup_probability: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSettings {
    pub provider_url: String,
    pub token_id: String,
    pub cache_ttl_seconds: u64,
    pub timeout_seconds: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySettings {
    pub days_back: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonSettings {
    pub name: String,
    pub ends_at: DateTime<Utc>,
    pub default_conversion_rate: f64,
    pub min_conversion_rate: f64,
    pub max_conversion_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    pub server_url: String,
    pub min_refresh_seconds: u64,
    pub timeout_seconds: u64,
}

impl Default for CalculationSettings {
    fn default() -> Self {
        Self {
            share_change_threshold: 0.000_000_1,
            percentile_threshold: 0.01,
            pace_threshold: 0.0001,
            fallback_token_price: 0.07,
            supply_scenarios: vec![150_000_000, 200_000_000, 250_000_000],
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            global: RateLimitRule { requests: 1000, window_seconds: 3600 },
            get: RateLimitRule { requests: 30, window_seconds: 60 },
            store: RateLimitRule { requests: 20, window_seconds: 60 },
            store_wallet: RateLimitRule { requests: 2, window_seconds: 3600 },
            cleanup_probability: 0.01,
        }
    }
}

impl Default for SeasonSettings {
    fn default() -> Self {
        Self {
            name: "Season 2".to_string(),
            ends_at: Utc
                .with_ymd_and_hms(2025, 12, 11, 23, 59, 59)
                .single()
                .unwrap_or_else(Utc::now),
            default_conversion_rate: 112.5,
            min_conversion_rate: 75.0,
            max_conversion_rate: 150.0,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app: AppSettings {
                name: "Points Tracker".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                log_level: "info".to_string(),
            },
            calculation: CalculationSettings::default(),
            rate_limits: RateLimitSettings::default(),
            database: DatabaseSettings {
                url: "sqlite://points_tracker.db?mode=rwc".to_string(),
                max_connections: 5,
                connect_timeout_seconds: 30,
            },
            price: PriceSettings {
                provider_url: "https://api.coingecko.com/api/v3".to_string(),
                token_id: "spark".to_string(),
                cache_ttl_seconds: 300, // 5 minutes
                timeout_seconds: 10,
                max_retries: 3,
            },
            api: ApiSettings {
                host: "0.0.0.0".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
            },
            history: HistorySettings { days_back: 30 },
            season: SeasonSettings::default(),
            client: ClientSettings {
                server_url: "http://localhost:8080".to_string(),
                min_refresh_seconds: 30,
                timeout_seconds: 15,
            },
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("POINTS_TRACKER")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        s.try_deserialize()
    }

    /// Defaults overlaid by one explicit file, then the environment.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("POINTS_TRACKER")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        s.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        let calc = &self.calculation;
        if !(calc.fallback_token_price > 0.0) {
            return Err("Fallback token price must be positive".to_string());
        }

        if calc.share_change_threshold < 0.0
            || calc.percentile_threshold < 0.0
            || calc.pace_threshold < 0.0
        {
            return Err("Calculation thresholds must not be negative".to_string());
        }

        if calc.supply_scenarios.is_empty() || calc.supply_scenarios.contains(&0) {
            return Err("Supply scenarios must be non-empty and positive".to_string());
        }

        let limits = &self.rate_limits;
        for (name, rule) in [
            ("global", limits.global),
            ("get", limits.get),
            ("store", limits.store),
            ("store_wallet", limits.store_wallet),
        ] {
            if rule.requests == 0 || rule.window_seconds == 0 {
                return Err(format!("Rate limit '{}' must allow at least one request per window", name));
            }
        }

        if !(0.0..=1.0).contains(&limits.cleanup_probability) {
            return Err("Rate limit cleanup probability must be between 0 and 1".to_string());
        }

        if self.history.days_back <= 0 {
            return Err("History window must be at least one day".to_string());
        }

        let season = &self.season;
        if season.min_conversion_rate > season.max_conversion_rate
            || !(season.min_conversion_rate..=season.max_conversion_rate)
                .contains(&season.default_conversion_rate)
        {
            return Err("Default conversion rate must lie within the configured range".to_string());
        }

        Ok(())
    }
}
