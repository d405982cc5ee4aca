pub mod analytics;
pub mod api;
pub mod client;
pub mod config;
pub mod models;
pub mod price;
pub mod store;
pub mod verification;

pub use analytics::MetricsCalculator;
pub use config::Settings;
pub use models::{PointsTrackerError, Result, WalletSnapshot, WalletStats};
pub use verification::WalletAddress;
