pub mod calculator;
pub mod dashboard;
pub mod format;
pub mod projection;

pub use calculator::{find_valid_pool_values, points_growth, rank_change, simple_change, MetricsCalculator};
pub use dashboard::build_wallet_stats;
pub use format::format_compact;
pub use projection::{project_tokens, time_remaining};
