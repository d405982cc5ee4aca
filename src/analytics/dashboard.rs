use crate::models::{WalletResponse, WalletStats, NO_DATA};

use super::{
    calculator::{find_valid_pool_values, MetricsCalculator},
    format::group_thousands,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Assemble the dashboard view for a fetched wallet. Returns `None` when the
/// response carries no latest snapshot.
pub fn build_wallet_stats(
    calculator: &MetricsCalculator,
    response: &WalletResponse,
    token_price: Option<f64>,
) -> Option<WalletStats> {
    let latest = response.latest.as_ref()?;
    let history = response.history.as_slice();

    let metrics = calculator.derive(latest, history, token_price);
    let total_wallets = latest.total_wallets.filter(|w| *w > 0);
    let pool = find_valid_pool_values(history).current;

    let global_average = match (pool, total_wallets) {
        (Some(pool), Some(wallets)) => pool / wallets as f64,
        _ => 0.0,
    };

    Some(WalletStats {
        wallet_address: latest.wallet_address.clone(),
        total_points: group_thousands(latest.total_points),
        total_points_raw: latest.total_points,
        rank: latest
            .rank
            .filter(|r| *r > 0)
            .map(|r| r.to_string())
            .unwrap_or_else(|| NO_DATA.to_string()),
        percentile: latest
            .percentile
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| p.replacen("Top ", "", 1))
            .unwrap_or_else(|| NO_DATA.to_string()),
        total_wallets: total_wallets
            .map(|w| group_thousands(w as f64))
            .unwrap_or_else(|| NO_DATA.to_string()),
        total_points_pool: pool
            .map(group_thousands)
            .unwrap_or_else(|| NO_DATA.to_string()),
        global_average,
        last_updated: latest.created_at.format(TIMESTAMP_FORMAT).to_string(),
        metrics,
    })
}
