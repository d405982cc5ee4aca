use std::cmp::Ordering;

use crate::{
    config::CalculationSettings,
    models::{
        AirdropEstimates, ChangeIndicator, DerivedMetrics, Direction, MarketShare, PaceStatus,
        PointsGrowth, PoolValues, ScenarioEstimate, WalletSnapshot, NO_DATA,
    },
};
use super::format::{format_usd, parse_percent, signed_grouped, supply_label, to_fixed};

/// Points growth between two readings. `previous` must be positive; anything
/// else has no meaningful growth rate and yields `None`.
pub fn points_growth(current: f64, previous: f64) -> Option<PointsGrowth> {
    if !current.is_finite() || !previous.is_finite() || previous <= 0.0 {
        return None;
    }

    let diff = current - previous;
    let growth = to_fixed(diff / previous * 100.0, 2);
    let growth_percent = match growth.parse::<f64>() {
        Ok(g) if g > 0.0 => format!("+{}%", growth),
        _ => format!("{}%", growth),
    };

    Some(PointsGrowth {
        growth_percent,
        change_absolute: signed_grouped(diff),
    })
}

/// Rank movement; a lower rank number is better, so a drop in rank is "up".
pub fn rank_change(current: Option<u64>, previous: Option<u64>) -> ChangeIndicator {
    let (current, previous) = match (current.filter(|r| *r > 0), previous.filter(|r| *r > 0)) {
        (Some(c), Some(p)) => (c, p),
        _ => return ChangeIndicator::no_data(),
    };

    let direction = match previous.cmp(&current) {
        Ordering::Greater => Direction::Up,
        Ordering::Less => Direction::Down,
        Ordering::Equal => Direction::Neutral,
    };
    ChangeIndicator::new(previous.abs_diff(current).to_string(), direction)
}

/// Newest two strictly positive pool values, scanning history from the end.
pub fn find_valid_pool_values(history: &[WalletSnapshot]) -> PoolValues {
    let mut valid = history.iter().rev().filter_map(WalletSnapshot::valid_pool);

    PoolValues {
        current: valid.next(),
        previous: valid.next(),
    }
}

/// Grouped difference with "+" for growth, used for wallet-count and pool deltas.
pub fn simple_change(current: f64, previous: f64) -> String {
    signed_grouped(current - previous)
}

/// Pure derivation of dashboard metrics from a snapshot, its history and a token price.
#[derive(Debug, Clone)]
pub struct MetricsCalculator {
    settings: CalculationSettings,
}

impl Default for MetricsCalculator {
    fn default() -> Self {
        Self::new(CalculationSettings::default())
    }
}

impl MetricsCalculator {
    pub fn new(settings: CalculationSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CalculationSettings {
        &self.settings
    }

    pub fn percentile_change(
        &self,
        current_rank: Option<u64>,
        previous_rank: Option<u64>,
        total_wallets: Option<u64>,
    ) -> ChangeIndicator {
        let (current, previous, total) = match (
            current_rank.filter(|r| *r > 0),
            previous_rank.filter(|r| *r > 0),
            total_wallets.filter(|t| *t > 0),
        ) {
            (Some(c), Some(p), Some(t)) => (c as f64, p as f64, t as f64),
            _ => return ChangeIndicator::no_data(),
        };

        let percentile = |rank: f64| (total - rank) / total * 100.0;
        let diff = percentile(current) - percentile(previous);

        // Sub-threshold movement is rounding jitter, not a signal
        if diff.abs() <= self.settings.percentile_threshold {
            return ChangeIndicator::no_data();
        }

        ChangeIndicator::new(format!("{}%", to_fixed(diff.abs(), 2)), Direction::from_sign(diff))
    }

    pub fn market_share(
        &self,
        current_points: f64,
        current_pool: Option<f64>,
        history: &[WalletSnapshot],
    ) -> MarketShare {
        let pool = match current_pool.filter(|p| p.is_finite() && *p > 0.0) {
            Some(pool) => pool,
            None => return MarketShare::no_data(),
        };

        let share = current_points / pool * 100.0;
        // Shares are tiny fractions of the pool; fewer digits would round them away
        let share_text = format!("{}%", to_fixed(share, 6));

        // Points must come from the same snapshot as the pool they are divided by
        let previous = history
            .iter()
            .rev()
            .filter_map(|s| s.valid_pool().map(|p| (s.total_points, p)))
            .nth(1)
            .filter(|(points, _)| *points > 0.0);

        let (previous_points, previous_pool) = match previous {
            Some(pair) => pair,
            None => {
                return MarketShare {
                    share: share_text,
                    ..MarketShare::no_data()
                }
            }
        };

        let diff = share - previous_points / previous_pool * 100.0;
        if diff.abs() <= self.settings.share_change_threshold {
            return MarketShare {
                share: share_text,
                share_change_numeric: diff,
                ..MarketShare::no_data()
            };
        }

        let share_change = if diff >= 0.0 {
            format!("+{}%", to_fixed(diff, 7))
        } else {
            format!("{}%", to_fixed(diff, 7))
        };

        MarketShare {
            share: share_text,
            share_change,
            share_change_indicator: ChangeIndicator::new(
                format!("{}%", to_fixed(diff.abs(), 7)),
                Direction::from_sign(diff),
            ),
            share_change_numeric: diff,
        }
    }

    /// Live price when positive, otherwise the configured fallback.
    pub fn effective_price(&self, token_price: Option<f64>) -> f64 {
        token_price
            .filter(|p| p.is_finite() && *p > 0.0)
            .unwrap_or(self.settings.fallback_token_price)
    }

    pub fn airdrop_estimates(&self, share: &str, token_price: Option<f64>) -> AirdropEstimates {
        let fraction = parse_percent(share).map(|p| p / 100.0).unwrap_or(0.0);
        let price = self.effective_price(token_price);

        AirdropEstimates(
            self.settings
                .supply_scenarios
                .iter()
                .map(|&supply| ScenarioEstimate {
                    scenario: supply_label(supply),
                    token_supply: supply,
                    value: if fraction == 0.0 {
                        NO_DATA.to_string()
                    } else {
                        format_usd(supply as f64 * fraction * price)
                    },
                })
                .collect(),
        )
    }

    pub fn pace_status(&self, share_change: f64) -> PaceStatus {
        let threshold = self.settings.pace_threshold;
        if share_change > threshold {
            PaceStatus::Outpacing
        } else if share_change < -threshold {
            PaceStatus::Trailing
        } else {
            PaceStatus::KeepingPace
        }
    }

    /// Run the whole pipeline. Deltas compare the last two history entries;
    /// with fewer than two every delta is the no-data marker.
    pub fn derive(
        &self,
        latest: &WalletSnapshot,
        history: &[WalletSnapshot],
        token_price: Option<f64>,
    ) -> DerivedMetrics {
        let mut points_growth_text = NO_DATA.to_string();
        let mut points_change_text = NO_DATA.to_string();
        let mut rank = ChangeIndicator::no_data();
        let mut percentile = ChangeIndicator::no_data();
        let mut total_wallets_change = NO_DATA.to_string();

        if let [.., previous, last] = history {
            if let Some(growth) = points_growth(last.total_points, previous.total_points) {
                points_growth_text = growth.growth_percent;
                points_change_text = growth.change_absolute;
            }

            rank = rank_change(last.rank, previous.rank);
            percentile = self.percentile_change(last.rank, previous.rank, latest.total_wallets);

            if let (Some(current), Some(prior)) = (
                last.total_wallets.filter(|w| *w > 0),
                previous.total_wallets.filter(|w| *w > 0),
            ) {
                total_wallets_change = simple_change(current as f64, prior as f64);
            }
        }

        let pools = find_valid_pool_values(history);
        let total_points_pool_change = match (pools.current, pools.previous) {
            (Some(current), Some(previous)) => simple_change(current, previous),
            _ => NO_DATA.to_string(),
        };

        let share = self.market_share(latest.total_points, pools.current, history);
        let pace_status = self.pace_status(share.share_change_numeric);
        let airdrop_estimates = self.airdrop_estimates(&share.share, token_price);

        DerivedMetrics {
            points_growth: points_growth_text,
            points_change: points_change_text,
            rank_change: rank,
            percentile_change: percentile,
            pool_share: share.share,
            pool_share_change: share.share_change,
            pool_share_change_indicator: share.share_change_indicator,
            pool_share_change_numeric: share.share_change_numeric,
            pace_status,
            airdrop_estimates,
            token_price: token_price.filter(|p| p.is_finite() && *p > 0.0),
            effective_price: self.effective_price(token_price),
            total_points_pool_change,
            total_wallets_change,
        }
    }
}
