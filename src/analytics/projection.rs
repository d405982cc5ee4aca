use chrono::{DateTime, Utc};

use crate::{
    config::SeasonSettings,
    models::{TimeRemaining, TokenProjection},
};

const POINTS_PER_UNIT: f64 = 1_000_000.0;

/// Tokens earned for `points` at `conversion_rate` tokens per million points.
///
/// The rate is clamped into the season's configured range. A dollar value is
/// only attached for a live positive price; projections never price at the
/// fallback constant.
pub fn project_tokens(
    points: f64,
    conversion_rate: f64,
    token_price: Option<f64>,
    season: &SeasonSettings,
) -> TokenProjection {
    let rate = if conversion_rate.is_finite() {
        conversion_rate.clamp(season.min_conversion_rate, season.max_conversion_rate)
    } else {
        season.default_conversion_rate
    };

    let tokens = if points.is_finite() && points > 0.0 {
        points / POINTS_PER_UNIT * rate
    } else {
        0.0
    };

    TokenProjection {
        conversion_rate: rate,
        tokens,
        dollar_value: token_price
            .filter(|p| p.is_finite() && *p > 0.0)
            .map(|p| tokens * p),
    }
}

pub fn time_remaining(season_end: DateTime<Utc>, now: DateTime<Utc>) -> TimeRemaining {
    let total = (season_end - now).num_seconds();
    if total <= 0 {
        return TimeRemaining::default();
    }

    TimeRemaining {
        days: total / 86_400,
        hours: (total % 86_400) / 3_600,
        minutes: (total % 3_600) / 60,
        seconds: total % 60,
    }
}
