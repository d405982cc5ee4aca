use chrono::{DateTime, Utc};

use crate::models::{PointsTrackerError, Result, SnapshotSubmission, WalletSnapshot};
use super::address::WalletAddress;

pub const MAX_TOTAL_POINTS: f64 = 1e15;
pub const MAX_RANK: f64 = 1_000_000.0;
pub const MAX_TOTAL_WALLETS: f64 = 10_000_000.0;
pub const MAX_POINTS_POOL: f64 = 1e18;

/// Validate a scraper submission at the store boundary and turn it into a
/// typed snapshot stamped with `now`.
pub fn validate_submission(
    wallet: &WalletAddress,
    submission: &SnapshotSubmission,
    now: DateTime<Utc>,
) -> Result<WalletSnapshot> {
    let total_points = submission
        .total_points
        .ok_or_else(|| PointsTrackerError::validation("total_points", "total_points is required"))?;
    if !total_points.is_finite() || !(0.0..=MAX_TOTAL_POINTS).contains(&total_points) {
        return Err(PointsTrackerError::validation("total_points", "Invalid total_points value"));
    }

    let rank = bounded_count(submission.rank, MAX_RANK, "rank")?;

    let percentile = submission
        .percentile
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());
    if let Some(p) = percentile {
        if !is_percentile_label(p) {
            return Err(PointsTrackerError::validation("percentile", "Invalid percentile format"));
        }
    }

    let total_wallets = bounded_count(submission.total_wallets, MAX_TOTAL_WALLETS, "total_wallets")?;

    let total_points_pool = match submission.total_points_pool {
        Some(pool) if !pool.is_finite() || !(0.0..=MAX_POINTS_POOL).contains(&pool) => {
            return Err(PointsTrackerError::validation(
                "total_points_pool",
                "Invalid total_points_pool value",
            ));
        }
        other => other,
    };

    Ok(WalletSnapshot {
        wallet_address: wallet.to_string(),
        total_points,
        rank,
        total_wallets,
        percentile: percentile.map(str::to_string),
        total_points_pool,
        created_at: now,
    })
}

/// Whole number in `[1, max]`. Zero reads as "not reported".
fn bounded_count(value: Option<f64>, max: f64, field: &'static str) -> Result<Option<u64>> {
    match value {
        None => Ok(None),
        Some(v) if v == 0.0 => Ok(None),
        Some(v) if v.is_finite() && v.fract() == 0.0 && (1.0..=max).contains(&v) => Ok(Some(v as u64)),
        Some(_) => Err(PointsTrackerError::validation(field, format!("Invalid {} value", field))),
    }
}

/// `\d+\.\d+%`, optionally prefixed with "Top ".
pub fn is_percentile_label(label: &str) -> bool {
    let body = label.strip_prefix("Top ").unwrap_or(label);
    let number = match body.strip_suffix('%') {
        Some(n) => n,
        None => return false,
    };

    match number.split_once('.') {
        Some((whole, frac)) => {
            !whole.is_empty()
                && !frac.is_empty()
                && whole.bytes().all(|b| b.is_ascii_digit())
                && frac.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn wallet() -> WalletAddress {
        WalletAddress::parse("0x742d35cc6634c0532925a3b844bc9e7595f6e842").unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 20, 8, 0, 0).unwrap()
    }

    fn submission() -> SnapshotSubmission {
        SnapshotSubmission {
            total_points: Some(1_234_567.0),
            rank: Some(42.0),
            total_wallets: Some(50_000.0),
            percentile: Some("Top 0.08%".to_string()),
            total_points_pool: Some(3.5e9),
        }
    }

    fn field_of(err: PointsTrackerError) -> &'static str {
        match err {
            PointsTrackerError::Validation { field, .. } => field,
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_valid_submission() {
        let snapshot = validate_submission(&wallet(), &submission(), now()).unwrap();
        assert_eq!(snapshot.wallet_address, wallet().to_string());
        assert_eq!(snapshot.rank, Some(42));
        assert_eq!(snapshot.total_wallets, Some(50_000));
        assert_eq!(snapshot.percentile.as_deref(), Some("Top 0.08%"));
        assert_eq!(snapshot.created_at, now());
    }

    #[test]
    fn test_zero_rank_and_wallets_mean_absent() {
        let mut input = submission();
        input.rank = Some(0.0);
        input.total_wallets = Some(0.0);
        input.percentile = Some(String::new());

        let snapshot = validate_submission(&wallet(), &input, now()).unwrap();
        assert_eq!(snapshot.rank, None);
        assert_eq!(snapshot.total_wallets, None);
        assert_eq!(snapshot.percentile, None);
    }

    #[test]
    fn test_missing_total_points() {
        let mut input = submission();
        input.total_points = None;

        let err = validate_submission(&wallet(), &input, now()).unwrap_err();
        assert_eq!(err.to_string(), "total_points is required");
    }

    #[test]
    fn test_out_of_range_values() {
        let mut input = submission();
        input.total_points = Some(-1.0);
        assert_eq!(field_of(validate_submission(&wallet(), &input, now()).unwrap_err()), "total_points");

        let mut input = submission();
        input.total_points = Some(f64::INFINITY);
        assert_eq!(field_of(validate_submission(&wallet(), &input, now()).unwrap_err()), "total_points");

        let mut input = submission();
        input.rank = Some(1_000_001.0);
        let err = validate_submission(&wallet(), &input, now()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid rank value");

        let mut input = submission();
        input.rank = Some(2.5);
        assert_eq!(field_of(validate_submission(&wallet(), &input, now()).unwrap_err()), "rank");

        let mut input = submission();
        input.total_wallets = Some(10_000_001.0);
        assert_eq!(field_of(validate_submission(&wallet(), &input, now()).unwrap_err()), "total_wallets");

        let mut input = submission();
        input.total_points_pool = Some(2e18);
        let err = validate_submission(&wallet(), &input, now()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid total_points_pool value");
    }

    #[test]
    fn test_percentile_label_format() {
        assert!(is_percentile_label("12.5%"));
        assert!(is_percentile_label("Top 0.08%"));
        assert!(!is_percentile_label("12%"));
        assert!(!is_percentile_label("12.5"));
        assert!(!is_percentile_label(".5%"));
        assert!(!is_percentile_label("Bottom 1.0%"));
        assert!(!is_percentile_label("1.0%; drop table"));

        let mut input = submission();
        input.percentile = Some("about half".to_string());
        let err = validate_submission(&wallet(), &input, now()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid percentile format");
    }
}
