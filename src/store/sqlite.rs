//! SQLite-backed snapshot store.
//!
//! Snapshots are append-only; timestamps are stored as unix milliseconds so
//! range scans over a wallet's history stay on the composite index.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tracing::{debug, info};

use crate::{
    config::DatabaseSettings,
    models::{Result, WalletSnapshot},
    verification::WalletAddress,
};
use super::SnapshotStore;

const SELECT_COLUMNS: &str =
    "SELECT wallet_address, total_points, rank, total_wallets, percentile, total_points_pool, created_at \
     FROM wallet_tracking";

pub struct SqliteSnapshotStore {
    pool: SqlitePool,
}

#[derive(FromRow)]
struct SnapshotRow {
    wallet_address: String,
    total_points: f64,
    rank: Option<i64>,
    total_wallets: Option<i64>,
    percentile: Option<String>,
    total_points_pool: Option<f64>,
    created_at: i64,
}

impl From<SnapshotRow> for WalletSnapshot {
    fn from(row: SnapshotRow) -> Self {
        WalletSnapshot {
            wallet_address: row.wallet_address,
            total_points: row.total_points,
            rank: row.rank.and_then(|r| u64::try_from(r).ok()),
            total_wallets: row.total_wallets.and_then(|w| u64::try_from(w).ok()),
            percentile: row.percentile,
            total_points_pool: row.total_points_pool,
            created_at: Utc
                .timestamp_millis_opt(row.created_at)
                .single()
                .unwrap_or_default(),
        }
    }
}

impl SqliteSnapshotStore {
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&settings.url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(Duration::from_secs(settings.connect_timeout_seconds))
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;

        info!("Snapshot store ready at {}", settings.url);
        Ok(store)
    }

    /// Private in-memory database; a single connection keeps every query on the same database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "
            CREATE TABLE IF NOT EXISTS wallet_tracking (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                wallet_address TEXT NOT NULL,
                total_points REAL NOT NULL,
                rank INTEGER,
                total_wallets INTEGER,
                percentile TEXT,
                total_points_pool REAL,
                created_at INTEGER NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_wallet_tracking_wallet_created \
             ON wallet_tracking(wallet_address, created_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for SqliteSnapshotStore {
    async fn latest(&self, wallet: &WalletAddress) -> Result<Option<WalletSnapshot>> {
        let row: Option<SnapshotRow> = sqlx::query_as(&format!(
            "{} WHERE wallet_address = ? ORDER BY created_at DESC, id DESC LIMIT 1",
            SELECT_COLUMNS
        ))
        .bind(wallet.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(WalletSnapshot::from))
    }

    async fn history(&self, wallet: &WalletAddress, since: DateTime<Utc>) -> Result<Vec<WalletSnapshot>> {
        let rows: Vec<SnapshotRow> = sqlx::query_as(&format!(
            "{} WHERE wallet_address = ? AND created_at >= ? ORDER BY created_at ASC, id ASC",
            SELECT_COLUMNS
        ))
        .bind(wallet.as_str())
        .bind(since.timestamp_millis())
        .fetch_all(&self.pool)
        .await?;

        debug!("Loaded {} history rows for {}", rows.len(), wallet);
        Ok(rows.into_iter().map(WalletSnapshot::from).collect())
    }

    async fn insert(&self, snapshot: &WalletSnapshot) -> Result<WalletSnapshot> {
        let created_at = snapshot.created_at.timestamp_millis();
        sqlx::query(
            "INSERT INTO wallet_tracking \
             (wallet_address, total_points, rank, total_wallets, percentile, total_points_pool, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&snapshot.wallet_address)
        .bind(snapshot.total_points)
        .bind(snapshot.rank.map(|r| r as i64))
        .bind(snapshot.total_wallets.map(|w| w as i64))
        .bind(snapshot.percentile.as_deref())
        .bind(snapshot.total_points_pool)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        debug!("Stored snapshot for {}", snapshot.wallet_address);
        // Echo the row as it reads back, at millisecond precision
        Ok(WalletSnapshot {
            created_at: Utc
                .timestamp_millis_opt(created_at)
                .single()
                .unwrap_or(snapshot.created_at),
            ..snapshot.clone()
        })
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
