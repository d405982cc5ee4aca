use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    models::{Result, WalletSnapshot},
    verification::WalletAddress,
};

pub mod sqlite;

pub use sqlite::SqliteSnapshotStore;

/// Persistence for wallet snapshots, keyed by (wallet, timestamp).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Most recent snapshot for the wallet, if any
    async fn latest(&self, wallet: &WalletAddress) -> Result<Option<WalletSnapshot>>;

    /// Snapshots created at or after `since`, oldest first
    async fn history(&self, wallet: &WalletAddress, since: DateTime<Utc>) -> Result<Vec<WalletSnapshot>>;

    async fn insert(&self, snapshot: &WalletSnapshot) -> Result<WalletSnapshot>;

    /// Cheap connectivity check for health probes
    async fn ping(&self) -> Result<()>;
}
