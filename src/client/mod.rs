use async_trait::async_trait;

use crate::{
    models::{PriceQuote, Result, WalletResponse},
    verification::WalletAddress,
};

pub mod coordinator;
pub mod http;

pub use coordinator::{RequestCoordinator, SearchOutcome, SkipReason};
pub use http::HttpBackend;

/// Read side of the tracking service as seen by a dashboard client.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletBackend: Send + Sync {
    async fn fetch_wallet(&self, wallet: &WalletAddress) -> Result<WalletResponse>;

    async fn fetch_price(&self) -> Result<PriceQuote>;
}
