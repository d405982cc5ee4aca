pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;

use crate::models::{PointsTrackerError, Result};

pub use error::ApiError;
pub use rate_limit::{RateLimitDecision, RateLimiter};
pub use routes::create_router;
pub use state::{AppState, SharedState};

/// Bind and serve the HTTP API until the process is stopped.
pub async fn serve(state: SharedState) -> Result<()> {
    let api = &state.settings().api;
    let addr: SocketAddr = format!("{}:{}", api.host, api.port)
        .parse()
        .map_err(|e| PointsTrackerError::ConfigError(format!("Invalid listen address: {}", e)))?;

    let listener = TcpListener::bind(addr).await?;

    info!("Listening on {}", addr);
    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
