use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    models::{PriceQuote, SnapshotSubmission, StoreResponse, WalletResponse},
    verification::{validate_submission, WalletAddress},
};
use super::{
    error::{ApiError, INVALID_ACTION, INVALID_REQUEST, PROCESSING_FAILED},
    rate_limit::{ACTION_GET, ACTION_GLOBAL, ACTION_STORE, ACTION_STORE_WALLET},
    state::{AppState, SharedState},
};

const GLOBAL_LIMIT_MESSAGE: &str = "Rate limit exceeded. Too many requests from your IP address.";
const WALLET_STORE_LIMIT_MESSAGE: &str = "This wallet has been updated too recently. Please try again later.";

#[derive(Debug, Deserialize)]
pub struct TrackRequest {
    #[serde(default = "default_action")]
    pub action: String,
    #[serde(default, alias = "walletAddress")]
    pub wallet_address: Option<String>,
    #[serde(flatten)]
    pub submission: SnapshotSubmission,
}

fn default_action() -> String {
    ACTION_GET.to_string()
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub price_circuit: String,
    pub cached_prices: usize,
}

/// Caller IP: first `x-forwarded-for` hop, then `x-real-ip`, then "unknown".
pub fn client_ip(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded.or(real_ip).unwrap_or("unknown").to_string()
}

pub async fn track_wallet(
    State(state): State<SharedState>,
    headers: HeaderMap,
    payload: Result<Json<TrackRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let rules = &state.settings().rate_limits;
    let ip = client_ip(&headers);

    state.enforce(&ip, ACTION_GLOBAL, rules.global, GLOBAL_LIMIT_MESSAGE)?;

    let Json(request) = payload.map_err(|rejection| {
        debug!("Rejected track-wallet body: {}", rejection);
        ApiError::bad_request(INVALID_REQUEST)
    })?;

    let wallet = request
        .wallet_address
        .as_deref()
        .map(WalletAddress::parse)
        .transpose()
        .map_err(|_| ApiError::bad_request(INVALID_REQUEST))?
        .ok_or_else(|| ApiError::bad_request(INVALID_REQUEST))?;

    let (identifier, rule) = match request.action.as_str() {
        ACTION_GET => (wallet.as_str(), rules.get),
        ACTION_STORE => (ip.as_str(), rules.store),
        _ => return Err(ApiError::bad_request(INVALID_ACTION)),
    };
    state.enforce(
        identifier,
        &request.action,
        rule,
        &format!("Rate limit exceeded for {} action. Please try again later.", request.action),
    )?;

    state.limiter().maybe_cleanup(rules.cleanup_probability);

    if request.action == ACTION_STORE {
        store_snapshot(&state, &wallet, &request.submission).await
    } else {
        Ok(Json(load_wallet(&state, &wallet).await).into_response())
    }
}

/// Latest snapshot plus the configured history window. Store failures degrade to empty data.
async fn load_wallet(state: &AppState, wallet: &WalletAddress) -> WalletResponse {
    let since = Utc::now() - Duration::days(state.settings().history.days_back);
    let store = state.store();

    let (latest, history) = tokio::join!(store.latest(wallet), store.history(wallet, since));

    let latest = latest.unwrap_or_else(|e| {
        error!("Latest snapshot query failed for {}: {}", wallet, e);
        None
    });
    let history = history.unwrap_or_else(|e| {
        error!("History query failed for {}: {}", wallet, e);
        Vec::new()
    });

    debug!("Serving {} history rows for {}", history.len(), wallet);
    WalletResponse::new(latest, history)
}

async fn store_snapshot(
    state: &AppState,
    wallet: &WalletAddress,
    submission: &SnapshotSubmission,
) -> Result<Response, ApiError> {
    let snapshot = validate_submission(wallet, submission, Utc::now())?;

    state.enforce(
        wallet.as_str(),
        ACTION_STORE_WALLET,
        state.settings().rate_limits.store_wallet,
        WALLET_STORE_LIMIT_MESSAGE,
    )?;

    let stored = state.store().insert(&snapshot).await.map_err(|e| {
        error!("Snapshot insert failed for {}: {}", wallet, e);
        ApiError::Internal(PROCESSING_FAILED.to_string())
    })?;

    info!("Stored snapshot for {} ({} points)", wallet, stored.total_points);
    Ok(Json(StoreResponse {
        success: true,
        data: vec![stored],
    })
    .into_response())
}

pub async fn get_price(State(state): State<SharedState>) -> Json<PriceQuote> {
    Json(state.prices().current_quote().await)
}

pub async fn health(State(state): State<SharedState>) -> Result<Json<HealthResponse>, ApiError> {
    state.store().ping().await.map_err(|e| {
        error!("Health check failed: {}", e);
        ApiError::Unavailable("Database unavailable".to_string())
    })?;

    Ok(Json(HealthResponse {
        status: "ok",
        price_circuit: format!("{:?}", state.prices().circuit_state()),
        cached_prices: state.prices().cache_stats().total_entries,
    }))
}
