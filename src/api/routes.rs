use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::{
    handlers::{get_price, health, track_wallet},
    state::SharedState,
};

pub fn create_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.settings().api.cors_origins);

    Router::new()
        .route("/track-wallet", post(track_wallet))
        .route("/price", get(get_price))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|origin| origin.parse().ok()).collect();
    layer.allow_origin(allowed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, HeaderMap, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::{
        api::state::AppState,
        config::{RateLimitRule, Settings},
        models::{PointsTrackerError, PriceQuote, SOURCE_COINGECKO, SOURCE_FALLBACK},
        price::{oracle::MockPriceSource, PriceService},
        store::{MockSnapshotStore, SnapshotStore, SqliteSnapshotStore},
    };

    const WALLET: &str = "0x742d35cc6634c0532925a3b844bc9e7595f6e842";

    fn app_with(settings: Settings, store: Arc<dyn SnapshotStore>, price_up: bool) -> Router {
        let mut source = MockPriceSource::new();
        source.expect_fetch_quote().returning(move || {
            if price_up {
                Ok(PriceQuote::live(0.05, 1.0, SOURCE_COINGECKO))
            } else {
                Err(PointsTrackerError::PriceUnavailable("offline".to_string()))
            }
        });

        let mut price_settings = settings.price.clone();
        price_settings.max_retries = 1;
        let prices = PriceService::new(
            Arc::new(source),
            &price_settings,
            settings.calculation.fallback_token_price,
        );

        create_router(Arc::new(AppState::new(settings, store, prices)))
    }

    async fn sqlite_app(settings: Settings) -> Router {
        let store = SqliteSnapshotStore::in_memory().await.unwrap();
        app_with(settings, Arc::new(store), true)
    }

    fn track(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/track-wallet")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn store_body(points: f64) -> Value {
        json!({
            "action": "store",
            "wallet_address": WALLET,
            "total_points": points,
            "rank": 12,
            "total_wallets": 5000,
            "percentile": "Top 0.24%",
            "total_points_pool": 2.0e9
        })
    }

    #[tokio::test]
    async fn test_get_unknown_wallet_returns_empty_response() {
        let app = sqlite_app(Settings::default()).await;
        let (status, _, body) = send(&app, track(json!({ "walletAddress": WALLET }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "latest": null, "history": [], "has_data": false }));
    }

    #[tokio::test]
    async fn test_store_then_get() {
        let app = sqlite_app(Settings::default()).await;

        let (status, _, body) = send(&app, track(store_body(1_000_000.0))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"][0]["wallet_address"], json!(WALLET));
        assert_eq!(body["data"][0]["rank"], json!(12));

        let (status, _, body) = send(&app, track(json!({ "action": "get", "wallet_address": WALLET.to_uppercase().replace("0X", "0x") }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["has_data"], json!(true));
        assert_eq!(body["latest"]["total_points"], json!(1_000_000.0));
        assert_eq!(body["history"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_invalid_requests() {
        let app = sqlite_app(Settings::default()).await;

        let (status, _, body) = send(&app, track(json!({ "wallet_address": "0x123" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("Invalid request"));

        let (status, _, body) = send(&app, track(json!({ "action": "get" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("Invalid request"));

        let (status, _, body) = send(&app, track(json!({ "action": "delete", "wallet_address": WALLET }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("Invalid action. Use \"get\" or \"store\""));

        let malformed = Request::builder()
            .method("POST")
            .uri("/track-wallet")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _, body) = send(&app, malformed).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("Invalid request"));
    }

    #[tokio::test]
    async fn test_store_validation_message() {
        let app = sqlite_app(Settings::default()).await;
        let mut body = store_body(10.0);
        body["rank"] = json!(2_000_000);

        let (status, _, body) = send(&app, track(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("Invalid rank value"));
    }

    #[tokio::test]
    async fn test_per_wallet_store_ceiling() {
        let app = sqlite_app(Settings::default()).await;

        for points in [1.0, 2.0] {
            let (status, _, _) = send(&app, track(store_body(points))).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, headers, body) = send(&app, track(store_body(3.0))).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            body["error"],
            json!("This wallet has been updated too recently. Please try again later.")
        );
        let retry_after: u64 = headers[header::RETRY_AFTER].to_str().unwrap().parse().unwrap();
        assert!(retry_after >= 3590 && retry_after <= 3600);
        assert_eq!(body["retry_after"], json!(retry_after));
    }

    #[tokio::test]
    async fn test_global_ip_limit() {
        let mut settings = Settings::default();
        settings.rate_limits.global = RateLimitRule { requests: 1, window_seconds: 60 };
        let app = sqlite_app(settings).await;

        let (status, _, _) = send(&app, track(json!({ "wallet_address": WALLET }))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, headers, body) = send(&app, track(json!({ "wallet_address": WALLET }))).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert!(headers.contains_key(header::RETRY_AFTER));
        assert_eq!(
            body["error"],
            json!("Rate limit exceeded. Too many requests from your IP address.")
        );
    }

    #[tokio::test]
    async fn test_get_action_limit_is_per_wallet() {
        let mut settings = Settings::default();
        settings.rate_limits.get = RateLimitRule { requests: 1, window_seconds: 60 };
        let app = sqlite_app(settings).await;

        let (status, _, _) = send(&app, track(json!({ "wallet_address": WALLET }))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, body) = send(&app, track(json!({ "wallet_address": WALLET }))).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], json!("Rate limit exceeded for get action. Please try again later."));

        let other = "0x0000000000000000000000000000000000000001";
        let (status, _, _) = send(&app, track(json!({ "wallet_address": other }))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_store_failures_degrade_or_fail() {
        let mut store = MockSnapshotStore::new();
        store
            .expect_latest()
            .returning(|_| Err(PointsTrackerError::DatabaseError(sqlx::Error::PoolClosed)));
        store
            .expect_history()
            .returning(|_, _| Err(PointsTrackerError::DatabaseError(sqlx::Error::PoolClosed)));
        store
            .expect_insert()
            .returning(|_| Err(PointsTrackerError::DatabaseError(sqlx::Error::PoolClosed)));
        let app = app_with(Settings::default(), Arc::new(store), true);

        let (status, _, body) = send(&app, track(json!({ "wallet_address": WALLET }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["has_data"], json!(false));

        let (status, _, body) = send(&app, track(store_body(5.0))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], json!("Unable to process request"));
    }

    #[tokio::test]
    async fn test_price_endpoint() {
        let store = Arc::new(SqliteSnapshotStore::in_memory().await.unwrap());
        let live = app_with(Settings::default(), store.clone(), true);
        let request = || Request::builder().uri("/price").body(Body::empty()).unwrap();

        let (status, _, body) = send(&live, request()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["price"], json!(0.05));
        assert_eq!(body["source"], json!(SOURCE_COINGECKO));

        let (_, _, body) = send(&live, request()).await;
        assert_eq!(body["source"], json!("cache"));

        let down = app_with(Settings::default(), store, false);
        let (status, _, body) = send(&down, request()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["price"], json!(0.07));
        assert_eq!(body["source"], json!(SOURCE_FALLBACK));
    }

    #[tokio::test]
    async fn test_health() {
        let app = sqlite_app(Settings::default()).await;
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let (status, _, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], json!("ok"));

        let mut store = MockSnapshotStore::new();
        store
            .expect_ping()
            .returning(|| Err(PointsTrackerError::DatabaseError(sqlx::Error::PoolClosed)));
        let app = app_with(Settings::default(), Arc::new(store), true);
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let (status, _, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
