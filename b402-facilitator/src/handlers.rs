//! Axum route handlers for the facilitator service.
//!
//! Status-code policy: business rejections ride in a 200 body, structurally
//! invalid requests get a 400 with the endpoint's error envelope, and only
//! transport-level failures become 500s. Internal error detail never reaches
//! a response body; `/verify` answers with a fixed generic reason and
//! `/settle` with the error taxonomy's short summary.

use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use b402::proto::{SettleRequest, SettleResponse, VerifyRequest, VerifyResponse};
use b402_evm::tokens::supported_assets;
use serde_json::json;

use crate::local::LocalFacilitator;
use crate::metrics;

/// Shared application state for the facilitator service.
pub type AppState = Arc<LocalFacilitator>;

/// Creates the axum [`axum::Router`] with all facilitator endpoints.
///
/// Endpoints:
/// - `GET /` — service metadata and endpoint directory
/// - `GET /health` — health check
/// - `GET /list` — supported network and assets
/// - `POST /verify` — verify a payment authorization
/// - `POST /settle` — execute a payment on-chain
/// - `GET /metrics` — Prometheus metrics
pub fn router(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/", axum::routing::get(get_root))
        .route("/health", axum::routing::get(get_health))
        .route("/list", axum::routing::get(get_list))
        .route("/verify", axum::routing::post(post_verify))
        .route("/settle", axum::routing::post(post_settle))
        .route("/metrics", axum::routing::get(get_metrics))
        .with_state(state)
}

fn observe(method: &str, route: &str, status: StatusCode, started: Instant) {
    metrics::HTTP_REQUEST_DURATION
        .with_label_values(&[method, route, status.as_str()])
        .observe(started.elapsed().as_secs_f64());
}

/// `POST /verify` — verifies a payment authorization.
///
/// Always answers 200 with the validity outcome in the body, except for
/// structurally malformed requests (400) and internal failures (500 with a
/// generic reason).
pub async fn post_verify(
    State(state): State<AppState>,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            metrics::VERIFY_REQUESTS.with_label_values(&["invalid"]).inc();
            observe("POST", "/verify", StatusCode::BAD_REQUEST, started);
            let response = VerifyResponse::invalid(rejection.body_text());
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    };

    match state.verify(&request).await {
        Ok(response) => {
            let status = if response.is_valid { "success" } else { "failed" };
            metrics::VERIFY_REQUESTS.with_label_values(&[status]).inc();
            observe("POST", "/verify", StatusCode::OK, started);
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(error) => {
            tracing::error!(error = %error, "verify failed with internal error");
            metrics::VERIFY_REQUESTS.with_label_values(&["error"]).inc();
            observe("POST", "/verify", StatusCode::INTERNAL_SERVER_ERROR, started);
            let response = VerifyResponse::invalid("Verification failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
        }
    }
}

/// `POST /settle` — executes a payment on-chain.
pub async fn post_settle(
    State(state): State<AppState>,
    body: Result<Json<SettleRequest>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            metrics::SETTLE_REQUESTS.with_label_values(&["invalid"]).inc();
            observe("POST", "/settle", StatusCode::BAD_REQUEST, started);
            let response = SettleResponse::failure(state.network(), rejection.body_text());
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    };

    match state.settle(&request).await {
        Ok(response) => {
            metrics::SETTLE_REQUESTS.with_label_values(&["success"]).inc();
            observe("POST", "/settle", StatusCode::OK, started);
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(error) => {
            metrics::SETTLE_REQUESTS.with_label_values(&["failed"]).inc();
            observe("POST", "/settle", StatusCode::INTERNAL_SERVER_ERROR, started);
            let response = SettleResponse::failure(state.network(), error.wire_reason());
            (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
        }
    }
}

/// `GET /` — service metadata and endpoint directory.
pub async fn get_root(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "service": "B402 Facilitator",
        "version": env!("CARGO_PKG_VERSION"),
        "network": state.network().name(),
        "chainId": state.network().chain_id(),
        "relayerContract": state.relayer_address(),
        "endpoints": {
            "/": "GET - API information",
            "/health": "GET - Health check",
            "/list": "GET - List supported tokens",
            "/verify": "POST - Verify payment authorization",
            "/settle": "POST - Execute payment on-chain",
            "/metrics": "GET - Prometheus metrics",
        },
    }))
}

/// `GET /health` — health check.
pub async fn get_health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "b402-facilitator",
        "network": state.network().name(),
        "relayer": state.signer_address(),
    }))
}

/// `GET /list` — supported network and per-asset metadata.
pub async fn get_list(State(state): State<AppState>) -> Json<serde_json::Value> {
    let network = state.network();
    let mut assets = Vec::new();
    for asset in supported_assets(network) {
        let info = state.token_info(asset).await;
        assets.push(json!({
            "asset": asset,
            "symbol": info.symbol,
            "name": info.name,
            "decimals": info.decimals,
            "network": network.name(),
        }));
    }
    Json(json!({
        "facilitator": "b402",
        "version": env!("CARGO_PKG_VERSION"),
        "networks": [{
            "network": network.name(),
            "chainId": network.chain_id(),
            "relayerContract": state.relayer_address(),
            "supportedAssets": assets,
        }],
        "features": [
            "gasless-payments",
            "eip712-signatures",
            "dynamic-token-support",
        ],
        "endpoints": {
            "verify": "/verify",
            "settle": "/settle",
            "list": "/list",
            "health": "/health",
        },
    }))
}

/// `GET /metrics` — Prometheus text exposition.
pub async fn get_metrics() -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::metrics_output(),
    )
        .into_response()
}
