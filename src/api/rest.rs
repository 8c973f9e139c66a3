// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/` and answer with the `{status, data,
// message}` envelope the dashboard already speaks.
//
// CORS is configured permissively for development; tighten `allowed_origins`
// in production.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::app_state::AppState;
use crate::chart::{ChartRequest, ChartType, IndicatorSpec};
use crate::indicators::{IndicatorKind, IndicatorParams};
use crate::types::ApiEnvelope;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/info", get(info))
        .route("/api/v1/indicators", get(list_indicators))
        .route("/api/v1/chart/:symbol", get(chart))
        .route("/api/v1/bundle", get(latest_bundle))
        .route("/api/v1/errors", get(recent_errors))
        .route("/api/v1/search", get(search))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Basic endpoints
// =============================================================================

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Serialize)]
struct InfoPayload {
    name: &'static str,
    version: &'static str,
    upstream_base_url: String,
    upstream_api_key_configured: bool,
    uptime_secs: u64,
    chart_rounds: u64,
}

async fn info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (upstream_base_url, key_configured) = {
        let config = state.runtime_config.read();
        (
            config.upstream_base_url.clone(),
            config.upstream_api_key.is_some(),
        )
    };

    Json(ApiEnvelope::success(InfoPayload {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        upstream_base_url,
        upstream_api_key_configured: key_configured,
        uptime_secs: state.uptime_secs(),
        chart_rounds: state.chart_service.current_round(),
    }))
}

#[derive(Debug, Serialize)]
struct IndicatorInfo {
    id: &'static str,
    label: String,
    default_period: usize,
    remote: bool,
}

async fn list_indicators() -> impl IntoResponse {
    let indicators: Vec<IndicatorInfo> = IndicatorKind::ALL
        .iter()
        .map(|kind| IndicatorInfo {
            id: kind.wire_id(),
            label: kind.to_string(),
            default_period: kind.default_period(),
            remote: kind.has_remote_source(),
        })
        .collect();
    Json(ApiEnvelope::success(indicators))
}

/// The most recently published bundle. Dashboards polling for updates
/// compare its `version` against what they last rendered.
async fn latest_bundle(State(state): State<Arc<AppState>>) -> Response {
    match state.chart_service.latest() {
        Some(bundle) => (StatusCode::OK, Json(ApiEnvelope::success(&*bundle))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiEnvelope::<()>::error("no chart round has completed yet")),
        )
            .into_response(),
    }
}

async fn recent_errors(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let errors = state.recent_errors.read().clone();
    Json(ApiEnvelope::success(errors))
}

// =============================================================================
// Chart endpoint
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartQuery {
    interval: Option<String>,
    period: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    chart_type: Option<String>,
    /// Comma-separated indicator specs, e.g. `sma:20,macd,rsi:14`.
    indicators: Option<String>,
}

async fn chart(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<ChartQuery>,
) -> Response {
    // Resolve defaults up front so the config lock is not held across awaits.
    let (default_interval, default_period, default_chart_type) = {
        let config = state.runtime_config.read();
        (
            config.default_interval.clone(),
            config.default_period.clone(),
            config.default_chart_type,
        )
    };

    let chart_type = match &query.chart_type {
        Some(raw) => match ChartType::parse(raw) {
            Some(ct) => ct,
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ApiEnvelope::<()>::error(format!("unknown chart type '{raw}'"))),
                )
                    .into_response();
            }
        },
        None => default_chart_type,
    };

    let indicators = match parse_indicator_list(query.indicators.as_deref().unwrap_or_default()) {
        Ok(list) => list,
        Err(message) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiEnvelope::<()>::error(message)),
            )
                .into_response();
        }
    };

    // An explicit date range replaces the default period rather than
    // competing with it.
    let period = match (query.period, &query.start_date) {
        (Some(p), _) => Some(p),
        (None, Some(_)) => None,
        (None, None) => Some(default_period),
    };

    let request = ChartRequest {
        symbol: symbol.to_uppercase(),
        interval: query.interval.unwrap_or(default_interval),
        period,
        start_date: query.start_date,
        end_date: query.end_date,
        chart_type,
        indicators,
    };

    match state.chart_service.rebuild(&request).await {
        Ok(Some(bundle)) => {
            (StatusCode::OK, Json(ApiEnvelope::success(&*bundle))).into_response()
        }
        Ok(None) => (
            StatusCode::CONFLICT,
            Json(ApiEnvelope::<()>::error(
                "chart round superseded by a newer request",
            )),
        )
            .into_response(),
        Err(e) => {
            warn!(symbol = %request.symbol, error = %e, "chart round failed");
            state.push_error(format!("chart {}: {e:#}", request.symbol));
            (
                StatusCode::BAD_GATEWAY,
                Json(ApiEnvelope::<()>::error(format!("{e:#}"))),
            )
                .into_response()
        }
    }
}

/// Parse a comma-separated indicator list into specs.
///
/// Each entry is `<id>[:<period>]`, with MACD taking up to three numbers
/// (`macd:12:26:9`) and Bollinger a period plus deviation multiplier
/// (`bb:20:2.5`). Unknown ids or unparseable numbers reject the request.
fn parse_indicator_list(raw: &str) -> Result<Vec<IndicatorSpec>, String> {
    let mut specs = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let spec =
            parse_indicator_spec(part).ok_or_else(|| format!("unknown indicator spec '{part}'"))?;
        specs.push(spec);
    }
    Ok(specs)
}

fn parse_indicator_spec(part: &str) -> Option<IndicatorSpec> {
    let mut fields = part.split(':');
    let kind = IndicatorKind::parse(fields.next()?)?;
    let args: Vec<&str> = fields.map(str::trim).collect();

    let mut params = IndicatorParams::for_kind(kind);
    match kind {
        IndicatorKind::Macd => {
            if let Some(raw) = args.first() {
                params.fast_period = raw.parse().ok()?;
            }
            if let Some(raw) = args.get(1) {
                params.slow_period = raw.parse().ok()?;
            }
            if let Some(raw) = args.get(2) {
                params.signal_period = raw.parse().ok()?;
            }
        }
        IndicatorKind::Bollinger => {
            if let Some(raw) = args.first() {
                params.period = raw.parse().ok()?;
            }
            if let Some(raw) = args.get(1) {
                params.std_dev_multiplier = raw.parse().ok()?;
            }
        }
        _ => {
            if let Some(raw) = args.first() {
                params.period = raw.parse().ok()?;
            }
        }
    }

    Some(IndicatorSpec { kind, params })
}

// =============================================================================
// Search passthrough
// =============================================================================

#[derive(Debug, Deserialize)]
struct SearchQuery {
    query: String,
}

async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Response {
    let base_url = state.runtime_config.read().upstream_base_url.clone();
    let url = format!("{}/api/stocks/search", base_url.trim_end_matches('/'));

    let result = state
        .http
        .get(&url)
        .query(&[("query", params.query.as_str())])
        .send()
        .await;

    match result {
        Ok(resp) => match resp.json::<serde_json::Value>().await {
            Ok(body) => (StatusCode::OK, Json(body)).into_response(),
            Err(e) => (
                StatusCode::BAD_GATEWAY,
                Json(ApiEnvelope::<()>::error(format!("invalid search response: {e}"))),
            )
                .into_response(),
        },
        Err(e) => {
            state.push_error(format!("search: {e}"));
            (
                StatusCode::BAD_GATEWAY,
                Json(ApiEnvelope::<()>::error(format!("search request failed: {e}"))),
            )
                .into_response()
        }
    }
}
