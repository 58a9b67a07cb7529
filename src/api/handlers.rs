//! HTTP API handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::MyriadError;
use crate::myriad::{
    MarketEventsParams, MarketHoldersParams, MarketRef, MarketsParams, MyriadClient,
    PortfolioParams, QuestionsParams, QuoteRequest, UserEventsParams,
};
use crate::state::{
    utc_now_rfc3339, AccountInfo, MarketAnalysis, PerformanceReport, Position, StateHandle,
    StateUpdate, TradeDecision, TradeRecord,
};

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Bot state snapshot.
    pub state: StateHandle,
    /// Upstream Myriad client.
    pub myriad: Arc<MyriadClient>,
    /// Advisory asset list from configuration.
    pub assets: Vec<String>,
    /// Advisory scheduling interval from configuration.
    pub interval: String,
    /// Prometheus render handle, when a recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state.
    pub fn new(config: &Config, myriad: MyriadClient) -> Self {
        Self {
            state: StateHandle::new(),
            myriad: Arc::new(myriad),
            assets: config.assets_list(),
            interval: config.interval.clone(),
            prometheus: None,
        }
    }

    /// Attach a Prometheus render handle for `GET /metrics`.
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}

/// Error reply from any endpoint: a status code plus `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Caller-input error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<MyriadError> for ApiError {
    /// Mapping is by error kind: rejected input stays a caller error,
    /// everything that died in transit or upstream is a server error.
    fn from(err: MyriadError) -> Self {
        let status = if err.is_invalid_params() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

/// Error body shape.
#[derive(Debug, Serialize)]
struct ErrorBody {
    /// Human-readable failure description.
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, "{}", self.message);
        } else {
            warn!(status = %self.status, "{}", self.message);
        }
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "healthy" while the process serves requests.
    pub status: &'static str,
    /// Current UTC time.
    pub timestamp: String,
    /// Crate version.
    pub version: &'static str,
}

/// Acknowledgment returned by ingestion endpoints.
#[derive(Debug, Serialize)]
pub struct Ack {
    /// Always "success".
    pub status: &'static str,
}

const ACK: Ack = Ack { status: "success" };

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        timestamp: utc_now_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Prometheus exposition endpoint.
pub async fn render_metrics(State(app): State<AppState>) -> Response {
    match &app.prometheus {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

/// Account summary handler.
pub async fn account(State(app): State<AppState>) -> Json<AccountInfo> {
    Json(app.state.account().await)
}

/// Open positions handler.
pub async fn positions(State(app): State<AppState>) -> Json<Vec<Position>> {
    Json(app.state.positions().await)
}

fn default_page() -> u32 {
    1
}

fn default_decision_limit() -> u32 {
    20
}

fn default_trade_limit() -> u32 {
    50
}

fn default_list_limit() -> u32 {
    20
}

fn default_event_limit() -> u32 {
    50
}

fn check_range(name: &str, value: u32, min: u32, max: u32) -> Result<(), ApiError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!(
            "{name} must be between {min} and {max}"
        )))
    }
}

/// Query parameters for `GET /decisions`.
#[derive(Debug, Deserialize)]
pub struct DecisionsQuery {
    /// Maximum entries to return (1-100, default 20).
    #[serde(default = "default_decision_limit")]
    pub limit: u32,
    /// Filter by asset ticker, case-insensitive.
    pub asset: Option<String>,
}

/// Recent decisions handler.
pub async fn decisions(
    State(app): State<AppState>,
    Query(query): Query<DecisionsQuery>,
) -> Result<Json<Vec<TradeDecision>>, ApiError> {
    check_range("limit", query.limit, 1, 100)?;
    Ok(Json(
        app.state
            .decisions(query.limit as usize, query.asset.as_deref())
            .await,
    ))
}

/// Query parameters for `GET /market-analysis`.
#[derive(Debug, Deserialize)]
pub struct AnalysisQuery {
    /// Filter by asset ticker, case-insensitive.
    pub asset: Option<String>,
}

/// Market analyses handler.
pub async fn market_analysis(
    State(app): State<AppState>,
    Query(query): Query<AnalysisQuery>,
) -> Json<Vec<MarketAnalysis>> {
    Json(app.state.analyses(query.asset.as_deref()).await)
}

/// Query parameters for `GET /trades`.
#[derive(Debug, Deserialize)]
pub struct TradesQuery {
    /// Maximum entries to return (1-500, default 50).
    #[serde(default = "default_trade_limit")]
    pub limit: u32,
    /// Filter by asset ticker, case-insensitive.
    pub asset: Option<String>,
    /// Filter by execution status, exact match.
    pub status: Option<String>,
}

/// Trade history handler.
pub async fn trades(
    State(app): State<AppState>,
    Query(query): Query<TradesQuery>,
) -> Result<Json<Vec<TradeRecord>>, ApiError> {
    check_range("limit", query.limit, 1, 500)?;
    Ok(Json(
        app.state
            .trades(
                query.limit as usize,
                query.asset.as_deref(),
                query.status.as_deref(),
            )
            .await,
    ))
}

/// Static trading parameters exposed for observability.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayConfig {
    /// Maximum risk per trade, percent of account.
    pub max_risk_per_trade: f64,
    /// Minimum position value in quote currency.
    pub min_position_value: f64,
    /// Maximum position value in quote currency.
    pub max_position_value: f64,
    /// Stop loss, percent from entry.
    pub stop_loss_pct: f64,
    /// Take profit, percent from entry.
    pub take_profit_pct: f64,
    /// Maximum concurrent open trades.
    pub max_concurrent_trades: u32,
    /// Maximum trades per day.
    pub max_daily_trades: u32,
    /// Tracked asset tickers.
    pub assets: Vec<String>,
    /// Analysis interval hint.
    pub interval: String,
}

/// Current configuration handler.
pub async fn get_config(State(app): State<AppState>) -> Json<GatewayConfig> {
    Json(GatewayConfig {
        max_risk_per_trade: 3.0,
        min_position_value: 50.0,
        max_position_value: 300.0,
        stop_loss_pct: 1.5,
        take_profit_pct: 3.0,
        max_concurrent_trades: 4,
        max_daily_trades: 10,
        assets: app.assets.clone(),
        interval: app.interval.clone(),
    })
}

/// Partial configuration update. Accepted and echoed back; nothing is
/// applied to a live strategy.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConfigUpdate {
    /// Maximum risk per trade, percent (0-10).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_risk_per_trade: Option<f64>,
    /// Maximum concurrent open trades (0-20).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_trades: Option<u32>,
    /// Maximum trades per day (0-100).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_daily_trades: Option<u32>,
    /// Stop loss, percent (0-10).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss_pct: Option<f64>,
    /// Take profit, percent (0-20).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit_pct: Option<f64>,
}

impl ConfigUpdate {
    fn validate(&self) -> Result<(), String> {
        fn in_range(name: &str, value: Option<f64>, max: f64) -> Result<(), String> {
            match value {
                Some(v) if !(0.0..=max).contains(&v) => {
                    Err(format!("{name} must be between 0 and {max}"))
                }
                _ => Ok(()),
            }
        }
        in_range("max_risk_per_trade", self.max_risk_per_trade, 10.0)?;
        in_range("stop_loss_pct", self.stop_loss_pct, 10.0)?;
        in_range("take_profit_pct", self.take_profit_pct, 20.0)?;
        if let Some(v) = self.max_concurrent_trades {
            if v > 20 {
                return Err("max_concurrent_trades must be between 0 and 20".to_string());
            }
        }
        if let Some(v) = self.max_daily_trades {
            if v > 100 {
                return Err("max_daily_trades must be between 0 and 100".to_string());
            }
        }
        Ok(())
    }
}

/// Acknowledgment for `PUT /config`.
#[derive(Debug, Serialize)]
pub struct ConfigAck {
    /// Always "success".
    pub status: &'static str,
    /// What happened to the update.
    pub message: &'static str,
    /// The fields that were supplied.
    pub updated_fields: ConfigUpdate,
}

/// Configuration update handler. Pure acknowledgment.
pub async fn update_config(
    Json(update): Json<ConfigUpdate>,
) -> Result<Json<ConfigAck>, ApiError> {
    update.validate().map_err(ApiError::bad_request)?;
    info!(?update, "configuration update requested");
    Ok(Json(ConfigAck {
        status: "success",
        message: "configuration acknowledged, not applied to a live strategy",
        updated_fields: update,
    }))
}

/// Performance statistics handler.
pub async fn performance(State(app): State<AppState>) -> Json<PerformanceReport> {
    Json(app.state.performance().await)
}

// --- Myriad proxy handlers ---

/// Query parameters for `GET /myriad/questions`.
#[derive(Debug, Deserialize)]
pub struct QuestionsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_list_limit")]
    pub limit: u32,
    pub keyword: Option<String>,
    pub min_markets: Option<u32>,
    pub max_markets: Option<u32>,
}

/// Proxy: list questions.
pub async fn myriad_questions(
    State(app): State<AppState>,
    Query(query): Query<QuestionsQuery>,
) -> Result<Json<Value>, ApiError> {
    check_range("page", query.page, 1, u32::MAX)?;
    check_range("limit", query.limit, 1, 100)?;
    let params = QuestionsParams {
        page: query.page,
        limit: query.limit,
        keyword: query.keyword,
        min_markets: query.min_markets,
        max_markets: query.max_markets,
    };
    Ok(Json(app.myriad.questions(&params).await?))
}

/// Proxy: get one question by id.
pub async fn myriad_question(
    State(app): State<AppState>,
    Path(question_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(app.myriad.question(question_id).await?))
}

/// Query parameters for `GET /myriad/markets`.
#[derive(Debug, Deserialize)]
pub struct MarketsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_list_limit")]
    pub limit: u32,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub network_id: Option<i64>,
    pub state: Option<String>,
    pub token_address: Option<String>,
    pub topics: Option<String>,
    pub keyword: Option<String>,
}

/// Proxy: list markets.
pub async fn myriad_markets(
    State(app): State<AppState>,
    Query(query): Query<MarketsQuery>,
) -> Result<Json<Value>, ApiError> {
    check_range("page", query.page, 1, u32::MAX)?;
    check_range("limit", query.limit, 1, 100)?;
    let defaults = MarketsParams::default();
    let params = MarketsParams {
        page: query.page,
        limit: query.limit,
        sort: query.sort.unwrap_or(defaults.sort),
        order: query.order.unwrap_or(defaults.order),
        network_id: query.network_id,
        state: query.state,
        token_address: query.token_address,
        topics: query.topics,
        keyword: query.keyword,
    };
    Ok(Json(app.myriad.markets(&params).await?))
}

/// Resolve a path key into a market reference: numeric keys are on-chain
/// ids (and need `network_id`), everything else is a slug.
fn market_from_key(key: &str, network_id: Option<i64>) -> Result<MarketRef, ApiError> {
    match key.parse::<i64>() {
        Ok(market_id) => Ok(MarketRef::resolve(None, Some(market_id), network_id)?),
        Err(_) => Ok(MarketRef::Slug(key.to_string())),
    }
}

/// Query parameters for market lookup.
#[derive(Debug, Deserialize)]
pub struct MarketLookupQuery {
    pub network_id: Option<i64>,
}

/// Proxy: get one market by slug or id.
pub async fn myriad_market(
    State(app): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<MarketLookupQuery>,
) -> Result<Json<Value>, ApiError> {
    let market = market_from_key(&key, query.network_id)?;
    Ok(Json(app.myriad.market(&market).await?))
}

/// Query parameters for `GET /myriad/markets/{key}/events`.
#[derive(Debug, Deserialize)]
pub struct MarketEventsQuery {
    pub network_id: Option<i64>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_event_limit")]
    pub limit: u32,
    pub since: Option<i64>,
    pub until: Option<i64>,
}

/// Proxy: list market events.
pub async fn myriad_market_events(
    State(app): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<MarketEventsQuery>,
) -> Result<Json<Value>, ApiError> {
    check_range("page", query.page, 1, u32::MAX)?;
    check_range("limit", query.limit, 1, 100)?;
    let market = market_from_key(&key, query.network_id)?;
    let params = MarketEventsParams {
        page: query.page,
        limit: query.limit,
        since: query.since,
        until: query.until,
    };
    Ok(Json(app.myriad.market_events(&market, &params).await?))
}

/// Query parameters for `GET /myriad/markets/{key}/holders`.
#[derive(Debug, Deserialize)]
pub struct MarketHoldersQuery {
    pub network_id: Option<i64>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_event_limit")]
    pub limit: u32,
}

/// Proxy: list market holders.
pub async fn myriad_market_holders(
    State(app): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<MarketHoldersQuery>,
) -> Result<Json<Value>, ApiError> {
    check_range("page", query.page, 1, u32::MAX)?;
    check_range("limit", query.limit, 1, 100)?;
    let market = market_from_key(&key, query.network_id)?;
    let params = MarketHoldersParams {
        page: query.page,
        limit: query.limit,
    };
    Ok(Json(app.myriad.market_holders(&market, &params).await?))
}

/// Proxy: price a trade.
pub async fn myriad_quote(
    State(app): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(app.myriad.market_quote(&request).await?))
}

/// Query parameters for `GET /myriad/user/{address}/events`.
#[derive(Debug, Deserialize)]
pub struct UserEventsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_event_limit")]
    pub limit: u32,
    pub market_id: Option<i64>,
    pub network_id: Option<i64>,
    pub since: Option<i64>,
    pub until: Option<i64>,
}

/// Proxy: list a user's events.
pub async fn myriad_user_events(
    State(app): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<UserEventsQuery>,
) -> Result<Json<Value>, ApiError> {
    check_range("page", query.page, 1, u32::MAX)?;
    check_range("limit", query.limit, 1, 100)?;
    let params = UserEventsParams {
        page: query.page,
        limit: query.limit,
        market_id: query.market_id,
        network_id: query.network_id,
        since: query.since,
        until: query.until,
    };
    Ok(Json(app.myriad.user_events(&address, &params).await?))
}

/// Query parameters for `GET /myriad/user/{address}/portfolio`.
#[derive(Debug, Deserialize)]
pub struct PortfolioQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_list_limit")]
    pub limit: u32,
    pub market_slug: Option<String>,
    pub market_id: Option<i64>,
    pub network_id: Option<i64>,
    pub token_address: Option<String>,
}

/// Proxy: get a user's portfolio.
pub async fn myriad_user_portfolio(
    State(app): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<PortfolioQuery>,
) -> Result<Json<Value>, ApiError> {
    check_range("page", query.page, 1, u32::MAX)?;
    check_range("limit", query.limit, 1, 100)?;
    let params = PortfolioParams {
        page: query.page,
        limit: query.limit,
        market_slug: query.market_slug,
        market_id: query.market_id,
        network_id: query.network_id,
        token_address: query.token_address,
    };
    Ok(Json(app.myriad.user_portfolio(&address, &params).await?))
}

// --- Trusted ingestion handlers ---
//
// Callers are assumed to sit inside the deployment trust boundary; there
// is no application-level auth on these routes.

/// Ingest a partial state update from the bot.
pub async fn ingest_state(
    State(app): State<AppState>,
    Json(update): Json<StateUpdate>,
) -> Json<Ack> {
    app.state.apply_update(update).await;
    Json(ACK)
}

/// Ingest a single trading decision from the bot.
pub async fn ingest_decision(
    State(app): State<AppState>,
    Json(decision): Json<TradeDecision>,
) -> Json<Ack> {
    app.state.push_decision(decision).await;
    Json(ACK)
}

/// Ingest a completed trade from the bot.
pub async fn ingest_trade(
    State(app): State<AppState>,
    Json(trade): Json<TradeRecord>,
) -> Json<Ack> {
    app.state.push_trade(trade).await;
    Json(ACK)
}
