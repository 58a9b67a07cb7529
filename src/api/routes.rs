//! HTTP API route definitions.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{
    account, decisions, get_config, health, ingest_decision, ingest_state, ingest_trade,
    market_analysis, myriad_market, myriad_market_events, myriad_market_holders, myriad_markets,
    myriad_question, myriad_questions, myriad_quote, myriad_user_events, myriad_user_portfolio,
    performance, positions, render_metrics, trades, update_config, AppState,
};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Bot state endpoints
        .route("/health", get(health))
        .route("/account", get(account))
        .route("/positions", get(positions))
        .route("/decisions", get(decisions))
        .route("/market-analysis", get(market_analysis))
        .route("/trades", get(trades))
        .route("/config", get(get_config).put(update_config))
        .route("/performance", get(performance))
        .route("/metrics", get(render_metrics))
        // Myriad proxy endpoints
        .route("/myriad/questions", get(myriad_questions))
        .route("/myriad/questions/:question_id", get(myriad_question))
        .route("/myriad/markets", get(myriad_markets))
        .route("/myriad/markets/:key", get(myriad_market))
        .route("/myriad/markets/:key/events", get(myriad_market_events))
        .route("/myriad/markets/:key/holders", get(myriad_market_holders))
        .route("/myriad/quote", post(myriad_quote))
        .route("/myriad/user/:address/events", get(myriad_user_events))
        .route("/myriad/user/:address/portfolio", get(myriad_user_portfolio))
        // Trusted ingestion endpoints
        .route("/internal/update-state", post(ingest_state))
        .route("/internal/add-decision", post(ingest_decision))
        .route("/internal/add-trade", post(ingest_trade))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Request, Response, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::myriad::{MyriadClient, Transport};

    /// App state whose upstream points at a dead address: anything that
    /// actually dials out fails, which is exactly what these tests want.
    fn test_state() -> AppState {
        let transport =
            Transport::new("http://127.0.0.1:9", None, Duration::from_millis(100)).unwrap();
        AppState::new(&Config::default(), MyriadClient::from_transport(transport))
    }

    fn test_router() -> Router {
        create_router(test_state())
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_req(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let response = test_router().oneshot(get_req("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn account_starts_idle_and_empty() {
        let response = test_router().oneshot(get_req("/account")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "idle");
        assert_eq!(body["total_positions"], 0);
        assert_eq!(body["last_update"], Value::Null);
    }

    #[tokio::test]
    async fn ingested_decision_shows_up_in_listing() {
        let app = test_router();
        let decision = json!({
            "timestamp": "2026-01-05T12:00:00Z",
            "asset": "BTC",
            "action": "buy",
            "conviction": "high",
            "signal_type": "momentum",
            "reasoning": "breakout",
        });

        let response = app
            .clone()
            .oneshot(json_req("POST", "/internal/add-decision", decision))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(get_req("/decisions")).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["asset"], "BTC");
        assert_eq!(body[0]["position_size"], Value::Null);
    }

    #[tokio::test]
    async fn decisions_limit_must_be_in_range() {
        let response = test_router()
            .oneshot(get_req("/decisions?limit=0"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("limit"));
    }

    #[tokio::test]
    async fn trades_filter_by_asset_and_status() {
        let app = test_router();
        for (asset, status) in [("BTC", "filled"), ("BTC", "cancelled"), ("ETH", "filled")] {
            let trade = json!({
                "timestamp": "2026-01-05T12:00:00Z",
                "asset": asset,
                "action": "buy",
                "size": 0.5,
                "price": 100.0,
                "value": 50.0,
                "status": status,
            });
            let response = app
                .clone()
                .oneshot(json_req("POST", "/internal/add-trade", trade))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .oneshot(get_req("/trades?asset=btc&status=filled"))
            .await
            .unwrap();
        let body = body_json(response).await;
        let trades = body.as_array().unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0]["asset"], "BTC");
        assert_eq!(trades[0]["status"], "filled");
    }

    #[tokio::test]
    async fn state_update_flows_into_account_and_performance() {
        let app = test_router();
        let update = json!({
            "status": "running",
            "account_value": 1500.25,
            "trade_history": [
                {
                    "timestamp": "2026-01-05T11:00:00Z",
                    "asset": "BTC",
                    "action": "sell",
                    "size": 0.5,
                    "price": 100.0,
                    "value": 50.0,
                    "status": "filled",
                    "pnl": 7.5,
                },
            ],
        });

        let response = app
            .clone()
            .oneshot(json_req("POST", "/internal/update-state", update))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let account = body_json(app.clone().oneshot(get_req("/account")).await.unwrap()).await;
        assert_eq!(account["status"], "running");
        assert_eq!(account["account_value"], 1500.25);
        assert!(account["last_update"].is_string());

        let perf = body_json(app.oneshot(get_req("/performance")).await.unwrap()).await;
        assert_eq!(perf["total_trades"], 1);
        assert_eq!(perf["winning_trades"], 1);
        assert_eq!(perf["total_pnl"], 7.5);
    }

    #[tokio::test]
    async fn config_reports_static_parameters() {
        let response = test_router().oneshot(get_req("/config")).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["max_daily_trades"], 10);
        assert_eq!(body["interval"], "15m");
        assert!(body["assets"]
            .as_array()
            .unwrap()
            .contains(&Value::String("BTC".to_string())));
    }

    #[tokio::test]
    async fn config_update_is_acknowledged_without_effect() {
        let app = test_router();
        let response = app
            .clone()
            .oneshot(json_req("PUT", "/config", json!({"stop_loss_pct": 2.0})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["updated_fields"], json!({"stop_loss_pct": 2.0}));

        // The reported configuration is unchanged.
        let config = body_json(app.oneshot(get_req("/config")).await.unwrap()).await;
        assert_eq!(config["stop_loss_pct"], 1.5);
    }

    #[tokio::test]
    async fn config_update_rejects_out_of_range_values() {
        let response = test_router()
            .oneshot(json_req("PUT", "/config", json!({"max_risk_per_trade": 50.0})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_quote_is_rejected_without_upstream() {
        // The upstream address is unroutable, so a 400 here proves the
        // request was rejected before any network call.
        let response = test_router()
            .oneshot(json_req(
                "POST",
                "/myriad/quote",
                json!({
                    "market_slug": "btc-above-100k",
                    "outcome_id": 0,
                    "action": "buy",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("value"));
    }

    #[tokio::test]
    async fn id_addressed_market_requires_network_id() {
        let response = test_router()
            .oneshot(get_req("/myriad/markets/42"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn proxy_limit_bounds_are_enforced() {
        let response = test_router()
            .oneshot(get_req("/myriad/markets?limit=101"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn metrics_route_is_404_without_recorder() {
        let response = test_router().oneshot(get_req("/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
