//! Myriad Protocol API v2 client.
//!
//! Thin, typed wrapper over [`Transport`]: each method validates and
//! assembles one upstream request, then returns the response JSON as-is.
//! Responses are deliberately untyped, the gateway relays them without
//! reshaping.

use std::time::Duration;

use serde_json::Value;
use tracing::{instrument, warn};

use crate::config::Config;
use crate::error::MyriadError;

use super::transport::Transport;
use super::types::{
    MarketEventsParams, MarketHoldersParams, MarketRef, MarketsParams, PortfolioParams,
    QuestionsParams, QuoteRequest, UserEventsParams,
};

/// Client for the Myriad prediction-market API.
#[derive(Debug, Clone)]
pub struct MyriadClient {
    transport: Transport,
}

impl MyriadClient {
    /// Create a client from config.
    pub fn new(config: &Config) -> Result<Self, MyriadError> {
        if config.myriad_api_key.is_none() {
            warn!("MYRIAD_API_KEY is not set, upstream requests will be unauthenticated");
        }
        let transport = Transport::new(
            &config.myriad_api_url,
            config.myriad_api_key.clone(),
            Duration::from_secs(config.http_timeout_secs),
        )?;
        Ok(Self { transport })
    }

    /// Create a client over an existing transport.
    pub fn from_transport(transport: Transport) -> Self {
        Self { transport }
    }

    /// List questions (groups of related markets).
    #[instrument(skip(self, params))]
    pub async fn questions(&self, params: &QuestionsParams) -> Result<Value, MyriadError> {
        self.transport.get("questions", &params.query()).await
    }

    /// Get a single question with its markets.
    #[instrument(skip(self))]
    pub async fn question(&self, question_id: i64) -> Result<Value, MyriadError> {
        self.transport
            .get(&format!("questions/{question_id}"), &[])
            .await
    }

    /// List markets with filtering, sorting and pagination.
    #[instrument(skip(self, params))]
    pub async fn markets(&self, params: &MarketsParams) -> Result<Value, MyriadError> {
        self.transport.get("markets", &params.query()).await
    }

    /// Get a single market by slug or on-chain id.
    #[instrument(skip(self))]
    pub async fn market(&self, market: &MarketRef) -> Result<Value, MyriadError> {
        let mut query = Vec::new();
        if let Some(network) = market.network_param() {
            query.push(network);
        }
        self.transport
            .get(&format!("markets/{}", market.path_segment()), &query)
            .await
    }

    /// List events (trades, liquidity changes, claims) for a market.
    #[instrument(skip(self, params))]
    pub async fn market_events(
        &self,
        market: &MarketRef,
        params: &MarketEventsParams,
    ) -> Result<Value, MyriadError> {
        let mut query = params.query();
        if let Some(network) = market.network_param() {
            query.push(network);
        }
        self.transport
            .get(&format!("markets/{}/events", market.path_segment()), &query)
            .await
    }

    /// List top holders for each outcome of a market.
    #[instrument(skip(self, params))]
    pub async fn market_holders(
        &self,
        market: &MarketRef,
        params: &MarketHoldersParams,
    ) -> Result<Value, MyriadError> {
        let mut query = params.query();
        if let Some(network) = market.network_param() {
            query.push(network);
        }
        self.transport
            .get(
                &format!("markets/{}/holders", market.path_segment()),
                &query,
            )
            .await
    }

    /// Price a prospective trade. Validation happens before any traffic:
    /// a request that fails [`QuoteRequest::build_body`] never leaves the
    /// process.
    #[instrument(skip(self, request))]
    pub async fn market_quote(&self, request: &QuoteRequest) -> Result<Value, MyriadError> {
        let body = request.build_body()?;
        self.transport.post_json("markets/quote", &body).await
    }

    /// List a user's events across all markets.
    #[instrument(skip(self, params))]
    pub async fn user_events(
        &self,
        address: &str,
        params: &UserEventsParams,
    ) -> Result<Value, MyriadError> {
        self.transport
            .get(&format!("users/{address}/events"), &params.query())
            .await
    }

    /// Get a user's aggregated portfolio.
    #[instrument(skip(self, params))]
    pub async fn user_portfolio(
        &self,
        address: &str,
        params: &PortfolioParams,
    ) -> Result<Value, MyriadError> {
        self.transport
            .get(&format!("users/{address}/portfolio"), &params.query())
            .await
    }
}
