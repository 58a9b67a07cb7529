//! Request types for the Myriad Protocol API v2.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::MyriadError;

/// Abstract mainnet network id.
pub const ABSTRACT_MAINNET: i64 = 2741;
/// Abstract testnet network id.
pub const ABSTRACT_TESTNET: i64 = 11124;
/// Linea mainnet network id.
pub const LINEA_MAINNET: i64 = 59144;
/// Linea testnet network id.
pub const LINEA_TESTNET: i64 = 59141;
/// BNB chain mainnet network id.
pub const BNB_MAINNET: i64 = 56;
/// BNB chain testnet network id.
pub const BNB_TESTNET: i64 = 97;
/// Celo testnet network id.
pub const CELO_TESTNET: i64 = 44787;

/// Trade direction for quote requests.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TradeAction {
    /// Spend `value` tokens to acquire shares.
    Buy,
    /// Dispose of shares, sized by `value` or by `shares`.
    Sell,
}

/// How a market is addressed upstream: by slug, or by on-chain id plus the
/// network it is deployed on. Network ids are passed through without
/// membership checks — the known set (see the constants above) is open-ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketRef {
    /// Opaque market slug.
    Slug(String),
    /// On-chain market id, qualified by network.
    OnChain {
        /// Blockchain market id.
        market_id: i64,
        /// Network the market is deployed on.
        network_id: i64,
    },
}

impl MarketRef {
    /// Resolve an addressing mode from the three optional inputs.
    ///
    /// A slug wins when both modes are supplied. An on-chain id is only
    /// usable together with a network id. Fails when neither mode is
    /// satisfiable.
    pub fn resolve(
        slug: Option<String>,
        market_id: Option<i64>,
        network_id: Option<i64>,
    ) -> Result<Self, MyriadError> {
        if let Some(slug) = slug {
            return Ok(Self::Slug(slug));
        }
        match (market_id, network_id) {
            (Some(market_id), Some(network_id)) => Ok(Self::OnChain {
                market_id,
                network_id,
            }),
            (Some(_), None) => Err(MyriadError::invalid(
                "market_id addressing requires network_id",
            )),
            _ => Err(MyriadError::invalid(
                "must provide either slug or (market_id + network_id)",
            )),
        }
    }

    /// Path segment identifying the market (`/markets/{segment}/...`).
    pub fn path_segment(&self) -> String {
        match self {
            Self::Slug(slug) => slug.clone(),
            Self::OnChain { market_id, .. } => market_id.to_string(),
        }
    }

    /// The `network_id` query parameter for on-chain addressing, if any.
    pub fn network_param(&self) -> Option<(&'static str, String)> {
        match self {
            Self::Slug(_) => None,
            Self::OnChain { network_id, .. } => Some(("network_id", network_id.to_string())),
        }
    }
}

/// Parameters for listing questions.
#[derive(Debug, Clone)]
pub struct QuestionsParams {
    /// Page number, starting at 1.
    pub page: u32,
    /// Results per page (1-100).
    pub limit: u32,
    /// Search keyword for the question title.
    pub keyword: Option<String>,
    /// Minimum number of linked markets.
    pub min_markets: Option<u32>,
    /// Maximum number of linked markets.
    pub max_markets: Option<u32>,
}

impl Default for QuestionsParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            keyword: None,
            min_markets: None,
            max_markets: None,
        }
    }
}

impl QuestionsParams {
    pub(crate) fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(keyword) = &self.keyword {
            params.push(("keyword", keyword.clone()));
        }
        if let Some(min_markets) = self.min_markets {
            params.push(("min_markets", min_markets.to_string()));
        }
        if let Some(max_markets) = self.max_markets {
            params.push(("max_markets", max_markets.to_string()));
        }
        params
    }
}

/// Parameters for listing markets with filtering and sorting.
#[derive(Debug, Clone)]
pub struct MarketsParams {
    /// Page number, starting at 1.
    pub page: u32,
    /// Results per page (1-100).
    pub limit: u32,
    /// Sort field (volume, volume_24h, liquidity, expires_at, published_at).
    pub sort: String,
    /// Sort order (asc, desc).
    pub order: String,
    /// Filter by network id.
    pub network_id: Option<i64>,
    /// Filter by state (open, closed, resolved). Passed through unvalidated.
    pub state: Option<String>,
    /// Filter by token address.
    pub token_address: Option<String>,
    /// Comma-separated list of topics.
    pub topics: Option<String>,
    /// Full-text search across title, description, outcome titles.
    pub keyword: Option<String>,
}

impl Default for MarketsParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            sort: "volume".to_string(),
            order: "desc".to_string(),
            network_id: None,
            state: None,
            token_address: None,
            topics: None,
            keyword: None,
        }
    }
}

impl MarketsParams {
    pub(crate) fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
            ("sort", self.sort.clone()),
            ("order", self.order.clone()),
        ];
        if let Some(network_id) = self.network_id {
            params.push(("network_id", network_id.to_string()));
        }
        if let Some(state) = &self.state {
            params.push(("state", state.clone()));
        }
        if let Some(token_address) = &self.token_address {
            params.push(("token_address", token_address.clone()));
        }
        if let Some(topics) = &self.topics {
            params.push(("topics", topics.clone()));
        }
        if let Some(keyword) = &self.keyword {
            params.push(("keyword", keyword.clone()));
        }
        params
    }
}

/// Parameters for listing market events (trades, liquidity, claims).
#[derive(Debug, Clone)]
pub struct MarketEventsParams {
    /// Page number, starting at 1.
    pub page: u32,
    /// Results per page (1-100).
    pub limit: u32,
    /// Unix timestamp lower bound, inclusive.
    pub since: Option<i64>,
    /// Unix timestamp upper bound, inclusive.
    pub until: Option<i64>,
}

impl Default for MarketEventsParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 50,
            since: None,
            until: None,
        }
    }
}

impl MarketEventsParams {
    pub(crate) fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(since) = self.since {
            params.push(("since", since.to_string()));
        }
        if let Some(until) = self.until {
            params.push(("until", until.to_string()));
        }
        params
    }
}

/// Parameters for listing market holders (applied per outcome).
#[derive(Debug, Clone)]
pub struct MarketHoldersParams {
    /// Page number, starting at 1.
    pub page: u32,
    /// Results per page (1-100), applied per outcome.
    pub limit: u32,
}

impl Default for MarketHoldersParams {
    fn default() -> Self {
        Self { page: 1, limit: 50 }
    }
}

impl MarketHoldersParams {
    pub(crate) fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ]
    }
}

/// Parameters for listing a user's events across markets.
///
/// This endpoint is the odd one out upstream: it expects camelCase
/// `marketId`/`networkId` where every other operation takes snake_case.
#[derive(Debug, Clone)]
pub struct UserEventsParams {
    /// Page number, starting at 1.
    pub page: u32,
    /// Results per page (1-100).
    pub limit: u32,
    /// Filter by market id.
    pub market_id: Option<i64>,
    /// Filter by network id.
    pub network_id: Option<i64>,
    /// Unix timestamp lower bound, inclusive.
    pub since: Option<i64>,
    /// Unix timestamp upper bound, inclusive.
    pub until: Option<i64>,
}

impl Default for UserEventsParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 50,
            market_id: None,
            network_id: None,
            since: None,
            until: None,
        }
    }
}

impl UserEventsParams {
    pub(crate) fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(market_id) = self.market_id {
            params.push(("marketId", market_id.to_string()));
        }
        if let Some(network_id) = self.network_id {
            params.push(("networkId", network_id.to_string()));
        }
        if let Some(since) = self.since {
            params.push(("since", since.to_string()));
        }
        if let Some(until) = self.until {
            params.push(("until", until.to_string()));
        }
        params
    }
}

/// Parameters for a user's aggregated portfolio.
#[derive(Debug, Clone)]
pub struct PortfolioParams {
    /// Page number, starting at 1.
    pub page: u32,
    /// Results per page (1-100).
    pub limit: u32,
    /// Filter by market slug.
    pub market_slug: Option<String>,
    /// Filter by market id.
    pub market_id: Option<i64>,
    /// Filter by network id.
    pub network_id: Option<i64>,
    /// Filter by token address.
    pub token_address: Option<String>,
}

impl Default for PortfolioParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            market_slug: None,
            market_id: None,
            network_id: None,
            token_address: None,
        }
    }
}

impl PortfolioParams {
    pub(crate) fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(market_slug) = &self.market_slug {
            params.push(("market_slug", market_slug.clone()));
        }
        if let Some(market_id) = self.market_id {
            params.push(("market_id", market_id.to_string()));
        }
        if let Some(network_id) = self.network_id {
            params.push(("network_id", network_id.to_string()));
        }
        if let Some(token_address) = &self.token_address {
            params.push(("token_address", token_address.clone()));
        }
        params
    }
}

/// A trade-quote request as accepted from callers.
///
/// Carries the raw optional fields so validation happens in one place,
/// [`QuoteRequest::build_body`], before any network traffic.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    /// On-chain market id.
    #[serde(default)]
    pub market_id: Option<i64>,
    /// Market slug. Wins over `market_id` when both are present.
    #[serde(default)]
    pub market_slug: Option<String>,
    /// Network id, required alongside `market_id`.
    #[serde(default)]
    pub network_id: Option<i64>,
    /// On-chain outcome id.
    pub outcome_id: i64,
    /// Trade direction.
    pub action: TradeAction,
    /// Tokens to spend (buy) or receive (sell).
    #[serde(default)]
    pub value: Option<Decimal>,
    /// Shares to buy or sell.
    #[serde(default)]
    pub shares: Option<Decimal>,
    /// Slippage tolerance as a fraction in [0, 1).
    #[serde(default = "default_slippage")]
    pub slippage: Decimal,
}

fn default_slippage() -> Decimal {
    dec!(0.005)
}

impl QuoteRequest {
    /// Validate the request and assemble the upstream body.
    ///
    /// Sizing rules: buy is always sized by `value` (`shares` is ignored);
    /// sell takes `value` or `shares`, and when both are given only `value`
    /// is transmitted.
    pub fn build_body(&self) -> Result<QuoteBody, MyriadError> {
        let market = MarketRef::resolve(
            self.market_slug.clone(),
            self.market_id,
            self.network_id,
        )?;

        let (value, shares) = match self.action {
            TradeAction::Buy => match self.value {
                Some(value) => (Some(value), None),
                None => {
                    return Err(MyriadError::invalid("for buy action, 'value' is required"))
                }
            },
            TradeAction::Sell => match (self.value, self.shares) {
                (Some(value), _) => (Some(value), None),
                (None, Some(shares)) => (None, Some(shares)),
                (None, None) => {
                    return Err(MyriadError::invalid(
                        "for sell action, either 'value' or 'shares' is required",
                    ))
                }
            },
        };

        let (market_slug, market_id, network_id) = match market {
            MarketRef::Slug(slug) => (Some(slug), None, None),
            MarketRef::OnChain {
                market_id,
                network_id,
            } => (None, Some(market_id), Some(network_id)),
        };

        Ok(QuoteBody {
            market_slug,
            market_id,
            network_id,
            outcome_id: self.outcome_id,
            action: self.action,
            slippage: self.slippage,
            value,
            shares,
        })
    }
}

/// Wire body for `POST /markets/quote`. Absent fields are omitted entirely.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteBody {
    /// Market slug, for slug addressing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_slug: Option<String>,
    /// On-chain market id, for id addressing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_id: Option<i64>,
    /// Network id, paired with `market_id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_id: Option<i64>,
    /// On-chain outcome id.
    pub outcome_id: i64,
    /// Trade direction.
    pub action: TradeAction,
    /// Slippage tolerance.
    pub slippage: Decimal,
    /// Spend/receive amount; never sent together with `shares`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Decimal>,
    /// Share count; sell only, and only when `value` is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares: Option<Decimal>,
}
