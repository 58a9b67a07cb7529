//! Myriad Protocol API integration.
//!
//! This module handles:
//! - Request parameter types and validation
//! - The retrying HTTP transport
//! - The high-level API client used by the gateway handlers

pub mod client;
pub mod transport;
pub mod types;

pub use client::MyriadClient;
pub use transport::{RetryPolicy, Transport};
pub use types::{
    MarketEventsParams, MarketHoldersParams, MarketRef, MarketsParams, PortfolioParams,
    QuestionsParams, QuoteBody, QuoteRequest, TradeAction, UserEventsParams,
};
