//! GTrader gateway: REST access to a trading bot's state plus a
//! pass-through client for the Myriad Protocol prediction-market API.
//!
//! The process is a thin shim between three parties:
//!
//! ```text
//! trading bot ──POST /internal/*──▶ ┌─────────┐ ◀──GET /account ...── dashboards
//!                                   │ gateway  │
//!                                   └────┬────┘
//!                                        │ /myriad/* proxied with retry + auth
//!                                        ▼
//!                              Myriad Protocol API v2
//! ```
//!
//! The bot pushes its state through the ingestion endpoints; external
//! callers read that state or reach through to Myriad. The gateway keeps
//! no state of its own beyond the in-memory snapshot.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`myriad`]: Myriad API client and retrying transport
//! - [`state`]: In-memory bot state snapshot
//! - [`api`]: HTTP API surface
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod myriad;
pub mod state;
pub mod utils;

pub use config::Config;
pub use error::{GatewayError, MyriadError, Result};
