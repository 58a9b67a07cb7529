//! HTTP API module: bot state endpoints, Myriad proxy, and ingestion.

pub mod handlers;
pub mod routes;

pub use handlers::{ApiError, AppState};
pub use routes::create_router;
