//! Unified error types for the gateway.

use thiserror::Error;

/// Top-level error type for the gateway service.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Myriad API client error.
    #[error("myriad error: {0}")]
    Myriad(#[from] MyriadError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the Myriad API client (request builder + transport).
#[derive(Error, Debug)]
pub enum MyriadError {
    /// Caller-supplied parameters failed validation; no network call was made.
    #[error("invalid request: {0}")]
    InvalidParams(String),

    /// Upstream answered with a non-retryable error status.
    #[error("myriad api returned {status}: {body}")]
    Status {
        /// HTTP status of the final response.
        status: reqwest::StatusCode,
        /// Response body, verbatim.
        body: String,
    },

    /// Upstream kept failing with retryable statuses until the budget ran out.
    #[error("myriad api still failing after {attempts} attempts ({status}): {body}")]
    RetriesExhausted {
        /// Total requests sent, including the initial attempt.
        attempts: u32,
        /// HTTP status of the last response.
        status: reqwest::StatusCode,
        /// Body of the last response.
        body: String,
    },

    /// HTTP transport failure (connect, timeout, decode).
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl MyriadError {
    /// Shorthand for a validation failure.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParams(msg.into())
    }

    /// Whether this error was caused by the caller's input rather than the
    /// upstream service.
    pub fn is_invalid_params(&self) -> bool {
        matches!(self, Self::InvalidParams(_))
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, GatewayError>;
