//! Error types shared by the agent server and the marketplace client.

use axum::http::StatusCode;
use thiserror::Error;

/// Result alias used throughout the SDK.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the SDK.
#[derive(Debug, Error)]
pub enum Error {
    /// Inbound webhook signature was missing, malformed or wrong.
    #[error("Invalid signature")]
    Unauthenticated,

    /// `/query` was called before a handler was registered.
    #[error("No query handler registered")]
    NoHandlerRegistered,

    /// The registered handler failed; carries its message.
    #[error("{0}")]
    Handler(String),

    /// The coordinator answered with an HTTP error status.
    #[error("marketplace request failed with status {status}: {message}")]
    Api {
        /// HTTP status code returned by the coordinator.
        status: u16,
        /// Remote error message, or `HTTP <status>` when none was sent.
        message: String,
    },

    /// The coordinator could not be reached or its reply could not be decoded.
    #[error("marketplace request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The supplied configuration cannot be used.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// HTTP status used when this error terminates an inbound request.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
