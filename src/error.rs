//! Error types for proxy communication.
//!
//! `ProxyError` covers the transport side (request failed, bad JSON, non-2xx
//! status); backend-reported conditions travel inside status documents as
//! [`crate::models::ErrorInfo`] and live in the store, not here.

use crate::models::{ErrorInfo, ErrorKind};
use thiserror::Error;

/// Error type for proxy client operations.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// HTTP request failed before a response was produced.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the JSON document we expected.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server answered with a non-success status.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The proxy URL given on the command line could not be parsed.
    #[error("invalid proxy URL {url:?}: {message}")]
    InvalidUrl { url: String, message: String },
}

impl ProxyError {
    /// True when the failure means the proxy itself is unreachable, as
    /// opposed to it answering with an application-level error.
    pub fn is_connection_error(&self) -> bool {
        match self {
            ProxyError::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            ProxyError::Server { status, .. } => *status >= 500,
            ProxyError::Json(_) | ProxyError::InvalidUrl { .. } => false,
        }
    }

    /// True when the server rejected our token.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ProxyError::Server { status, .. } if *status == 401 || *status == 403)
    }

    /// Convert into the store's error representation so the overlay selector
    /// can prioritize it like any backend-reported error.
    pub fn to_error_info(&self) -> ErrorInfo {
        let kind = if self.is_auth_error() {
            ErrorKind::Auth
        } else if self.is_connection_error() {
            ErrorKind::Connection
        } else {
            ErrorKind::Other
        };
        ErrorInfo::new(kind, self.to_string())
    }
}
