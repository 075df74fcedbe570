//! Client-wide error types.
//!
//! This module defines the error type shared by every layer of the client
//! and a result alias used across the crate. Transport failures keep their
//! original `reqwest` error; API-level failures carry the code and message
//! the backend put in its error envelope.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by the FretesJá client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, TLS, timeout, connection reset).
    #[error("Network error: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    /// Error envelope returned by the API.
    #[error("API error {status} [{code}]: {message}")]
    Api {
        status: StatusCode,
        code: String,
        message: String,
    },

    /// Request payload rejected before any network call.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Session persistence failure.
    #[error("Session storage error: {source}")]
    Storage {
        #[from]
        source: std::io::Error,
    },

    /// Response body did not match the expected shape.
    #[error("Decode error: {source}")]
    Decode {
        #[from]
        source: serde_json::Error,
    },

    /// The configured base URL and path do not form a valid URL.
    #[error("Invalid URL: {message}")]
    InvalidUrl { message: String },
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    // Helper constructors for common patterns

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn api(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            message: message.into(),
        }
    }

    /// HTTP status carried by the error, when one exists.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Network { source } => source.status(),
            _ => None,
        }
    }
}
