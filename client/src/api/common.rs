//! Wire envelopes shared by every API endpoint.
//!
//! The FretesJá backend wraps every response in a small JSON envelope.
//! This module defines the three shapes the client has to understand and
//! the decoding helper that turns an HTTP response into either typed data
//! or a [`ClientError`]. Includes:
//! - Standard success envelope with optional human-readable message
//! - Paginated envelope with camelCase pagination metadata
//! - Error envelope with a machine-readable code
//!
//! # Response Format
//! Successful responses carry:
//! - `success`: always `true`
//! - `data`: the payload, typed per endpoint
//! - `message`: optional human-readable text
//!
//! Paginated list responses additionally carry `pagination` with `page`,
//! `limit`, `total`, `totalPages`, `hasNext` and `hasPrev`.
//!
//! Failed responses (non-2xx) carry:
//! - `success`: always `false`
//! - `error.code`: machine-readable category
//! - `error.message`: human-readable text
//!
//! # Decoding Flow
//! 1. Transport failures keep their `reqwest` error.
//! 2. Non-2xx statuses are decoded as the error envelope; bodies that are
//!    not the envelope fall back to the `http_error` code.
//! 3. 2xx bodies are deserialized into the expected envelope type.

use crate::errors::{ClientError, ClientResult};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Standard success envelope for single-object endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Indicates if the request was successful
    pub success: bool,
    /// Response payload
    pub data: T,
    /// Optional human-readable message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Success envelope for list endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    /// Indicates if the request was successful
    pub success: bool,
    /// Items for the current page
    pub data: Vec<T>,
    /// Pagination metadata
    pub pagination: Pagination,
}

/// Pagination metadata, camelCase on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub limit: u32,
    /// Total number of items across all pages
    pub total: u64,
    /// Total number of pages
    pub total_pages: u32,
    /// Whether there is a next page
    pub has_next: bool,
    /// Whether there is a previous page
    pub has_prev: bool,
}

/// Error envelope for failed requests
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always `false`
    pub success: bool,
    /// Error details
    pub error: ApiErrorBody,
}

/// Error details for failed requests
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Machine-readable error category
    pub code: String,
    /// Human-readable description
    pub message: String,
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }

    /// Create a successful response without a message
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }
}

impl<T> PaginatedResponse<T> {
    /// Create a successful paginated response
    pub fn new(data: Vec<T>, pagination: Pagination) -> Self {
        Self {
            success: true,
            data,
            pagination,
        }
    }
}

impl Pagination {
    /// Create pagination metadata from page parameters and total count
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = if total == 0 {
            1
        } else {
            ((total - 1) / limit as u64 + 1) as u32
        };

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

impl ErrorEnvelope {
    /// Create an error envelope
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ApiErrorBody {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

/// Decodes an HTTP response into the expected envelope type.
///
/// Non-2xx responses become [`ClientError::Api`]; the error code comes from
/// the error envelope when the body is one, `http_error` otherwise.
pub async fn read_envelope<T>(response: reqwest::Response) -> ClientResult<T>
where
    T: DeserializeOwned,
{
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(error_from_body(status, &body));
    }

    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

/// Maps a failed response body to [`ClientError::Api`].
pub(crate) fn error_from_body(status: StatusCode, body: &str) -> ClientError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => ClientError::api(status, envelope.error.code, envelope.error.message),
        Err(_) => ClientError::api(
            status,
            "http_error",
            status.canonical_reason().unwrap_or("Request failed"),
        ),
    }
}
