//! Typed access to the FretesJá REST API.
//!
//! This module holds the wire envelopes every endpoint shares and the
//! verb-level client page controllers consume. Authentication concerns
//! live in `auth`; everything here assumes the transport already handles
//! them.

pub mod client;
pub mod common;

pub use client::{ApiClient, QueryParams};
pub use common::{ApiResponse, PaginatedResponse, Pagination};
