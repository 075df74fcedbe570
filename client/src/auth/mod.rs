//! Authentication module for session lifecycle and access control.
//!
//! This module provides login, registration and password recovery flows,
//! the authenticated HTTP transport with its single-flight token refresh,
//! and the role-based route gate.

pub mod guard;
pub mod interceptor;
pub mod models;
pub mod service;

// Re-exports for convenience
pub use guard::{RouteDecision, authorize};
pub use interceptor::AuthHttp;
pub use models::{CurrentUser, UserRole};
pub use service::AuthService;
