//! Data structures for authentication-related entities.
//!
//! This module defines user roles, the authenticated user, the token
//! payload returned by the auth endpoints, and the request bodies those
//! endpoints accept, carrying the same field rules the registration and
//! login forms enforce before submitting.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Roles a FretesJá account can hold, lowercase on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Carrier,
    Trucker,
    Admin,
    Operator,
}

/// Authenticated user as the backend reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    pub role: UserRole,
    pub name: String,
}

/// Response to login, registration, and token refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64, // Token expiration in seconds
    pub user: CurrentUser,
}

/// Login request payload
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Must be a valid email"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Trucker registration payload
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RegisterTruckerRequest {
    #[validate(length(min = 3, message = "Name must have at least 3 characters"))]
    pub name: String,

    #[validate(email(message = "Must be a valid email"))]
    pub email: String,

    #[validate(
        length(min = 8, message = "Password must have at least 8 characters"),
        custom(function = "validate_password_strength")
    )]
    pub password: String,

    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,

    #[validate(length(min = 1, message = "CPF is required"))]
    pub cpf: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
}

/// Carrier registration payload
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RegisterCarrierRequest {
    #[validate(length(min = 3, message = "Name must have at least 3 characters"))]
    pub name: String,

    #[validate(email(message = "Must be a valid email"))]
    pub email: String,

    #[validate(
        length(min = 8, message = "Password must have at least 8 characters"),
        custom(function = "validate_password_strength")
    )]
    pub password: String,

    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
}

/// Password recovery request
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Must be a valid email"))]
    pub email: String,
}

/// Password reset payload carrying the token from the recovery email
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,

    #[validate(
        length(min = 8, message = "Password must have at least 8 characters"),
        custom(function = "validate_password_strength")
    )]
    pub new_password: String,
}

/// Token refresh request. The response reuses [`AuthResponse`]: the
/// backend rotates both tokens and echoes the user.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Validates the registration form's strength rule: upper and lower case
/// letters, a digit and a special character.
fn validate_password_strength(password: &str) -> Result<(), validator::ValidationError> {
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| !c.is_ascii_alphanumeric());

    if has_upper && has_lower && has_digit && has_special {
        Ok(())
    } else {
        Err(validator::ValidationError::new(
            "password must mix upper and lower case letters, digits and special characters",
        ))
    }
}
