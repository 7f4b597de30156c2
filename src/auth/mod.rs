pub mod extractors;
pub mod middleware;
pub mod password;
pub mod session;
pub mod store;
pub mod token;

use crate::models::PublicUser;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use validator::Validate;

// Re-export necessary items
pub use extractors::AuthenticatedUser;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenKeys, TokenKind};

lazy_static! {
    // Display names: letters to start, then letters, spaces, dots, apostrophes, hyphens
    static ref NAME_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z][a-zA-Z .'-]*$").unwrap();
}

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// User's email address.
    /// Must be a valid email format.
    #[validate(email)]
    pub email: String,
    /// User's password. Presence is enough here; strength was enforced at
    /// registration.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Optional display name for the new account.
    #[validate(
        length(min = 2, max = 100),
        regex(path = "NAME_REGEX", message = "Name contains invalid characters")
    )]
    pub name: Option<String>,
    /// Email address for the new account.
    /// Must be a valid email format.
    #[validate(email)]
    pub email: String,
    /// Password for the new account.
    /// Must be at least 6 characters long.
    #[validate(length(min = 6))]
    pub password: String,
}

/// Payload carrying a refresh token, used by both the refresh and logout
/// endpoints.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Response structure after successful authentication (login, registration, or
/// refresh). Contains the user's public fields and a fresh token pair.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: PublicUser,
    /// Short-lived JWT sent as a bearer credential on subsequent requests.
    pub access_token: String,
    /// Long-lived token exchanged for a new pair at `/auth/refresh`; rotated
    /// (invalidated) on each use.
    pub refresh_token: String,
}
