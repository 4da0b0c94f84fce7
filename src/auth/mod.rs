pub mod access;
pub mod middleware;
pub mod password;
pub mod principal;
pub mod refresh;
pub mod service;
pub mod token;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub use access::{is_admin, is_owner};
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use principal::AuthenticatedPrincipal;
pub use refresh::{InMemoryRefreshStore, RefreshStore};
pub use service::AuthService;
pub use token::{Claims, Clock, SystemClock, TokenCodec, TokenError, TokenIssuer};

lazy_static! {
    // Regex for username validation: alphanumeric, underscores, hyphens
    static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// Payload for a login request.
#[derive(Debug, Deserialize, Validate)]
pub struct AuthRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(length(min = 3, max = 255))]
    pub password: String,
}

/// Payload for a new user registration request. The password is entered
/// twice; the pair must match exactly before anything is hashed.
#[derive(Debug, Deserialize, Validate)]
pub struct RegistrationRequest {
    /// Must be 3-50 characters: alphanumeric, underscores or hyphens.
    #[validate(
        length(min = 3, max = 50),
        regex(
            path = "USERNAME_REGEX",
            message = "Username must be alphanumeric, underscores, or hyphens"
        )
    )]
    pub username: String,
    #[validate(length(min = 3, max = 255))]
    pub password: String,
    pub confirm_password: String,
}

/// Payload for a refresh-token rotation request.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// The access/refresh token pair returned by login and refresh.
/// Both are opaque strings to every caller except the token codec.
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtResponse {
    pub token: String,
    pub refresh_token: String,
}
