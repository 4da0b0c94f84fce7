use std::sync::Arc;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::refresh::RefreshStore;
use crate::auth::token::TokenIssuer;
use crate::auth::{JwtResponse, RegistrationRequest};
use crate::error::AppError;
use crate::models::{Role, User, UserDto};
use crate::storage::UserStore;
use uuid::Uuid;

/// Orchestrates registration, login and refresh-token rotation.
///
/// Holds no state of its own beyond its injected collaborators; the only
/// mutation it performs is `RefreshStore::put`, which is what makes a
/// previously issued refresh token for the same user unusable.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    issuer: TokenIssuer,
    refresh_store: Arc<dyn RefreshStore>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        issuer: TokenIssuer,
        refresh_store: Arc<dyn RefreshStore>,
    ) -> Self {
        Self {
            users,
            issuer,
            refresh_store,
        }
    }

    /// Registers a new user with the `USER` role.
    ///
    /// Password and confirmation are compared as exact strings before any
    /// hashing happens. A taken username is a 409.
    pub async fn register(&self, request: &RegistrationRequest) -> Result<UserDto, AppError> {
        if request.password != request.confirm_password {
            return Err(AppError::BadRequest("Passwords do not match".into()));
        }
        if self.users.exists(&request.username).await? {
            return Err(AppError::Conflict(format!(
                "User with username '{}' already exists",
                request.username
            )));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: request.username.clone(),
            password_hash: hash_password(&request.password)?,
            roles: [Role::User].into_iter().collect(),
        };
        let saved = self.users.save(user).await?;
        Ok(UserDto::from(&saved))
    }

    /// Checks credentials and issues a fresh access/refresh pair.
    ///
    /// Recording the refresh token in the store is the point at which any
    /// previously issued refresh token for this user stops working: one
    /// active session per user.
    pub async fn login(&self, username: &str, password: &str) -> Result<JwtResponse, AppError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("User with username '{}' not found", username))
            })?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::BadRequest("Incorrect password".into()));
        }

        let token = self.issuer.access_token(&user)?;
        let refresh_token = self.issuer.refresh_token(&user)?;
        self.refresh_store.put(&user.username, &refresh_token);

        Ok(JwtResponse {
            token,
            refresh_token,
        })
    }

    /// Rotates a refresh token into a brand-new access/refresh pair.
    ///
    /// Every failure mode (malformed, expired, bad signature, no stored
    /// token, stored token mismatch) collapses into the same generic
    /// outcome so the client cannot tell an expired token from a
    /// superseded one. A presented token that verifies but does not match
    /// the stored value is a replay of a rotated-out token.
    pub async fn refresh(&self, presented: &str) -> Result<JwtResponse, AppError> {
        let invalid = || AppError::Unauthorized("Invalid refresh token".to_string());

        let claims = self
            .issuer
            .codec()
            .verify(presented)
            .map_err(|_| invalid())?;

        match self.refresh_store.get(&claims.sub) {
            Some(stored) if stored == presented => {}
            _ => return Err(invalid()),
        }

        let user = self
            .users
            .find_by_username(&claims.sub)
            .await?
            .ok_or_else(invalid)?;

        let token = self.issuer.access_token(&user)?;
        let refresh_token = self.issuer.refresh_token(&user)?;
        self.refresh_store.put(&user.username, &refresh_token);

        Ok(JwtResponse {
            token,
            refresh_token,
        })
    }
}
