use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Role, User};

/// Source of the current time for expiry computation. Injectable so token
/// lifetime behavior can be tested without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The wall clock. Used everywhere outside of tests.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Claims carried by a signed token.
///
/// Access tokens carry the subject, its roles and an expiry; refresh tokens
/// carry the subject and expiry only. Roles are deliberately absent from
/// refresh tokens so that a refresh token can never authorize resource
/// access directly.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject of the token: the username.
    pub sub: String,
    /// Role set, present on access tokens only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<HashSet<Role>>,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Unique token id. Guarantees two tokens for the same subject are
    /// distinct strings even when issued within the same second, which the
    /// refresh-rotation exact-match check relies on.
    pub jti: Uuid,
}

/// The ways verification of a presented token can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Structurally invalid: not a JWT, bad base64, bad JSON, missing claims.
    Malformed,
    /// Signature and structure are fine but the expiry instant has passed.
    Expired,
    /// The signature does not verify against the server key.
    BadSignature,
    /// The token names an algorithm the codec does not accept.
    Unsupported,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "malformed token"),
            TokenError::Expired => write!(f, "expired token"),
            TokenError::BadSignature => write!(f, "bad token signature"),
            TokenError::Unsupported => write!(f, "unsupported token algorithm"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Produces and parses HS256-signed tokens.
///
/// Holds the single server-wide symmetric key, built once from the
/// base64-encoded configured secret. Pure with respect to the provided
/// clock and key; no side effects.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn from_base64_secret(secret: &str) -> Result<Self, AppError> {
        Self::with_clock(secret, Arc::new(SystemClock))
    }

    pub fn with_clock(secret: &str, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        let encoding_key = EncodingKey::from_base64_secret(secret)
            .map_err(|e| AppError::InternalServerError(format!("Invalid JWT secret: {}", e)))?;
        let decoding_key = DecodingKey::from_base64_secret(secret)
            .map_err(|e| AppError::InternalServerError(format!("Invalid JWT secret: {}", e)))?;
        Ok(Self {
            encoding_key,
            decoding_key,
            clock,
        })
    }

    /// Builds a signed token for `subject` expiring `ttl` from now.
    pub fn issue(
        &self,
        subject: &str,
        roles: Option<HashSet<Role>>,
        ttl: Duration,
    ) -> Result<String, AppError> {
        let claims = Claims {
            sub: subject.to_string(),
            roles,
            exp: (self.clock.now() + ttl).timestamp(),
            jti: Uuid::new_v4(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalServerError(format!("Failed to issue token: {}", e)))
    }

    /// Parses and verifies a presented token, returning its claims unaltered.
    ///
    /// Expiry is evaluated against the injected clock, not the library's
    /// internal one, so the clock is authoritative.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName
                | ErrorKind::MissingAlgorithm => TokenError::Unsupported,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })?;

        if claims.exp <= self.clock.now().timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

/// Translates a user identity into access and refresh tokens.
pub struct TokenIssuer {
    codec: Arc<TokenCodec>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(codec: Arc<TokenCodec>, access_secs: i64, refresh_secs: i64) -> Self {
        Self {
            codec,
            access_ttl: Duration::seconds(access_secs),
            refresh_ttl: Duration::seconds(refresh_secs),
        }
    }

    /// Short-lived token carrying subject and roles.
    pub fn access_token(&self, user: &User) -> Result<String, AppError> {
        self.codec
            .issue(&user.username, Some(user.roles.clone()), self.access_ttl)
    }

    /// Longer-lived token carrying the subject only.
    pub fn refresh_token(&self, user: &User) -> Result<String, AppError> {
        self.codec.issue(&user.username, None, self.refresh_ttl)
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }
}
