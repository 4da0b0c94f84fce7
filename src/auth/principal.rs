use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::collections::HashSet;
use std::future::{ready, Ready};

use crate::auth::token::Claims;
use crate::error::AppError;
use crate::models::Role;

/// The authenticated identity attached to a single in-flight request.
///
/// Created by `AuthMiddleware` from a validated access token's claims and
/// carried through request extensions; never persisted. The claims are
/// authoritative for the duration of the request; roles are not re-fetched
/// from the user store mid-request.
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal {
    pub username: String,
    pub roles: HashSet<Role>,
    pub authenticated: bool,
}

impl AuthenticatedPrincipal {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            username: claims.sub.clone(),
            roles: claims.roles.clone().unwrap_or_default(),
            authenticated: true,
        }
    }
}

/// Extracts the principal placed into request extensions by `AuthMiddleware`.
///
/// Handlers that require authentication take this extractor as a parameter;
/// when the request carried no token (the middleware passes such requests
/// through unauthenticated), extraction fails with 401.
impl FromRequest for AuthenticatedPrincipal {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedPrincipal>().cloned() {
            Some(principal) => ready(Ok(principal)),
            None => {
                let err = AppError::Unauthorized("Not authorized user".to_string());
                ready(Err(err.into()))
            }
        }
    }
}
