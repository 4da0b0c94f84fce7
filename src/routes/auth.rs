use crate::{
    auth::{AuthRequest, AuthService, RefreshRequest, RegistrationRequest},
    error::AppError,
};
use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

/// Register a new user.
///
/// Creates a new account with the `USER` role and returns its public
/// projection. Password and confirmation must match; a taken username
/// yields 409.
#[post("/registration")]
pub async fn register(
    service: web::Data<AuthService>,
    body: web::Json<RegistrationRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    let user = service.register(&body).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Authenticate a user.
///
/// Validates credentials and returns an access/refresh token pair. Logging
/// in supersedes any refresh token issued by an earlier login.
#[post("/login")]
pub async fn login(
    service: web::Data<AuthService>,
    body: web::Json<AuthRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    let pair = service.login(&body.username, &body.password).await?;
    Ok(HttpResponse::Ok().json(pair))
}

/// Rotate a refresh token.
///
/// Exchanges a live refresh token for a brand-new pair; the presented
/// token is invalid from this point on. Any invalid token (expired,
/// tampered or already rotated out) yields the same 401.
#[post("/refresh")]
pub async fn refresh(
    service: web::Data<AuthService>,
    body: web::Json<RefreshRequest>,
) -> Result<impl Responder, AppError> {
    let pair = service.refresh(&body.refresh_token).await?;
    Ok(HttpResponse::Ok().json(pair))
}
