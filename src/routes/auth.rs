use crate::{
    auth::{session, AuthenticatedUser, LoginRequest, RefreshTokenRequest, RegisterRequest, TokenKeys},
    error::AppError,
};
use actix_web::{post, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

/// Register a new user
///
/// Creates a new user account, opens a session, and returns the user's public
/// fields together with an access/refresh token pair.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    keys: web::Data<TokenKeys>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    // Validate input
    register_data.validate()?;

    let response = session::register(&pool, &keys, register_data.into_inner()).await?;

    Ok(HttpResponse::Created().json(response))
}

/// Login user
///
/// Authenticates a user and returns a fresh token pair.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    keys: web::Data<TokenKeys>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    // Validate input
    login_data.validate()?;

    let response = session::login(&pool, &keys, login_data.into_inner()).await?;

    Ok(HttpResponse::Ok().json(response))
}

/// Exchange a refresh token for a new token pair
///
/// The presented token is rotated out of the store; replaying it afterwards
/// fails.
#[post("/refresh")]
pub async fn refresh(
    pool: web::Data<PgPool>,
    keys: web::Data<TokenKeys>,
    refresh_data: web::Json<RefreshTokenRequest>,
) -> Result<impl Responder, AppError> {
    refresh_data.validate()?;

    let response = session::refresh(&pool, &keys, &refresh_data.refresh_token).await?;

    Ok(HttpResponse::Ok().json(response))
}

/// Logout
///
/// Revokes the presented refresh token. Revoking a token that is already gone
/// still reports success, so logout is safe to retry.
#[post("/logout")]
pub async fn logout(
    pool: web::Data<PgPool>,
    logout_data: web::Json<RefreshTokenRequest>,
) -> Result<impl Responder, AppError> {
    logout_data.validate()?;

    session::logout(&pool, &logout_data.refresh_token).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Logged out successfully"
    })))
}

/// Logout from all devices
///
/// Requires a valid access token; revokes every refresh token owned by the
/// authenticated user.
#[post("/logout-all")]
pub async fn logout_all(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    session::logout_all(&pool, user.0.sub).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Logged out from all devices"
    })))
}

#[cfg(test)]
mod tests {
    use crate::auth::{LoginRequest, RefreshTokenRequest};
    use validator::Validate;

    #[test]
    fn test_refresh_payload_rejects_empty_token() {
        let payload = RefreshTokenRequest {
            refresh_token: String::new(),
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_login_payload_requires_well_formed_email() {
        let payload = LoginRequest {
            email: "not-an-email".to_string(),
            password: "password123".to_string(),
        };
        assert!(payload.validate().is_err());
    }
}
