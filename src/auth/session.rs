//! The session flow: register, login, refresh (with rotation), logout and
//! logout-all, expressed as plain async functions over injected dependencies.
//!
//! Handlers pass in the connection pool and the process-wide [`TokenKeys`];
//! nothing in here touches the environment or any global state.

use crate::auth::password::{hash_password, verify_password};
use crate::auth::store;
use crate::auth::token::{TokenKeys, TokenKind};
use crate::auth::{AuthResponse, LoginRequest, RegisterRequest};
use crate::error::AppError;
use crate::models::{PublicUser, User};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

/// Issues an access/refresh token pair for the user and persists the refresh
/// token. The stored expiry mirrors the refresh token's signed expiry.
async fn issue_session(
    pool: &PgPool,
    keys: &TokenKeys,
    user: &PublicUser,
) -> Result<(String, String), AppError> {
    let access_token = keys.issue_access(user.id, &user.email)?;
    let refresh_token = keys.issue_refresh(user.id, &user.email)?;

    let expires_at = Utc::now() + keys.refresh_ttl();
    store::save(pool, user.id, &refresh_token, expires_at).await?;

    Ok((access_token, refresh_token))
}

async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, email, name, password_hash, created_at, updated_at \
         FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Creates a new account and opens a session for it.
///
/// Fails with `Conflict` when the email is already registered.
pub async fn register(
    pool: &PgPool,
    keys: &TokenKeys,
    payload: RegisterRequest,
) -> Result<AuthResponse, AppError> {
    if find_user_by_email(pool, &payload.email).await?.is_some() {
        return Err(AppError::Conflict(
            "User with this email already exists".into(),
        ));
    }

    let password_hash = hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, PublicUser>(
        "INSERT INTO users (id, email, name, password_hash) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, email, name",
    )
    .bind(Uuid::new_v4())
    .bind(&payload.email)
    .bind(&payload.name)
    .bind(&password_hash)
    .fetch_one(pool)
    .await?;

    let (access_token, refresh_token) = issue_session(pool, keys, &user).await?;

    Ok(AuthResponse {
        user,
        access_token,
        refresh_token,
    })
}

/// Authenticates credentials and opens a session.
///
/// An unknown email and a wrong password both fail with the same
/// `Unauthorized` message, so a caller cannot probe which emails exist.
pub async fn login(
    pool: &PgPool,
    keys: &TokenKeys,
    payload: LoginRequest,
) -> Result<AuthResponse, AppError> {
    let user = find_user_by_email(pool, &payload.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".into()))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    }

    let public = PublicUser::from(&user);
    let (access_token, refresh_token) = issue_session(pool, keys, &public).await?;

    Ok(AuthResponse {
        user: public,
        access_token,
        refresh_token,
    })
}

/// Exchanges a refresh token for a new token pair, rotating the presented
/// token out of the store.
///
/// Failure modes, in order of detection:
/// - token absent from the store: `InvalidToken`
/// - stored expiry passed: `TokenExpired`, and the stale record is deleted, so
///   a replay of the same token fails with `InvalidToken`
/// - bad signature: `InvalidToken`
/// - owning user deleted since issuance: `NotFound`
///
/// Once rotation completes the presented token is never valid again, even if
/// resubmitted immediately.
pub async fn refresh(pool: &PgPool, keys: &TokenKeys, token: &str) -> Result<AuthResponse, AppError> {
    if token.is_empty() {
        return Err(AppError::BadRequest("Refresh token is required".into()));
    }

    let stored = store::find(pool, token)
        .await?
        .ok_or_else(|| AppError::InvalidToken("Invalid refresh token".into()))?;

    if stored.expires_at < Utc::now() {
        store::revoke(pool, token).await?;
        return Err(AppError::TokenExpired("Refresh token expired".into()));
    }

    keys.verify(token, TokenKind::Refresh)?;

    let user = sqlx::query_as::<_, PublicUser>("SELECT id, email, name FROM users WHERE id = $1")
        .bind(stored.user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    // Rotate: the presented token dies before its replacement is issued.
    store::revoke(pool, token).await?;
    let (access_token, refresh_token) = issue_session(pool, keys, &user).await?;

    Ok(AuthResponse {
        user,
        access_token,
        refresh_token,
    })
}

/// Revokes a single refresh token. Revoking a token the store no longer holds
/// succeeds quietly, so logout is safe to retry.
pub async fn logout(pool: &PgPool, token: &str) -> Result<(), AppError> {
    if token.is_empty() {
        return Err(AppError::BadRequest("Refresh token is required".into()));
    }

    store::revoke(pool, token).await
}

/// Revokes every refresh token owned by the user, ending all their sessions.
pub async fn logout_all(pool: &PgPool, user_id: Uuid) -> Result<(), AppError> {
    let revoked = store::revoke_all(pool, user_id).await?;
    log::info!("Revoked {} refresh token(s) for user {}", revoked, user_id);

    Ok(())
}
