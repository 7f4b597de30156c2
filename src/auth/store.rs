//! Server-side persistence for refresh tokens.
//!
//! Every issued refresh token is written here; a token missing from this table
//! is unusable regardless of its signature. Rotation and logout work by
//! deleting rows, so revocation is always a plain delete-by-value.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// A stored refresh token joined with its owner's public fields.
#[derive(Debug, FromRow)]
pub struct StoredRefreshToken {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub user_email: String,
    pub user_name: Option<String>,
}

/// Persists a freshly issued refresh token.
///
/// A colliding token value surfaces as `AppError::Conflict` via the unique
/// constraint on `token` (cryptographically negligible for signed JWTs).
pub async fn save(
    pool: &PgPool,
    user_id: Uuid,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query("INSERT INTO refresh_tokens (token, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .execute(pool)
        .await?;

    Ok(())
}

/// Looks up a refresh token by value, including the owning user's public fields.
pub async fn find(pool: &PgPool, token: &str) -> Result<Option<StoredRefreshToken>, AppError> {
    let record = sqlx::query_as::<_, StoredRefreshToken>(
        "SELECT rt.token, rt.user_id, rt.expires_at, u.email AS user_email, u.name AS user_name \
         FROM refresh_tokens rt \
         JOIN users u ON u.id = rt.user_id \
         WHERE rt.token = $1",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Deletes a refresh token by value. Deleting a token that is already gone is
/// not an error.
pub async fn revoke(pool: &PgPool, token: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(())
}

/// Deletes every refresh token belonging to the given user. Returns the number
/// of sessions revoked.
pub async fn revoke_all(pool: &PgPool, user_id: Uuid) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Deletes every refresh token whose expiry has passed. Maintenance operation,
/// driven by the background sweep task rather than by requests.
pub async fn sweep_expired(pool: &PgPool) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < NOW()")
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
