use crate::config::Config;
use crate::error::AppError;
use chrono::Duration;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Distinguishes the two token flavours issued by the API.
///
/// Access and refresh tokens are signed with independent secrets, so a token of
/// one kind never verifies as the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Short-lived bearer credential sent on every request.
    Access,
    /// Long-lived credential persisted server-side and rotated on use.
    Refresh,
}

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token: the user's unique identifier.
    pub sub: Uuid,
    /// Email of the user at issuance time.
    pub email: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: usize,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
}

/// Signing material and lifetimes for both token kinds.
///
/// Constructed once at startup from [`Config`] and shared with handlers via
/// `web::Data`, so no token code reads the environment at request time.
#[derive(Clone)]
pub struct TokenKeys {
    access_secret: String,
    refresh_secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenKeys {
    pub fn new(
        access_secret: impl Into<String>,
        refresh_secret: impl Into<String>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.jwt_secret.clone(),
            config.refresh_token_secret.clone(),
            Duration::seconds(config.access_token_ttl_secs),
            Duration::days(config.refresh_token_ttl_days),
        )
    }

    /// Lifetime of refresh tokens; the session flow uses this to compute the
    /// stored expiry alongside the signed one.
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    fn secret(&self, kind: TokenKind) -> &str {
        match kind {
            TokenKind::Access => &self.access_secret,
            TokenKind::Refresh => &self.refresh_secret,
        }
    }

    fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    fn issue(&self, kind: TokenKind, user_id: Uuid, email: &str) -> Result<String, AppError> {
        let now = chrono::Utc::now();
        let expiration = now
            .checked_add_signed(self.ttl(kind))
            .ok_or_else(|| AppError::InternalServerError("Token expiry out of range".into()))?;

        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iat: now.timestamp() as usize,
            exp: expiration.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret(kind).as_bytes()),
        )
        .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    /// Issues a short-lived access token for the given user.
    pub fn issue_access(&self, user_id: Uuid, email: &str) -> Result<String, AppError> {
        self.issue(TokenKind::Access, user_id, email)
    }

    /// Issues a refresh token for the given user. The caller is responsible for
    /// persisting it in the refresh-token store.
    pub fn issue_refresh(&self, user_id: Uuid, email: &str) -> Result<String, AppError> {
        self.issue(TokenKind::Refresh, user_id, email)
    }

    /// Verifies a JWT of the given kind and decodes its claims.
    ///
    /// Fails with `AppError::InvalidToken` if the token is malformed, its
    /// signature does not match the kind's secret, or it has expired.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, AppError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret(kind).as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| AppError::InvalidToken(format!("Invalid token: {}", e)))
    }
}
