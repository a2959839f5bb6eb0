//! JWT issuing and validation
//!
//! Access and refresh tokens are both HS256 JWTs. They differ only in
//! lifetime and in the `kind` claim, which every decode checks.

use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use kernel::id::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::domain::entity::revoked_token::RevokedToken;
use crate::domain::value_object::token_kind::TokenKind;
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i64,
    pub kind: TokenKind,
    /// Issued-at (UTC Unix timestamp)
    pub iat: i64,
    /// Expiration (UTC Unix timestamp)
    pub exp: i64,
    /// Unique token id, the blacklist key
    pub jti: Uuid,
}

impl Claims {
    pub fn user_id(&self) -> UserId {
        UserId::new(self.sub)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }

    /// Blacklist entry that outlives the token by nothing
    pub fn revocation(&self) -> RevokedToken {
        RevokedToken {
            jti: self.jti,
            user_id: self.user_id(),
            kind: self.kind,
            expires_at: self.expires_at(),
        }
    }
}

/// Sign a fresh token of `kind` for `user_id`
pub fn issue(user_id: UserId, kind: TokenKind, config: &AuthConfig) -> AuthResult<String> {
    let now = Utc::now().timestamp();
    let ttl = match kind {
        TokenKind::Access => config.access_ttl_secs(),
        TokenKind::Refresh => config.refresh_ttl_secs(),
    };

    let claims = Claims {
        sub: user_id.get(),
        kind,
        iat: now,
        exp: now + ttl,
        jti: Uuid::new_v4(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(&config.jwt_secret),
    )
    .map_err(|e| AuthError::Internal(format!("Token encoding failed: {e}")))
}

/// Verify signature and expiry, then require the expected `kind`
pub fn verify(token: &str, expected: TokenKind, config: &AuthConfig) -> AuthResult<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(&config.jwt_secret),
        &Validation::default(),
    )?;

    if data.claims.kind != expected {
        tracing::debug!(
            expected = %expected,
            actual = %data.claims.kind,
            "Token kind mismatch"
        );
        return Err(AuthError::InvalidToken);
    }

    Ok(data.claims)
}
