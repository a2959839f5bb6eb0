//! Refresh Use Case
//!
//! Exchanges a refresh token for a new access token. The refresh token
//! itself is not rotated and stays valid until it expires or is revoked.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::token;
use crate::domain::repository::{TokenBlacklistRepository, UserRepository};
use crate::domain::value_object::token_kind::TokenKind;
use crate::error::{AuthError, AuthResult};

pub struct RefreshUseCase<R>
where
    R: UserRepository + TokenBlacklistRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> RefreshUseCase<R>
where
    R: UserRepository + TokenBlacklistRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    /// Returns the new access token
    pub async fn execute(&self, refresh_token: &str) -> AuthResult<String> {
        let claims = token::verify(refresh_token, TokenKind::Refresh, &self.config)?;

        if self.repo.is_revoked(claims.jti).await? {
            tracing::warn!(user_id = claims.sub, jti = %claims.jti, "Revoked refresh token presented");
            return Err(AuthError::InvalidToken);
        }

        let user = self
            .repo
            .find_user_by_id(claims.user_id())
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !user.can_login() {
            return Err(AuthError::InvalidToken);
        }

        let access_token = token::issue(user.id, TokenKind::Access, &self.config)?;

        tracing::debug!(user_id = %user.id, "Access token refreshed");

        Ok(access_token)
    }
}
