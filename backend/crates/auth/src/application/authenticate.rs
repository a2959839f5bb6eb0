//! Authenticate Use Case
//!
//! Turns a bearer access token into the caller's `Principal`.

use std::sync::Arc;

use kernel::principal::Principal;

use crate::application::config::AuthConfig;
use crate::application::token;
use crate::domain::repository::{TokenBlacklistRepository, UserRepository};
use crate::domain::value_object::token_kind::TokenKind;
use crate::error::{AuthError, AuthResult};

pub struct AuthenticateUseCase<R>
where
    R: UserRepository + TokenBlacklistRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> AuthenticateUseCase<R>
where
    R: UserRepository + TokenBlacklistRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    /// Flags come from the current user row, not from the token, so
    /// permission changes apply without re-login.
    pub async fn execute(&self, access_token: &str) -> AuthResult<Principal> {
        let claims = token::verify(access_token, TokenKind::Access, &self.config)?;

        if self.repo.is_revoked(claims.jti).await? {
            return Err(AuthError::InvalidToken);
        }

        let user = self
            .repo
            .find_user_by_id(claims.user_id())
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !user.is_active {
            return Err(AuthError::InvalidToken);
        }

        Ok(user.principal())
    }
}
