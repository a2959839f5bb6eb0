//! Logout Use Case
//!
//! Blacklists the refresh token and, when the call carried one, the bearer
//! access token. Repeating a logout is harmless.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::token;
use crate::domain::repository::TokenBlacklistRepository;
use crate::domain::value_object::token_kind::TokenKind;
use crate::error::AuthResult;

pub struct LogoutInput {
    pub refresh_token: String,
    pub access_token: Option<String>,
}

pub struct LogoutUseCase<R>
where
    R: TokenBlacklistRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> LogoutUseCase<R>
where
    R: TokenBlacklistRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, input: LogoutInput) -> AuthResult<()> {
        let refresh = token::verify(&input.refresh_token, TokenKind::Refresh, &self.config)?;
        self.repo.revoke(&refresh.revocation()).await?;

        // An already expired access token needs no entry
        if let Some(access_token) = input.access_token.as_deref() {
            if let Ok(access) = token::verify(access_token, TokenKind::Access, &self.config) {
                self.repo.revoke(&access.revocation()).await?;
            }
        }

        tracing::info!(user_id = refresh.sub, "User logged out");

        Ok(())
    }
}
