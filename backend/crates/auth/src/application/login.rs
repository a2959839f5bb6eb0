//! Login Use Case
//!
//! Verifies credentials and issues an access/refresh token pair.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::token;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    token_kind::TokenKind, user_name::UserName, user_password::RawPassword,
};
use crate::error::{AuthError, AuthResult};

pub struct LoginInput {
    pub user_name: String,
    pub password: String,
}

pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct LoginUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> LoginUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, input: LoginInput) -> AuthResult<TokenPair> {
        let user_name =
            UserName::new(&input.user_name).map_err(|_| AuthError::InvalidCredentials)?;

        let mut user = self
            .repo
            .find_user_by_name(&user_name)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let raw_password = RawPassword::presented(input.password);
        if !user.password.verify(&raw_password, self.config.pepper()) {
            return Err(AuthError::InvalidCredentials);
        }

        // Checked after the password so inactive accounts are not enumerable
        if !user.can_login() {
            return Err(AuthError::AccountDisabled);
        }

        user.record_login();
        self.repo.update_user(&user).await?;

        let pair = TokenPair {
            access_token: token::issue(user.id, TokenKind::Access, &self.config)?,
            refresh_token: token::issue(user.id, TokenKind::Refresh, &self.config)?,
        };

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(pair)
    }
}
