//! Register Use Case
//!
//! Creates a regular worker account.

use std::sync::Arc;

use kernel::id::UserId;

use crate::application::config::AuthConfig;
use crate::domain::entity::user::NewUser;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    email::Email,
    user_name::UserName,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

pub struct RegisterInput {
    pub user_name: String,
    pub password: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

pub struct RegisterOutput {
    pub user_id: UserId,
    pub user_name: String,
}

pub struct RegisterUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> RegisterUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<RegisterOutput> {
        let user_name =
            UserName::new(&input.user_name).map_err(|e| AuthError::Validation(e.to_string()))?;

        // Early exit; the unique index still decides under a race
        if self.repo.user_name_exists(&user_name).await? {
            return Err(AuthError::UserNameTaken);
        }

        let email = Email::optional(input.email.as_deref())?;
        let raw_password = RawPassword::choose(input.password, user_name.canonical())?;
        let password = UserPassword::from_raw(&raw_password, self.config.pepper())?;

        let new_user = NewUser {
            full_name: input
                .full_name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
            email,
            ..NewUser::worker(user_name, password)
        };

        let user = self.repo.create_user(&new_user).await?;

        tracing::info!(
            user_id = %user.id,
            user_name = %user.user_name,
            "User registered"
        );

        Ok(RegisterOutput {
            user_id: user.id,
            user_name: user.user_name.original().to_string(),
        })
    }
}
