//! Current User Use Case

use std::sync::Arc;

use kernel::principal::Principal;

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::error::{AuthError, AuthResult};

pub struct CurrentUserUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
}

impl<R> CurrentUserUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, principal: &Principal) -> AuthResult<User> {
        self.repo
            .find_user_by_id(principal.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}
