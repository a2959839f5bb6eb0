//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use kernel::id::UserId;
use uuid::Uuid;

use crate::domain::entity::{
    revoked_token::RevokedToken,
    user::{NewUser, User},
};
use crate::domain::value_object::user_name::UserName;
use crate::error::AuthResult;

#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert a user. A taken user name yields `AuthError::UserNameTaken`.
    async fn create_user(&self, user: &NewUser) -> AuthResult<User>;

    async fn find_user_by_id(&self, user_id: UserId) -> AuthResult<Option<User>>;

    /// Case-insensitive lookup by canonical form
    async fn find_user_by_name(&self, user_name: &UserName) -> AuthResult<Option<User>>;

    async fn user_name_exists(&self, user_name: &UserName) -> AuthResult<bool>;

    async fn update_user(&self, user: &User) -> AuthResult<()>;
}

/// JWT blacklist
#[trait_variant::make(TokenBlacklistRepository: Send)]
pub trait LocalTokenBlacklistRepository {
    /// Add an entry. Revoking an already revoked token is a no-op.
    async fn revoke(&self, token: &RevokedToken) -> AuthResult<()>;

    async fn is_revoked(&self, jti: Uuid) -> AuthResult<bool>;

    /// Drop entries whose token has expired
    async fn cleanup_expired(&self) -> AuthResult<u64>;
}
