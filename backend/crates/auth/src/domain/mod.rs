//! Domain Layer
//!
//! Contains entities, value objects, and repository traits.

pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{
    revoked_token::RevokedToken,
    user::{NewUser, User},
};
pub use repository::{TokenBlacklistRepository, UserRepository};
