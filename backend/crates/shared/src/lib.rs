//! Shared Kernel - Domain-crossing minimal core
//!
//! Vocabulary shared by every domain crate:
//! - Common error types and result aliases
//! - Typed database identifiers
//! - The authenticated caller ([`principal::Principal`])
//!
//! Only things with the same meaning in every domain belong here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
pub mod principal;
