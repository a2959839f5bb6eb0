//! Worksite Backend Module
//!
//! Objects (construction sites), works, photo evidence and supervisor
//! reviews, plus the work status engine that decides what a user may do
//! on an object.
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, status engine, repository traits
//! - `application/` - Use cases
//! - `infra/` - PostgreSQL implementation
//! - `presentation/` - HTTP handlers
//!
//! ## Consistency Model
//! - Status is derived per request from work rows and never stored
//! - A user has at most one open work; starts are serialized per user and
//!   backed by a partial unique index
//! - Identity always comes from the access token, never from payloads

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::WorksiteConfig;
pub use domain::repository::WorksiteStore;
pub use domain::services::ObjectStatus;
pub use error::{WorksiteError, WorksiteResult};
pub use infra::postgres::PgWorksiteRepository;
pub use presentation::router::{worksite_router, worksite_router_generic};

#[cfg(test)]
mod tests;
