//! Entity Module

pub mod revoked_token;
pub mod user;
