//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (random tokens, Base64)
//! - Password hashing (Argon2id, NIST SP 800-63B compliant)
//! - Media storage backends for uploaded files

pub mod crypto;
pub mod password;
pub mod storage;
