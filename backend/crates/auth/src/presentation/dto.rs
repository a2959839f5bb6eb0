//! API DTOs (Data Transfer Objects)
//!
//! Request fields default to empty so that a missing field is reported by
//! domain validation as 400 rather than by the JSON extractor.

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use serde::{Deserialize, Serialize};

use crate::domain::entity::user::User;

// ============================================================================
// Register
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub fullname: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterResponse {
    pub id: UserId,
    pub username: String,
}

// ============================================================================
// Tokens
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Body of `/refresh` and `/logout`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RefreshTokenRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

// ============================================================================
// Authenticated
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct PingResponse {
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    pub id: UserId,
    pub username: String,
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub date_joined: DateTime<Utc>,
}

impl From<User> for MeResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.user_name.original().to_string(),
            fullname: user.full_name,
            email: user.email.map(|e| e.as_str().to_string()),
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            last_login: user.last_login_at,
            date_joined: user.date_joined,
        }
    }
}
