//! Revoked Token Entity
//!
//! Blacklist entry keyed by the JWT `jti`. Kept until the token would have
//! expired anyway, then removed by the startup cleanup.

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use uuid::Uuid;

use crate::domain::value_object::token_kind::TokenKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevokedToken {
    pub jti: Uuid,
    pub user_id: UserId,
    pub kind: TokenKind,
    pub expires_at: DateTime<Utc>,
}

impl RevokedToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
