//! Authenticated caller
//!
//! Produced by the bearer-token middleware in the `auth` crate and consumed
//! by every protected handler. Identity always comes from here, never from
//! request payloads.

use serde::{Deserialize, Serialize};

use crate::id::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl Principal {
    /// Regular worker without elevated flags
    pub const fn worker(user_id: UserId) -> Self {
        Self {
            user_id,
            is_staff: false,
            is_superuser: false,
        }
    }

    /// Staff or superuser. Reviewers rate works instead of performing them.
    #[inline]
    pub const fn is_reviewer(&self) -> bool {
        self.is_staff || self.is_superuser
    }
}
