//! User Entity
//!
//! Profile, credentials and permission flags in one aggregate.
//! Users are deactivated rather than deleted.

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use kernel::principal::Principal;

use crate::domain::value_object::{email::Email, user_name::UserName, user_password::UserPassword};

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub user_name: UserName,
    pub full_name: Option<String>,
    pub email: Option<Email>,
    pub password: UserPassword,
    /// Supervisors and office staff
    pub is_staff: bool,
    pub is_superuser: bool,
    /// Inactive users cannot log in, refresh or use issued tokens
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub date_joined: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn record_login(&mut self) {
        let now = Utc::now();
        self.last_login_at = Some(now);
        self.updated_at = now;
    }

    pub fn can_login(&self) -> bool {
        self.is_active
    }

    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.id,
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
        }
    }
}

/// Registration data before the database assigns an id
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_name: UserName,
    pub full_name: Option<String>,
    pub email: Option<Email>,
    pub password: UserPassword,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl NewUser {
    /// Regular worker account, the only kind self-registration creates
    pub fn worker(user_name: UserName, password: UserPassword) -> Self {
        Self {
            user_name,
            full_name: None,
            email: None,
            password,
            is_staff: false,
            is_superuser: false,
        }
    }
}
