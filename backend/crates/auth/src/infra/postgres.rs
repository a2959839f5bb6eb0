//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{
    revoked_token::RevokedToken,
    user::{NewUser, User},
};
use crate::domain::repository::{TokenBlacklistRepository, UserRepository};
use crate::domain::value_object::{
    email::Email, user_name::UserName, user_password::UserPassword,
};
use crate::error::{AuthError, AuthResult};

/// Unique index on the lowercase user name
const USER_NAME_UNIQUE: &str = "users_user_name_canonical_key";

const USER_COLUMNS: &str = r#"
    id,
    user_name,
    full_name,
    email,
    password_hash,
    is_staff,
    is_superuser,
    is_active,
    last_login_at,
    date_joined,
    updated_at
"#;

#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn create_user(&self, user: &NewUser) -> AuthResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users (
                user_name,
                user_name_canonical,
                full_name,
                email,
                password_hash,
                is_staff,
                is_superuser
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.user_name.original())
            .bind(user.user_name.canonical())
            .bind(user.full_name.as_deref())
            .bind(user.email.as_ref().map(Email::as_str))
            .bind(user.password.as_phc_string())
            .bind(user.is_staff)
            .bind(user.is_superuser)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.constraint() == Some(USER_NAME_UNIQUE) => {
                    AuthError::UserNameTaken
                }
                _ => AuthError::Database(e),
            })?;

        row.into_user()
    }

    async fn find_user_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_id.get())
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_user_by_name(&self, user_name: &UserName) -> AuthResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_name_canonical = $1");

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_name.canonical())
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn user_name_exists(&self, user_name: &UserName) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE user_name_canonical = $1)",
        )
        .bind(user_name.canonical())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn update_user(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                full_name = $2,
                email = $3,
                password_hash = $4,
                is_staff = $5,
                is_superuser = $6,
                is_active = $7,
                last_login_at = $8,
                updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(user.id.get())
        .bind(user.full_name.as_deref())
        .bind(user.email.as_ref().map(Email::as_str))
        .bind(user.password.as_phc_string())
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .bind(user.is_active)
        .bind(user.last_login_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Token Blacklist Implementation
// ============================================================================

impl TokenBlacklistRepository for PgAuthRepository {
    async fn revoke(&self, token: &RevokedToken) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO revoked_tokens (jti, user_id, kind, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(token.jti)
        .bind(token.user_id.get())
        .bind(token.kind.as_str())
        .bind(token.expires_at)
        .execute(&self.pool)
        .await?;

        tracing::debug!(jti = %token.jti, kind = %token.kind, "Token revoked");

        Ok(())
    }

    async fn is_revoked(&self, jti: Uuid) -> AuthResult<bool> {
        let revoked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE jti = $1)",
        )
        .bind(jti)
        .fetch_one(&self.pool)
        .await?;

        Ok(revoked)
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < now()")
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(tokens_deleted = deleted, "Cleaned up expired token blacklist");

        Ok(deleted)
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    user_name: String,
    full_name: Option<String>,
    email: Option<String>,
    password_hash: String,
    is_staff: bool,
    is_superuser: bool,
    is_active: bool,
    last_login_at: Option<DateTime<Utc>>,
    date_joined: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        Ok(User {
            id: UserId::new(self.id),
            user_name: UserName::from_db(&self.user_name),
            full_name: self.full_name,
            email: self.email.map(Email::from_db),
            password: UserPassword::from_phc_string(self.password_hash)?,
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
            is_active: self.is_active,
            last_login_at: self.last_login_at,
            date_joined: self.date_joined,
            updated_at: self.updated_at,
        })
    }
}
