//! Auth Middleware
//!
//! Bearer-token guard for protected routes. On success the caller's
//! `Principal` is placed in the request extensions, where handlers pick it
//! up with `Extension<Principal>`.

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;

use crate::application::AuthenticateUseCase;
use crate::application::config::AuthConfig;
use crate::domain::repository::{TokenBlacklistRepository, UserRepository};
use crate::error::AuthError;

#[derive(Clone)]
pub struct AuthMiddlewareState<R>
where
    R: UserRepository + TokenBlacklistRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
}

impl<R> AuthMiddlewareState<R>
where
    R: UserRepository + TokenBlacklistRepository + Clone + Send + Sync + 'static,
{
    pub fn new(repo: R, config: AuthConfig) -> Self {
        Self {
            repo: Arc::new(repo),
            config: Arc::new(config),
        }
    }
}

/// Token from `Authorization: Bearer <token>`, if present
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Reject the request with 401 unless it carries a valid access token
pub async fn require_access_token<R>(
    State(state): State<AuthMiddlewareState<R>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: UserRepository + TokenBlacklistRepository + Clone + Send + Sync + 'static,
{
    let token = bearer_token(req.headers()).ok_or(AuthError::MissingToken)?;

    let use_case = AuthenticateUseCase::new(state.repo.clone(), state.config.clone());
    let principal = use_case.execute(token).await?;

    tracing::debug!(user_id = %principal.user_id, "Request authenticated");

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}
