//! HTTP Handlers

use axum::extract::{Extension, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Json, response::IntoResponse};
use kernel::principal::Principal;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::{
    CurrentUserUseCase, LoginInput, LoginUseCase, LogoutInput, LogoutUseCase, RefreshUseCase,
    RegisterInput, RegisterUseCase,
};
use crate::domain::repository::{TokenBlacklistRepository, UserRepository};
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    AccessTokenResponse, LoginRequest, MeResponse, PingResponse, RefreshTokenRequest,
    RegisterRequest, RegisterResponse, TokenPairResponse,
};
use crate::presentation::extract::ValidJson;
use crate::presentation::middleware::bearer_token;

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<R>
where
    R: UserRepository + TokenBlacklistRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
}

fn required_refresh_token(req: RefreshTokenRequest) -> AuthResult<String> {
    req.refresh_token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AuthError::Validation("refresh_token is required".to_string()))
}

/// POST /api/auth/register
pub async fn register<R>(
    State(state): State<AuthAppState<R>>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + TokenBlacklistRepository + Clone + Send + Sync + 'static,
{
    let use_case = RegisterUseCase::new(state.repo.clone(), state.config.clone());

    let output = use_case
        .execute(RegisterInput {
            user_name: req.username,
            password: req.password,
            email: req.email,
            full_name: req.fullname,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: output.user_id,
            username: output.user_name,
        }),
    ))
}

/// POST /api/auth/login
pub async fn login<R>(
    State(state): State<AuthAppState<R>>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> AuthResult<Json<TokenPairResponse>>
where
    R: UserRepository + TokenBlacklistRepository + Clone + Send + Sync + 'static,
{
    let use_case = LoginUseCase::new(state.repo.clone(), state.config.clone());

    let pair = use_case
        .execute(LoginInput {
            user_name: req.username,
            password: req.password,
        })
        .await?;

    Ok(Json(TokenPairResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    }))
}

/// POST /api/auth/refresh
pub async fn refresh<R>(
    State(state): State<AuthAppState<R>>,
    ValidJson(req): ValidJson<RefreshTokenRequest>,
) -> AuthResult<Json<AccessTokenResponse>>
where
    R: UserRepository + TokenBlacklistRepository + Clone + Send + Sync + 'static,
{
    let refresh_token = required_refresh_token(req)?;

    let use_case = RefreshUseCase::new(state.repo.clone(), state.config.clone());
    let access_token = use_case.execute(&refresh_token).await?;

    Ok(Json(AccessTokenResponse { access_token }))
}

/// POST /api/auth/logout
pub async fn logout<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
    ValidJson(req): ValidJson<RefreshTokenRequest>,
) -> AuthResult<StatusCode>
where
    R: UserRepository + TokenBlacklistRepository + Clone + Send + Sync + 'static,
{
    let refresh_token = required_refresh_token(req)?;

    let use_case = LogoutUseCase::new(state.repo.clone(), state.config.clone());
    use_case
        .execute(LogoutInput {
            refresh_token,
            access_token: bearer_token(&headers).map(str::to_string),
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/ping
pub async fn ping(Extension(principal): Extension<Principal>) -> Json<PingResponse> {
    tracing::debug!(user_id = %principal.user_id, "Auth ping");
    Json(PingResponse { status: "auth" })
}

/// GET /api/auth/me
pub async fn me<R>(
    State(state): State<AuthAppState<R>>,
    Extension(principal): Extension<Principal>,
) -> AuthResult<Json<MeResponse>>
where
    R: UserRepository + TokenBlacklistRepository + Clone + Send + Sync + 'static,
{
    let use_case = CurrentUserUseCase::new(state.repo.clone());
    let user = use_case.execute(&principal).await?;
    Ok(Json(user.into()))
}
