//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod config;

use auth::{
    AuthMiddlewareState, PgAuthRepository, TokenBlacklistRepository, auth_router,
    require_access_token,
};
use axum::{
    Router, http,
    http::{Method, header},
    middleware,
};
use platform::storage::FsMediaStore;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use worksite::{PgWorksiteRepository, worksite_router};

use crate::config::ServerConfig;

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,auth=info,worksite=info,platform=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Startup cleanup: drop blacklist entries for tokens that expired anyway
    // Errors here should not prevent server startup
    let auth_repo = PgAuthRepository::new(pool.clone());
    match auth_repo.cleanup_expired().await {
        Ok(tokens) => {
            tracing::info!(tokens_deleted = tokens, "Token blacklist cleanup completed");
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Token blacklist cleanup failed, continuing anyway"
            );
        }
    }

    // CORS configuration
    let allowed_origins: Vec<http::HeaderValue> = config
        .frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]));

    // Worksite routes sit behind the bearer-token guard
    let guard = AuthMiddlewareState::new(auth_repo.clone(), config.auth.clone());
    let worksite = worksite_router(
        PgWorksiteRepository::new(pool.clone()),
        FsMediaStore::new(&config.media_root),
        config.worksite.clone(),
    )
    .route_layer(middleware::from_fn_with_state(
        guard,
        require_access_token::<PgAuthRepository>,
    ));

    // An absolute MEDIA_URL points at an external host; files are still served locally
    let media_path = match config.worksite.media_url.trim_matches('/') {
        path if path.is_empty() || path.contains("://") => "/media".to_string(),
        path => format!("/{path}"),
    };

    // Build router
    let app = Router::new()
        .nest("/api/auth", auth_router(auth_repo, config.auth))
        .nest("/api", worksite)
        .nest_service(&media_path, ServeDir::new(&config.media_root))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
