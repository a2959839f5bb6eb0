//! Worksite Router
//!
//! Routes expect a `Principal` request extension. The binary wraps this
//! router in the auth crate's bearer-token middleware.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use platform::storage::{FsMediaStore, MediaStore};
use std::sync::Arc;

use crate::application::config::WorksiteConfig;
use crate::domain::repository::WorksiteStore;
use crate::infra::postgres::PgWorksiteRepository;
use crate::presentation::handlers::{self, WorksiteAppState};

/// Headroom for multipart boundaries and headers around the image
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the worksite router with PostgreSQL and filesystem storage
pub fn worksite_router(
    repo: PgWorksiteRepository,
    media: FsMediaStore,
    config: WorksiteConfig,
) -> Router {
    worksite_router_generic(repo, media, config)
}

/// Create a generic worksite router for any repository and storage backend
pub fn worksite_router_generic<R, S>(repo: R, media: S, config: WorksiteConfig) -> Router
where
    R: WorksiteStore,
    S: MediaStore + Clone + Send + Sync + 'static,
{
    let upload_limit = config.max_image_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES);

    let state = WorksiteAppState {
        repo: Arc::new(repo),
        media: Arc::new(media),
        config: Arc::new(config),
    };

    Router::new()
        // Status engine
        .route("/object/status/{id}", get(handlers::object_status::<R, S>))
        .route("/start", post(handlers::start_work::<R, S>))
        .route("/start/free", post(handlers::start_free_work::<R, S>))
        .route("/end", post(handlers::end_work::<R, S>))
        .route("/review/{work_id}", post(handlers::review_work::<R, S>))
        .route(
            "/works_without_reviews",
            get(handlers::works_without_reviews::<R, S>),
        )
        // Objects
        .route(
            "/objects",
            post(handlers::create_object::<R, S>).get(handlers::list_objects::<R, S>),
        )
        .route(
            "/objects/{id}",
            get(handlers::get_object::<R, S>)
                .patch(handlers::update_object::<R, S>)
                .delete(handlers::delete_object::<R, S>),
        )
        .route(
            "/object/{id}/works",
            post(handlers::create_planned_work::<R, S>),
        )
        // Work queries
        .route(
            "/object/work-history/{id}",
            get(handlers::work_history::<R, S>),
        )
        .route("/object/work-free/{id}", get(handlers::free_works::<R, S>))
        .route("/info/{work_id}", get(handlers::work_info::<R, S>))
        .route("/user/works", get(handlers::user_works::<R, S>))
        // Images
        .route(
            "/image_work/{work_id}",
            post(handlers::upload_image::<R, S>).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/image_work/{work_id}/list",
            get(handlers::list_images::<R, S>),
        )
        .route(
            "/image_work/{work_id}/{image_id}",
            get(handlers::get_image::<R, S>).delete(handlers::delete_image::<R, S>),
        )
        .with_state(state)
}
