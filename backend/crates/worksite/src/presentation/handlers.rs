//! HTTP Handlers
//!
//! Every handler runs behind the bearer-token middleware and reads the
//! caller from the `Principal` extension.

use axum::extract::multipart::MultipartError;
use axum::extract::{Extension, Multipart, State};
use axum::http::StatusCode;
use axum::{Json, response::IntoResponse};
use kernel::id::{ObjectId, WorkId, WorkImageId};
use kernel::principal::Principal;
use platform::storage::MediaStore;
use std::sync::Arc;

use crate::application::config::WorksiteConfig;
use crate::application::{
    CreateObjectInput, EndWorkInput, EndWorkUseCase, ImageInput, ManageObjectsUseCase,
    ObjectStatusUseCase, PendingReviewsUseCase, PlannedWorkInput, ReviewInput, ReviewWorkUseCase,
    StartWorkInput, StartWorkUseCase, WorkImagesUseCase, WorkQueriesUseCase,
};
use crate::domain::repository::WorksiteStore;
use crate::error::{WorksiteError, WorksiteResult};
use crate::presentation::dto::{
    CreateObjectRequest, EndWorkRequest, FreeWorkResponse, ImageResponse, ObjectResponse,
    PlannedWorkRequest, ReviewRequest, ReviewResponse, StartFreeWorkRequest, StartWorkRequest,
    StatusResponse, UpdateObjectRequest, WorkDetailsResponse, WorkResponse,
};
use crate::presentation::extract::{ValidJson, ValidPath};

/// Multipart field carrying the uploaded photo
const IMAGE_FIELD: &str = "image";

/// Shared state for worksite handlers
#[derive(Clone)]
pub struct WorksiteAppState<R, S>
where
    R: WorksiteStore,
    S: MediaStore + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub media: Arc<S>,
    pub config: Arc<WorksiteConfig>,
}

impl<R, S> WorksiteAppState<R, S>
where
    R: WorksiteStore,
    S: MediaStore + Clone + Send + Sync + 'static,
{
    fn objects(&self) -> ManageObjectsUseCase<R, S> {
        ManageObjectsUseCase::new(self.repo.clone(), self.media.clone(), self.config.clone())
    }

    fn images(&self) -> WorkImagesUseCase<R, S> {
        WorkImagesUseCase::new(self.repo.clone(), self.media.clone(), self.config.clone())
    }
}

fn required<T>(value: Option<T>, field: &str) -> WorksiteResult<T> {
    value.ok_or_else(|| WorksiteError::validation(format!("{field} is required")))
}

// ============================================================================
// Status & transitions
// ============================================================================

/// GET /api/object/status/{id}
pub async fn object_status<R, S>(
    State(state): State<WorksiteAppState<R, S>>,
    Extension(principal): Extension<Principal>,
    ValidPath(object_id): ValidPath<ObjectId>,
) -> WorksiteResult<Json<StatusResponse>>
where
    R: WorksiteStore,
    S: MediaStore + Clone + Send + Sync + 'static,
{
    let use_case = ObjectStatusUseCase::new(state.repo.clone());
    let report = use_case.execute(&principal, object_id).await?;
    Ok(Json(StatusResponse::new(&report.status, report.stats)))
}

/// POST /api/start
pub async fn start_work<R, S>(
    State(state): State<WorksiteAppState<R, S>>,
    Extension(principal): Extension<Principal>,
    ValidJson(req): ValidJson<StartWorkRequest>,
) -> WorksiteResult<impl IntoResponse>
where
    R: WorksiteStore,
    S: MediaStore + Clone + Send + Sync + 'static,
{
    let use_case = StartWorkUseCase::new(state.repo.clone());
    let work = use_case
        .execute(
            &principal,
            StartWorkInput {
                object_id: required(req.object, "object")?,
                name: req.name,
                description: req.description,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(WorkResponse::from(work))))
}

/// POST /api/start/free
pub async fn start_free_work<R, S>(
    State(state): State<WorksiteAppState<R, S>>,
    Extension(principal): Extension<Principal>,
    ValidJson(req): ValidJson<StartFreeWorkRequest>,
) -> WorksiteResult<Json<WorkResponse>>
where
    R: WorksiteStore,
    S: MediaStore + Clone + Send + Sync + 'static,
{
    let work_id = required(req.work_id, "work_id")?;

    let use_case = StartWorkUseCase::new(state.repo.clone());
    let work = use_case.execute_planned(&principal, work_id).await?;
    Ok(Json(work.into()))
}

/// POST /api/end
pub async fn end_work<R, S>(
    State(state): State<WorksiteAppState<R, S>>,
    Extension(principal): Extension<Principal>,
    ValidJson(req): ValidJson<EndWorkRequest>,
) -> WorksiteResult<Json<WorkResponse>>
where
    R: WorksiteStore,
    S: MediaStore + Clone + Send + Sync + 'static,
{
    let use_case = EndWorkUseCase::new(state.repo.clone());
    let work = use_case
        .execute(
            &principal,
            EndWorkInput {
                work_id: required(req.work_id, "work_id")?,
                comment: req.comment,
            },
        )
        .await?;

    Ok(Json(work.into()))
}

/// POST /api/review/{work_id}
pub async fn review_work<R, S>(
    State(state): State<WorksiteAppState<R, S>>,
    Extension(principal): Extension<Principal>,
    ValidPath(work_id): ValidPath<WorkId>,
    ValidJson(req): ValidJson<ReviewRequest>,
) -> WorksiteResult<impl IntoResponse>
where
    R: WorksiteStore,
    S: MediaStore + Clone + Send + Sync + 'static,
{
    let use_case = ReviewWorkUseCase::new(state.repo.clone());
    let review = use_case
        .execute(
            &principal,
            ReviewInput {
                work_id,
                rating: req.rating,
                comment: req.comment,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ReviewResponse::from(review))))
}

/// GET /api/works_without_reviews
pub async fn works_without_reviews<R, S>(
    State(state): State<WorksiteAppState<R, S>>,
    Extension(principal): Extension<Principal>,
) -> WorksiteResult<Json<Vec<WorkResponse>>>
where
    R: WorksiteStore,
    S: MediaStore + Clone + Send + Sync + 'static,
{
    let use_case = PendingReviewsUseCase::new(state.repo.clone());
    let works = use_case.execute(&principal).await?;
    Ok(Json(works.into_iter().map(WorkResponse::from).collect()))
}

// ============================================================================
// Objects
// ============================================================================

/// POST /api/objects
pub async fn create_object<R, S>(
    State(state): State<WorksiteAppState<R, S>>,
    Extension(principal): Extension<Principal>,
    ValidJson(req): ValidJson<CreateObjectRequest>,
) -> WorksiteResult<impl IntoResponse>
where
    R: WorksiteStore,
    S: MediaStore + Clone + Send + Sync + 'static,
{
    let object = state
        .objects()
        .create(
            &principal,
            CreateObjectInput {
                name: req.name,
                address: req.address,
                task_description: req.task_description,
                deadline: req.deadline,
                supervisor_id: req.supervisor,
                worker_ids: req.workers,
                start_time: req.start_time,
                end_time: req.end_time,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ObjectResponse::from(object))))
}

/// GET /api/objects
pub async fn list_objects<R, S>(
    State(state): State<WorksiteAppState<R, S>>,
    Extension(principal): Extension<Principal>,
) -> WorksiteResult<Json<Vec<ObjectResponse>>>
where
    R: WorksiteStore,
    S: MediaStore + Clone + Send + Sync + 'static,
{
    let objects = state.objects().list(&principal).await?;
    Ok(Json(objects.into_iter().map(ObjectResponse::from).collect()))
}

/// GET /api/objects/{id}
pub async fn get_object<R, S>(
    State(state): State<WorksiteAppState<R, S>>,
    Extension(principal): Extension<Principal>,
    ValidPath(object_id): ValidPath<ObjectId>,
) -> WorksiteResult<Json<ObjectResponse>>
where
    R: WorksiteStore,
    S: MediaStore + Clone + Send + Sync + 'static,
{
    let object = state.objects().get(&principal, object_id).await?;
    Ok(Json(object.into()))
}

/// PATCH /api/objects/{id}
pub async fn update_object<R, S>(
    State(state): State<WorksiteAppState<R, S>>,
    Extension(principal): Extension<Principal>,
    ValidPath(object_id): ValidPath<ObjectId>,
    ValidJson(req): ValidJson<UpdateObjectRequest>,
) -> WorksiteResult<Json<ObjectResponse>>
where
    R: WorksiteStore,
    S: MediaStore + Clone + Send + Sync + 'static,
{
    let object = state
        .objects()
        .update(&principal, object_id, req.into())
        .await?;
    Ok(Json(object.into()))
}

/// DELETE /api/objects/{id}
pub async fn delete_object<R, S>(
    State(state): State<WorksiteAppState<R, S>>,
    Extension(principal): Extension<Principal>,
    ValidPath(object_id): ValidPath<ObjectId>,
) -> WorksiteResult<StatusCode>
where
    R: WorksiteStore,
    S: MediaStore + Clone + Send + Sync + 'static,
{
    state.objects().delete(&principal, object_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/object/{id}/works
pub async fn create_planned_work<R, S>(
    State(state): State<WorksiteAppState<R, S>>,
    Extension(principal): Extension<Principal>,
    ValidPath(object_id): ValidPath<ObjectId>,
    ValidJson(req): ValidJson<PlannedWorkRequest>,
) -> WorksiteResult<impl IntoResponse>
where
    R: WorksiteStore,
    S: MediaStore + Clone + Send + Sync + 'static,
{
    let work = state
        .objects()
        .create_planned_work(
            &principal,
            object_id,
            PlannedWorkInput {
                name: req.name,
                description: req.description,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(WorkResponse::from(work))))
}

// ============================================================================
// Work queries
// ============================================================================

/// GET /api/object/work-history/{id}
pub async fn work_history<R, S>(
    State(state): State<WorksiteAppState<R, S>>,
    Extension(principal): Extension<Principal>,
    ValidPath(object_id): ValidPath<ObjectId>,
) -> WorksiteResult<Json<Vec<WorkResponse>>>
where
    R: WorksiteStore,
    S: MediaStore + Clone + Send + Sync + 'static,
{
    let use_case = WorkQueriesUseCase::new(state.repo.clone());
    let works = use_case.history(&principal, object_id).await?;
    Ok(Json(works.into_iter().map(WorkResponse::from).collect()))
}

/// GET /api/object/work-free/{id}
pub async fn free_works<R, S>(
    State(state): State<WorksiteAppState<R, S>>,
    Extension(principal): Extension<Principal>,
    ValidPath(object_id): ValidPath<ObjectId>,
) -> WorksiteResult<Json<Vec<FreeWorkResponse>>>
where
    R: WorksiteStore,
    S: MediaStore + Clone + Send + Sync + 'static,
{
    let use_case = WorkQueriesUseCase::new(state.repo.clone());
    let works = use_case.free(&principal, object_id).await?;
    Ok(Json(works.into_iter().map(FreeWorkResponse::from).collect()))
}

/// GET /api/info/{work_id}
pub async fn work_info<R, S>(
    State(state): State<WorksiteAppState<R, S>>,
    Extension(principal): Extension<Principal>,
    ValidPath(work_id): ValidPath<WorkId>,
) -> WorksiteResult<Json<WorkDetailsResponse>>
where
    R: WorksiteStore,
    S: MediaStore + Clone + Send + Sync + 'static,
{
    let use_case = WorkQueriesUseCase::new(state.repo.clone());
    let details = use_case.details(&principal, work_id).await?;
    Ok(Json(WorkDetailsResponse::new(details, &state.config)))
}

/// GET /api/user/works
pub async fn user_works<R, S>(
    State(state): State<WorksiteAppState<R, S>>,
    Extension(principal): Extension<Principal>,
) -> WorksiteResult<Json<Vec<WorkDetailsResponse>>>
where
    R: WorksiteStore,
    S: MediaStore + Clone + Send + Sync + 'static,
{
    let use_case = WorkQueriesUseCase::new(state.repo.clone());
    let works = use_case.user_works(&principal).await?;
    Ok(Json(
        works
            .into_iter()
            .map(|details| WorkDetailsResponse::new(details, &state.config))
            .collect(),
    ))
}

// ============================================================================
// Images
// ============================================================================

/// POST /api/image_work/{work_id} (multipart, field `image`)
pub async fn upload_image<R, S>(
    State(state): State<WorksiteAppState<R, S>>,
    Extension(principal): Extension<Principal>,
    ValidPath(work_id): ValidPath<WorkId>,
    mut multipart: Multipart,
) -> WorksiteResult<impl IntoResponse>
where
    R: WorksiteStore,
    S: MediaStore + Clone + Send + Sync + 'static,
{
    let max_bytes = state.config.max_image_bytes;
    let multipart_error = |e: MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            WorksiteError::ImageTooLarge { max_bytes }
        } else {
            WorksiteError::validation(e.body_text())
        }
    };

    let mut input = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;

        input = Some(ImageInput {
            content_type,
            file_name,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let image = state.images().upload(&principal, work_id, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(ImageResponse::new(image, &state.config)),
    ))
}

/// GET /api/image_work/{work_id}/list
pub async fn list_images<R, S>(
    State(state): State<WorksiteAppState<R, S>>,
    Extension(principal): Extension<Principal>,
    ValidPath(work_id): ValidPath<WorkId>,
) -> WorksiteResult<Json<Vec<ImageResponse>>>
where
    R: WorksiteStore,
    S: MediaStore + Clone + Send + Sync + 'static,
{
    let images = state.images().list(&principal, work_id).await?;
    Ok(Json(
        images
            .into_iter()
            .map(|image| ImageResponse::new(image, &state.config))
            .collect(),
    ))
}

/// GET /api/image_work/{work_id}/{image_id}
pub async fn get_image<R, S>(
    State(state): State<WorksiteAppState<R, S>>,
    Extension(principal): Extension<Principal>,
    ValidPath((work_id, image_id)): ValidPath<(WorkId, WorkImageId)>,
) -> WorksiteResult<Json<ImageResponse>>
where
    R: WorksiteStore,
    S: MediaStore + Clone + Send + Sync + 'static,
{
    let image = state.images().get(&principal, work_id, image_id).await?;
    Ok(Json(ImageResponse::new(image, &state.config)))
}

/// DELETE /api/image_work/{work_id}/{image_id}
pub async fn delete_image<R, S>(
    State(state): State<WorksiteAppState<R, S>>,
    Extension(principal): Extension<Principal>,
    ValidPath((work_id, image_id)): ValidPath<(WorkId, WorkImageId)>,
) -> WorksiteResult<StatusCode>
where
    R: WorksiteStore,
    S: MediaStore + Clone + Send + Sync + 'static,
{
    state.images().delete(&principal, work_id, image_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
