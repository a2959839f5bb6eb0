//! Worksite Error Types
//!
//! Worksite-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::storage::StorageError;
use thiserror::Error;

pub type WorksiteResult<T> = Result<T, WorksiteError>;

#[derive(Debug, Error)]
pub enum WorksiteError {
    // 404
    #[error("Object not found")]
    ObjectNotFound,

    #[error("Work not found")]
    WorkNotFound,

    #[error("Image not found")]
    ImageNotFound,

    // 403
    #[error("You are neither a worker nor the supervisor of this object")]
    NoObjectAccess,

    #[error("Only the supervisor of this object can do that")]
    NotObjectManager,

    #[error("This work belongs to another user")]
    NotWorkOwner,

    #[error("Only staff can do that")]
    StaffOnly,

    #[error("Supervisors review works instead of starting them")]
    ReviewerCannotStart,

    // 409
    #[error("Already working on this object")]
    AlreadyWorkingHere,

    #[error("Already working on another object")]
    AlreadyWorkingElsewhere,

    /// Unique index fired without a visible open work (lost race)
    #[error("User already has an open work")]
    OpenWorkExists,

    #[error("Work is already closed")]
    WorkClosed,

    #[error("Work has already been taken")]
    WorkAlreadyTaken,

    #[error("Work has already been reviewed")]
    ReviewAlreadyExists,

    // 400 / 413
    #[error("{0}")]
    Validation(String),

    #[error("Image exceeds the {max_bytes} byte limit")]
    ImageTooLarge { max_bytes: usize },

    // 500
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WorksiteError {
    pub fn validation(message: impl Into<String>) -> Self {
        WorksiteError::Validation(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WorksiteError::ObjectNotFound
            | WorksiteError::WorkNotFound
            | WorksiteError::ImageNotFound => ErrorKind::NotFound,
            WorksiteError::NoObjectAccess
            | WorksiteError::NotObjectManager
            | WorksiteError::NotWorkOwner
            | WorksiteError::StaffOnly
            | WorksiteError::ReviewerCannotStart => ErrorKind::Forbidden,
            WorksiteError::AlreadyWorkingHere
            | WorksiteError::AlreadyWorkingElsewhere
            | WorksiteError::OpenWorkExists
            | WorksiteError::WorkClosed
            | WorksiteError::WorkAlreadyTaken
            | WorksiteError::ReviewAlreadyExists => ErrorKind::Conflict,
            WorksiteError::Validation(_) => ErrorKind::BadRequest,
            WorksiteError::ImageTooLarge { .. } => ErrorKind::PayloadTooLarge,
            WorksiteError::Storage(_) | WorksiteError::Database(_) | WorksiteError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    pub fn to_app_error(&self) -> AppError {
        match self {
            WorksiteError::Storage(_) | WorksiteError::Database(_) | WorksiteError::Internal(_) => {
                AppError::new(self.kind(), "Internal server error")
            }
            WorksiteError::AlreadyWorkingElsewhere => AppError::new(self.kind(), self.to_string())
                .with_action("Finish your current work first"),
            WorksiteError::ImageTooLarge { .. } => AppError::new(self.kind(), self.to_string())
                .with_action("Upload a smaller image"),
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    fn log(&self) {
        match self {
            WorksiteError::Database(e) => {
                tracing::error!(error = %e, "Worksite database error");
            }
            WorksiteError::Storage(e) => {
                tracing::error!(error = %e, "Worksite storage error");
            }
            WorksiteError::Internal(msg) => {
                tracing::error!(message = %msg, "Worksite internal error");
            }
            WorksiteError::NoObjectAccess
            | WorksiteError::NotObjectManager
            | WorksiteError::NotWorkOwner => {
                tracing::warn!(error = %self, "Worksite permission denied");
            }
            _ => {
                tracing::debug!(error = %self, "Worksite error");
            }
        }
    }
}

impl From<WorksiteError> for AppError {
    fn from(err: WorksiteError) -> Self {
        err.to_app_error()
    }
}

impl From<JsonRejection> for WorksiteError {
    fn from(rejection: JsonRejection) -> Self {
        WorksiteError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for WorksiteError {
    fn from(rejection: PathRejection) -> Self {
        WorksiteError::Validation(rejection.body_text())
    }
}

impl IntoResponse for WorksiteError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}
