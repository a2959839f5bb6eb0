//! API DTOs (Data Transfer Objects)
//!
//! Request fields default to empty so that a missing field is reported by
//! domain validation as 400 rather than by the JSON extractor.

use chrono::{DateTime, Utc};
use kernel::id::{ObjectId, ReviewId, UserId, WorkId, WorkImageId};
use serde::{Deserialize, Deserializer, Serialize};

use crate::application::config::WorksiteConfig;
use crate::domain::entities::{
    Object, ObjectChanges, Review, UserSummary, Work, WorkDetails, WorkImage,
};
use crate::domain::services::ObjectStatus;
use crate::domain::value_objects::{ObjectStats, WorkAction};

/// Distinguishes an absent field from an explicit `null`
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ============================================================================
// Objects
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateObjectRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub task_description: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub supervisor: Option<UserId>,
    pub workers: Vec<UserId>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateObjectRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub task_description: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub supervisor: Option<UserId>,
    pub workers: Option<Vec<UserId>>,
    #[serde(deserialize_with = "nullable")]
    pub start_time: Option<Option<DateTime<Utc>>>,
    #[serde(deserialize_with = "nullable")]
    pub end_time: Option<Option<DateTime<Utc>>>,
}

impl From<UpdateObjectRequest> for ObjectChanges {
    fn from(req: UpdateObjectRequest) -> Self {
        ObjectChanges {
            name: req.name,
            address: req.address,
            task_description: req.task_description,
            deadline: req.deadline,
            supervisor_id: req.supervisor,
            worker_ids: req.workers,
            start_time: req.start_time,
            end_time: req.end_time,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectResponse {
    pub id: ObjectId,
    pub name: String,
    pub address: String,
    pub task_description: String,
    pub deadline: DateTime<Utc>,
    pub supervisor: UserId,
    pub workers: Vec<UserId>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub qr_code: Option<String>,
}

impl From<Object> for ObjectResponse {
    fn from(object: Object) -> Self {
        Self {
            id: object.id,
            name: object.name,
            address: object.address,
            task_description: object.task_description,
            deadline: object.deadline,
            supervisor: object.supervisor_id,
            workers: object.worker_ids,
            start_time: object.start_time,
            end_time: object.end_time,
            qr_code: object.qr_code,
        }
    }
}

/// Object as embedded in status and work payloads
#[derive(Debug, Clone, Serialize)]
pub struct ObjectBrief {
    pub id: ObjectId,
    pub name: String,
    pub address: String,
    pub task_description: String,
    pub deadline: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl From<&Object> for ObjectBrief {
    fn from(object: &Object) -> Self {
        Self {
            id: object.id,
            name: object.name.clone(),
            address: object.address.clone(),
            task_description: object.task_description.clone(),
            deadline: object.deadline,
            start_time: object.start_time,
            end_time: object.end_time,
        }
    }
}

// ============================================================================
// Status
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<ObjectBrief>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work: Option<WorkResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_actions: Option<Vec<WorkAction>>,
    pub stats: ObjectStats,
}

impl StatusResponse {
    pub fn new(status: &ObjectStatus, stats: ObjectStats) -> Self {
        let actions = status.available_actions();
        Self {
            status: status.name(),
            object: status.object().map(ObjectBrief::from),
            work: status.work().cloned().map(WorkResponse::from),
            available_actions: (!actions.is_empty()).then(|| actions.to_vec()),
            stats,
        }
    }
}

// ============================================================================
// Works
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StartWorkRequest {
    pub object: Option<ObjectId>,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StartFreeWorkRequest {
    pub work_id: Option<WorkId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EndWorkRequest {
    pub work_id: Option<WorkId>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlannedWorkRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkResponse {
    pub id: WorkId,
    pub object: ObjectId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub worker_comment: Option<String>,
    pub user: Option<UserId>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl From<Work> for WorkResponse {
    fn from(work: Work) -> Self {
        Self {
            id: work.id,
            object: work.object_id,
            name: work.name,
            description: work.description,
            worker_comment: work.worker_comment,
            user: work.user_id,
            start_time: work.start_time,
            end_time: work.end_time,
        }
    }
}

/// Planned work offered to workers
#[derive(Debug, Clone, Serialize)]
pub struct FreeWorkResponse {
    pub id: WorkId,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl From<Work> for FreeWorkResponse {
    fn from(work: Work) -> Self {
        Self {
            id: work.id,
            name: work.name,
            description: work.description,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserBrief {
    pub id: UserId,
    pub username: String,
    pub fullname: Option<String>,
}

impl From<UserSummary> for UserBrief {
    fn from(user: UserSummary) -> Self {
        Self {
            id: user.id,
            username: user.user_name,
            fullname: user.full_name,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewBrief {
    pub rating: i16,
    pub comment: Option<String>,
    pub review_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkDetailsResponse {
    pub id: WorkId,
    pub object: ObjectBrief,
    pub name: Option<String>,
    pub description: Option<String>,
    pub worker_comment: Option<String>,
    pub user: Option<UserBrief>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub review: Option<ReviewBrief>,
    pub images: Vec<ImageResponse>,
}

impl WorkDetailsResponse {
    pub fn new(details: WorkDetails, config: &WorksiteConfig) -> Self {
        let WorkDetails {
            work,
            object,
            user,
            review,
            images,
        } = details;

        Self {
            id: work.id,
            object: ObjectBrief::from(&object),
            name: work.name,
            description: work.description,
            worker_comment: work.worker_comment,
            user: user.map(UserBrief::from),
            start_time: work.start_time,
            end_time: work.end_time,
            review: review.map(|r| ReviewBrief {
                rating: r.rating.get(),
                comment: r.comment,
                review_date: r.review_date,
            }),
            images: images
                .into_iter()
                .map(|image| ImageResponse::new(image, config))
                .collect(),
        }
    }
}

// ============================================================================
// Reviews
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReviewRequest {
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewResponse {
    pub id: ReviewId,
    pub work: WorkId,
    pub supervisor: UserId,
    pub rating: i16,
    pub comment: Option<String>,
    pub review_date: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            work: review.work_id,
            supervisor: review.supervisor_id,
            rating: review.rating.get(),
            comment: review.comment,
            review_date: review.review_date,
        }
    }
}

// ============================================================================
// Images
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ImageResponse {
    pub id: WorkImageId,
    pub work: WorkId,
    /// Public URL of the stored file
    pub image: String,
    pub uploaded_at: DateTime<Utc>,
}

impl ImageResponse {
    pub fn new(image: WorkImage, config: &WorksiteConfig) -> Self {
        Self {
            id: image.id,
            work: image.work_id,
            image: config.media_link(&image.image),
            uploaded_at: image.uploaded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_distinguishes_null() {
        let req: UpdateObjectRequest =
            serde_json::from_str(r#"{"end_time": null, "name": "Block C"}"#).unwrap();
        assert_eq!(req.end_time, Some(None));
        assert_eq!(req.start_time, None);

        let changes = ObjectChanges::from(req);
        assert_eq!(changes.name.as_deref(), Some("Block C"));
        assert!(changes.worker_ids.is_none());
    }

    #[test]
    fn test_status_response_omits_absent_parts() {
        let json = serde_json::to_value(StatusResponse::new(
            &ObjectStatus::NotFound,
            ObjectStats::default(),
        ))
        .unwrap();

        assert_eq!(json["status"], "not_found");
        assert!(json.get("object").is_none());
        assert!(json.get("available_actions").is_none());
        assert_eq!(json["stats"]["total_completed_works"], 0);
    }
}
