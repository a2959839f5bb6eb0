//! Worksite entities

use chrono::{DateTime, Utc};
use kernel::id::{ObjectId, ReviewId, UserId, WorkId, WorkImageId};
use kernel::principal::Principal;

use crate::domain::value_objects::Rating;
use crate::error::{WorksiteError, WorksiteResult};

const NAME_MAX_LENGTH: usize = 255;

/// Construction site with one supervisor and a pool of workers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    pub id: ObjectId,
    pub name: String,
    pub address: String,
    pub task_description: String,
    pub deadline: DateTime<Utc>,
    pub supervisor_id: UserId,
    pub worker_ids: Vec<UserId>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Status page reference, derived from the id
    pub qr_code: Option<String>,
}

impl Object {
    /// Superusers see every object; others need to supervise it or be assigned to it
    pub fn is_accessible_by(&self, principal: &Principal) -> bool {
        principal.is_superuser
            || self.supervisor_id == principal.user_id
            || self.worker_ids.contains(&principal.user_id)
    }

    pub fn can_manage(&self, principal: &Principal) -> bool {
        principal.is_superuser || self.supervisor_id == principal.user_id
    }

    pub fn apply(&mut self, changes: ObjectChanges) -> WorksiteResult<()> {
        if let Some(name) = changes.name {
            self.name = required_text("name", &name, Some(NAME_MAX_LENGTH))?;
        }
        if let Some(address) = changes.address {
            self.address = required_text("address", &address, Some(NAME_MAX_LENGTH))?;
        }
        if let Some(task) = changes.task_description {
            self.task_description = required_text("task_description", &task, None)?;
        }
        if let Some(deadline) = changes.deadline {
            self.deadline = deadline;
        }
        if let Some(supervisor) = changes.supervisor_id {
            self.supervisor_id = supervisor;
        }
        if let Some(mut workers) = changes.worker_ids {
            workers.sort();
            workers.dedup();
            self.worker_ids = workers;
        }
        if let Some(start) = changes.start_time {
            self.start_time = start;
        }
        if let Some(end) = changes.end_time {
            self.end_time = end;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewObject {
    pub name: String,
    pub address: String,
    pub task_description: String,
    pub deadline: DateTime<Utc>,
    pub supervisor_id: UserId,
    pub worker_ids: Vec<UserId>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl NewObject {
    pub fn new(
        name: &str,
        address: &str,
        task_description: &str,
        deadline: DateTime<Utc>,
        supervisor_id: UserId,
    ) -> WorksiteResult<Self> {
        Ok(Self {
            name: required_text("name", name, Some(NAME_MAX_LENGTH))?,
            address: required_text("address", address, Some(NAME_MAX_LENGTH))?,
            task_description: required_text("task_description", task_description, None)?,
            deadline,
            supervisor_id,
            worker_ids: Vec::new(),
            start_time: None,
            end_time: None,
        })
    }

    pub fn with_workers(mut self, mut workers: Vec<UserId>) -> Self {
        workers.sort();
        workers.dedup();
        self.worker_ids = workers;
        self
    }
}

/// Partial update. `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default)]
pub struct ObjectChanges {
    pub name: Option<String>,
    pub address: Option<String>,
    pub task_description: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub supervisor_id: Option<UserId>,
    pub worker_ids: Option<Vec<UserId>>,
    pub start_time: Option<Option<DateTime<Utc>>>,
    pub end_time: Option<Option<DateTime<Utc>>>,
}

/// A task on an object.
///
/// Lifecycle: planned (no user, not started) → open (started, not ended)
/// → completed (both timestamps set).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Work {
    pub id: WorkId,
    pub object_id: ObjectId,
    pub user_id: Option<UserId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub worker_comment: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Work {
    pub fn is_open(&self) -> bool {
        self.start_time.is_some() && self.end_time.is_none()
    }

    pub fn is_completed(&self) -> bool {
        self.start_time.is_some() && self.end_time.is_some()
    }

    pub fn is_planned(&self) -> bool {
        self.user_id.is_none() && self.start_time.is_none()
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == Some(user_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewWork {
    pub object_id: ObjectId,
    pub user_id: Option<UserId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
}

impl NewWork {
    /// Work started right now by `user_id`
    pub fn started(
        object_id: ObjectId,
        user_id: UserId,
        name: Option<&str>,
        description: Option<&str>,
    ) -> WorksiteResult<Self> {
        let name = required_text("name", name.unwrap_or_default(), Some(NAME_MAX_LENGTH))?;
        Ok(Self {
            object_id,
            user_id: Some(user_id),
            name: Some(name),
            description: optional_text(description),
            start_time: Some(Utc::now()),
        })
    }

    /// Unassigned work waiting for a worker
    pub fn planned(
        object_id: ObjectId,
        name: Option<&str>,
        description: Option<&str>,
    ) -> WorksiteResult<Self> {
        let name = required_text("name", name.unwrap_or_default(), Some(NAME_MAX_LENGTH))?;
        Ok(Self {
            object_id,
            user_id: None,
            name: Some(name),
            description: optional_text(description),
            start_time: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkImage {
    pub id: WorkImageId,
    pub work_id: WorkId,
    /// Storage key relative to the media root
    pub image: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub id: ReviewId,
    pub work_id: WorkId,
    pub supervisor_id: UserId,
    pub rating: Rating,
    pub comment: Option<String>,
    pub review_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub work_id: WorkId,
    pub supervisor_id: UserId,
    pub rating: Rating,
    pub comment: Option<String>,
}

/// Public projection of a user attached to works
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub id: UserId,
    pub user_name: String,
    pub full_name: Option<String>,
}

/// A work with everything shown on its detail page
#[derive(Debug, Clone)]
pub struct WorkDetails {
    pub work: Work,
    pub object: Object,
    pub user: Option<UserSummary>,
    pub review: Option<Review>,
    pub images: Vec<WorkImage>,
}

fn required_text(field: &str, value: &str, max: Option<usize>) -> WorksiteResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(WorksiteError::validation(format!("{field} is required")));
    }
    if let Some(max) = max.filter(|max| value.chars().count() > *max) {
        return Err(WorksiteError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value.to_string())
}

pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
