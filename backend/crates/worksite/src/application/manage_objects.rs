//! Object Management Use Case
//!
//! Create, list, read, update and delete objects, and plan works on them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::id::{ObjectId, UserId};
use kernel::principal::Principal;
use platform::storage::MediaStore;

use crate::application::config::WorksiteConfig;
use crate::domain::entities::{NewObject, NewWork, Object, ObjectChanges, Work};
use crate::domain::repository::{ObjectRepository, WorkRepository};
use crate::error::{WorksiteError, WorksiteResult};

pub struct CreateObjectInput {
    pub name: Option<String>,
    pub address: Option<String>,
    pub task_description: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub supervisor_id: Option<UserId>,
    pub worker_ids: Vec<UserId>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

pub struct PlannedWorkInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

pub struct ManageObjectsUseCase<R, S>
where
    R: ObjectRepository + WorkRepository,
    S: MediaStore,
{
    repo: Arc<R>,
    media: Arc<S>,
    config: Arc<WorksiteConfig>,
}

impl<R, S> ManageObjectsUseCase<R, S>
where
    R: ObjectRepository + WorkRepository,
    S: MediaStore,
{
    pub fn new(repo: Arc<R>, media: Arc<S>, config: Arc<WorksiteConfig>) -> Self {
        Self {
            repo,
            media,
            config,
        }
    }

    /// Staff only. The supervisor is the caller unless a superuser names one.
    pub async fn create(
        &self,
        principal: &Principal,
        input: CreateObjectInput,
    ) -> WorksiteResult<Object> {
        if !principal.is_reviewer() {
            return Err(WorksiteError::StaffOnly);
        }

        let supervisor_id = match input.supervisor_id {
            Some(id) if principal.is_superuser => id,
            _ => principal.user_id,
        };
        let deadline = input
            .deadline
            .ok_or_else(|| WorksiteError::validation("deadline is required"))?;

        let mut new_object = NewObject::new(
            input.name.as_deref().unwrap_or_default(),
            input.address.as_deref().unwrap_or_default(),
            input.task_description.as_deref().unwrap_or_default(),
            deadline,
            supervisor_id,
        )?
        .with_workers(input.worker_ids);
        new_object.start_time = input.start_time;
        new_object.end_time = input.end_time;

        let object = self
            .repo
            .create_object(&new_object, &self.config.qr_base_url)
            .await?;

        tracing::info!(
            object_id = %object.id,
            supervisor_id = %object.supervisor_id,
            workers = object.worker_ids.len(),
            "Object created"
        );

        Ok(object)
    }

    pub async fn list(&self, principal: &Principal) -> WorksiteResult<Vec<Object>> {
        self.repo.list_objects_for(principal).await
    }

    pub async fn get(&self, principal: &Principal, object_id: ObjectId) -> WorksiteResult<Object> {
        let object = self
            .repo
            .find_object(object_id)
            .await?
            .ok_or(WorksiteError::ObjectNotFound)?;

        if !object.is_accessible_by(principal) {
            return Err(WorksiteError::NoObjectAccess);
        }
        Ok(object)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        object_id: ObjectId,
        mut changes: ObjectChanges,
    ) -> WorksiteResult<Object> {
        let mut object = self.manageable(principal, object_id).await?;

        // Reassigning the supervisor is a superuser decision
        if !principal.is_superuser {
            changes.supervisor_id = None;
        }
        object.apply(changes)?;
        self.repo.update_object(&object).await?;

        tracing::info!(object_id = %object.id, "Object updated");
        Ok(object)
    }

    pub async fn delete(&self, principal: &Principal, object_id: ObjectId) -> WorksiteResult<()> {
        self.manageable(principal, object_id).await?;

        let image_keys = self.repo.delete_object(object_id).await?;
        for key in &image_keys {
            if let Err(e) = self.media.remove(key).await {
                tracing::warn!(key = %key, error = %e, "Failed to remove orphaned image");
            }
        }

        tracing::info!(
            object_id = %object_id,
            images_removed = image_keys.len(),
            "Object deleted"
        );
        Ok(())
    }

    /// Staff with access to the object plan a work for workers to pick up
    pub async fn create_planned_work(
        &self,
        principal: &Principal,
        object_id: ObjectId,
        input: PlannedWorkInput,
    ) -> WorksiteResult<Work> {
        if !principal.is_reviewer() {
            return Err(WorksiteError::StaffOnly);
        }
        let object = self.get(principal, object_id).await?;

        let new_work =
            NewWork::planned(object.id, input.name.as_deref(), input.description.as_deref())?;
        let work = self.repo.create_planned_work(&new_work).await?;

        tracing::info!(object_id = %object.id, work_id = %work.id, "Planned work created");
        Ok(work)
    }

    async fn manageable(&self, principal: &Principal, object_id: ObjectId) -> WorksiteResult<Object> {
        let object = self
            .repo
            .find_object(object_id)
            .await?
            .ok_or(WorksiteError::ObjectNotFound)?;

        if !object.can_manage(principal) {
            return Err(WorksiteError::NotObjectManager);
        }
        Ok(object)
    }
}
