//! Start Work Use Case
//!
//! Opens a new work on an object, or claims a planned one. The status
//! engine gives the precise refusal up front; the repository repeats the
//! open-work check under a per-user lock before writing.

use std::sync::Arc;

use kernel::id::{ObjectId, WorkId};
use kernel::principal::Principal;

use crate::domain::entities::{NewWork, Work};
use crate::domain::repository::{ObjectRepository, WorkRepository};
use crate::domain::services::{ensure_can_start, resolve_status};
use crate::error::{WorksiteError, WorksiteResult};

pub struct StartWorkInput {
    pub object_id: ObjectId,
    pub name: Option<String>,
    pub description: Option<String>,
}

pub struct StartWorkUseCase<R>
where
    R: ObjectRepository + WorkRepository,
{
    repo: Arc<R>,
}

impl<R> StartWorkUseCase<R>
where
    R: ObjectRepository + WorkRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, principal: &Principal, input: StartWorkInput) -> WorksiteResult<Work> {
        self.check_status(principal, input.object_id).await?;

        let new_work = NewWork::started(
            input.object_id,
            principal.user_id,
            input.name.as_deref(),
            input.description.as_deref(),
        )?;
        let work = self.repo.start_work(&new_work).await?;

        tracing::info!(
            user_id = %principal.user_id,
            object_id = %work.object_id,
            work_id = %work.id,
            "Work started"
        );

        Ok(work)
    }

    /// Take over a planned work of the object
    pub async fn execute_planned(&self, principal: &Principal, work_id: WorkId) -> WorksiteResult<Work> {
        let work = self
            .repo
            .find_work(work_id)
            .await?
            .ok_or(WorksiteError::WorkNotFound)?;

        if !work.is_planned() {
            return Err(WorksiteError::WorkAlreadyTaken);
        }

        self.check_status(principal, work.object_id).await?;

        let work = self.repo.claim_planned_work(work_id, principal.user_id).await?;

        tracing::info!(
            user_id = %principal.user_id,
            object_id = %work.object_id,
            work_id = %work.id,
            "Planned work claimed"
        );

        Ok(work)
    }

    async fn check_status(&self, principal: &Principal, object_id: ObjectId) -> WorksiteResult<()> {
        let object = self.repo.find_object(object_id).await?;
        let open_work = self.repo.find_open_work(principal.user_id).await?;
        ensure_can_start(resolve_status(principal, object, open_work)).map(|_| ())
    }
}
