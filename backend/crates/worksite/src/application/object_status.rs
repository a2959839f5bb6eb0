//! Object Status Use Case
//!
//! Resolves what the caller may do on an object and attaches the
//! completed-work counters.

use std::sync::Arc;

use kernel::id::ObjectId;
use kernel::principal::Principal;

use crate::domain::repository::{ObjectRepository, WorkRepository};
use crate::domain::services::{ObjectStatus, resolve_status};
use crate::domain::value_objects::ObjectStats;
use crate::error::WorksiteResult;

#[derive(Debug, Clone)]
pub struct StatusReport {
    pub status: ObjectStatus,
    pub stats: ObjectStats,
}

pub struct ObjectStatusUseCase<R>
where
    R: ObjectRepository + WorkRepository,
{
    repo: Arc<R>,
}

impl<R> ObjectStatusUseCase<R>
where
    R: ObjectRepository + WorkRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(
        &self,
        principal: &Principal,
        object_id: ObjectId,
    ) -> WorksiteResult<StatusReport> {
        let object = self.repo.find_object(object_id).await?;
        let open_work = self.repo.find_open_work(principal.user_id).await?;

        let stats = if object.is_some() {
            self.repo.object_stats(object_id, principal.user_id).await?
        } else {
            ObjectStats::default()
        };

        let status = resolve_status(principal, object, open_work);

        tracing::debug!(
            user_id = %principal.user_id,
            object_id = %object_id,
            status = status.name(),
            "Object status resolved"
        );

        Ok(StatusReport { status, stats })
    }
}
