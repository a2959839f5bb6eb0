//! End Work Use Case

use std::sync::Arc;

use kernel::id::WorkId;
use kernel::principal::Principal;

use crate::domain::entities::{Work, optional_text};
use crate::domain::repository::WorkRepository;
use crate::domain::services::ensure_can_finish;
use crate::error::WorksiteResult;

pub struct EndWorkInput {
    pub work_id: WorkId,
    pub comment: Option<String>,
}

pub struct EndWorkUseCase<R>
where
    R: WorkRepository,
{
    repo: Arc<R>,
}

impl<R> EndWorkUseCase<R>
where
    R: WorkRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Close the caller's own open work. Identity comes from the token only.
    pub async fn execute(&self, principal: &Principal, input: EndWorkInput) -> WorksiteResult<Work> {
        let work = self.repo.find_work(input.work_id).await?;
        ensure_can_finish(principal, work.as_ref())?;

        let comment = optional_text(input.comment.as_deref());
        let work = self
            .repo
            .finish_work(input.work_id, principal.user_id, comment.as_deref())
            .await?;

        tracing::info!(
            user_id = %principal.user_id,
            work_id = %work.id,
            "Work ended"
        );

        Ok(work)
    }
}
