//! Work Query Use Case
//!
//! Read-only views over works: object history, unclaimed planned works,
//! the detail page and the caller's own works.

use std::sync::Arc;

use kernel::id::{ObjectId, WorkId};
use kernel::principal::Principal;

use crate::domain::entities::{Object, Work, WorkDetails};
use crate::domain::repository::{
    ObjectRepository, ReviewRepository, WorkImageRepository, WorkRepository,
};
use crate::domain::services::can_view_work;
use crate::error::{WorksiteError, WorksiteResult};

pub struct WorkQueriesUseCase<R>
where
    R: ObjectRepository + WorkRepository + WorkImageRepository + ReviewRepository,
{
    repo: Arc<R>,
}

impl<R> WorkQueriesUseCase<R>
where
    R: ObjectRepository + WorkRepository + WorkImageRepository + ReviewRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn history(
        &self,
        principal: &Principal,
        object_id: ObjectId,
    ) -> WorksiteResult<Vec<Work>> {
        self.accessible_object(principal, object_id).await?;
        self.repo.work_history(object_id).await
    }

    pub async fn free(&self, principal: &Principal, object_id: ObjectId) -> WorksiteResult<Vec<Work>> {
        self.accessible_object(principal, object_id).await?;
        self.repo.free_works(object_id).await
    }

    pub async fn details(&self, principal: &Principal, work_id: WorkId) -> WorksiteResult<WorkDetails> {
        let work = self
            .repo
            .find_work(work_id)
            .await?
            .ok_or(WorksiteError::WorkNotFound)?;
        let object = self
            .repo
            .find_object(work.object_id)
            .await?
            .ok_or(WorksiteError::ObjectNotFound)?;

        if !can_view_work(principal, &work, &object) {
            return Err(WorksiteError::NotWorkOwner);
        }

        self.assemble(work, object).await
    }

    /// The caller's works, newest first, each with review and images
    pub async fn user_works(&self, principal: &Principal) -> WorksiteResult<Vec<WorkDetails>> {
        let works = self.repo.works_of_user(principal.user_id).await?;

        let mut details = Vec::with_capacity(works.len());
        for work in works {
            let Some(object) = self.repo.find_object(work.object_id).await? else {
                continue;
            };
            details.push(self.assemble(work, object).await?);
        }
        Ok(details)
    }

    async fn assemble(&self, work: Work, object: Object) -> WorksiteResult<WorkDetails> {
        let user = match work.user_id {
            Some(user_id) => self.repo.find_user_summary(user_id).await?,
            None => None,
        };
        let review = self.repo.find_review(work.id).await?;
        let images = self.repo.list_images(work.id).await?;

        Ok(WorkDetails {
            work,
            object,
            user,
            review,
            images,
        })
    }

    async fn accessible_object(
        &self,
        principal: &Principal,
        object_id: ObjectId,
    ) -> WorksiteResult<Object> {
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
}
