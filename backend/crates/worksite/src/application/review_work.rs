//! Review Use Cases
//!
//! Staff rate works once each, regardless of whether the work is still open.

use std::sync::Arc;

use kernel::id::WorkId;
use kernel::principal::Principal;

use crate::domain::entities::{NewReview, Review, Work, optional_text};
use crate::domain::repository::{ReviewRepository, WorkRepository};
use crate::domain::services::ensure_can_review;
use crate::domain::value_objects::Rating;
use crate::error::{WorksiteError, WorksiteResult};

pub struct ReviewInput {
    pub work_id: WorkId,
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

pub struct ReviewWorkUseCase<R>
where
    R: WorkRepository + ReviewRepository,
{
    repo: Arc<R>,
}

impl<R> ReviewWorkUseCase<R>
where
    R: WorkRepository + ReviewRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, principal: &Principal, input: ReviewInput) -> WorksiteResult<Review> {
        let work = self.repo.find_work(input.work_id).await?;
        ensure_can_review(principal, work.as_ref())?;

        let rating = input
            .rating
            .ok_or_else(|| WorksiteError::validation("rating is required"))
            .and_then(Rating::new)?;

        let review = self
            .repo
            .create_review(&NewReview {
                work_id: input.work_id,
                supervisor_id: principal.user_id,
                rating,
                comment: optional_text(input.comment.as_deref()),
            })
            .await?;

        tracing::info!(
            supervisor_id = %principal.user_id,
            work_id = %review.work_id,
            rating = review.rating.get(),
            "Work reviewed"
        );

        Ok(review)
    }
}

/// Completed works still waiting for a rating
pub struct PendingReviewsUseCase<R>
where
    R: WorkRepository,
{
    repo: Arc<R>,
}

impl<R> PendingReviewsUseCase<R>
where
    R: WorkRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Staff see objects they supervise, superusers see everything
    pub async fn execute(&self, principal: &Principal) -> WorksiteResult<Vec<Work>> {
        if !principal.is_reviewer() {
            return Err(WorksiteError::StaffOnly);
        }

        let supervisor = (!principal.is_superuser).then_some(principal.user_id);
        self.repo.works_without_review(supervisor).await
    }
}
