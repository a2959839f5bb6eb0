//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.
//!
//! Transitions that must stay consistent under concurrency (`start_work`,
//! `claim_planned_work`, `finish_work`, image changes) re-check their
//! precondition inside the same statement or transaction that writes.

use kernel::id::{ObjectId, UserId, WorkId, WorkImageId};
use kernel::principal::Principal;

use crate::domain::entities::{
    NewObject, NewReview, NewWork, Object, Review, UserSummary, Work, WorkImage,
};
use crate::domain::value_objects::ObjectStats;
use crate::error::WorksiteResult;

#[trait_variant::make(ObjectRepository: Send)]
pub trait LocalObjectRepository {
    /// Insert the object and set its QR reference in one transaction
    async fn create_object(&self, object: &NewObject, qr_base_url: &str)
    -> WorksiteResult<Object>;

    async fn find_object(&self, object_id: ObjectId) -> WorksiteResult<Option<Object>>;

    /// Objects the principal supervises or works on (all for superusers)
    async fn list_objects_for(&self, principal: &Principal) -> WorksiteResult<Vec<Object>>;

    /// Persist fields and replace the worker set
    async fn update_object(&self, object: &Object) -> WorksiteResult<()>;

    /// Delete with cascade. Returns the storage keys of removed images.
    async fn delete_object(&self, object_id: ObjectId) -> WorksiteResult<Vec<String>>;
}

#[trait_variant::make(WorkRepository: Send)]
pub trait LocalWorkRepository {
    async fn find_work(&self, work_id: WorkId) -> WorksiteResult<Option<Work>>;

    /// The user's single open work, if any
    async fn find_open_work(&self, user_id: UserId) -> WorksiteResult<Option<Work>>;

    async fn create_planned_work(&self, work: &NewWork) -> WorksiteResult<Work>;

    /// Insert a started work unless the user already has an open one.
    /// Serialized per user; the conflict names the object of the open work.
    async fn start_work(&self, work: &NewWork) -> WorksiteResult<Work>;

    /// Assign a planned work to `user_id` and start it now
    async fn claim_planned_work(&self, work_id: WorkId, user_id: UserId) -> WorksiteResult<Work>;

    /// Close the user's open work. `WorkClosed` if it was closed meanwhile.
    async fn finish_work(
        &self,
        work_id: WorkId,
        user_id: UserId,
        comment: Option<&str>,
    ) -> WorksiteResult<Work>;

    async fn object_stats(&self, object_id: ObjectId, user_id: UserId)
    -> WorksiteResult<ObjectStats>;

    /// Started works of the object, newest first
    async fn work_history(&self, object_id: ObjectId) -> WorksiteResult<Vec<Work>>;

    /// Planned works nobody has claimed yet
    async fn free_works(&self, object_id: ObjectId) -> WorksiteResult<Vec<Work>>;

    async fn works_of_user(&self, user_id: UserId) -> WorksiteResult<Vec<Work>>;

    /// Completed works lacking a review, limited to one supervisor if given
    async fn works_without_review(&self, supervisor: Option<UserId>)
    -> WorksiteResult<Vec<Work>>;

    async fn find_user_summary(&self, user_id: UserId) -> WorksiteResult<Option<UserSummary>>;
}

#[trait_variant::make(WorkImageRepository: Send)]
pub trait LocalWorkImageRepository {
    /// Attach an image while the work is open and owned by `user_id`
    async fn add_image(
        &self,
        work_id: WorkId,
        user_id: UserId,
        image: &str,
    ) -> WorksiteResult<WorkImage>;

    async fn list_images(&self, work_id: WorkId) -> WorksiteResult<Vec<WorkImage>>;

    async fn find_image(
        &self,
        work_id: WorkId,
        image_id: WorkImageId,
    ) -> WorksiteResult<Option<WorkImage>>;

    /// Same precondition as `add_image`. Returns the removed row.
    async fn remove_image(
        &self,
        work_id: WorkId,
        image_id: WorkImageId,
        user_id: UserId,
    ) -> WorksiteResult<WorkImage>;
}

#[trait_variant::make(ReviewRepository: Send)]
pub trait LocalReviewRepository {
    /// A second review for the same work yields `ReviewAlreadyExists`
    async fn create_review(&self, review: &NewReview) -> WorksiteResult<Review>;

    async fn find_review(&self, work_id: WorkId) -> WorksiteResult<Option<Review>>;
}

/// Everything the worksite handlers need from storage
pub trait WorksiteStore:
    ObjectRepository
    + WorkRepository
    + WorkImageRepository
    + ReviewRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> WorksiteStore for T where
    T: ObjectRepository
        + WorkRepository
        + WorkImageRepository
        + ReviewRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
