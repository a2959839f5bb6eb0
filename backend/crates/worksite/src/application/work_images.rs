//! Work Images Use Case
//!
//! Photo evidence attached to a work. Files go through `MediaStore`; rows
//! are only written while the work is open and owned by the caller.

use std::sync::Arc;

use kernel::id::{WorkId, WorkImageId};
use kernel::principal::Principal;
use platform::storage::MediaStore;

use crate::application::config::WorksiteConfig;
use crate::domain::entities::{Work, WorkImage};
use crate::domain::repository::{ObjectRepository, WorkImageRepository, WorkRepository};
use crate::domain::services::{can_view_work, ensure_can_change_images};
use crate::domain::value_objects::ImageUpload;
use crate::error::{WorksiteError, WorksiteResult};

pub struct ImageInput {
    pub content_type: Option<String>,
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

pub struct WorkImagesUseCase<R, S>
where
    R: ObjectRepository + WorkRepository + WorkImageRepository,
    S: MediaStore,
{
    repo: Arc<R>,
    media: Arc<S>,
    config: Arc<WorksiteConfig>,
}

impl<R, S> WorkImagesUseCase<R, S>
where
    R: ObjectRepository + WorkRepository + WorkImageRepository,
    S: MediaStore,
{
    pub fn new(repo: Arc<R>, media: Arc<S>, config: Arc<WorksiteConfig>) -> Self {
        Self {
            repo,
            media,
            config,
        }
    }

    pub async fn upload(
        &self,
        principal: &Principal,
        work_id: WorkId,
        input: Option<ImageInput>,
    ) -> WorksiteResult<WorkImage> {
        let work = self.repo.find_work(work_id).await?;
        ensure_can_change_images(principal, work.as_ref())?;

        let input = input.ok_or_else(|| WorksiteError::validation("image is required"))?;
        let upload = ImageUpload::new(
            input.content_type.as_deref(),
            input.file_name.as_deref(),
            input.bytes,
            self.config.max_image_bytes,
        )?;

        let (extension, bytes) = upload.into_parts();
        let size = bytes.len();
        let key = self
            .media
            .put(&self.config.image_directory, &extension, bytes)
            .await?;

        let image = match self.repo.add_image(work_id, principal.user_id, &key).await {
            Ok(image) => image,
            Err(e) => {
                if let Err(remove_err) = self.media.remove(&key).await {
                    tracing::warn!(key = %key, error = %remove_err, "Failed to remove orphaned upload");
                }
                return Err(e);
            }
        };

        tracing::info!(
            user_id = %principal.user_id,
            work_id = %work_id,
            image_id = %image.id,
            size,
            "Work image uploaded"
        );

        Ok(image)
    }

    pub async fn list(&self, principal: &Principal, work_id: WorkId) -> WorksiteResult<Vec<WorkImage>> {
        self.viewable(principal, work_id).await?;
        self.repo.list_images(work_id).await
    }

    pub async fn get(
        &self,
        principal: &Principal,
        work_id: WorkId,
        image_id: WorkImageId,
    ) -> WorksiteResult<WorkImage> {
        self.viewable(principal, work_id).await?;
        self.repo
            .find_image(work_id, image_id)
            .await?
            .ok_or(WorksiteError::ImageNotFound)
    }

    pub async fn delete(
        &self,
        principal: &Principal,
        work_id: WorkId,
        image_id: WorkImageId,
    ) -> WorksiteResult<()> {
        let work = self.repo.find_work(work_id).await?;
        ensure_can_change_images(principal, work.as_ref())?;

        if self.repo.find_image(work_id, image_id).await?.is_none() {
            return Err(WorksiteError::ImageNotFound);
        }

        let image = self
            .repo
            .remove_image(work_id, image_id, principal.user_id)
            .await?;

        if let Err(e) = self.media.remove(&image.image).await {
            tracing::warn!(key = %image.image, error = %e, "Failed to remove image file");
        }

        tracing::info!(work_id = %work_id, image_id = %image_id, "Work image deleted");
        Ok(())
    }

    async fn viewable(&self, principal: &Principal, work_id: WorkId) -> WorksiteResult<Work> {
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
        Ok(work)
    }
}
