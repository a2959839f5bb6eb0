//! Application Layer - Use cases and application services

pub mod config;
pub mod end_work;
pub mod manage_objects;
pub mod object_status;
pub mod review_work;
pub mod start_work;
pub mod work_images;
pub mod work_queries;

pub use config::WorksiteConfig;
pub use end_work::{EndWorkInput, EndWorkUseCase};
pub use manage_objects::{CreateObjectInput, ManageObjectsUseCase, PlannedWorkInput};
pub use object_status::{ObjectStatusUseCase, StatusReport};
pub use review_work::{PendingReviewsUseCase, ReviewInput, ReviewWorkUseCase};
pub use start_work::{StartWorkInput, StartWorkUseCase};
pub use work_images::{ImageInput, WorkImagesUseCase};
pub use work_queries::WorkQueriesUseCase;
