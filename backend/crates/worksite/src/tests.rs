//! Crate-level tests for the worksite flows
//!
//! Use cases and the router run against an in-memory repository and the
//! in-memory media store.

#[cfg(test)]
pub(crate) mod support {
    use chrono::{Duration, Utc};
    use kernel::id::{ObjectId, ReviewId, UserId, WorkId, WorkImageId};
    use kernel::principal::Principal;
    use std::sync::{Arc, Mutex, MutexGuard};

    use crate::domain::entities::{
        NewObject, NewReview, NewWork, Object, Review, UserSummary, Work, WorkImage,
    };
    use crate::domain::repository::{
        ObjectRepository, ReviewRepository, WorkImageRepository, WorkRepository,
    };
    use crate::domain::services::open_work_conflict;
    use crate::domain::value_objects::{ObjectStats, qr_reference};
    use crate::error::{WorksiteError, WorksiteResult};

    pub const SUPERVISOR: UserId = UserId::new(1);
    pub const WORKER: UserId = UserId::new(2);
    pub const OTHER_WORKER: UserId = UserId::new(3);
    pub const STRANGER: UserId = UserId::new(4);
    pub const ROOT: UserId = UserId::new(5);

    pub fn worker() -> Principal {
        Principal::worker(WORKER)
    }

    pub fn supervisor() -> Principal {
        Principal {
            user_id: SUPERVISOR,
            is_staff: true,
            is_superuser: false,
        }
    }

    pub fn root() -> Principal {
        Principal {
            user_id: ROOT,
            is_staff: true,
            is_superuser: true,
        }
    }

    #[derive(Default)]
    struct State {
        users: Vec<UserSummary>,
        objects: Vec<Object>,
        works: Vec<Work>,
        images: Vec<WorkImage>,
        reviews: Vec<Review>,
        next_id: i64,
    }

    impl State {
        fn next_id(&mut self) -> i64 {
            self.next_id += 1;
            self.next_id
        }
    }

    #[derive(Clone, Default)]
    pub struct InMemoryWorksiteRepository {
        state: Arc<Mutex<State>>,
    }

    impl InMemoryWorksiteRepository {
        /// Supervisor, two workers, a stranger and a superuser
        pub fn with_crew() -> Self {
            let repo = Self::default();
            {
                let mut state = repo.lock();
                for (id, name) in [
                    (SUPERVISOR, "foreman"),
                    (WORKER, "mason"),
                    (OTHER_WORKER, "welder"),
                    (STRANGER, "visitor"),
                    (ROOT, "admin"),
                ] {
                    state.users.push(UserSummary {
                        id,
                        user_name: name.to_string(),
                        full_name: Some(format!("{name} full")),
                    });
                }
            }
            repo
        }

        fn lock(&self) -> MutexGuard<'_, State> {
            self.state.lock().unwrap()
        }

        /// Object supervised by `SUPERVISOR` with both workers assigned
        pub fn seed_object(&self, name: &str) -> ObjectId {
            let mut state = self.lock();
            let id = ObjectId::new(state.next_id());
            state.objects.push(Object {
                id,
                name: name.to_string(),
                address: "Stroiteley 5".into(),
                task_description: "Brickwork".into(),
                deadline: Utc::now() + Duration::days(30),
                supervisor_id: SUPERVISOR,
                worker_ids: vec![WORKER, OTHER_WORKER],
                start_time: None,
                end_time: None,
                qr_code: Some(qr_reference("https://qr.example", id)),
            });
            id
        }

        pub fn seed_completed_work(&self, object_id: ObjectId, user_id: UserId) -> WorkId {
            let mut state = self.lock();
            let id = WorkId::new(state.next_id());
            let started = Utc::now() - Duration::hours(3);
            state.works.push(Work {
                id,
                object_id,
                user_id: Some(user_id),
                name: Some("Finished masonry".into()),
                description: None,
                worker_comment: Some("Done".into()),
                start_time: Some(started),
                end_time: Some(started + Duration::hours(2)),
            });
            id
        }

        pub fn work(&self, work_id: WorkId) -> Work {
            self.lock()
                .works
                .iter()
                .find(|w| w.id == work_id)
                .cloned()
                .unwrap()
        }

        pub fn open_works_of(&self, user_id: UserId) -> usize {
            self.lock()
                .works
                .iter()
                .filter(|w| w.user_id == Some(user_id) && w.end_time.is_none())
                .count()
        }

        pub fn image_count(&self, work_id: WorkId) -> usize {
            self.lock()
                .images
                .iter()
                .filter(|i| i.work_id == work_id)
                .count()
        }

        pub fn reviews_of(&self, work_id: WorkId) -> Vec<Review> {
            self.lock()
                .reviews
                .iter()
                .filter(|r| r.work_id == work_id)
                .cloned()
                .collect()
        }
    }

    fn open_of(state: &State, user_id: UserId) -> Option<Work> {
        state
            .works
            .iter()
            .find(|w| w.user_id == Some(user_id) && w.end_time.is_none())
            .cloned()
    }

    fn writable_work(state: &State, work_id: WorkId, user_id: UserId) -> bool {
        state
            .works
            .iter()
            .any(|w| w.id == work_id && w.is_owned_by(user_id) && w.is_open())
    }

    impl ObjectRepository for InMemoryWorksiteRepository {
        async fn create_object(
            &self,
            object: &NewObject,
            qr_base_url: &str,
        ) -> WorksiteResult<Object> {
            let mut state = self.lock();
            let id = ObjectId::new(state.next_id());
            let created = Object {
                id,
                name: object.name.clone(),
                address: object.address.clone(),
                task_description: object.task_description.clone(),
                deadline: object.deadline,
                supervisor_id: object.supervisor_id,
                worker_ids: object.worker_ids.clone(),
                start_time: object.start_time,
                end_time: object.end_time,
                qr_code: Some(qr_reference(qr_base_url, id)),
            };
            state.objects.push(created.clone());
            Ok(created)
        }

        async fn find_object(&self, object_id: ObjectId) -> WorksiteResult<Option<Object>> {
            Ok(self.lock().objects.iter().find(|o| o.id == object_id).cloned())
        }

        async fn list_objects_for(&self, principal: &Principal) -> WorksiteResult<Vec<Object>> {
            Ok(self
                .lock()
                .objects
                .iter()
                .filter(|o| o.is_accessible_by(principal))
                .cloned()
                .collect())
        }

        async fn update_object(&self, object: &Object) -> WorksiteResult<()> {
            let mut state = self.lock();
            let slot = state
                .objects
                .iter_mut()
                .find(|o| o.id == object.id)
                .ok_or(WorksiteError::ObjectNotFound)?;
            *slot = object.clone();
            Ok(())
        }

        async fn delete_object(&self, object_id: ObjectId) -> WorksiteResult<Vec<String>> {
            let mut state = self.lock();
            let before = state.objects.len();
            state.objects.retain(|o| o.id != object_id);
            if state.objects.len() == before {
                return Err(WorksiteError::ObjectNotFound);
            }

            let work_ids: Vec<WorkId> = state
                .works
                .iter()
                .filter(|w| w.object_id == object_id)
                .map(|w| w.id)
                .collect();
            state.works.retain(|w| w.object_id != object_id);
            state.reviews.retain(|r| !work_ids.contains(&r.work_id));

            let keys = state
                .images
                .iter()
                .filter(|i| work_ids.contains(&i.work_id))
                .map(|i| i.image.clone())
                .collect();
            state.images.retain(|i| !work_ids.contains(&i.work_id));
            Ok(keys)
        }
    }

    impl WorkRepository for InMemoryWorksiteRepository {
        async fn find_work(&self, work_id: WorkId) -> WorksiteResult<Option<Work>> {
            Ok(self.lock().works.iter().find(|w| w.id == work_id).cloned())
        }

        async fn find_open_work(&self, user_id: UserId) -> WorksiteResult<Option<Work>> {
            Ok(open_of(&self.lock(), user_id))
        }

        async fn create_planned_work(&self, work: &NewWork) -> WorksiteResult<Work> {
            let mut state = self.lock();
            let created = Work {
                id: WorkId::new(state.next_id()),
                object_id: work.object_id,
                user_id: None,
                name: work.name.clone(),
                description: work.description.clone(),
                worker_comment: None,
                start_time: None,
                end_time: None,
            };
            state.works.push(created.clone());
            Ok(created)
        }

        async fn start_work(&self, work: &NewWork) -> WorksiteResult<Work> {
            let user_id = work.user_id.unwrap();
            let mut state = self.lock();
            if let Some(open) = open_of(&state, user_id) {
                return Err(open_work_conflict(work.object_id, &open));
            }
            if !state.objects.iter().any(|o| o.id == work.object_id) {
                return Err(WorksiteError::ObjectNotFound);
            }
            let created = Work {
                id: WorkId::new(state.next_id()),
                object_id: work.object_id,
                user_id: Some(user_id),
                name: work.name.clone(),
                description: work.description.clone(),
                worker_comment: None,
                start_time: Some(work.start_time.unwrap_or_else(Utc::now)),
                end_time: None,
            };
            state.works.push(created.clone());
            Ok(created)
        }

        async fn claim_planned_work(&self, work_id: WorkId, user_id: UserId) -> WorksiteResult<Work> {
            let mut state = self.lock();
            let object_id = state
                .works
                .iter()
                .find(|w| w.id == work_id)
                .map(|w| w.object_id)
                .ok_or(WorksiteError::WorkNotFound)?;
            if let Some(open) = open_of(&state, user_id) {
                return Err(open_work_conflict(object_id, &open));
            }
            let work = state
                .works
                .iter_mut()
                .find(|w| w.id == work_id && w.is_planned())
                .ok_or(WorksiteError::WorkAlreadyTaken)?;
            work.user_id = Some(user_id);
            work.start_time = Some(Utc::now());
            Ok(work.clone())
        }

        async fn finish_work(
            &self,
            work_id: WorkId,
            user_id: UserId,
            comment: Option<&str>,
        ) -> WorksiteResult<Work> {
            let mut state = self.lock();
            let work = state
                .works
                .iter_mut()
                .find(|w| w.id == work_id && w.is_owned_by(user_id) && w.is_open())
                .ok_or(WorksiteError::WorkClosed)?;
            work.end_time = Some(Utc::now());
            if let Some(comment) = comment {
                work.worker_comment = Some(comment.to_string());
            }
            Ok(work.clone())
        }

        async fn object_stats(
            &self,
            object_id: ObjectId,
            user_id: UserId,
        ) -> WorksiteResult<ObjectStats> {
            let state = self.lock();
            let completed: Vec<&Work> = state
                .works
                .iter()
                .filter(|w| w.object_id == object_id && w.is_completed())
                .collect();
            Ok(ObjectStats {
                total_completed_works: completed.len() as i64,
                user_completed_works: completed.iter().filter(|w| w.is_owned_by(user_id)).count()
                    as i64,
            })
        }

        async fn work_history(&self, object_id: ObjectId) -> WorksiteResult<Vec<Work>> {
            let mut works: Vec<Work> = self
                .lock()
                .works
                .iter()
                .filter(|w| w.object_id == object_id && w.start_time.is_some())
                .cloned()
                .collect();
            works.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(b.id.cmp(&a.id)));
            Ok(works)
        }

        async fn free_works(&self, object_id: ObjectId) -> WorksiteResult<Vec<Work>> {
            Ok(self
                .lock()
                .works
                .iter()
                .filter(|w| w.object_id == object_id && w.is_planned())
                .cloned()
                .collect())
        }

        async fn works_of_user(&self, user_id: UserId) -> WorksiteResult<Vec<Work>> {
            let mut works: Vec<Work> = self
                .lock()
                .works
                .iter()
                .filter(|w| w.is_owned_by(user_id))
                .cloned()
                .collect();
            works.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(b.id.cmp(&a.id)));
            Ok(works)
        }

        async fn works_without_review(
            &self,
            supervisor: Option<UserId>,
        ) -> WorksiteResult<Vec<Work>> {
            let state = self.lock();
            Ok(state
                .works
                .iter()
                .filter(|w| w.is_completed())
                .filter(|w| !state.reviews.iter().any(|r| r.work_id == w.id))
                .filter(|w| match supervisor {
                    None => true,
                    Some(id) => state
                        .objects
                        .iter()
                        .any(|o| o.id == w.object_id && o.supervisor_id == id),
                })
                .cloned()
                .collect())
        }

        async fn find_user_summary(&self, user_id: UserId) -> WorksiteResult<Option<UserSummary>> {
            Ok(self.lock().users.iter().find(|u| u.id == user_id).cloned())
        }
    }

    impl WorkImageRepository for InMemoryWorksiteRepository {
        async fn add_image(
            &self,
            work_id: WorkId,
            user_id: UserId,
            image: &str,
        ) -> WorksiteResult<WorkImage> {
            let mut state = self.lock();
            if !writable_work(&state, work_id, user_id) {
                return Err(WorksiteError::WorkClosed);
            }
            let created = WorkImage {
                id: WorkImageId::new(state.next_id()),
                work_id,
                image: image.to_string(),
                uploaded_at: Utc::now(),
            };
            state.images.push(created.clone());
            Ok(created)
        }

        async fn list_images(&self, work_id: WorkId) -> WorksiteResult<Vec<WorkImage>> {
            Ok(self
                .lock()
                .images
                .iter()
                .filter(|i| i.work_id == work_id)
                .cloned()
                .collect())
        }

        async fn find_image(
            &self,
            work_id: WorkId,
            image_id: WorkImageId,
        ) -> WorksiteResult<Option<WorkImage>> {
            Ok(self
                .lock()
                .images
                .iter()
                .find(|i| i.id == image_id && i.work_id == work_id)
                .cloned())
        }

        async fn remove_image(
            &self,
            work_id: WorkId,
            image_id: WorkImageId,
            user_id: UserId,
        ) -> WorksiteResult<WorkImage> {
            let mut state = self.lock();
            if !writable_work(&state, work_id, user_id) {
                return Err(WorksiteError::WorkClosed);
            }
            let index = state
                .images
                .iter()
                .position(|i| i.id == image_id && i.work_id == work_id)
                .ok_or(WorksiteError::ImageNotFound)?;
            Ok(state.images.remove(index))
        }
    }

    impl ReviewRepository for InMemoryWorksiteRepository {
        async fn create_review(&self, review: &NewReview) -> WorksiteResult<Review> {
            let mut state = self.lock();
            if state.reviews.iter().any(|r| r.work_id == review.work_id) {
                return Err(WorksiteError::ReviewAlreadyExists);
            }
            let created = Review {
                id: ReviewId::new(state.next_id()),
                work_id: review.work_id,
                supervisor_id: review.supervisor_id,
                rating: review.rating,
                comment: review.comment.clone(),
                review_date: Utc::now(),
            };
            state.reviews.push(created.clone());
            Ok(created)
        }

        async fn find_review(&self, work_id: WorkId) -> WorksiteResult<Option<Review>> {
            Ok(self
                .lock()
                .reviews
                .iter()
                .find(|r| r.work_id == work_id)
                .cloned())
        }
    }
}

#[cfg(test)]
mod use_case_tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use kernel::id::{ObjectId, WorkId};
    use kernel::principal::Principal;
    use platform::storage::MemoryMediaStore;

    use super::support::*;
    use crate::application::*;
    use crate::domain::entities::ObjectChanges;
    use crate::error::WorksiteError;

    fn setup() -> (Arc<InMemoryWorksiteRepository>, ObjectId, ObjectId) {
        let repo = InMemoryWorksiteRepository::with_crew();
        let north = repo.seed_object("North tower");
        let south = repo.seed_object("South tower");
        (Arc::new(repo), north, south)
    }

    async fn start(
        repo: &Arc<InMemoryWorksiteRepository>,
        principal: &Principal,
        object_id: ObjectId,
    ) -> Result<kernel::id::WorkId, WorksiteError> {
        StartWorkUseCase::new(repo.clone())
            .execute(
                principal,
                StartWorkInput {
                    object_id,
                    name: Some("Lay bricks".into()),
                    description: Some("Second floor".into()),
                },
            )
            .await
            .map(|w| w.id)
    }

    async fn status(
        repo: &Arc<InMemoryWorksiteRepository>,
        principal: &Principal,
        object_id: ObjectId,
    ) -> StatusReport {
        ObjectStatusUseCase::new(repo.clone())
            .execute(principal, object_id)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_status_follows_the_work_lifecycle() {
        let (repo, north, south) = setup();

        assert_eq!(status(&repo, &worker(), north).await.status.name(), "start");

        let work_id = start(&repo, &worker(), north).await.unwrap();
        let report = status(&repo, &worker(), north).await;
        assert_eq!(report.status.name(), "work");
        assert_eq!(report.status.work().map(|w| w.id), Some(work_id));
        assert_eq!(status(&repo, &worker(), south).await.status.name(), "busy");

        EndWorkUseCase::new(repo.clone())
            .execute(
                &worker(),
                EndWorkInput {
                    work_id,
                    comment: Some("Wall finished".into()),
                },
            )
            .await
            .unwrap();

        let report = status(&repo, &worker(), north).await;
        assert_eq!(report.status.name(), "start");
        assert_eq!(report.stats.total_completed_works, 1);
        assert_eq!(report.stats.user_completed_works, 1);

        let report = status(&repo, &Principal::worker(OTHER_WORKER), north).await;
        assert_eq!(report.stats.total_completed_works, 1);
        assert_eq!(report.stats.user_completed_works, 0);
    }

    #[tokio::test]
    async fn test_status_for_missing_and_foreign_objects() {
        let (repo, north, _) = setup();

        let report = status(&repo, &worker(), ObjectId::new(999)).await;
        assert_eq!(report.status.name(), "not_found");
        assert_eq!(report.stats.total_completed_works, 0);

        let report = status(&repo, &Principal::worker(STRANGER), north).await;
        assert_eq!(report.status.name(), "forbidden");
        assert_eq!(status(&repo, &supervisor(), north).await.status.name(), "review");
        assert_eq!(status(&repo, &root(), north).await.status.name(), "review");
    }

    #[tokio::test]
    async fn test_start_refusals() {
        let (repo, north, south) = setup();

        assert!(matches!(
            start(&repo, &worker(), ObjectId::new(999)).await,
            Err(WorksiteError::ObjectNotFound)
        ));
        assert!(matches!(
            start(&repo, &Principal::worker(STRANGER), north).await,
            Err(WorksiteError::NoObjectAccess)
        ));
        assert!(matches!(
            start(&repo, &supervisor(), north).await,
            Err(WorksiteError::ReviewerCannotStart)
        ));

        start(&repo, &worker(), north).await.unwrap();
        assert!(matches!(
            start(&repo, &worker(), north).await,
            Err(WorksiteError::AlreadyWorkingHere)
        ));
        assert!(matches!(
            start(&repo, &worker(), south).await,
            Err(WorksiteError::AlreadyWorkingElsewhere)
        ));
        assert_eq!(repo.open_works_of(WORKER), 1);
    }

    #[tokio::test]
    async fn test_start_requires_name() {
        let (repo, north, _) = setup();
        let result = StartWorkUseCase::new(repo.clone())
            .execute(
                &worker(),
                StartWorkInput {
                    object_id: north,
                    name: Some("   ".into()),
                    description: None,
                },
            )
            .await;
        assert!(matches!(result, Err(WorksiteError::Validation(_))));
        assert_eq!(repo.open_works_of(WORKER), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_starts_open_exactly_one_work() {
        let (repo, north, _) = setup();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { start(&repo, &worker(), north).await })
            })
            .collect();

        let mut started = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => started += 1,
                Err(e) => assert!(matches!(e, WorksiteError::AlreadyWorkingHere)),
            }
        }

        assert_eq!(started, 1);
        assert_eq!(repo.open_works_of(WORKER), 1);
    }

    #[tokio::test]
    async fn test_end_rules() {
        let (repo, north, _) = setup();
        let work_id = start(&repo, &worker(), north).await.unwrap();
        let end = |principal: Principal, work_id: WorkId| {
            let repo = repo.clone();
            async move {
                EndWorkUseCase::new(repo)
                    .execute(
                        &principal,
                        EndWorkInput {
                            work_id,
                            comment: None,
                        },
                    )
                    .await
            }
        };

        assert!(matches!(
            end(Principal::worker(OTHER_WORKER), work_id).await,
            Err(WorksiteError::NotWorkOwner)
        ));
        assert!(repo.work(work_id).end_time.is_none());

        assert!(matches!(
            end(worker(), WorkId::new(999)).await,
            Err(WorksiteError::WorkNotFound)
        ));

        let closed = end(worker(), work_id).await.unwrap();
        assert!(closed.end_time.is_some());
        assert!(matches!(
            end(worker(), work_id).await,
            Err(WorksiteError::WorkClosed)
        ));
    }

    #[tokio::test]
    async fn test_planned_work_is_claimed_once() {
        let (repo, north, _) = setup();
        let objects = ManageObjectsUseCase::new(
            repo.clone(),
            Arc::new(MemoryMediaStore::new()),
            Arc::new(WorksiteConfig::default()),
        );

        let planned = objects
            .create_planned_work(
                &supervisor(),
                north,
                PlannedWorkInput {
                    name: Some("Install windows".into()),
                    description: None,
                },
            )
            .await
            .unwrap();
        assert!(matches!(
            objects
                .create_planned_work(
                    &worker(),
                    north,
                    PlannedWorkInput {
                        name: Some("Sneaky".into()),
                        description: None,
                    },
                )
                .await,
            Err(WorksiteError::StaffOnly)
        ));

        let queries = WorkQueriesUseCase::new(repo.clone());
        assert_eq!(queries.free(&worker(), north).await.unwrap().len(), 1);

        let use_case = StartWorkUseCase::new(repo.clone());
        let claimed = use_case.execute_planned(&worker(), planned.id).await.unwrap();
        assert_eq!(claimed.user_id, Some(WORKER));
        assert!(claimed.is_open());
        assert!(queries.free(&worker(), north).await.unwrap().is_empty());

        assert!(matches!(
            use_case
                .execute_planned(&Principal::worker(OTHER_WORKER), planned.id)
                .await,
            Err(WorksiteError::WorkAlreadyTaken)
        ));
        assert!(matches!(
            use_case.execute_planned(&worker(), WorkId::new(999)).await,
            Err(WorksiteError::WorkNotFound)
        ));
    }

    #[tokio::test]
    async fn test_review_once_per_work() {
        let (repo, north, _) = setup();
        let work_id = repo.seed_completed_work(north, WORKER);
        let review = |principal: Principal, rating: Option<i64>| {
            let repo = repo.clone();
            async move {
                ReviewWorkUseCase::new(repo)
                    .execute(
                        &principal,
                        ReviewInput {
                            work_id,
                            rating,
                            comment: Some("Neat joints".into()),
                        },
                    )
                    .await
            }
        };

        assert!(matches!(
            review(worker(), Some(5)).await,
            Err(WorksiteError::StaffOnly)
        ));
        assert!(matches!(
            review(supervisor(), Some(6)).await,
            Err(WorksiteError::Validation(_))
        ));
        assert!(matches!(
            review(supervisor(), None).await,
            Err(WorksiteError::Validation(_))
        ));

        let first = review(supervisor(), Some(4)).await.unwrap();
        assert_eq!(first.rating.get(), 4);

        assert!(matches!(
            review(root(), Some(1)).await,
            Err(WorksiteError::ReviewAlreadyExists)
        ));
        let stored = repo.reviews_of(work_id);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].rating.get(), 4);
    }

    #[tokio::test]
    async fn test_open_work_can_be_reviewed() {
        let (repo, north, _) = setup();
        let work_id = start(&repo, &worker(), north).await.unwrap();

        let review = ReviewWorkUseCase::new(repo.clone())
            .execute(
                &supervisor(),
                ReviewInput {
                    work_id,
                    rating: Some(3),
                    comment: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(review.supervisor_id, SUPERVISOR);
    }

    #[tokio::test]
    async fn test_pending_reviews_scope() {
        let (repo, north, _) = setup();
        let reviewed = repo.seed_completed_work(north, WORKER);
        let pending = repo.seed_completed_work(north, OTHER_WORKER);
        start(&repo, &worker(), north).await.unwrap();

        ReviewWorkUseCase::new(repo.clone())
            .execute(
                &supervisor(),
                ReviewInput {
                    work_id: reviewed,
                    rating: Some(5),
                    comment: None,
                },
            )
            .await
            .unwrap();

        let use_case = PendingReviewsUseCase::new(repo.clone());
        let works = use_case.execute(&supervisor()).await.unwrap();
        assert_eq!(works.iter().map(|w| w.id).collect::<Vec<_>>(), vec![pending]);

        let other_staff = Principal {
            user_id: STRANGER,
            is_staff: true,
            is_superuser: false,
        };
        assert!(use_case.execute(&other_staff).await.unwrap().is_empty());
        assert_eq!(use_case.execute(&root()).await.unwrap().len(), 1);
        assert!(matches!(
            use_case.execute(&worker()).await,
            Err(WorksiteError::StaffOnly)
        ));
    }

    #[tokio::test]
    async fn test_object_management() {
        let repo = Arc::new(InMemoryWorksiteRepository::with_crew());
        let media = Arc::new(MemoryMediaStore::new());
        let config = Arc::new(WorksiteConfig {
            qr_base_url: "https://site.example".into(),
            ..Default::default()
        });
        let objects = ManageObjectsUseCase::new(repo.clone(), media, config);

        let input = || CreateObjectInput {
            name: Some("Depot".into()),
            address: Some("Portovaya 3".into()),
            task_description: Some("Roofing".into()),
            deadline: Some(Utc::now() + Duration::days(10)),
            supervisor_id: Some(OTHER_WORKER),
            worker_ids: vec![WORKER, WORKER],
            start_time: None,
            end_time: None,
        };

        assert!(matches!(
            objects.create(&worker(), input()).await,
            Err(WorksiteError::StaffOnly)
        ));

        // Staff cannot hand the object to someone else
        let object = objects.create(&supervisor(), input()).await.unwrap();
        assert_eq!(object.supervisor_id, SUPERVISOR);
        assert_eq!(object.worker_ids, vec![WORKER]);
        assert_eq!(
            object.qr_code.as_deref(),
            Some(format!("https://site.example/object/status/{}", object.id).as_str())
        );

        let delegated = objects.create(&root(), input()).await.unwrap();
        assert_eq!(delegated.supervisor_id, OTHER_WORKER);

        let missing_deadline = CreateObjectInput {
            deadline: None,
            ..input()
        };
        assert!(matches!(
            objects.create(&supervisor(), missing_deadline).await,
            Err(WorksiteError::Validation(_))
        ));

        assert_eq!(objects.list(&worker()).await.unwrap().len(), 2);
        assert_eq!(objects.list(&supervisor()).await.unwrap().len(), 1);
        assert!(matches!(
            objects.get(&Principal::worker(STRANGER), object.id).await,
            Err(WorksiteError::NoObjectAccess)
        ));

        assert!(matches!(
            objects
                .update(&worker(), object.id, ObjectChanges::default())
                .await,
            Err(WorksiteError::NotObjectManager)
        ));
        let updated = objects
            .update(
                &supervisor(),
                object.id,
                ObjectChanges {
                    name: Some("Depot 2".into()),
                    supervisor_id: Some(STRANGER),
                    worker_ids: Some(vec![OTHER_WORKER]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Depot 2");
        assert_eq!(updated.supervisor_id, SUPERVISOR);
        assert_eq!(updated.worker_ids, vec![OTHER_WORKER]);

        objects.delete(&supervisor(), object.id).await.unwrap();
        assert!(matches!(
            objects.get(&supervisor(), object.id).await,
            Err(WorksiteError::ObjectNotFound)
        ));
    }

    #[tokio::test]
    async fn test_work_queries() {
        let (repo, north, _) = setup();
        let done = repo.seed_completed_work(north, OTHER_WORKER);
        let open = start(&repo, &worker(), north).await.unwrap();
        let queries = WorkQueriesUseCase::new(repo.clone());

        let history = queries.history(&worker(), north).await.unwrap();
        assert_eq!(history.iter().map(|w| w.id).collect::<Vec<_>>(), vec![open, done]);
        assert!(matches!(
            queries.history(&Principal::worker(STRANGER), north).await,
            Err(WorksiteError::NoObjectAccess)
        ));

        let details = queries.details(&worker(), open).await.unwrap();
        assert_eq!(details.object.id, north);
        assert_eq!(details.user.map(|u| u.user_name), Some("mason".to_string()));
        assert!(details.review.is_none());

        assert!(queries.details(&supervisor(), done).await.is_ok());
        assert!(matches!(
            queries.details(&worker(), done).await,
            Err(WorksiteError::NotWorkOwner)
        ));

        let mine = queries.user_works(&worker()).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].work.id, open);
    }

    #[tokio::test]
    async fn test_images_only_on_own_open_work() {
        let (repo, north, _) = setup();
        let media = Arc::new(MemoryMediaStore::new());
        let images = WorkImagesUseCase::new(
            repo.clone(),
            media.clone(),
            Arc::new(WorksiteConfig::default()),
        );
        let photo = || {
            Some(ImageInput {
                content_type: Some("image/png".into()),
                file_name: Some("wall.png".into()),
                bytes: vec![0x89, b'P', b'N', b'G'],
            })
        };

        let work_id = start(&repo, &worker(), north).await.unwrap();
        let image = images.upload(&worker(), work_id, photo()).await.unwrap();
        assert!(image.image.starts_with("images/") && image.image.ends_with(".png"));
        assert!(media.contains(&image.image));

        assert!(matches!(
            images
                .upload(&Principal::worker(OTHER_WORKER), work_id, photo())
                .await,
            Err(WorksiteError::NotWorkOwner)
        ));
        assert!(matches!(
            images.upload(&worker(), work_id, None).await,
            Err(WorksiteError::Validation(_))
        ));

        EndWorkUseCase::new(repo.clone())
            .execute(
                &worker(),
                EndWorkInput {
                    work_id,
                    comment: None,
                },
            )
            .await
            .unwrap();

        assert!(matches!(
            images.upload(&worker(), work_id, photo()).await,
            Err(WorksiteError::WorkClosed)
        ));
        assert!(matches!(
            images.delete(&worker(), work_id, image.id).await,
            Err(WorksiteError::WorkClosed)
        ));
        assert_eq!(repo.image_count(work_id), 1);
        assert_eq!(media.len(), 1);

        assert_eq!(images.list(&supervisor(), work_id).await.unwrap().len(), 1);
        assert!(images.get(&worker(), work_id, image.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_image_delete_removes_file() {
        let (repo, north, _) = setup();
        let media = Arc::new(MemoryMediaStore::new());
        let images = WorkImagesUseCase::new(
            repo.clone(),
            media.clone(),
            Arc::new(WorksiteConfig::default()),
        );

        let work_id = start(&repo, &worker(), north).await.unwrap();
        let image = images
            .upload(
                &worker(),
                work_id,
                Some(ImageInput {
                    content_type: Some("image/jpeg".into()),
                    file_name: None,
                    bytes: vec![0xFF, 0xD8, 0xFF],
                }),
            )
            .await
            .unwrap();

        images.delete(&worker(), work_id, image.id).await.unwrap();
        assert_eq!(repo.image_count(work_id), 0);
        assert!(media.is_empty());

        assert!(matches!(
            images.delete(&worker(), work_id, image.id).await,
            Err(WorksiteError::ImageNotFound)
        ));
    }

    #[tokio::test]
    async fn test_oversized_image_is_rejected_before_storage() {
        let (repo, north, _) = setup();
        let media = Arc::new(MemoryMediaStore::new());
        let images = WorkImagesUseCase::new(
            repo.clone(),
            media.clone(),
            Arc::new(WorksiteConfig {
                max_image_bytes: 4,
                ..Default::default()
            }),
        );

        let work_id = start(&repo, &worker(), north).await.unwrap();
        let result = images
            .upload(
                &worker(),
                work_id,
                Some(ImageInput {
                    content_type: Some("image/jpeg".into()),
                    file_name: None,
                    bytes: vec![0; 5],
                }),
            )
            .await;

        assert!(matches!(result, Err(WorksiteError::ImageTooLarge { max_bytes: 4 })));
        assert!(media.is_empty());
    }
}

#[cfg(test)]
mod router_tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::{Extension, Router};
    use kernel::id::ObjectId;
    use kernel::principal::Principal;
    use platform::storage::MemoryMediaStore;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::support::*;
    use crate::application::config::WorksiteConfig;
    use crate::presentation::router::worksite_router_generic;

    const BOUNDARY: &str = "worksite-test-boundary";

    fn app(repo: &InMemoryWorksiteRepository, principal: Principal) -> Router {
        worksite_router_generic(
            repo.clone(),
            MemoryMediaStore::new(),
            WorksiteConfig {
                media_url: "/media".into(),
                max_image_bytes: 1024,
                ..Default::default()
            },
        )
        .layer(Extension(principal))
    }

    async fn read(response: axum::response::Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        read(response).await
    }

    async fn send_raw(app: &Router, uri: &str, body: &str) -> (StatusCode, Option<String>, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let (status, value) = read(response).await;
        (status, content_type, value)
    }

    async fn upload(app: &Router, uri: &str, content_type: &str, bytes: &[u8]) -> (StatusCode, Value) {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"site.jpg\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();

        read(app.clone().oneshot(request).await.unwrap()).await
    }

    fn seeded() -> (InMemoryWorksiteRepository, ObjectId, ObjectId) {
        let repo = InMemoryWorksiteRepository::with_crew();
        let north = repo.seed_object("North tower");
        let south = repo.seed_object("South tower");
        (repo, north, south)
    }

    #[tokio::test]
    async fn test_status_payload_shapes() {
        let (repo, north, south) = seeded();
        let app = app(&repo, worker());

        let (status, body) = send(&app, "GET", &format!("/object/status/{north}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "start");
        assert_eq!(body["available_actions"], json!(["start"]));
        assert_eq!(body["object"]["name"], "North tower");
        assert_eq!(body["stats"]["total_completed_works"], 0);

        let (status, body) = send(
            &app,
            "POST",
            "/start",
            Some(json!({"object": north.get(), "name": "Lay bricks"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"], WORKER.get());

        let (_, body) = send(&app, "GET", &format!("/object/status/{north}"), None).await;
        assert_eq!(body["status"], "work");
        assert_eq!(body["available_actions"], json!(["end"]));
        assert_eq!(body["work"]["name"], "Lay bricks");

        let (_, body) = send(&app, "GET", &format!("/object/status/{south}"), None).await;
        assert_eq!(body["status"], "busy");
        assert!(body.get("available_actions").is_none());

        let (_, body) = send(&app, "GET", "/object/status/999", None).await;
        assert_eq!(body["status"], "not_found");
    }

    #[tokio::test]
    async fn test_start_conflicts_and_validation() {
        let (repo, north, south) = seeded();
        let app = app(&repo, worker());

        let (status, _) = send(&app, "POST", "/start", Some(json!({"name": "No object"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "POST", "/start", Some(json!({"object": north.get()}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let start = json!({"object": north.get(), "name": "Plaster"});
        assert_eq!(send(&app, "POST", "/start", Some(start.clone())).await.0, StatusCode::CREATED);

        let (status, body) = send(&app, "POST", "/start", Some(start)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["detail"], "Already working on this object");

        let (status, body) = send(
            &app,
            "POST",
            "/start",
            Some(json!({"object": south.get(), "name": "Plaster"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["detail"], "Already working on another object");

        let stranger = self::app(&repo, Principal::worker(STRANGER));
        let (status, _) = send(
            &stranger,
            "POST",
            "/start",
            Some(json!({"object": north.get(), "name": "Plaster"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_malformed_input_is_a_problem_response() {
        let (repo, north, _) = seeded();
        let app = app(&repo, worker());

        let (status, content_type, body) =
            send_raw(&app, "/start", r#"{"object": "abc", "name": "Plaster"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(body["status"], 400);
        assert!(body["detail"].as_str().is_some_and(|d| d.contains("object")));

        let (status, content_type, body) = send_raw(&app, "/end", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(body["status"], 400);

        let (status, body) = send(&app, "GET", "/object/status/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);

        let (status, body) = send(
            &app,
            "POST",
            &format!("/review/{north}"),
            Some(json!({"rating": "five"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
        assert_eq!(repo.open_works_of(WORKER), 0);
    }

    #[tokio::test]
    async fn test_end_uses_token_identity() {
        let (repo, north, _) = seeded();
        let worker_app = app(&repo, worker());
        let (_, body) = send(
            &worker_app,
            "POST",
            "/start",
            Some(json!({"object": north.get(), "name": "Plaster"})),
        )
        .await;
        let work_id = body["id"].as_i64().unwrap();

        let other = app(&repo, Principal::worker(OTHER_WORKER));
        let (status, _) = send(&other, "POST", "/end", Some(json!({"work_id": work_id}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(
            &worker_app,
            "POST",
            "/end",
            Some(json!({"work_id": work_id, "comment": "Smooth"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["worker_comment"], "Smooth");
        assert!(body["end_time"].is_string());

        let (status, _) = send(&worker_app, "POST", "/end", Some(json!({"work_id": work_id}))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(&worker_app, "POST", "/end", Some(json!({"work_id": 999}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_review_endpoint() {
        let (repo, north, _) = seeded();
        let work_id = repo.seed_completed_work(north, WORKER);
        let uri = format!("/review/{work_id}");

        let (status, _) = send(&app(&repo, worker()), "POST", &uri, Some(json!({"rating": 5}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let staff = app(&repo, supervisor());
        let (status, _) = send(&staff, "POST", &uri, Some(json!({"rating": 0}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &staff,
            "POST",
            &uri,
            Some(json!({"rating": 5, "comment": "Clean work"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["rating"], 5);

        let (status, _) = send(&staff, "POST", &uri, Some(json!({"rating": 2}))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(&staff, "POST", "/review/999", Some(json!({"rating": 2}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&staff, "GET", "/works_without_reviews", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_object_crud_endpoints() {
        let repo = InMemoryWorksiteRepository::with_crew();
        let staff = app(&repo, supervisor());

        let (status, body) = send(
            &staff,
            "POST",
            "/objects",
            Some(json!({
                "name": "Bridge",
                "address": "Naberezhnaya 1",
                "task_description": "Deck repair",
                "deadline": "2030-05-01T12:00:00Z",
                "workers": [WORKER.get()]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["id"].as_i64().unwrap();
        assert_eq!(body["supervisor"], SUPERVISOR.get());
        assert!(body["qr_code"].as_str().unwrap().ends_with(&format!("/object/status/{id}")));

        let (status, _) = send(&staff, "POST", "/objects", Some(json!({"name": "Bridge"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app(&repo, worker()), "POST", "/objects", Some(json!({}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(&app(&repo, worker()), "GET", "/objects", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = send(
            &staff,
            "PATCH",
            &format!("/objects/{id}"),
            Some(json!({"name": "Bridge 2", "end_time": null})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Bridge 2");

        let (status, _) = send(
            &app(&repo, worker()),
            "DELETE",
            &format!("/objects/{id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&staff, "DELETE", &format!("/objects/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&staff, "GET", &format!("/objects/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_planned_work_endpoints() {
        let (repo, north, _) = seeded();
        let staff = app(&repo, supervisor());
        let worker_app = app(&repo, worker());

        let (status, body) = send(
            &staff,
            "POST",
            &format!("/object/{north}/works"),
            Some(json!({"name": "Glazing", "description": "Floor 3"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let work_id = body["id"].as_i64().unwrap();
        assert!(body["user"].is_null());

        let (_, body) = send(&worker_app, "GET", &format!("/object/work-free/{north}"), None).await;
        assert_eq!(body, json!([{"id": work_id, "name": "Glazing", "description": "Floor 3"}]));

        let (status, body) = send(
            &worker_app,
            "POST",
            "/start/free",
            Some(json!({"work_id": work_id})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"], WORKER.get());

        let other = app(&repo, Principal::worker(OTHER_WORKER));
        let (status, _) = send(&other, "POST", "/start/free", Some(json!({"work_id": work_id}))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(&other, "POST", "/start/free", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&worker_app, "GET", &format!("/object/work-history/{north}"), None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_work_info_and_user_works() {
        let (repo, north, _) = seeded();
        let worker_app = app(&repo, worker());
        let (_, body) = send(
            &worker_app,
            "POST",
            "/start",
            Some(json!({"object": north.get(), "name": "Tiling"})),
        )
        .await;
        let work_id = body["id"].as_i64().unwrap();

        let (status, body) = send(&worker_app, "GET", &format!("/info/{work_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["object"]["id"], north.get());
        assert_eq!(body["user"]["username"], "mason");
        assert!(body["review"].is_null());
        assert_eq!(body["images"], json!([]));

        let stranger = app(&repo, Principal::worker(OTHER_WORKER));
        let (status, _) = send(&stranger, "GET", &format!("/info/{work_id}"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (_, body) = send(&worker_app, "GET", "/user/works", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "Tiling");
    }

    #[tokio::test]
    async fn test_image_upload_endpoints() {
        let (repo, north, _) = seeded();
        let worker_app = app(&repo, worker());
        let (_, body) = send(
            &worker_app,
            "POST",
            "/start",
            Some(json!({"object": north.get(), "name": "Facade"})),
        )
        .await;
        let work_id = body["id"].as_i64().unwrap();
        let uri = format!("/image_work/{work_id}");

        let (status, body) = upload(&worker_app, &uri, "image/jpeg", b"\xFF\xD8\xFFjpeg").await;
        assert_eq!(status, StatusCode::CREATED);
        let image_id = body["id"].as_i64().unwrap();
        let url = body["image"].as_str().unwrap();
        assert!(url.starts_with("/media/images/") && url.ends_with(".jpg"));

        let (status, _) = upload(&worker_app, &uri, "text/plain", b"hello").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = upload(&worker_app, &uri, "image/png", &[0u8; 2048]).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

        let (status, body) = send(&worker_app, "GET", &format!("{uri}/list"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = send(&worker_app, "GET", &format!("{uri}/{image_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["work"], work_id);

        let (status, _) = send(&worker_app, "DELETE", &format!("{uri}/{image_id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&worker_app, "GET", &format!("{uri}/{image_id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_after_end_is_rejected() {
        let (repo, north, _) = seeded();
        let worker_app = app(&repo, worker());
        let (_, body) = send(
            &worker_app,
            "POST",
            "/start",
            Some(json!({"object": north.get(), "name": "Facade"})),
        )
        .await;
        let work_id = body["id"].as_i64().unwrap();
        let uri = format!("/image_work/{work_id}");

        assert_eq!(
            upload(&worker_app, &uri, "image/png", b"png").await.0,
            StatusCode::CREATED
        );
        send(&worker_app, "POST", "/end", Some(json!({"work_id": work_id}))).await;

        let (status, _) = upload(&worker_app, &uri, "image/png", b"png").await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, body) = send(&worker_app, "GET", &format!("{uri}/list"), None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }
}
