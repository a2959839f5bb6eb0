//! PostgreSQL Repository Implementations
//!
//! Start and claim transitions take a transaction-scoped advisory lock keyed
//! by the user id, so concurrent starts of one user run one after another.
//! The partial unique index `works_one_open_per_user` backs it.

use chrono::{DateTime, Utc};
use kernel::id::{ObjectId, ReviewId, UserId, WorkId, WorkImageId};
use kernel::principal::Principal;
use sqlx::{PgConnection, PgPool};

use crate::domain::entities::{
    NewObject, NewReview, NewWork, Object, Review, UserSummary, Work, WorkImage,
};
use crate::domain::repository::{
    ObjectRepository, ReviewRepository, WorkImageRepository, WorkRepository,
};
use crate::domain::services::open_work_conflict;
use crate::domain::value_objects::{ObjectStats, Rating, qr_reference};
use crate::error::{WorksiteError, WorksiteResult};

const ONE_OPEN_WORK_INDEX: &str = "works_one_open_per_user";
const ONE_REVIEW_PER_WORK: &str = "reviews_work_id_key";

const OBJECT_COLUMNS: &str = r#"
    o.id,
    o.name,
    o.address,
    o.task_description,
    o.deadline,
    o.supervisor_id,
    ARRAY(
        SELECT ow.user_id FROM object_workers ow
        WHERE ow.object_id = o.id
        ORDER BY ow.user_id
    ) AS worker_ids,
    o.start_time,
    o.end_time,
    o.qr_code
"#;

const WORK_COLUMNS: &str = r#"
    w.id,
    w.object_id,
    w.user_id,
    w.name,
    w.description,
    w.worker_comment,
    w.start_time,
    w.end_time
"#;

#[derive(Clone)]
pub struct PgWorksiteRepository {
    pool: PgPool,
}

impl PgWorksiteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Serialize work transitions of one user until the transaction ends
async fn lock_user(conn: &mut PgConnection, user_id: UserId) -> WorksiteResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(user_id.get())
        .execute(conn)
        .await?;
    Ok(())
}

async fn open_work_locked(conn: &mut PgConnection, user_id: UserId) -> WorksiteResult<Option<Work>> {
    let sql = format!(
        "SELECT {WORK_COLUMNS} FROM works w WHERE w.user_id = $1 AND w.end_time IS NULL LIMIT 1 FOR UPDATE"
    );
    let row = sqlx::query_as::<_, WorkRow>(&sql)
        .bind(user_id.get())
        .fetch_optional(conn)
        .await?;
    Ok(row.map(WorkRow::into_work))
}

async fn replace_workers(
    conn: &mut PgConnection,
    object_id: ObjectId,
    workers: &[UserId],
) -> WorksiteResult<()> {
    sqlx::query("DELETE FROM object_workers WHERE object_id = $1")
        .bind(object_id.get())
        .execute(&mut *conn)
        .await?;

    let ids: Vec<i64> = workers.iter().map(UserId::get).collect();
    sqlx::query(
        r#"
        INSERT INTO object_workers (object_id, user_id)
        SELECT $1, UNNEST($2::BIGINT[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(object_id.get())
    .bind(ids)
    .execute(&mut *conn)
    .await
    .map_err(unknown_user)?;

    Ok(())
}

fn unknown_user(e: sqlx::Error) -> WorksiteError {
    match &e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            WorksiteError::validation("Supervisor or worker does not exist")
        }
        _ => WorksiteError::Database(e),
    }
}

// ============================================================================
// Object Repository Implementation
// ============================================================================

impl ObjectRepository for PgWorksiteRepository {
    async fn create_object(
        &self,
        object: &NewObject,
        qr_base_url: &str,
    ) -> WorksiteResult<Object> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO objects (
                name,
                address,
                task_description,
                deadline,
                supervisor_id,
                start_time,
                end_time
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&object.name)
        .bind(&object.address)
        .bind(&object.task_description)
        .bind(object.deadline)
        .bind(object.supervisor_id.get())
        .bind(object.start_time)
        .bind(object.end_time)
        .fetch_one(&mut *tx)
        .await
        .map_err(unknown_user)?;
        let object_id = ObjectId::new(id);

        sqlx::query("UPDATE objects SET qr_code = $2 WHERE id = $1")
            .bind(id)
            .bind(qr_reference(qr_base_url, object_id))
            .execute(&mut *tx)
            .await?;

        replace_workers(&mut tx, object_id, &object.worker_ids).await?;

        tx.commit().await?;

        self.find_object(object_id)
            .await?
            .ok_or_else(|| WorksiteError::Internal("Created object vanished".into()))
    }

    async fn find_object(&self, object_id: ObjectId) -> WorksiteResult<Option<Object>> {
        let sql = format!("SELECT {OBJECT_COLUMNS} FROM objects o WHERE o.id = $1");

        let row = sqlx::query_as::<_, ObjectRow>(&sql)
            .bind(object_id.get())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(ObjectRow::into_object))
    }

    async fn list_objects_for(&self, principal: &Principal) -> WorksiteResult<Vec<Object>> {
        let sql = format!(
            r#"
            SELECT {OBJECT_COLUMNS} FROM objects o
            WHERE $2
               OR o.supervisor_id = $1
               OR EXISTS (
                   SELECT 1 FROM object_workers ow
                   WHERE ow.object_id = o.id AND ow.user_id = $1
               )
            ORDER BY o.deadline, o.id
            "#
        );

        let rows = sqlx::query_as::<_, ObjectRow>(&sql)
            .bind(principal.user_id.get())
            .bind(principal.is_superuser)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ObjectRow::into_object).collect())
    }

    async fn update_object(&self, object: &Object) -> WorksiteResult<()> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE objects SET
                name = $2,
                address = $3,
                task_description = $4,
                deadline = $5,
                supervisor_id = $6,
                start_time = $7,
                end_time = $8
            WHERE id = $1
            "#,
        )
        .bind(object.id.get())
        .bind(&object.name)
        .bind(&object.address)
        .bind(&object.task_description)
        .bind(object.deadline)
        .bind(object.supervisor_id.get())
        .bind(object.start_time)
        .bind(object.end_time)
        .execute(&mut *tx)
        .await
        .map_err(unknown_user)?
        .rows_affected();

        if updated == 0 {
            return Err(WorksiteError::ObjectNotFound);
        }

        replace_workers(&mut tx, object.id, &object.worker_ids).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete_object(&self, object_id: ObjectId) -> WorksiteResult<Vec<String>> {
        let mut tx = self.pool.begin().await?;

        let keys = sqlx::query_scalar::<_, String>(
            r#"
            SELECT i.image FROM work_images i
            JOIN works w ON w.id = i.work_id
            WHERE w.object_id = $1
            "#,
        )
        .bind(object_id.get())
        .fetch_all(&mut *tx)
        .await?;

        let deleted = sqlx::query("DELETE FROM objects WHERE id = $1")
            .bind(object_id.get())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(WorksiteError::ObjectNotFound);
        }

        tx.commit().await?;
        Ok(keys)
    }
}

// ============================================================================
// Work Repository Implementation
// ============================================================================

impl WorkRepository for PgWorksiteRepository {
    async fn find_work(&self, work_id: WorkId) -> WorksiteResult<Option<Work>> {
        let sql = format!("SELECT {WORK_COLUMNS} FROM works w WHERE w.id = $1");

        let row = sqlx::query_as::<_, WorkRow>(&sql)
            .bind(work_id.get())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(WorkRow::into_work))
    }

    async fn find_open_work(&self, user_id: UserId) -> WorksiteResult<Option<Work>> {
        let sql = format!(
            "SELECT {WORK_COLUMNS} FROM works w WHERE w.user_id = $1 AND w.end_time IS NULL LIMIT 1"
        );

        let row = sqlx::query_as::<_, WorkRow>(&sql)
            .bind(user_id.get())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(WorkRow::into_work))
    }

    async fn create_planned_work(&self, work: &NewWork) -> WorksiteResult<Work> {
        let sql = format!(
            r#"
            INSERT INTO works AS w (object_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING {WORK_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, WorkRow>(&sql)
            .bind(work.object_id.get())
            .bind(work.name.as_deref())
            .bind(work.description.as_deref())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    WorksiteError::ObjectNotFound
                }
                _ => WorksiteError::Database(e),
            })?;

        Ok(row.into_work())
    }

    async fn start_work(&self, work: &NewWork) -> WorksiteResult<Work> {
        let user_id = work
            .user_id
            .ok_or_else(|| WorksiteError::Internal("Started work without a user".into()))?;

        let mut tx = self.pool.begin().await?;
        lock_user(&mut tx, user_id).await?;

        if let Some(open) = open_work_locked(&mut tx, user_id).await? {
            return Err(open_work_conflict(work.object_id, &open));
        }

        let sql = format!(
            r#"
            INSERT INTO works AS w (object_id, user_id, name, description, start_time)
            VALUES ($1, $2, $3, $4, COALESCE($5, now()))
            RETURNING {WORK_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, WorkRow>(&sql)
            .bind(work.object_id.get())
            .bind(user_id.get())
            .bind(work.name.as_deref())
            .bind(work.description.as_deref())
            .bind(work.start_time)
            .fetch_one(&mut *tx)
            .await
            .map_err(start_conflict)?;

        tx.commit().await?;
        Ok(row.into_work())
    }

    async fn claim_planned_work(&self, work_id: WorkId, user_id: UserId) -> WorksiteResult<Work> {
        let mut tx = self.pool.begin().await?;
        lock_user(&mut tx, user_id).await?;

        let object_id = sqlx::query_scalar::<_, i64>("SELECT object_id FROM works WHERE id = $1 FOR UPDATE")
            .bind(work_id.get())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(WorksiteError::WorkNotFound)?;

        if let Some(open) = open_work_locked(&mut tx, user_id).await? {
            return Err(open_work_conflict(ObjectId::new(object_id), &open));
        }

        let sql = format!(
            r#"
            UPDATE works AS w SET user_id = $2, start_time = now()
            WHERE w.id = $1 AND w.user_id IS NULL AND w.start_time IS NULL
            RETURNING {WORK_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, WorkRow>(&sql)
            .bind(work_id.get())
            .bind(user_id.get())
            .fetch_optional(&mut *tx)
            .await
            .map_err(start_conflict)?
            .ok_or(WorksiteError::WorkAlreadyTaken)?;

        tx.commit().await?;
        Ok(row.into_work())
    }

    async fn finish_work(
        &self,
        work_id: WorkId,
        user_id: UserId,
        comment: Option<&str>,
    ) -> WorksiteResult<Work> {
        let sql = format!(
            r#"
            UPDATE works AS w
            SET end_time = now(), worker_comment = COALESCE($3, w.worker_comment)
            WHERE w.id = $1
              AND w.user_id = $2
              AND w.start_time IS NOT NULL
              AND w.end_time IS NULL
            RETURNING {WORK_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, WorkRow>(&sql)
            .bind(work_id.get())
            .bind(user_id.get())
            .bind(comment)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(WorksiteError::WorkClosed)?;

        Ok(row.into_work())
    }

    async fn object_stats(&self, object_id: ObjectId, user_id: UserId) -> WorksiteResult<ObjectStats> {
        let (total, mine) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE start_time IS NOT NULL AND end_time IS NOT NULL),
                COUNT(*) FILTER (WHERE start_time IS NOT NULL AND end_time IS NOT NULL AND user_id = $2)
            FROM works
            WHERE object_id = $1
            "#,
        )
        .bind(object_id.get())
        .bind(user_id.get())
        .fetch_one(&self.pool)
        .await?;

        Ok(ObjectStats {
            total_completed_works: total,
            user_completed_works: mine,
        })
    }

    async fn work_history(&self, object_id: ObjectId) -> WorksiteResult<Vec<Work>> {
        let sql = format!(
            r#"
            SELECT {WORK_COLUMNS} FROM works w
            WHERE w.object_id = $1 AND w.start_time IS NOT NULL
            ORDER BY w.start_time DESC, w.id DESC
            "#
        );
        self.fetch_works(&sql, object_id.get()).await
    }

    async fn free_works(&self, object_id: ObjectId) -> WorksiteResult<Vec<Work>> {
        let sql = format!(
            r#"
            SELECT {WORK_COLUMNS} FROM works w
            WHERE w.object_id = $1 AND w.user_id IS NULL AND w.start_time IS NULL
            ORDER BY w.id
            "#
        );
        self.fetch_works(&sql, object_id.get()).await
    }

    async fn works_of_user(&self, user_id: UserId) -> WorksiteResult<Vec<Work>> {
        let sql = format!(
            r#"
            SELECT {WORK_COLUMNS} FROM works w
            WHERE w.user_id = $1
            ORDER BY w.start_time DESC NULLS LAST, w.id DESC
            "#
        );
        self.fetch_works(&sql, user_id.get()).await
    }

    async fn works_without_review(&self, supervisor: Option<UserId>) -> WorksiteResult<Vec<Work>> {
        let sql = format!(
            r#"
            SELECT {WORK_COLUMNS} FROM works w
            JOIN objects o ON o.id = w.object_id
            WHERE w.start_time IS NOT NULL
              AND w.end_time IS NOT NULL
              AND NOT EXISTS (SELECT 1 FROM reviews r WHERE r.work_id = w.id)
              AND ($1::BIGINT IS NULL OR o.supervisor_id = $1)
            ORDER BY w.end_time DESC, w.id DESC
            "#
        );

        let rows = sqlx::query_as::<_, WorkRow>(&sql)
            .bind(supervisor.map(|id| id.get()))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(WorkRow::into_work).collect())
    }

    async fn find_user_summary(&self, user_id: UserId) -> WorksiteResult<Option<UserSummary>> {
        let row = sqlx::query_as::<_, UserSummaryRow>(
            "SELECT id, user_name, full_name FROM users WHERE id = $1",
        )
        .bind(user_id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| UserSummary {
            id: UserId::new(r.id),
            user_name: r.user_name,
            full_name: r.full_name,
        }))
    }
}

impl PgWorksiteRepository {
    async fn fetch_works(&self, sql: &str, key: i64) -> WorksiteResult<Vec<Work>> {
        let rows = sqlx::query_as::<_, WorkRow>(sql)
            .bind(key)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(WorkRow::into_work).collect())
    }
}

fn start_conflict(e: sqlx::Error) -> WorksiteError {
    match &e {
        sqlx::Error::Database(db) if db.constraint() == Some(ONE_OPEN_WORK_INDEX) => {
            tracing::warn!("Open work index rejected a start");
            WorksiteError::OpenWorkExists
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => WorksiteError::ObjectNotFound,
        _ => WorksiteError::Database(e),
    }
}

// ============================================================================
// Work Image Repository Implementation
// ============================================================================

impl WorkImageRepository for PgWorksiteRepository {
    async fn add_image(
        &self,
        work_id: WorkId,
        user_id: UserId,
        image: &str,
    ) -> WorksiteResult<WorkImage> {
        // FOR SHARE makes a concurrent finish wait, then re-checks its result
        let row = sqlx::query_as::<_, ImageRow>(
            r#"
            INSERT INTO work_images (work_id, image)
            SELECT w.id, $3 FROM works w
            WHERE w.id = $1
              AND w.user_id = $2
              AND w.start_time IS NOT NULL
              AND w.end_time IS NULL
            FOR SHARE
            RETURNING id, work_id, image, uploaded_at
            "#,
        )
        .bind(work_id.get())
        .bind(user_id.get())
        .bind(image)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(WorksiteError::WorkClosed)?;

        Ok(row.into_image())
    }

    async fn list_images(&self, work_id: WorkId) -> WorksiteResult<Vec<WorkImage>> {
        let rows = sqlx::query_as::<_, ImageRow>(
            r#"
            SELECT id, work_id, image, uploaded_at FROM work_images
            WHERE work_id = $1
            ORDER BY uploaded_at, id
            "#,
        )
        .bind(work_id.get())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ImageRow::into_image).collect())
    }

    async fn find_image(
        &self,
        work_id: WorkId,
        image_id: WorkImageId,
    ) -> WorksiteResult<Option<WorkImage>> {
        let row = sqlx::query_as::<_, ImageRow>(
            "SELECT id, work_id, image, uploaded_at FROM work_images WHERE id = $1 AND work_id = $2",
        )
        .bind(image_id.get())
        .bind(work_id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ImageRow::into_image))
    }

    async fn remove_image(
        &self,
        work_id: WorkId,
        image_id: WorkImageId,
        user_id: UserId,
    ) -> WorksiteResult<WorkImage> {
        let row = sqlx::query_as::<_, ImageRow>(
            r#"
            DELETE FROM work_images i
            USING works w
            WHERE i.id = $2
              AND i.work_id = $1
              AND w.id = i.work_id
              AND w.user_id = $3
              AND w.start_time IS NOT NULL
              AND w.end_time IS NULL
            RETURNING i.id, i.work_id, i.image, i.uploaded_at
            "#,
        )
        .bind(work_id.get())
        .bind(image_id.get())
        .bind(user_id.get())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(WorksiteError::WorkClosed)?;

        Ok(row.into_image())
    }
}

// ============================================================================
// Review Repository Implementation
// ============================================================================

impl ReviewRepository for PgWorksiteRepository {
    async fn create_review(&self, review: &NewReview) -> WorksiteResult<Review> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            INSERT INTO reviews (work_id, supervisor_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id, work_id, supervisor_id, rating, comment, review_date
            "#,
        )
        .bind(review.work_id.get())
        .bind(review.supervisor_id.get())
        .bind(review.rating.get())
        .bind(review.comment.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.constraint() == Some(ONE_REVIEW_PER_WORK) => {
                WorksiteError::ReviewAlreadyExists
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                WorksiteError::WorkNotFound
            }
            _ => WorksiteError::Database(e),
        })?;

        Ok(row.into_review())
    }

    async fn find_review(&self, work_id: WorkId) -> WorksiteResult<Option<Review>> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT id, work_id, supervisor_id, rating, comment, review_date
            FROM reviews WHERE work_id = $1
            "#,
        )
        .bind(work_id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ReviewRow::into_review))
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct ObjectRow {
    id: i64,
    name: String,
    address: String,
    task_description: String,
    deadline: DateTime<Utc>,
    supervisor_id: i64,
    worker_ids: Vec<i64>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    qr_code: Option<String>,
}

impl ObjectRow {
    fn into_object(self) -> Object {
        Object {
            id: ObjectId::new(self.id),
            name: self.name,
            address: self.address,
            task_description: self.task_description,
            deadline: self.deadline,
            supervisor_id: UserId::new(self.supervisor_id),
            worker_ids: self.worker_ids.into_iter().map(UserId::new).collect(),
            start_time: self.start_time,
            end_time: self.end_time,
            qr_code: self.qr_code,
        }
    }
}

#[derive(sqlx::FromRow)]
struct WorkRow {
    id: i64,
    object_id: i64,
    user_id: Option<i64>,
    name: Option<String>,
    description: Option<String>,
    worker_comment: Option<String>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
}

impl WorkRow {
    fn into_work(self) -> Work {
        Work {
            id: WorkId::new(self.id),
            object_id: ObjectId::new(self.object_id),
            user_id: self.user_id.map(UserId::new),
            name: self.name,
            description: self.description,
            worker_comment: self.worker_comment,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ImageRow {
    id: i64,
    work_id: i64,
    image: String,
    uploaded_at: DateTime<Utc>,
}

impl ImageRow {
    fn into_image(self) -> WorkImage {
        WorkImage {
            id: WorkImageId::new(self.id),
            work_id: WorkId::new(self.work_id),
            image: self.image,
            uploaded_at: self.uploaded_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    work_id: i64,
    supervisor_id: i64,
    rating: i16,
    comment: Option<String>,
    review_date: DateTime<Utc>,
}

impl ReviewRow {
    fn into_review(self) -> Review {
        Review {
            id: ReviewId::new(self.id),
            work_id: WorkId::new(self.work_id),
            supervisor_id: UserId::new(self.supervisor_id),
            rating: Rating::from_db(self.rating),
            comment: self.comment,
            review_date: self.review_date,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserSummaryRow {
    id: i64,
    user_name: String,
    full_name: Option<String>,
}

// ============================================================================
// Database tests (skipped unless DATABASE_URL is set)
// ============================================================================
