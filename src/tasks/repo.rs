use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: String, // todo, in_progress, done
    pub total_minutes: f64,
    pub user_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TimeLog {
    pub id: i64,
    pub task_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
    pub duration_minutes: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Estimate {
    pub id: i64,
    pub task_id: i64,
    pub estimated_min: f64,
    pub estimated_max: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Task {
    pub async fn create(
        db: &PgPool,
        user_id: i64,
        title: &str,
        description: &str,
        status: &str,
        total_minutes: f64,
    ) -> Result<Task, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, status, total_minutes, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, status, total_minutes, user_id, created_at, updated_at
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(status)
        .bind(total_minutes)
        .bind(user_id)
        .fetch_one(db)
        .await
    }

    /// Lookup by id only. Ownership is decided by the caller via the
    /// authorization guard, so admins can see every task.
    pub async fn find_by_id(db: &PgPool, task_id: i64) -> Result<Option<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, total_minutes, user_id, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(task_id)
        .fetch_optional(db)
        .await
    }

    pub async fn list_by_user(
        db: &PgPool,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, total_minutes, user_id, created_at, updated_at
            FROM tasks
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
    }

    pub async fn update(
        db: &PgPool,
        task_id: i64,
        title: Option<&str>,
        description: Option<&str>,
        status: Option<&str>,
        total_minutes: Option<f64>,
    ) -> Result<Task, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                total_minutes = COALESCE($5, total_minutes),
                updated_at = now()
            WHERE id = $1
            RETURNING id, title, description, status, total_minutes, user_id, created_at, updated_at
            "#,
        )
        .bind(task_id)
        .bind(title)
        .bind(description)
        .bind(status)
        .bind(total_minutes)
        .fetch_one(db)
        .await
    }

    pub async fn set_status(db: &PgPool, task_id: i64, status: &str) -> Result<Task, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, title, description, status, total_minutes, user_id, created_at, updated_at
            "#,
        )
        .bind(task_id)
        .bind(status)
        .fetch_one(db)
        .await
    }

    pub async fn delete(db: &PgPool, task_id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(task_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn reassign(db: &PgPool, task_id: i64, new_owner: i64) -> Result<Task, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET user_id = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, title, description, status, total_minutes, user_id, created_at, updated_at
            "#,
        )
        .bind(task_id)
        .bind(new_owner)
        .fetch_one(db)
        .await
    }
}

impl TimeLog {
    pub async fn create(
        db: &PgPool,
        task_id: i64,
        start_time: OffsetDateTime,
        end_time: Option<OffsetDateTime>,
        duration_minutes: Option<f64>,
    ) -> Result<TimeLog, sqlx::Error> {
        sqlx::query_as::<_, TimeLog>(
            r#"
            INSERT INTO timelogs (task_id, start_time, end_time, duration_minutes)
            VALUES ($1, $2, $3, $4)
            RETURNING id, task_id, start_time, end_time, duration_minutes, created_at
            "#,
        )
        .bind(task_id)
        .bind(start_time)
        .bind(end_time)
        .bind(duration_minutes)
        .fetch_one(db)
        .await
    }

    pub async fn list_by_task(db: &PgPool, task_id: i64) -> Result<Vec<TimeLog>, sqlx::Error> {
        sqlx::query_as::<_, TimeLog>(
            r#"
            SELECT id, task_id, start_time, end_time, duration_minutes, created_at
            FROM timelogs
            WHERE task_id = $1
            ORDER BY start_time
            "#,
        )
        .bind(task_id)
        .fetch_all(db)
        .await
    }
}

impl Estimate {
    pub async fn create(
        db: &PgPool,
        task_id: i64,
        estimated_min: f64,
        estimated_max: f64,
    ) -> Result<Estimate, sqlx::Error> {
        sqlx::query_as::<_, Estimate>(
            r#"
            INSERT INTO estimates (task_id, estimated_min, estimated_max)
            VALUES ($1, $2, $3)
            RETURNING id, task_id, estimated_min, estimated_max, created_at
            "#,
        )
        .bind(task_id)
        .bind(estimated_min)
        .bind(estimated_max)
        .fetch_one(db)
        .await
    }

    pub async fn list_by_task(db: &PgPool, task_id: i64) -> Result<Vec<Estimate>, sqlx::Error> {
        sqlx::query_as::<_, Estimate>(
            r#"
            SELECT id, task_id, estimated_min, estimated_max, created_at
            FROM estimates
            WHERE task_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(task_id)
        .fetch_all(db)
        .await
    }
}
