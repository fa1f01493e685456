use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        extractors::AuthUser,
        guard::{can_access, require_admin},
        repo::User,
    },
    error::AppError,
    state::AppState,
};

use super::dto::{
    AssignRequest, CreateEstimateRequest, CreateTaskRequest, CreateTimeLogRequest, Pagination,
    StatusRequest, UpdateTaskRequest,
};
use super::repo::{Estimate, Task, TimeLog};

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", post(create_task).get(list_tasks))
        .route("/tasks/:id", get(get_task).put(update_task).delete(delete_task))
        .route("/tasks/:id/status", post(change_status))
        .route("/tasks/:id/assign", post(assign_task))
        .route("/tasks/:id/timelogs", post(create_timelog).get(list_timelogs))
        .route("/tasks/:id/estimates", post(create_estimate).get(list_estimates))
}

/// Resolve a task and apply the ownership guard. A missing task and a task
/// the caller may not see produce the same "not found" outcome, so existence
/// is never disclosed to unauthorized callers.
async fn load_guarded_task(
    state: &AppState,
    user: &User,
    task_id: i64,
) -> Result<Task, AppError> {
    match Task::find_by_id(&state.db, task_id).await? {
        Some(task) if can_access(user, task.user_id) => Ok(task),
        Some(_) => {
            warn!(user_id = user.id, task_id, "access to foreign task denied");
            Err(AppError::NotFound("Task not found".into()))
        }
        None => Err(AppError::NotFound("Task not found".into())),
    }
}

fn duration_minutes(start: OffsetDateTime, end: Option<OffsetDateTime>) -> Option<f64> {
    end.map(|end| (end - start).as_seconds_f64() / 60.0)
}

#[instrument(skip_all)]
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let task = Task::create(
        &state.db,
        user.id,
        &payload.title,
        &payload.description,
        &payload.status,
        payload.total_minutes,
    )
    .await?;
    info!(user_id = user.id, task_id = task.id, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

#[instrument(skip_all)]
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<Task>>, AppError> {
    let (limit, offset) = p.clamped();
    let tasks = Task::list_by_user(&state.db, user.id, limit, offset).await?;
    Ok(Json(tasks))
}

#[instrument(skip_all)]
pub async fn get_task(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Task>, AppError> {
    let task = load_guarded_task(&state, &user, id).await?;
    Ok(Json(task))
}

#[instrument(skip_all)]
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, AppError> {
    load_guarded_task(&state, &user, id).await?;
    let task = Task::update(
        &state.db,
        id,
        payload.title.as_deref(),
        payload.description.as_deref(),
        payload.status.as_deref(),
        payload.total_minutes,
    )
    .await?;
    info!(user_id = user.id, task_id = id, "task updated");
    Ok(Json(task))
}

#[instrument(skip_all)]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    load_guarded_task(&state, &user, id).await?;
    Task::delete(&state.db, id).await?;
    info!(user_id = user.id, task_id = id, "task deleted");
    Ok(Json(json!({ "ok": true })))
}

#[instrument(skip_all)]
pub async fn change_status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<StatusRequest>,
) -> Result<Json<Task>, AppError> {
    load_guarded_task(&state, &user, id).await?;
    let task = Task::set_status(&state.db, id, &payload.status).await?;
    info!(user_id = user.id, task_id = id, status = %payload.status, "task status changed");
    Ok(Json(task))
}

/// Admin-only reassignment. The admin check runs before the task is
/// resolved, so a non-admin caller gets `Forbidden` even for a task id that
/// does not exist. This ordering differs from every other task endpoint and
/// is intentional.
#[instrument(skip_all)]
pub async fn assign_task(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<AssignRequest>,
) -> Result<Json<Task>, AppError> {
    require_admin(&user)?;

    if Task::find_by_id(&state.db, id).await?.is_none() {
        return Err(AppError::NotFound("Task not found".into()));
    }
    if User::find_by_id(&state.db, payload.user_id).await?.is_none() {
        return Err(AppError::NotFound("User not found".into()));
    }

    let task = Task::reassign(&state.db, id, payload.user_id).await?;
    info!(
        admin_id = user.id,
        task_id = id,
        new_owner = payload.user_id,
        "task reassigned"
    );
    Ok(Json(task))
}

#[instrument(skip_all)]
pub async fn create_timelog(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<CreateTimeLogRequest>,
) -> Result<(StatusCode, Json<TimeLog>), AppError> {
    load_guarded_task(&state, &user, id).await?;
    let duration = duration_minutes(payload.start_time, payload.end_time);
    let timelog = TimeLog::create(
        &state.db,
        id,
        payload.start_time,
        payload.end_time,
        duration,
    )
    .await?;
    info!(user_id = user.id, task_id = id, timelog_id = timelog.id, "timelog created");
    Ok((StatusCode::CREATED, Json(timelog)))
}

#[instrument(skip_all)]
pub async fn list_timelogs(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<TimeLog>>, AppError> {
    load_guarded_task(&state, &user, id).await?;
    let timelogs = TimeLog::list_by_task(&state.db, id).await?;
    Ok(Json(timelogs))
}

#[instrument(skip_all)]
pub async fn create_estimate(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<CreateEstimateRequest>,
) -> Result<(StatusCode, Json<Estimate>), AppError> {
    load_guarded_task(&state, &user, id).await?;
    let estimate = Estimate::create(
        &state.db,
        id,
        payload.estimated_min,
        payload.estimated_max,
    )
    .await?;
    info!(user_id = user.id, task_id = id, estimate_id = estimate.id, "estimate created");
    Ok((StatusCode::CREATED, Json(estimate)))
}

#[instrument(skip_all)]
pub async fn list_estimates(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Estimate>>, AppError> {
    load_guarded_task(&state, &user, id).await?;
    let estimates = Estimate::list_by_task(&state.db, id).await?;
    Ok(Json(estimates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn duration_is_none_for_open_interval() {
        let start = datetime!(2026-08-25 09:00 UTC);
        assert_eq!(duration_minutes(start, None), None);
    }

    #[test]
    fn duration_in_minutes_for_closed_interval() {
        let start = datetime!(2026-08-25 09:00 UTC);
        let end = datetime!(2026-08-25 09:45 UTC);
        assert_eq!(duration_minutes(start, Some(end)), Some(45.0));
    }

    #[test]
    fn duration_handles_sub_minute_intervals() {
        let start = datetime!(2026-08-25 09:00:00 UTC);
        let end = datetime!(2026-08-25 09:00:30 UTC);
        assert_eq!(duration_minutes(start, Some(end)), Some(0.5));
    }
}
