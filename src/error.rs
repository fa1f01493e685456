use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Request-scoped error outcomes, translated to HTTP at the boundary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Username already registered")]
    DuplicateUsername,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::DuplicateUsername => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Internal(err) => {
                // Log the detail server-side, return a generic message to the client
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "detail": message }))).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            // users.username is the only unique constraint in the schema
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::DuplicateUsername
            }
            // a row can vanish between the guard check and the mutation
            sqlx::Error::RowNotFound => AppError::NotFound("Not found".into()),
            _ => AppError::Internal(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn error_response(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        (status, json)
    }

    #[tokio::test]
    async fn duplicate_username_is_bad_request() {
        let (status, body) = error_response(AppError::DuplicateUsername).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .contains("already registered"));
    }

    #[tokio::test]
    async fn unauthorized_keeps_message() {
        let (status, body) =
            error_response(AppError::Unauthorized("Invalid credentials".into())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Invalid credentials");
    }

    #[tokio::test]
    async fn forbidden_keeps_message() {
        let (status, body) =
            error_response(AppError::Forbidden("Admin access required".into())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["detail"], "Admin access required");
    }

    #[tokio::test]
    async fn internal_hides_details() {
        let (status, body) = error_response(AppError::Internal(anyhow::anyhow!(
            "connection refused at 10.0.0.5:5432"
        )))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Internal server error");
        assert!(!body["detail"].as_str().unwrap().contains("10.0.0.5"));
    }

    #[tokio::test]
    async fn not_found_keeps_message() {
        let (status, body) = error_response(AppError::NotFound("Task not found".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Task not found");
    }
}
