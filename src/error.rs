//! HTTP-facing error type. Handlers return `Result<_, ApiError>`; the body is
//! always `{ "error": ..., "message"?: ... }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::content::ContentError;
use crate::routes::ErrorResponse;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Too many requests. Please try again later.")]
    TooManyRequests,

    #[error("{0}")]
    Unavailable(String),

    /// Logged in full, reported to the caller as a generic failure
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        ApiError::Internal(format!("{}: {}", context, err))
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UnknownId { table, id } => {
                ApiError::NotFound(format!("No {} row with id {}", table, id))
            }
            StoreError::Database(e) => ApiError::internal("database error", e),
            StoreError::Encoding(e) => ApiError::internal("document encoding error", e),
            StoreError::Blob(e) => ApiError::internal("file storage error", e),
        }
    }
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Validation(msg) => ApiError::BadRequest(msg),
            e @ ContentError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            ContentError::Conflict(msg) => ApiError::Conflict(msg),
            ContentError::Store(e) => e.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                ErrorResponse {
                    error: self.to_string(),
                    message: None,
                }
            }
            ApiError::Unavailable(reason) => ErrorResponse {
                error: "Service unavailable".to_string(),
                message: Some(reason.clone()),
            },
            _ => ErrorResponse {
                error: self.to_string(),
                message: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_content_errors_map_to_status() {
        let cases = [
            (
                ApiError::from(ContentError::Validation("title is required".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(ContentError::NotFound {
                    label: "project",
                    id: "x".into(),
                }),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(ContentError::Conflict("dup".into())),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::from(StoreError::UnknownId {
                    table: "skills",
                    id: Uuid::nil(),
                }),
                StatusCode::NOT_FOUND,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status);
        }
    }

    #[tokio::test]
    async fn test_internal_details_are_not_returned() {
        let response = ApiError::internal("database error", "password auth failed for user x")
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Internal server error");
        assert!(body.get("message").is_none());
    }
}
