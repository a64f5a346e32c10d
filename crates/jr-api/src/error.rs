use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::{borrow::Cow, future::Future};
use thiserror::Error;
use tracing::error;

use jr_common::db::{EmbeddingStorageError, IntakeStorageError};
use jr_common::embedding::EmbedError;
use jr_common::scoring::ScoringError;

tokio::task_local! {
    static REQUEST_ID: String;
}

fn sanitize_message(message: &str) -> String {
    const MAX_LEN: usize = 240;

    let mut cleaned = message
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .split_whitespace()
        .map(|token| {
            if token.contains("://") || token.starts_with('/') || token.contains('\\') {
                "[redacted]".to_string()
            } else {
                token.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    if cleaned.len() > MAX_LEN {
        cleaned.truncate(MAX_LEN);
    }

    if cleaned.trim().is_empty() {
        "unexpected error".to_string()
    } else {
        cleaned
    }
}

pub async fn with_request_id<Fut, T>(request_id: Option<String>, fut: Fut) -> T
where
    Fut: Future<Output = T>,
{
    if let Some(request_id) = request_id {
        REQUEST_ID.scope(request_id, fut).await
    } else {
        fut.await
    }
}

pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|value| value.clone()).ok()
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("database error: {0}")]
    Database(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("embeddings not found for ids {missing_ids:?}: {message}")]
    MissingEmbeddings {
        message: String,
        missing_ids: Vec<i64>,
    },
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
    request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing_ids: Option<Vec<i64>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let code = self.code();
        let request_id = current_request_id();

        error!(
            code,
            status = %status,
            request_id = request_id.as_deref().unwrap_or(""),
            error = %self,
            "api_error"
        );

        let missing_ids = match &self {
            ApiError::MissingEmbeddings { missing_ids, .. } => Some(missing_ids.clone()),
            _ => None,
        };

        let body = Json(ErrorResponse {
            code,
            message: self.public_message().into_owned(),
            request_id,
            missing_ids,
        });

        (status, body).into_response()
    }
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::NotFound(_) | ApiError::MissingEmbeddings { .. } => "not_found",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
            ApiError::Database(_) => "database_error",
            ApiError::Internal(_) => "internal_error",
        }
    }

    fn public_message(&self) -> Cow<'static, str> {
        match self {
            ApiError::BadRequest(msg) => Cow::Owned(sanitize_message(msg)),
            ApiError::Unauthorized(_) => Cow::Borrowed("unauthorized"),
            ApiError::NotFound(msg) => Cow::Owned(sanitize_message(msg)),
            ApiError::MissingEmbeddings { message, .. } => Cow::Owned(sanitize_message(message)),
            ApiError::ServiceUnavailable(_) => Cow::Borrowed("service unavailable"),
            ApiError::Database(_) | ApiError::Internal(_) => Cow::Borrowed("internal server error"),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) | ApiError::MissingEmbeddings { .. } => StatusCode::NOT_FOUND,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<EmbeddingStorageError> for ApiError {
    fn from(value: EmbeddingStorageError) -> Self {
        match value {
            EmbeddingStorageError::MissingIds(missing_ids) => ApiError::MissingEmbeddings {
                message: "no stored embeddings for the listed ids".into(),
                missing_ids,
            },
            other => ApiError::Database(other.to_string()),
        }
    }
}

impl From<EmbedError> for ApiError {
    fn from(value: EmbedError) -> Self {
        match value {
            EmbedError::InvalidRecord(err) => ApiError::BadRequest(err.to_string()),
            EmbedError::UnknownCategory { .. } => ApiError::BadRequest(value.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ScoringError> for ApiError {
    fn from(value: ScoringError) -> Self {
        ApiError::Internal(value.to_string())
    }
}

impl From<IntakeStorageError> for ApiError {
    fn from(value: IntakeStorageError) -> Self {
        ApiError::Database(value.to_string())
    }
}
