use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::{
    i18n::{Lang, Msg},
    users::repo::RepoError,
};

/// One failed rule of a request body, addressed by its field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub code: &'static str,
    pub message: String,
    pub path: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<usize>,
}

impl FieldError {
    pub fn new(field: &str, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: vec![field.to_string()],
            minimum: None,
            maximum: None,
        }
    }

    pub fn required(field: &str, message: &str) -> Self {
        Self::new(field, "invalid_type", message)
    }

    pub fn too_small(field: &str, minimum: usize, message: &str) -> Self {
        Self {
            minimum: Some(minimum),
            ..Self::new(field, "too_small", message)
        }
    }

    pub fn too_big(field: &str, maximum: usize, message: &str) -> Self {
        Self {
            maximum: Some(maximum),
            ..Self::new(field, "too_big", message)
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Operational { status: StatusCode, message: String },

    #[error("request validation failed")]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        AppError::Operational {
            status,
            message: message.into(),
        }
    }

    pub fn localized(status: StatusCode, msg: Msg, lang: Lang) -> Self {
        Self::new(status, msg.text(lang))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Operational { status, .. } => *status,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        AppError::Internal(e.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Operational { message, .. } => {
                let kind = if status.is_server_error() { "error" } else { "fail" };
                json!({ "status": kind, "message": message })
            }
            AppError::Validation(errors) => json!({ "status": "fail", "errors": errors }),
            AppError::Internal(e) => {
                tracing::error!(error = ?e, "unhandled error");
                json!({ "status": "error", "message": "Something went wrong" })
            }
        };
        (status, Json(body)).into_response()
    }
}
