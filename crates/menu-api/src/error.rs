//! HTTP mapping of menu errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use menu_core::{MenuError, Notice};
use thiserror::Error;

use crate::response::ApiResponse;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Menu(#[from] MenuError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
            ApiError::Menu(e) => match e {
                MenuError::Aborted => (StatusCode::CONFLICT, "Aborted"),
                MenuError::Network(_) => (StatusCode::BAD_GATEWAY, "NetworkError"),
                MenuError::Database(_) => (StatusCode::SERVICE_UNAVAILABLE, "DatabaseError"),
                MenuError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "StorageError"),
                MenuError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "ValidationError"),
                MenuError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
                MenuError::UnknownSetKey(_) => (StatusCode::NOT_FOUND, "UnknownSetKey"),
                MenuError::PagesSync { .. } => (StatusCode::MULTI_STATUS, "PagesSyncFailed"),
                MenuError::Serialization(_) => (StatusCode::BAD_REQUEST, "SerializationError"),
                MenuError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
            },
        }
    }

    fn notice(&self) -> Notice {
        match self {
            ApiError::Menu(e) => e.notice(),
            ApiError::BadRequest(msg) => Notice {
                title: "Invalid request".to_string(),
                message: msg.clone(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() || status == StatusCode::MULTI_STATUS {
            tracing::error!("{}: {}", code, self);
        } else {
            tracing::warn!("{}: {}", code, self);
        }

        let notice = self.notice();
        let body = Json(ApiResponse::<()>::error(code, &notice.title, &notice.message));
        (status, body).into_response()
    }
}
