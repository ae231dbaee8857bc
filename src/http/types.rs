use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::domain::error::StoreError;
use crate::domain::task::{Task, TaskId};

#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self { Self { status: StatusCode::BAD_REQUEST, message: message.into() } }
    pub fn not_found(message: impl Into<String>) -> Self { Self { status: StatusCode::NOT_FOUND, message: message.into() } }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::not_found(err.to_string()),
            StoreError::Storage(e) => {
                tracing::error!(error = %e, "store failure");
                Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: "internal error".into() }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response { (self.status, axum::Json(self)).into_response() }
}

#[derive(Debug, Deserialize)]
pub struct TextBody { pub text: String }

#[derive(Debug, Serialize)]
pub struct CreatedBody { pub id: TaskId }

#[derive(Debug, Serialize)]
pub struct ListBody { pub items: Vec<Task> }
