//! The single exception-to-response mapping layer.
//!
//! Every domain condition becomes
//! `{ statusCode, error, message, details }`. Storage failures keep a
//! fixed public message; the underlying error was already logged where
//! it was caught.

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde_json::json;

use crate::domain::error::DomainError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, details) = match &self.0 {
            DomainError::AccessDenied { entity, method } => (
                StatusCode::FORBIDDEN,
                self.0.to_string(),
                json!({ "entity": entity.display_name(), "method": method }),
            ),
            DomainError::PermissionDenied { entity, method, id } => (
                StatusCode::FORBIDDEN,
                self.0.to_string(),
                json!({ "entity": entity.display_name(), "method": method, "id": id }),
            ),
            DomainError::NotFound { entity, id } => (
                StatusCode::NOT_FOUND,
                self.0.to_string(),
                json!({ "entity": entity.display_name(), "id": id }),
            ),
            DomainError::WrongData { field, message } => (
                StatusCode::BAD_REQUEST,
                self.0.to_string(),
                json!({ "field": field, "reason": message }),
            ),
            DomainError::InvalidCredentials => {
                (StatusCode::FORBIDDEN, self.0.to_string(), json!({}))
            }
            DomainError::Database { .. } => (
                StatusCode::BAD_REQUEST,
                "Database query failed".to_owned(),
                json!({}),
            ),
        };

        let error = status
            .canonical_reason()
            .unwrap_or("Error")
            .to_owned();
        let body = json!({
            "statusCode": status.as_u16(),
            "error": error,
            "message": message,
            "details": details,
        });
        (status, Json(body)).into_response()
    }
}
