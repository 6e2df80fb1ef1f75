use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::models::FieldError;
use crate::services::{AuthError, RecordError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    Forbidden,

    DatabaseError(String),

    ValidationError {
        message: String,
        fields: Vec<FieldError>,
    },

    Conflict(String),

    InternalError(String),

    /// Carries the internal reason for logging only; the client always sees
    /// the same generic message.
    Unauthorized(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Forbidden => write!(f, "Forbidden"),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::ValidationError { message, .. } => {
                write!(f, "Validation error: {}", message)
            }
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Not allowed to perform this action".to_string(),
                None,
            ),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                    None,
                )
            }
            ApiError::ValidationError { message, fields } => {
                (StatusCode::UNPROCESSABLE_ENTITY, message, Some(fields))
            }
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::Unauthorized(reason) => {
                tracing::debug!("Rejected credentials: {}", reason);
                let body = ApiResponse::<()>::error("Unauthorized");
                let mut response = (StatusCode::UNAUTHORIZED, Json(body)).into_response();
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                return response;
            }
        };

        let mut body = ApiResponse::<()>::error(error_message);
        body.details = details;
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(format!("{err:#}"))
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            e if e.is_unauthorized() => ApiError::Unauthorized(e.to_string()),
            AuthError::Forbidden => ApiError::Forbidden,
            AuthError::NotFound(id) => ApiError::not_found("User", id),
            AuthError::Conflict(field) => ApiError::Conflict(format!("{field} already registered")),
            AuthError::Validation(fields) => ApiError::invalid_fields(fields),
            AuthError::Database(msg) => ApiError::DatabaseError(msg),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::NotFound(id) => ApiError::not_found("Virtual machine", id),
            RecordError::Forbidden => ApiError::Forbidden,
            RecordError::Validation(fields) => ApiError::invalid_fields(fields),
            RecordError::Database(msg) => ApiError::DatabaseError(msg),
            RecordError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        ApiError::NotFound(format!("{} {} not found", resource, id))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError {
            message: msg.into(),
            fields: Vec::new(),
        }
    }

    pub fn invalid_fields(fields: Vec<FieldError>) -> Self {
        ApiError::ValidationError {
            message: "Request validation failed".to_string(),
            fields,
        }
    }
}
