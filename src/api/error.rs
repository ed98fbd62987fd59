use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::LibraryError;
use crate::services::media_service::MediaError;
use crate::services::movie_form::FormError;
use crate::services::tasks::TaskError;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    ExternalApiError { service: String, message: String },

    ValidationError(String),

    Conflict(String),

    InternalError(String),

    /// 403 with a specific error code
    Forbidden { code: &'static str, message: String },

    /// 400 from a failed library operation, with a specific error code
    OperationFailed { code: &'static str, message: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::ExternalApiError { service, message } => {
                write!(f, "{service} error: {message}")
            }
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
            Self::Forbidden { code, message } | Self::OperationFailed { code, message } => {
                write!(f, "{code}: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::DatabaseError(_) | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ExternalApiError { .. } => StatusCode::BAD_GATEWAY,
            Self::ValidationError(_) | Self::OperationFailed { .. } => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
        }
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::DatabaseError(_) | Self::InternalError(_) => "INTERNAL_ERROR",
            Self::ExternalApiError { .. } => "EXTERNAL_API_ERROR",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Forbidden { code, .. } | Self::OperationFailed { code, .. } => *code,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let error_message = match self {
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                "A database error occurred".to_string()
            }
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            Self::ExternalApiError { service, message } => {
                tracing::warn!("{} API error: {}", service, message);
                format!("{service} service is unavailable")
            }
            Self::NotFound(msg)
            | Self::ValidationError(msg)
            | Self::Conflict(msg)
            | Self::Forbidden { message: msg, .. }
            | Self::OperationFailed { message: msg, .. } => msg,
        };

        let body = ApiResponse::<()>::error(error_message).with_code(code);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(format!("{err:#}"))
    }
}

impl From<LibraryError> for ApiError {
    fn from(err: LibraryError) -> Self {
        match err {
            LibraryError::PathSecurity(message) => Self::Forbidden {
                code: "INVALID_PATH",
                message,
            },
            LibraryError::InsufficientPermissions(message) => Self::Forbidden {
                code: "PERMISSION_DENIED",
                message,
            },
            LibraryError::FileOperation(message) => Self::OperationFailed {
                code: "OPERATION_FAILED",
                message,
            },
            LibraryError::ScanOperation(message) => Self::OperationFailed {
                code: "SCAN_FAILED",
                message,
            },
            LibraryError::MetadataExtraction(message) => Self::OperationFailed {
                code: "EXTRACTION_FAILED",
                message,
            },
            LibraryError::InvalidFileType(message) => Self::OperationFailed {
                code: "INVALID_FILE_TYPE",
                message,
            },
            LibraryError::NotFound(msg) => Self::NotFound(msg),
            LibraryError::Database(msg) => Self::DatabaseError(msg),
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::NotFound(msg) => Self::NotFound(format!("{msg} not found")),
            MediaError::Validation(msg) => Self::ValidationError(msg),
            MediaError::Library(e) => e.into(),
            MediaError::Database(msg) => Self::DatabaseError(msg),
        }
    }
}

impl From<FormError> for ApiError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::Provider(message) => Self::omdb_error(message),
            FormError::Store(msg) => Self::DatabaseError(msg),
            FormError::Duplicate(id) => Self::Conflict(format!("Movie {id} already exists")),
            FormError::NotFound(id) => Self::not_found("OMDB record", id),
        }
    }
}

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::NotFound(id) => Self::not_found("Task", id),
            e @ TaskError::NotCancellable { .. } => Self::ValidationError(e.to_string()),
        }
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        Self::NotFound(format!("{resource} {id} not found"))
    }

    pub fn omdb_error(msg: impl Into<String>) -> Self {
        Self::ExternalApiError {
            service: "OMDB".to_string(),
            message: msg.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_errors_map_to_codes() {
        let err: ApiError = LibraryError::security("outside").into();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.code(), "INVALID_PATH");

        let err: ApiError = LibraryError::ScanOperation("busy".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "SCAN_FAILED");

        let err: ApiError = LibraryError::NotFound("x".into()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_form_errors_map_to_statuses() {
        let err: ApiError = FormError::Duplicate("tt1375666".into()).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: ApiError = FormError::Provider("timeout".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.code(), "EXTERNAL_API_ERROR");
    }
}
