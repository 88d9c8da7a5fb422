use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors raised by the draw core
#[derive(Error, Debug)]
pub enum DrawError {
    #[error("Need at least 2 members to draw, found {found}")]
    InsufficientMembers { found: usize },

    #[error("Member listed more than once")]
    DuplicateMember,

    #[error("Invalid assignment: {0}")]
    InvalidAssignment(String),

    #[error("Group not found: {0}")]
    GroupNotFound(i64),

    #[error("Only the group admin can draw names")]
    NotAuthorized,

    #[error("Group is completed")]
    GroupClosed,

    #[error("Storage failure: {0}")]
    Storage(#[from] sea_orm::DbErr),
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Access forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    code: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized", None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "Forbidden", Some(msg.clone())),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not Found", Some(msg.clone())),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad Request", Some(msg.clone())),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "Conflict", Some(msg.clone())),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", None)
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database Error", Some(err.to_string()))
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "Validation Error", Some(msg.clone()))
            }
        };

        let body = ErrorResponse {
            code: status.as_u16(),
            message: message.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<DrawError> for AppError {
    fn from(err: DrawError) -> Self {
        match err {
            DrawError::InsufficientMembers { .. }
            | DrawError::DuplicateMember
            | DrawError::InvalidAssignment(_) => {
                AppError::Validation(err.to_string())
            }
            DrawError::GroupNotFound(_) => AppError::NotFound(err.to_string()),
            DrawError::NotAuthorized => AppError::Forbidden(err.to_string()),
            DrawError::GroupClosed => AppError::Conflict(err.to_string()),
            // Storage failures are reported verbatim
            DrawError::Storage(db_err) => AppError::Database(db_err),
        }
    }
}

/// Result type alias for application
pub type AppResult<T> = Result<T, AppError>;

/// Helper trait for converting Option to AppError::NotFound
pub trait OptionExt<T> {
    fn ok_or_not_found(self, msg: impl Into<String>) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, msg: impl Into<String>) -> AppResult<T> {
        self.ok_or_else(|| AppError::NotFound(msg.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response() {
        let err = AppError::NotFound("Group not found".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_option_ext() {
        let opt: Option<i32> = None;
        let result = opt.ok_or_not_found("Item not found");
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_draw_error_status_mapping() {
        let cases = [
            (DrawError::InsufficientMembers { found: 1 }, StatusCode::BAD_REQUEST),
            (DrawError::DuplicateMember, StatusCode::BAD_REQUEST),
            (DrawError::InvalidAssignment("self pair".to_string()), StatusCode::BAD_REQUEST),
            (DrawError::GroupNotFound(9), StatusCode::NOT_FOUND),
            (DrawError::NotAuthorized, StatusCode::FORBIDDEN),
            (DrawError::GroupClosed, StatusCode::CONFLICT),
            (
                DrawError::Storage(sea_orm::DbErr::Custom("disk full".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_insufficient_members_message() {
        let err = DrawError::InsufficientMembers { found: 1 };
        assert_eq!(err.to_string(), "Need at least 2 members to draw, found 1");
    }
}
