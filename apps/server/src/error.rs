//! Error handling for the server API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use matchdeck_core::{ParseError, SessionError};
use serde::Serialize;
use thiserror::Error;

use crate::db::DbError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(DbError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::CardNotFound(_) | DbError::NoteTypeNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            DbError::DuplicateNoteType(_) => ApiError::Conflict(err.to_string()),
            DbError::InvalidData(msg) => ApiError::BadRequest(msg),
            other => ApiError::Database(other),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::UnknownTile(_) => ApiError::NotFound(err.to_string()),
            SessionError::Finished | SessionError::TimeUp => ApiError::Conflict(err.to_string()),
            _ => ApiError::BadRequest(err.to_string()),
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Parse(_) => (StatusCode::BAD_REQUEST, "parse_error"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_status() {
        let error = ApiError::NotFound("card 123".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_bad_request_status() {
        let error = ApiError::BadRequest("invalid input".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parse_error_status() {
        let error = ApiError::from(ParseError::OrphanText { line: 3 });
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_conflict_status() {
        let error = ApiError::Conflict("already finished".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_internal_error_status() {
        let error = ApiError::Internal("unexpected error".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_db_not_found_maps_to_404() {
        let error = ApiError::from(DbError::CardNotFound(7));
        assert!(matches!(error, ApiError::NotFound(_)));
        assert_eq!(error.to_string(), "Not found: card not found: 7");
    }

    #[test]
    fn test_db_invalid_data_maps_to_400() {
        let error = ApiError::from(DbError::InvalidData("bad hour".to_string()));
        assert_eq!(error.to_string(), "Bad request: bad hour");
    }

    #[test]
    fn test_session_errors_map_by_kind() {
        assert!(matches!(
            ApiError::from(SessionError::EmptyPool),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(SessionError::UnknownTile(4)),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(SessionError::TimeUp),
            ApiError::Conflict(_)
        ));
    }

    #[test]
    fn test_error_display_parse() {
        let error = ApiError::from(ParseError::InvalidId {
            line: 2,
            value: "abc".to_string(),
        });
        assert_eq!(
            error.to_string(),
            "Parse error: invalid ID format at line 2: abc"
        );
    }

    #[test]
    fn test_error_display_conflict() {
        let error = ApiError::Conflict("the session is finished".to_string());
        assert_eq!(error.to_string(), "Conflict: the session is finished");
    }
}
