//! Error types for the survey API

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Result type alias for survey operations
pub type SurveyResult<T> = Result<T, SurveyError>;

/// Survey API error types
#[derive(Debug, Error)]
pub enum SurveyError {
    #[error("Survey {0} not found")]
    SurveyNotFound(String),

    #[error("Version {version} not found for survey {survey_id}")]
    VersionNotFound { survey_id: String, version: i32 },

    #[error("Survey {0} already exists")]
    SurveyExists(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<mongodb::error::Error> for SurveyError {
    fn from(err: mongodb::error::Error) -> Self {
        SurveyError::Database(err.to_string())
    }
}

impl From<bson::ser::Error> for SurveyError {
    fn from(err: bson::ser::Error) -> Self {
        SurveyError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for SurveyError {
    fn from(err: serde_json::Error) -> Self {
        SurveyError::Serialization(err.to_string())
    }
}

/// API error response body
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl SurveyError {
    /// Convert to API error code. Both not-found shapes share a code and
    /// differ in message only.
    pub fn code(&self) -> &'static str {
        match self {
            SurveyError::SurveyNotFound(_) | SurveyError::VersionNotFound { .. } => "NOT_FOUND",
            SurveyError::SurveyExists(_) => "CONFLICT",
            SurveyError::InvalidInput(_) => "INVALID_INPUT",
            SurveyError::Database(_) => "DATABASE_ERROR",
            SurveyError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            SurveyError::SurveyNotFound(_) | SurveyError::VersionNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            SurveyError::SurveyExists(_) => StatusCode::CONFLICT,
            SurveyError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            SurveyError::Database(_) | SurveyError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for SurveyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ApiError {
            code: self.code().to_string(),
            message: self.to_string(),
        };

        (status, axum::Json(body)).into_response()
    }
}
