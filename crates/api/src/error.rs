//! API error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use weir_control::ControlError;

/// Errors surfaced by the HTTP handlers, rendered as plain-text bodies
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body could not become a pipeline
    #[error("{0}")]
    BadRequest(String),

    /// No pipeline stored under the requested identifier
    #[error("pipeline not found")]
    NotFound,

    /// The backend failed
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ControlError> for ApiError {
    fn from(e: ControlError) -> Self {
        match e {
            // Creation-time errors are the caller's to fix.
            ControlError::Config(_) | ControlError::Pipeline(_) => Self::BadRequest(e.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::NotFound => String::new(),
            other => other.to_string(),
        };
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_control_error_mapping() {
        let parse_err = weir_config::PipelineConfig::from_slice(b"{bad").unwrap_err();
        let api_err = ApiError::from(ControlError::Config(parse_err));
        assert_eq!(api_err.status_code(), StatusCode::BAD_REQUEST);
    }
}
