// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Structured error body returned on every failure path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    InvalidRequest(String),
    ValidationError { field: String, message: String },
    ServiceUnavailable(String),
    InternalError(String),
}

impl ApiError {
    pub fn to_response(&self) -> ErrorResponse {
        let (error_type, message, details) = match self {
            ApiError::InvalidRequest(msg) => ("invalid_request", msg.clone(), None),
            ApiError::ValidationError { field, message } => {
                let mut details = HashMap::new();
                details.insert(
                    "field".to_string(),
                    serde_json::Value::String(field.clone()),
                );
                ("validation_error", message.clone(), Some(details))
            }
            ApiError::ServiceUnavailable(msg) => ("service_unavailable", msg.clone(), None),
            ApiError::InternalError(msg) => ("internal_error", msg.clone(), None),
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            message,
            details,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) | ApiError::ValidationError { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::ValidationError { field, message } => {
                write!(f, "Validation error for {}: {}", field, message)
            }
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// Response wrapper turning an [`ApiError`] into a status + JSON body.
pub struct ApiErrorResponse(pub ApiError);

impl From<ApiError> for ApiErrorResponse {
    fn from(error: ApiError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let body = self.0.to_response();
        (status, axum::response::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::InvalidRequest("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::ValidationError {
                field: "image".into(),
                message: "required".into(),
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::ServiceUnavailable("loading".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::InternalError("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_error_carries_field_detail() {
        let response = ApiError::ValidationError {
            field: "points".into(),
            message: "points must not be empty".into(),
        }
        .to_response();
        assert_eq!(response.error_type, "validation_error");
        let details = response.details.unwrap();
        assert_eq!(details["field"], serde_json::json!("points"));
    }

    #[test]
    fn test_internal_error_preserves_message() {
        let response = ApiError::InternalError("inference failed: OOM".into()).to_response();
        assert_eq!(response.error_type, "internal_error");
        assert!(response.message.contains("OOM"));
    }
}
