//! Error types for the REST API server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::layout::LayoutError;
use crate::record::ParseTagError;
use crate::settings::SettingsError;
use crate::store::StoreError;

/// API error types
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Column not present in the dataset
    FieldNotFound(String),
    /// Invalid parameter in request
    InvalidParameter(String),
    /// Invalid date range
    InvalidDateRange(String),
    /// Comment, section or record not found
    NotFound(String),
    /// Persisted state could not be read or written
    StorageError(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::FieldNotFound(field) => write!(f, "Field not found: {}", field),
            ApiError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            ApiError::InvalidDateRange(msg) => write!(f, "Invalid date range: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::StorageError(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::FieldNotFound(_) | ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidParameter(_) | ApiError::InvalidDateRange(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (error_type, message) = match &self {
            ApiError::FieldNotFound(field) => (
                "FieldNotFound",
                format!("Field '{}' not found in dataset", field),
            ),
            ApiError::InvalidParameter(msg) => ("InvalidParameter", msg.clone()),
            ApiError::InvalidDateRange(msg) => ("InvalidDateRange", msg.clone()),
            ApiError::NotFound(msg) => ("NotFound", msg.clone()),
            ApiError::StorageError(msg) => ("StorageError", msg.clone()),
        };

        if self.status().is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": error_type,
            "message": message,
        }));

        (self.status(), body).into_response()
    }
}

// Conversions from other error types

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::StorageError(err.to_string())
    }
}

impl From<LayoutError> for ApiError {
    fn from(err: LayoutError) -> Self {
        match err {
            LayoutError::IndexOutOfRange { .. } => ApiError::InvalidParameter(err.to_string()),
            LayoutError::SectionNotFound { .. } => ApiError::NotFound(err.to_string()),
            LayoutError::Store(e) => e.into(),
        }
    }
}

impl From<SettingsError> for ApiError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::Store(e) => e.into(),
            _ => ApiError::InvalidParameter(err.to_string()),
        }
    }
}

impl From<ParseTagError> for ApiError {
    fn from(err: ParseTagError) -> Self {
        ApiError::InvalidParameter(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::InvalidParameter(format!("JSON error: {}", err))
    }
}

impl From<chrono::ParseError> for ApiError {
    fn from(err: chrono::ParseError) -> Self {
        ApiError::InvalidDateRange(format!("Date parse error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::View;

    #[test]
    fn status_codes() {
        assert_eq!(
            ApiError::FieldNotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::InvalidDateRange("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::StorageError("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn layout_errors_map_to_client_errors() {
        let missing: ApiError = LayoutError::SectionNotFound {
            view: View::Data,
            id: "x".into(),
        }
        .into();
        assert!(matches!(missing, ApiError::NotFound(_)));

        let storage: ApiError = LayoutError::Store(StoreError::Backend("disk".into())).into();
        assert!(matches!(storage, ApiError::StorageError(_)));
    }

    #[test]
    fn only_storage_failures_are_server_errors() {
        let errors = [
            ApiError::FieldNotFound("x".into()),
            ApiError::InvalidParameter("x".into()),
            ApiError::InvalidDateRange("x".into()),
            ApiError::NotFound("x".into()),
            ApiError::StorageError("x".into()),
        ];
        let server: Vec<&ApiError> = errors
            .iter()
            .filter(|e| e.status().is_server_error())
            .collect();
        assert_eq!(server, vec![&ApiError::StorageError("x".into())]);
    }

    #[test]
    fn into_response_uses_status() {
        let response = ApiError::InvalidParameter("bad".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
