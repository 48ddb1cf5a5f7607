//! JSON envelope and error-to-response mapping for the todo API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use super::validation::ValidationErrors;
use crate::error::DatabaseError;

/// Outcome marker carried by every envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Uniform response body: `{status, message?, error?, id?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope {
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Id of a freshly created todo, string-encoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Envelope {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: Some(message.into()),
            error: None,
            id: None,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: None,
            error: Some(error.into()),
            id: None,
        }
    }

    /// Builder: attach a created id.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Builder: set the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Everything a todo request can fail with.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request body is empty")]
    EmptyBody,

    #[error("request body is not a valid todo: {0}")]
    InvalidBody(String),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("invalid todo id: {0}")]
    InvalidId(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("todo {0} not found")]
    NotFound(i64),

    #[error("no route for {0}")]
    UnknownRoute(String),

    #[error("method {method} not allowed for {path}")]
    MethodNotAllowed { method: String, path: String },

    #[error("failed to {action}: {source}")]
    Storage {
        action: &'static str,
        #[source]
        source: DatabaseError,
    },
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::EmptyBody
            | ApiError::InvalidBody(_)
            | ApiError::Validation(_)
            | ApiError::InvalidId(_)
            | ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) | ApiError::UnknownRoute(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The client-facing body. Storage detail stays out of it.
    pub fn envelope(&self) -> Envelope {
        match self {
            ApiError::EmptyBody => Envelope::error("No data provided"),
            ApiError::InvalidBody(_) => Envelope::error("Invalid data"),
            ApiError::Validation(errors) => {
                Envelope::error(errors.to_string()).with_message("Validation failed")
            }
            ApiError::InvalidId(_) => Envelope::error("Invalid todo ID format"),
            ApiError::InvalidQuery(_) => Envelope::error("Invalid query parameters"),
            ApiError::NotFound(_) => Envelope::error("Todo not found"),
            ApiError::UnknownRoute(_) => Envelope::error("Route not found"),
            ApiError::MethodNotAllowed { .. } => Envelope::error("Method not allowed"),
            ApiError::Storage { action, .. } => Envelope::error(format!("Failed to {action}")),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Storage { action, source } = &self {
            error!(action, error = %source, "Storage operation failed");
        }
        (self.status_code(), Json(self.envelope())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::to_bytes;
    use serde_json::Value;

    use super::*;
    use crate::todos::model::TodoPayload;
    use crate::todos::validation::validate;

    async fn render(err: ApiError) -> (StatusCode, String, Value) {
        let response = err.into_response();
        let status = response.status();
        let content_type = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn success_envelope_omits_empty_fields() {
        let json = serde_json::to_value(Envelope::success("Todo updated successfully")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "success", "message": "Todo updated successfully"})
        );
    }

    #[test]
    fn created_envelope_carries_string_id() {
        let json = serde_json::to_value(Envelope::success("created").with_id(42)).unwrap();
        assert_eq!(json["id"], "42");
    }

    #[tokio::test]
    async fn decode_errors_are_bad_request() {
        let (status, content_type, body) = render(ApiError::EmptyBody).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(content_type, "application/json");
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "No data provided");

        let (status, _, body) = render(ApiError::InvalidBody("eof".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid data");
    }

    #[tokio::test]
    async fn validation_error_joins_violations() {
        let payload = TodoPayload {
            description: Some("d".into()),
            due_date: Some(chrono::Utc::now()),
            ..Default::default()
        };
        let err = validate(payload).unwrap_err();

        let (status, _, body) = render(ApiError::from(err)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(
            body["error"],
            "field title is required, field status is required"
        );
    }

    #[tokio::test]
    async fn storage_error_hides_detail() {
        let err = ApiError::Storage {
            action: "create todo",
            source: DatabaseError::Query("no such table: todos".into()),
        };
        let (status, _, body) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to create todo");
        assert!(!body.to_string().contains("no such table"));
    }

    #[tokio::test]
    async fn storage_timeout_is_internal_error() {
        let err = ApiError::Storage {
            action: "retrieve todos",
            source: DatabaseError::Timeout {
                operation: "retrieve todos",
                timeout: Duration::from_millis(10),
            },
        };
        let (status, _, body) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to retrieve todos");
    }

    #[tokio::test]
    async fn not_found_and_invalid_id() {
        let (status, _, body) = render(ApiError::NotFound(9)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Todo not found");

        let (status, _, body) = render(ApiError::InvalidId("abc".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid todo ID format");
    }

    #[tokio::test]
    async fn method_not_allowed_is_json_405() {
        let err = ApiError::MethodNotAllowed {
            method: "DELETE".into(),
            path: "/api/todo/1".into(),
        };
        let (status, content_type, body) = render(err).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(content_type, "application/json");
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "Method not allowed");
    }
}
