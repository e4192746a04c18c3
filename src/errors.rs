//! Domain error taxonomy shared by every layer.
//!
//! Errors are built as typed values at the point of detection and returned
//! immediately. The HTTP boundary matches on the variant to pick a status code
//! and renders a stable JSON envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::error;

/// Field path (e.g. `auth.JWT_SECRET` or `email`) to the messages reported for it.
pub type FieldErrorMap = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authentication,
    Authorization,
    NotFound,
    Conflict,
    Internal,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: String,
        errors: FieldErrorMap,
    },
    #[error("{0}")]
    Authentication(String),
    #[error("{0}")]
    Authorization(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

impl AppError {
    /// Validation error carrying a single field message.
    #[must_use]
    pub fn field(message: &str, field: &str, detail: &str) -> Self {
        let mut errors = FieldErrorMap::new();
        errors.insert(field.to_string(), vec![detail.to_string()]);
        Self::Validation {
            message: message.to_string(),
            errors,
        }
    }

    #[must_use]
    pub fn authentication(message: &str) -> Self {
        Self::Authentication(message.to_string())
    }

    #[must_use]
    pub fn not_found(resource: &str) -> Self {
        Self::NotFound(resource.to_string())
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::Authorization(_) => ErrorKind::Authorization,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::Authorization(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code surfaced to clients.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Authentication(_) => "AUTHENTICATION_REQUIRED",
            Self::Authorization(_) => "PERMISSION_DENIED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "ValidationError",
            Self::Authentication(_) => "AuthenticationError",
            Self::Authorization(_) => "AuthorizationError",
            Self::NotFound(_) => "NotFoundError",
            Self::Conflict(_) => "ConflictError",
            Self::Internal(_) => "AppError",
        }
    }

    /// Field errors, only present on validation failures.
    #[must_use]
    pub const fn field_errors(&self) -> Option<&FieldErrorMap> {
        match self {
            Self::Validation { errors, .. } => Some(errors),
            _ => None,
        }
    }

    /// Message followed by one `path: messages` line per field error.
    #[must_use]
    pub fn detailed(&self) -> String {
        let mut text = self.to_string();
        if let Some(errors) = self.field_errors() {
            for (path, messages) in errors {
                text.push_str(&format!("\n{path}: {}", messages.join(", ")));
            }
        }
        text
    }

    /// JSON envelope returned to clients. Internal messages are replaced with a
    /// generic one.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let message = match self {
            Self::Internal(_) => "An unexpected error occurred".to_string(),
            other => other.to_string(),
        };
        let mut body = json!({
            "name": self.name(),
            "message": message,
            "code": self.code(),
            "statusCode": self.status().as_u16(),
        });
        if let (Some(errors), Some(object)) = (self.field_errors(), body.as_object_mut()) {
            object.insert("errors".to_string(), json!(errors));
        }
        json!({ "error": body })
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            error!("Internal error: {detail}");
        }
        (self.status(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_and_code_follow_kind() {
        let cases = [
            (AppError::field("bad", "email", "nope"), 400, "VALIDATION_ERROR"),
            (
                AppError::authentication("Invalid or expired token"),
                401,
                "AUTHENTICATION_REQUIRED",
            ),
            (
                AppError::Authorization("Permission denied".to_string()),
                403,
                "PERMISSION_DENIED",
            ),
            (AppError::not_found("User"), 404, "NOT_FOUND"),
            (AppError::Conflict("taken".to_string()), 409, "CONFLICT"),
            (AppError::internal("boom"), 500, "INTERNAL_SERVER_ERROR"),
        ];

        for (err, status, code) in cases {
            assert_eq!(err.status().as_u16(), status);
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn not_found_message_names_resource() {
        assert_eq!(AppError::not_found("User").to_string(), "User not found");
    }

    #[test]
    fn validation_json_includes_field_errors() {
        let err = AppError::field("Email already registered", "email", "Email already registered");
        let body = err.to_json();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["statusCode"], 400);
        assert_eq!(body["error"]["errors"]["email"][0], "Email already registered");
    }

    #[test]
    fn internal_json_hides_detail() {
        let err = AppError::internal("connection string leaked");
        let body = err.to_json();
        assert_eq!(body["error"]["message"], "An unexpected error occurred");
        assert!(body["error"].get("errors").is_none());
    }

    #[test]
    fn detailed_lists_paths() {
        let err = AppError::field("Invalid configuration", "auth.JWT_SECRET", "too short");
        assert_eq!(err.detailed(), "Invalid configuration\nauth.JWT_SECRET: too short");
        assert_eq!(AppError::not_found("User").detailed(), "User not found");
    }

    #[test]
    fn anyhow_maps_to_internal() {
        let err: AppError = anyhow::anyhow!("disk on fire").into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
