//! Structured error types for task operations.

use heck::ToTitleCase;
use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidFieldValue,
    InvalidAction,
    CsrfRejected,

    // Not found errors
    TaskNotFound,

    // Internal errors
    DatabaseError,
    InternalError,
}

/// Structured error for task operations.
///
/// User-facing codes end up as error messages on the rendered page; the rest
/// are logged and replaced by a generic error page.
#[derive(Debug, Clone, Serialize)]
pub struct TaskError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl TaskError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field.to_title_case()),
        )
        .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn invalid_action() -> Self {
        Self::new(ErrorCode::InvalidAction, "Invalid action").with_field("action")
    }

    pub fn csrf_rejected() -> Self {
        Self::new(
            ErrorCode::CsrfRejected,
            "Invalid or expired security token. Please reload the page and try again.",
        )
        .with_field("csrf_token")
    }

    pub fn task_not_found() -> Self {
        Self::new(ErrorCode::TaskNotFound, "Task not found")
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }

    /// Whether the message can be shown to the client as-is.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self.code, ErrorCode::DatabaseError | ErrorCode::InternalError)
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TaskError {}

/// Classify an error that escaped the service layer.
///
/// A wrapped `TaskError` comes back unchanged. Anything else keeps its full
/// context chain as the message, tagged as a database or internal failure.
impl From<anyhow::Error> for TaskError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(task_err) = err.downcast_ref::<TaskError>() {
            return task_err.clone();
        }
        let detail = format!("{:#}", err);
        if err.chain().any(|cause| cause.is::<rusqlite::Error>()) {
            TaskError::database(detail)
        } else {
            TaskError::internal(detail)
        }
    }
}

/// Result type for task operations.
pub type TaskResult<T> = std::result::Result<T, TaskError>;
