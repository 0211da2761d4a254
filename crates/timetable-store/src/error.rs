//! Error types for backend calls and store operations.

use thiserror::Error;
use timetable_engine::TimetableError;

use crate::backend::Table;

/// A failure reported by the backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct BackendError {
    /// Backend-specific error code, when one was returned.
    pub code: Option<String>,
    pub message: String,
}

impl BackendError {
    /// Code the backend uses for a unique-constraint violation.
    pub const UNIQUE_VIOLATION: &'static str = "23505";

    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        self.code.as_deref() == Some(Self::UNIQUE_VIOLATION)
    }
}

/// Errors returned by [`crate::Timetable`] operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("A teacher with the email {0} already exists")]
    DuplicateTeacherEmail(String),

    #[error("No {table} row with id {id}")]
    NotFound { table: Table, id: String },

    #[error("Row mapping error: {0}")]
    Mapping(String),

    #[error(transparent)]
    Validation(#[from] TimetableError),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Mapping(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
