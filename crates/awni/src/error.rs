//! Error types for awni.
//!
//! This module defines all error types used throughout the awni crate.
//! Controllers return these as discriminated results across the
//! core/presentation boundary rather than panicking, so callers can render
//! a message for each failure class.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for awni operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Intake Errors ===
    /// Input failed a declared constraint before any external call.
    #[error("validation failed: {message}")]
    Validation {
        /// Description of the constraint that was violated.
        message: String,
    },

    /// The operation collides with existing state (duplicate identity,
    /// stale revision).
    #[error("conflict: {message}")]
    Conflict {
        /// Description of the collision.
        message: String,
    },

    // === Lifecycle Errors ===
    /// The requested transition is not defined from the current status.
    #[error("cannot {action} {entity} while {status}")]
    InvalidState {
        /// Entity kind ("request" or "volunteer").
        entity: &'static str,
        /// The status the entity is currently in.
        status: String,
        /// The action that was attempted.
        action: &'static str,
    },

    /// No entity exists under the given identifier.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind ("request" or "volunteer").
        entity: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    // === External Service Errors ===
    /// The priority classification capability failed.
    ///
    /// Request creation recovers from this locally with a fixed default;
    /// it only surfaces when a classifier is invoked directly.
    #[error("classifier error: {0}")]
    Classifier(String),

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O and Serialization ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for awni operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a new invalid-state error.
    #[must_use]
    pub fn invalid_state(
        entity: &'static str,
        status: impl Into<String>,
        action: &'static str,
    ) -> Self {
        Self::InvalidState {
            entity,
            status: status.into(),
            action,
        }
    }

    /// Create a new not-found error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Create a new classifier error.
    #[must_use]
    pub fn classifier(message: impl Into<String>) -> Self {
        Self::Classifier(message.into())
    }

    /// Check if this error is a validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this error is a conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Check if this error is an invalid state transition.
    #[must_use]
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }

    /// Check if this error is a missing entity.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = Error::validation("requestText must be at least 10 characters");
        assert_eq!(
            err.to_string(),
            "validation failed: requestText must be at least 10 characters"
        );
        assert!(err.is_validation());
    }

    #[test]
    fn test_conflict_error_display() {
        let err = Error::conflict("a volunteer with this email already exists");
        assert!(err.to_string().contains("already exists"));
        assert!(err.is_conflict());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_invalid_state_error_display() {
        let err = Error::invalid_state("request", "cancelled", "resolve");
        assert_eq!(err.to_string(), "cannot resolve request while cancelled");
        assert!(err.is_invalid_state());
    }

    #[test]
    fn test_not_found_error_display() {
        let err = Error::not_found("volunteer", "abc123");
        assert_eq!(err.to_string(), "volunteer not found: abc123");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_classifier_error_display() {
        let err = Error::classifier("upstream timed out");
        assert_eq!(err.to_string(), "classifier error: upstream timed out");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "blank keyword".to_string(),
        };
        assert!(err.to_string().contains("blank keyword"));
    }
}
