//! Error types for friendbook.
//!
//! This module defines the error type shared by the record store, the location
//! feed and the configuration layer.

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

/// The main error type for friendbook operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Writing the record file failed.
    ///
    /// Under the lenient write policy the in-memory mutation has already been
    /// applied when this is returned.
    #[error("failed to persist records to {path}: {source}")]
    Persist {
        /// Destination file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
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

    /// No record with the given id exists.
    #[error("no record with id {id}")]
    RecordNotFound {
        /// The id that was looked up.
        id: Uuid,
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

    // === Location Errors ===
    /// A coordinate string could not be parsed or is out of range.
    #[error("invalid coordinate '{input}': expected LAT,LNG within [-90,90] and [-180,180]")]
    InvalidCoordinate {
        /// The rejected input.
        input: String,
    },

    /// The location feed was started outside a Tokio runtime.
    #[error("location feed requires a running Tokio runtime")]
    NoRuntime,

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for friendbook operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create an invalid coordinate error.
    #[must_use]
    pub fn invalid_coordinate(input: impl Into<String>) -> Self {
        Self::InvalidCoordinate {
            input: input.into(),
        }
    }

    /// Check if this error is a durability failure.
    #[must_use]
    pub fn is_persist_error(&self) -> bool {
        matches!(self, Self::Persist { .. } | Self::DirectoryCreate { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NoRuntime;
        assert_eq!(err.to_string(), "location feed requires a running Tokio runtime");

        let err = Error::invalid_coordinate("north");
        assert!(err.to_string().contains("'north'"));
    }

    #[test]
    fn test_persist_error_display() {
        let err = Error::Persist {
            path: PathBuf::from("/data/SavedFriends.json"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/data/SavedFriends.json"));
        assert!(msg.contains("disk full"));
        assert!(err.is_persist_error());
    }

    #[test]
    fn test_directory_create_is_persist_error() {
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied"),
        };
        assert!(err.to_string().contains("/root/forbidden"));
        assert!(err.is_persist_error());
        assert!(!Error::NoRuntime.is_persist_error());
    }

    #[test]
    fn test_record_not_found_display() {
        let id = Uuid::nil();
        let err = Error::RecordNotFound { id };
        assert!(err.to_string().contains("00000000-0000-0000-0000-000000000000"));
    }

    #[test]
    fn test_invalid_coordinate_display() {
        let err = Error::invalid_coordinate("north,east");
        assert!(err.to_string().contains("north,east"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "channel_capacity must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("channel_capacity"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
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
}
