//! Storage error handling
//!
//! Provides typed errors for store operations. Uniqueness, not-found and
//! membership conditions are distinct variants so callers can match on
//! them; I/O failures carry the path and are classified by kind.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::models::MediaKind;

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Lookup by id found nothing
    #[error("{record} {id} not found")]
    NotFound { record: &'static str, id: i64 },

    /// A record with this id already exists
    #[error("{record} {id} already exists")]
    DuplicateId { record: &'static str, id: i64 },

    /// The pair is already recorded
    #[error("{kind} {entity_id} is already in list {list_id}")]
    AlreadyMember {
        kind: MediaKind,
        list_id: i64,
        entity_id: i64,
    },

    /// The pair is not recorded
    #[error("{kind} {entity_id} is not in list {list_id}")]
    NotMember {
        kind: MediaKind,
        list_id: i64,
        entity_id: i64,
    },

    /// A persisted record could not be parsed
    #[error("Corrupt record at '{path}' line {line}: {details}")]
    DataCorruption {
        path: PathBuf,
        line: usize,
        details: String,
    },

    /// A field value cannot be stored
    #[error("Invalid {field}: {details}")]
    InvalidField {
        field: &'static str,
        details: String,
    },

    /// Failed to create data directory
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Permission denied accessing path
    #[error("Permission denied: cannot access '{path}'. Check file permissions.")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Disk is full or quota exceeded
    #[error(
        "Disk full or quota exceeded while writing to '{path}'. Free up disk space and try again."
    )]
    DiskFull {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to read file
    #[error("Failed to read '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to write file
    #[error("Failed to write '{path}': {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Atomic replace failed during rename
    #[error("Atomic write failed: could not rename '{from}' to '{to}': {source}")]
    AtomicWriteFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// SQLite database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Connection pool error
    #[error("Connection pool error: {0}")]
    Pool(String),
}

/// Which side of a file operation failed, for error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    Read,
    Write,
}

impl StoreError {
    /// Create an error from an I/O error with path context
    ///
    /// Classifies the error based on its kind (permission, disk full, etc.)
    pub fn from_io(error: io::Error, path: PathBuf, op: IoOp) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StoreError::PermissionDenied {
                path,
                source: error,
            },
            _ if is_disk_full_error(&error) => StoreError::DiskFull {
                path,
                source: error,
            },
            _ => match op {
                IoOp::Read => StoreError::ReadError {
                    path,
                    source: error,
                },
                IoOp::Write => StoreError::WriteError {
                    path,
                    source: error,
                },
            },
        }
    }

    /// Whether this is a lookup miss
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Check if this error is recoverable
    ///
    /// Uniqueness, not-found and membership conditions describe the data,
    /// not the storage, and the caller can act on them. I/O failures and
    /// corruption cannot be fixed by retrying the same call.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound { .. }
                | StoreError::DuplicateId { .. }
                | StoreError::AlreadyMember { .. }
                | StoreError::NotMember { .. }
                | StoreError::InvalidField { .. }
        )
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StoreError::DiskFull { .. } => Some("Free up disk space and try again."),
            StoreError::PermissionDenied { .. } => {
                Some("Check file and directory permissions. You may need to run with different permissions or change ownership.")
            }
            StoreError::CreateDirectory { .. } => {
                Some("Check that the parent directory exists and you have write permissions.")
            }
            StoreError::DataCorruption { .. } => {
                Some("Fix or remove the offending line in the data file, then retry.")
            }
            StoreError::DuplicateId { .. } => Some("Choose a different id."),
            _ => None,
        }
    }
}

/// Check if an I/O error indicates disk full condition
fn is_disk_full_error(error: &io::Error) -> bool {
    let msg = error.to_string().to_lowercase();
    msg.contains("no space left")
        || msg.contains("disk full")
        || msg.contains("quota exceeded")
        || msg.contains("not enough space")
}

impl From<r2d2::Error> for StoreError {
    fn from(err: r2d2::Error) -> Self {
        StoreError::Pool(err.to_string())
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
