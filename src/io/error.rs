//! Error types and path context for replication operations

use std::fmt;
use std::path::{Path, PathBuf};

/// Main error type for all replication operations
#[derive(Debug)]
pub enum ReplicationError {
    /// Corpus root is missing or not a directory
    MissingRoot {
        /// Configured root path
        path: PathBuf,
    },

    /// No labels were selected for replication
    EmptySelection,

    /// Selected label does not occur anywhere in the corpus
    UnknownLabel {
        /// The label that was requested
        label: String,
    },

    /// Multiplier is not a positive integer
    InvalidMultiplier {
        /// Label the multiplier was meant for, `None` for the default multiplier
        label: Option<String>,
        /// Provided value that failed validation
        value: String,
    },

    /// Start sequence is neither a positive integer nor the AUTO keyword
    InvalidStartSequence {
        /// Provided value that failed validation
        value: String,
    },

    /// Annotation file could not be read
    AnnotationRead {
        /// Path to the annotation file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Annotation file is not valid JSON
    AnnotationParse {
        /// Path to the annotation file
        path: PathBuf,
        /// Underlying JSON error
        source: serde_json::Error,
    },

    /// Annotation JSON does not have the shape replication relies on
    MalformedAnnotation {
        /// Path to the annotation file
        path: PathBuf,
        /// Description of what's wrong with the document
        reason: String,
    },

    /// No image with a supported extension shares the annotation's base name
    MissingCompanion {
        /// Path to the annotation file
        annotation: PathBuf,
    },

    /// Companion image exists but cannot be decoded
    ImageVerify {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image decoding error
        source: image::ImageError,
    },

    /// Patched annotation could not be serialised
    AnnotationWrite {
        /// Destination of the annotation copy
        path: PathBuf,
        /// Underlying JSON error
        source: serde_json::Error,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Report could not be rendered as JSON
    Report {
        /// Underlying JSON error
        source: serde_json::Error,
    },

    /// Background worker ended without delivering a result
    Worker {
        /// Description of the failure
        reason: String,
    },
}

/// Coarse classification used to decide how a failure is recovered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid configuration, reported before any I/O
    Config,
    /// Annotation unreadable or malformed, file skipped
    Parse,
    /// Companion image not found, file skipped
    MissingCompanion,
    /// I/O failure while replicating one file, file skipped
    Copy,
    /// Failure of the run machinery itself
    Internal,
}

impl ReplicationError {
    /// Classify the error for recovery and reporting
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingRoot { .. }
            | Self::EmptySelection
            | Self::UnknownLabel { .. }
            | Self::InvalidMultiplier { .. }
            | Self::InvalidStartSequence { .. } => ErrorCategory::Config,
            Self::AnnotationRead { .. }
            | Self::AnnotationParse { .. }
            | Self::MalformedAnnotation { .. } => ErrorCategory::Parse,
            Self::MissingCompanion { .. } => ErrorCategory::MissingCompanion,
            Self::ImageVerify { .. } | Self::AnnotationWrite { .. } | Self::FileSystem { .. } => {
                ErrorCategory::Copy
            }
            Self::Report { .. } | Self::Worker { .. } => ErrorCategory::Internal,
        }
    }

    /// Check whether this error aborts a run before it starts
    pub const fn is_config(&self) -> bool {
        matches!(self.category(), ErrorCategory::Config)
    }
}

impl fmt::Display for ReplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRoot { path } => {
                write!(f, "Corpus root '{}' does not exist", path.display())
            }
            Self::EmptySelection => write!(f, "At least one label must be selected"),
            Self::UnknownLabel { label } => {
                write!(f, "Label '{label}' does not occur in the corpus")
            }
            Self::InvalidMultiplier {
                label: Some(label),
                value,
            } => {
                write!(
                    f,
                    "Invalid multiplier '{value}' for label '{label}': must be a positive integer"
                )
            }
            Self::InvalidMultiplier { label: None, value } => {
                write!(
                    f,
                    "Invalid default multiplier '{value}': must be a positive integer"
                )
            }
            Self::InvalidStartSequence { value } => {
                write!(
                    f,
                    "Invalid start sequence '{value}': expected a positive integer or 'auto'"
                )
            }
            Self::AnnotationRead { path, source } => {
                write!(f, "Failed to read annotation '{}': {source}", path.display())
            }
            Self::AnnotationParse { path, source } => {
                write!(f, "Invalid JSON in '{}': {source}", path.display())
            }
            Self::MalformedAnnotation { path, reason } => {
                write!(f, "Malformed annotation '{}': {reason}", path.display())
            }
            Self::MissingCompanion { annotation } => {
                write!(
                    f,
                    "No companion image found for '{}'",
                    annotation.display()
                )
            }
            Self::ImageVerify { path, source } => {
                write!(f, "Failed to decode image '{}': {source}", path.display())
            }
            Self::AnnotationWrite { path, source } => {
                write!(
                    f,
                    "Failed to serialise annotation '{}': {source}",
                    path.display()
                )
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
            Self::Report { source } => write!(f, "Failed to render report: {source}"),
            Self::Worker { reason } => write!(f, "Replication worker failed: {reason}"),
        }
    }
}

impl std::error::Error for ReplicationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::AnnotationRead { source, .. } | Self::FileSystem { source, .. } => Some(source),
            Self::AnnotationParse { source, .. }
            | Self::AnnotationWrite { source, .. }
            | Self::Report { source } => Some(source),
            Self::ImageVerify { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for replication results
pub type Result<T> = std::result::Result<T, ReplicationError>;

/// Attaches the offending path to raw I/O failures
pub trait WithPath<T> {
    /// Convert an I/O error into a file system error naming `path` and `operation`
    ///
    /// # Errors
    ///
    /// Propagates the original error with the path context applied
    fn with_path(self, path: &Path, operation: &'static str) -> Result<T>;
}

impl<T> WithPath<T> for std::result::Result<T, std::io::Error> {
    fn with_path(self, path: &Path, operation: &'static str) -> Result<T> {
        self.map_err(|source| ReplicationError::FileSystem {
            path: path.to_path_buf(),
            operation,
            source,
        })
    }
}

/// Create an invalid multiplier error
pub fn invalid_multiplier(label: Option<&str>, value: &impl ToString) -> ReplicationError {
    ReplicationError::InvalidMultiplier {
        label: label.map(str::to_string),
        value: value.to_string(),
    }
}

/// Create a malformed annotation error
pub fn malformed_annotation(path: &Path, reason: &impl ToString) -> ReplicationError {
    ReplicationError::MalformedAnnotation {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
