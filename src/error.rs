//! Structured error types for configuration resolution.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Lookup errors
    NotFound,
    SourcesExhausted,

    // Decoding errors
    ParseFailure,
    UnsupportedFormat,

    // Validation errors
    ValidationFailure,
    InvalidBinding,

    // Lifecycle errors
    ConcurrencyMisuse,

    // Internal errors
    Io,
}

/// Category of a validation failure.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValidationKind {
    MissingField,
    InvalidFormat,
    OutOfRange,
}

/// A configuration failed validation.
///
/// Each variant is a distinct failure; match on the variant rather than the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("config cannot be nil")]
    ConfigNil,

    #[error("project name is required")]
    MissingProjectName,

    #[error("project version is required")]
    MissingProjectVersion,

    #[error("invalid Go version format: {0}")]
    InvalidGoVersion(String),

    #[error("test timeout cannot be negative: {0}")]
    NegativeTestTimeout(i64),

    /// A named field rule rejected its value.
    #[error("validation failed for field '{field}': {message}")]
    FieldRule { field: String, message: String },
}

impl ValidationError {
    pub fn kind(&self) -> ValidationKind {
        match self {
            ValidationError::ConfigNil
            | ValidationError::MissingProjectName
            | ValidationError::MissingProjectVersion => ValidationKind::MissingField,
            ValidationError::InvalidGoVersion(_) | ValidationError::FieldRule { .. } => {
                ValidationKind::InvalidFormat
            }
            ValidationError::NegativeTestTimeout(_) => ValidationKind::OutOfRange,
        }
    }
}

/// One available source that failed to load during a manager lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub source: String,
    pub message: String,
}

impl std::fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.source, self.message)
    }
}

/// Errors produced while locating, decoding, composing or persisting configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to parse {format} configuration {}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("no valid configuration file found in paths: {}", display_paths(.0))]
    NoValidConfigFile(Vec<PathBuf>),

    #[error("no configuration sources available")]
    NoSourcesAvailable,

    #[error("failed to load configuration from any source: {}", display_failures(.0))]
    AllSourcesFailed(Vec<SourceFailure>),

    #[error("configuration validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("already watching for configuration changes")]
    AlreadyWatching,

    #[error("failed to start configuration watcher: {0}")]
    WatchSpawn(#[source] std::io::Error),

    #[error("invalid environment binding: {0}")]
    InvalidBinding(String),

    #[error("failed to serialize {format}: {message}")]
    Serialize {
        format: &'static str,
        message: String,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigError::NotFound(_) => ErrorCode::NotFound,
            ConfigError::Parse { .. } => ErrorCode::ParseFailure,
            ConfigError::UnsupportedFormat(_) => ErrorCode::UnsupportedFormat,
            ConfigError::NoValidConfigFile(_)
            | ConfigError::NoSourcesAvailable
            | ConfigError::AllSourcesFailed(_) => ErrorCode::SourcesExhausted,
            ConfigError::Validation(_) => ErrorCode::ValidationFailure,
            ConfigError::AlreadyWatching => ErrorCode::ConcurrencyMisuse,
            ConfigError::InvalidBinding(_) => ErrorCode::InvalidBinding,
            ConfigError::Serialize { .. } => ErrorCode::ParseFailure,
            ConfigError::WatchSpawn(_) | ConfigError::Io { .. } => ErrorCode::Io,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    let shown: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
    format!("[{}]", shown.join(", "))
}

fn display_failures(failures: &[SourceFailure]) -> String {
    let shown: Vec<String> = failures.iter().map(|f| f.to_string()).collect();
    shown.join("; ")
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
