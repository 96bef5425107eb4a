//! Error types for the launcher crate.

use std::path::PathBuf;

use arcade_core::LaunchErrorKind;

/// Reasons a requested filename fails path validation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PathError {
    /// Empty filename or disallowed extension.
    #[error("invalid game filename '{filename}': {reason}")]
    InvalidFilename { filename: String, reason: String },

    /// The normalized path escapes the base directory.
    #[error("'{filename}' resolves outside the game directory")]
    Traversal { filename: String },

    /// No regular file at the resolved path.
    #[error("game file not found: {path}")]
    NotFound { path: PathBuf },

    /// The file exists but cannot be opened.
    #[error("game file {path} is not readable: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is larger than the configured limit.
    #[error("game file {path} is {size} bytes (max: {max})")]
    SizeExceeded { path: PathBuf, size: u64, max: u64 },
}

impl PathError {
    /// The outcome category reported to the user.
    #[must_use]
    pub fn kind(&self) -> LaunchErrorKind {
        match self {
            Self::InvalidFilename { .. } => LaunchErrorKind::InvalidFilename,
            Self::Traversal { .. } => LaunchErrorKind::Traversal,
            Self::NotFound { .. } => LaunchErrorKind::NotFound,
            Self::Unreadable { .. } => LaunchErrorKind::Unreadable,
            Self::SizeExceeded { .. } => LaunchErrorKind::SizeExceeded,
        }
    }
}

/// Reasons static vetting refuses a payload.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ScanError {
    /// A banned call signature appears in the file head.
    #[error("potentially dangerous code detected in {path}: {signature}")]
    ContentRejected { path: PathBuf, signature: String },

    /// The file head is not UTF-8 text.
    #[error("game file {path} is not UTF-8 text")]
    NotText { path: PathBuf },

    /// The file head could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// The outcome category reported to the user. Any vetting failure
    /// counts as a rejection.
    #[must_use]
    pub fn kind(&self) -> LaunchErrorKind {
        match self {
            Self::ContentRejected { .. } | Self::NotText { .. } | Self::Io { .. } => {
                LaunchErrorKind::ContentRejected
            }
        }
    }
}

/// Errors reported by an [`AccessStore`](crate::access::AccessStore).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AccessError {
    /// The backing store could not be reached or refused the operation.
    #[error("access store unavailable: {0}")]
    Unavailable(String),
}

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// An environment override could not be parsed.
    #[error("invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },

    /// A field holds a value the launcher cannot work with.
    #[error("invalid config field '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors surfaced by the coordinator's administrative operations and by
/// catalog scanning.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LauncherError {
    /// Access store failure.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// The game directory could not be listed.
    #[error("failed to scan game directory {path}: {source}")]
    Catalog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A blocking filesystem task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}
