//! Resolution of requested game filenames against the base directory.
//!
//! The containment check runs on the lexically normalized path, never on
//! the raw request string, and is repeated on the canonical path once the
//! file is known to exist so a symlink cannot lead out of the directory.

use std::fs::File;
use std::path::{Component, Path, PathBuf};

use crate::config::LauncherConfig;
use crate::error::PathError;

/// A payload path that passed every [`PathValidator`] check.
///
/// Only the validator constructs this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedScript {
    path: PathBuf,
    size: u64,
}

impl ValidatedScript {
    /// Canonical absolute path of the payload.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size in bytes at validation time.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Resolves filenames under a fixed base directory.
#[derive(Debug, Clone)]
pub struct PathValidator {
    base_dir: PathBuf,
    extension: String,
    max_size: u64,
}

impl PathValidator {
    /// Create a validator from the launcher configuration.
    ///
    /// A relative `base_dir` is resolved against the current directory.
    #[must_use]
    pub fn new(config: &LauncherConfig) -> Self {
        Self {
            base_dir: normalize(&absolute(&config.base_dir)),
            extension: config.allowed_extension.clone(),
            max_size: config.max_file_size_bytes,
        }
    }

    /// The normalized base directory.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Validate `raw` and resolve it to a readable payload under the base
    /// directory.
    ///
    /// # Errors
    /// - [`PathError::InvalidFilename`] for an empty name or wrong extension
    /// - [`PathError::Traversal`] if the path leaves the base directory
    /// - [`PathError::NotFound`] if no regular file exists there
    /// - [`PathError::Unreadable`] if the file cannot be opened
    /// - [`PathError::SizeExceeded`] if the file is over the size limit
    pub fn validate(&self, raw: &str) -> Result<ValidatedScript, PathError> {
        if raw.is_empty() {
            return Err(PathError::InvalidFilename {
                filename: String::new(),
                reason: "no file path provided".to_owned(),
            });
        }

        // Backslashes count as separators so Windows-style traversal
        // attempts are caught on every platform.
        let candidate = normalize(&self.base_dir.join(raw.replace('\\', "/")));
        if !candidate.starts_with(&self.base_dir) || candidate == self.base_dir {
            return Err(PathError::Traversal { filename: raw.to_owned() });
        }

        if !raw.ends_with(&self.extension) {
            return Err(PathError::InvalidFilename {
                filename: raw.to_owned(),
                reason: format!("only {} game files are allowed", self.extension),
            });
        }

        let metadata = std::fs::metadata(&candidate)
            .map_err(|_| PathError::NotFound { path: candidate.clone() })?;
        if !metadata.is_file() {
            return Err(PathError::NotFound { path: candidate });
        }

        let canonical = candidate
            .canonicalize()
            .map_err(|_| PathError::NotFound { path: candidate.clone() })?;
        let canonical_base = self
            .base_dir
            .canonicalize()
            .map_err(|_| PathError::NotFound { path: self.base_dir.clone() })?;
        if !canonical.starts_with(&canonical_base) {
            tracing::warn!(
                requested = raw,
                resolved = %canonical.display(),
                "symlink leads outside the game directory"
            );
            return Err(PathError::Traversal { filename: raw.to_owned() });
        }

        File::open(&canonical).map_err(|source| PathError::Unreadable {
            path: canonical.clone(),
            source,
        })?;

        let size = metadata.len();
        if size > self.max_size {
            return Err(PathError::SizeExceeded { path: canonical, size, max: self.max_size });
        }

        Ok(ValidatedScript { path: canonical, size })
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_owned())
}

/// Lexically normalize `path`: drop `.` components and let `..` pop the
/// previous component. `..` at the root stays at the root.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                out.push(component.as_os_str());
            }
        }
    }
    out
}
