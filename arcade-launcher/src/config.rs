//! Launcher configuration.
//!
//! Parsed from TOML (see the gateway config), then overridden by `ARCADE_*`
//! environment variables.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default wall-clock limit for one game run.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300;

/// Default maximum payload size: 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Default cap on each captured output stream: 1 MiB.
pub const DEFAULT_MAX_OUTPUT_BYTES: u64 = 1024 * 1024;

/// Configuration for resolving, vetting and running game payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct LauncherConfig {
    /// Directory holding every game payload, flat.
    pub base_dir: PathBuf,

    /// Extension every payload must carry, including the leading dot.
    pub allowed_extension: String,

    /// Interpreter invoked as `<interpreter> <script>`.
    pub interpreter: PathBuf,

    /// Hard wall-clock limit for one run, in seconds.
    pub timeout_seconds: u64,

    /// Largest payload accepted by path validation.
    pub max_file_size_bytes: u64,

    /// Per-stream cap on captured stdout/stderr. The rest is discarded.
    pub max_output_bytes: u64,

    /// Files in `base_dir` that carry the extension but are not games.
    pub excluded_files: Vec<String>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("games"),
            allowed_extension: ".py".to_owned(),
            interpreter: PathBuf::from("python3"),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            excluded_files: vec![
                "__init__.py".to_owned(),
                "game_base.py".to_owned(),
                "game_launcher.py".to_owned(),
                "routes.py".to_owned(),
            ],
        }
    }
}

impl LauncherConfig {
    /// Create a config for the given game directory with default limits.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into(), ..Self::default() }
    }

    /// Builder-style override of the payload extension.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.allowed_extension = extension.into();
        self
    }

    /// Builder-style override of the interpreter.
    #[must_use]
    pub fn with_interpreter(mut self, interpreter: impl Into<PathBuf>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    /// Builder-style override of the timeout.
    #[must_use]
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// The run deadline as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Apply `ARCADE_*` overrides read through `lookup`. Empty values are ignored.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidEnv`] for non-numeric numeric overrides.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.is_empty());

        if let Some(dir) = get("ARCADE_BASE_DIR") {
            self.base_dir = PathBuf::from(dir);
        }
        if let Some(ext) = get("ARCADE_ALLOWED_EXTENSION") {
            self.allowed_extension = ext;
        }
        if let Some(interpreter) = get("ARCADE_INTERPRETER") {
            self.interpreter = PathBuf::from(interpreter);
        }
        if let Some(value) = get("ARCADE_TIMEOUT_SECONDS") {
            self.timeout_seconds = parse_u64("ARCADE_TIMEOUT_SECONDS", value)?;
        }
        if let Some(value) = get("ARCADE_MAX_FILE_SIZE_BYTES") {
            self.max_file_size_bytes = parse_u64("ARCADE_MAX_FILE_SIZE_BYTES", value)?;
        }
        if let Some(value) = get("ARCADE_MAX_OUTPUT_BYTES") {
            self.max_output_bytes = parse_u64("ARCADE_MAX_OUTPUT_BYTES", value)?;
        }
        Ok(())
    }

    /// Reject values the pipeline cannot operate with.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_dir.as_os_str().is_empty() {
            return Err(invalid("base_dir", "must not be empty"));
        }
        if self.timeout_seconds == 0 {
            return Err(invalid("timeout_seconds", "must be > 0"));
        }
        if self.max_file_size_bytes == 0 {
            return Err(invalid("max_file_size_bytes", "must be > 0"));
        }
        if self.max_output_bytes == 0 {
            return Err(invalid("max_output_bytes", "must be > 0"));
        }
        let ext = &self.allowed_extension;
        if ext.len() < 2 || !ext.starts_with('.') || ext[1..].contains(['.', '/', '\\']) {
            return Err(invalid("allowed_extension", "must look like '.py'"));
        }
        if self.interpreter.as_os_str().is_empty() {
            return Err(invalid("interpreter", "must not be empty"));
        }
        Ok(())
    }
}

fn parse_u64(var: &'static str, value: String) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv { var, value })
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field, reason: reason.to_owned() }
}
