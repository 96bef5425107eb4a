use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Longest user id the permission table accepts.
pub const MAX_USER_ID_LEN: usize = 50;

/// Identifies a player of the arcade.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[non_exhaustive]
pub struct UserId(pub String);

impl UserId {
    /// Creates a `UserId` from any string-like value without validation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parses an externally supplied user id.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidUserId`] if the id is empty, longer than
    /// [`MAX_USER_ID_LEN`] bytes, or contains control characters.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        if raw.is_empty() {
            return Err(CoreError::InvalidUserId { reason: "empty".to_owned() });
        }
        if raw.len() > MAX_USER_ID_LEN {
            return Err(CoreError::InvalidUserId {
                reason: format!("longer than {MAX_USER_ID_LEN} bytes"),
            });
        }
        if raw.chars().any(char::is_control) {
            return Err(CoreError::InvalidUserId {
                reason: "contains control characters".to_owned(),
            });
        }
        Ok(Self(raw.to_owned()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifies a game in the catalog. Derived from the payload filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[non_exhaustive]
pub struct GameId(pub String);

impl GameId {
    /// Returns the id of the game stored under `filename`.
    pub fn from_filename(filename: impl Into<String>) -> Self {
        Self(filename.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a single launch attempt, used to correlate logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub struct LaunchId(pub Uuid);

impl LaunchId {
    /// Creates a new random `LaunchId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LaunchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LaunchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for LaunchId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A SHA-256 digest of captured process output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Creates a `ContentHash` from a raw 32-byte array.
    #[must_use]
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}
