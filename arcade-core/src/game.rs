use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::id::GameId;

/// Catalog entry describing one executable payload.
///
/// Descriptors are rebuilt from the base directory on every lookup and
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct GameDescriptor {
    /// Bare filename under the base directory (e.g. `"ramen_shop.py"`).
    pub filename: String,
    /// Human-readable title scraped from the payload source.
    pub display_name: String,
    /// Short description shown in game listings.
    pub description: String,
    /// Absolute path the filename resolved to when the catalog was scanned.
    #[serde(skip_serializing, default)]
    pub resolved_path: PathBuf,
}

impl GameDescriptor {
    /// Create a descriptor.
    #[must_use]
    pub fn new(
        filename: String,
        display_name: String,
        description: String,
        resolved_path: PathBuf,
    ) -> Self {
        Self { filename, display_name, description, resolved_path }
    }

    /// The id under which scores for this game are recorded.
    #[must_use]
    pub fn id(&self) -> GameId {
        GameId::from_filename(self.filename.clone())
    }
}
