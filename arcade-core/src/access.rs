use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// A stored per-(user, game) permission flag.
///
/// Records are owned by an external store. A missing record means the game
/// is enabled for that user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct AccessRecord {
    /// The user the flag applies to.
    pub user_id: UserId,
    /// Filename of the game in the catalog.
    pub game_filename: String,
    /// Whether the user may launch the game.
    pub enabled: bool,
}

impl AccessRecord {
    /// Create a record.
    #[must_use]
    pub fn new(user_id: UserId, game_filename: impl Into<String>, enabled: bool) -> Self {
        Self { user_id, game_filename: game_filename.into(), enabled }
    }
}

/// Effective access of one user to one catalog game, as reported to admins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct GameAccess {
    pub filename: String,
    pub enabled: bool,
}

impl GameAccess {
    #[must_use]
    pub fn new(filename: impl Into<String>, enabled: bool) -> Self {
        Self { filename: filename.into(), enabled }
    }
}
