//! Game payload resolution, vetting and supervised execution for the Arcade.
//!
//! A launch flows through [`PathValidator`], [`StaticVetter`] and a
//! [`ProcessLauncher`], coordinated by [`GameLaunchCoordinator`] together
//! with the [`AccessGate`] and a [`ScoreSink`].

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod access;
pub mod backend;
pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod path;
pub mod process;
pub mod scores;
pub mod vetting;

pub use access::{AccessGate, AccessStore, InMemoryAccessStore};
pub use backend::ProcessLauncher;
pub use catalog::GameCatalog;
pub use config::LauncherConfig;
pub use coordinator::GameLaunchCoordinator;
pub use error::{AccessError, ConfigError, LauncherError, PathError, ScanError};
pub use path::{PathValidator, ValidatedScript};
pub use process::{compute_hash, LocalProcessLauncher};
pub use scores::{InMemoryScoreSink, ScoreSink, ScoreSubmission};
pub use vetting::{StaticVetter, VettedScript, DEFAULT_SIGNATURES, SCAN_WINDOW_BYTES};

/// Coordinator wired with the local launcher and in-memory stores.
pub type LocalCoordinator = GameLaunchCoordinator<LocalProcessLauncher, InMemoryAccessStore, InMemoryScoreSink>;

impl LocalCoordinator {
    /// Build a coordinator from configuration alone.
    #[must_use]
    pub fn local(config: LauncherConfig) -> Self {
        let launcher = LocalProcessLauncher::new(&config);
        GameLaunchCoordinator::new(config, launcher, InMemoryAccessStore::new(), InMemoryScoreSink::new())
    }
}
