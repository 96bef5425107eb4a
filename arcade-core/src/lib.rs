//! Core types for the Arcade game launch pipeline.
//!
//! Defines the domain types shared by the launcher and the gateway: game
//! descriptors, launch requests and results, access records, and the
//! `FINAL_SCORE:` output protocol.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod access;
pub mod error;
pub mod game;
pub mod id;
pub mod launch;
pub mod score;

pub use access::{AccessRecord, GameAccess};
pub use error::CoreError;
pub use game::GameDescriptor;
pub use id::{ContentHash, GameId, LaunchId, UserId};
pub use launch::{LaunchErrorKind, LaunchOutcome, LaunchRequest, LaunchResult};
pub use score::{extract_score, sanitize_score, MAX_SCORE, SCORE_MARKER};
