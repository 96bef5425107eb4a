//! Process launcher abstraction trait.
//!
//! Allows swapping the local interpreter launcher for a sandboxed one
//! without changing the coordination logic.

use std::time::Duration;

use arcade_core::LaunchResult;
use async_trait::async_trait;

use crate::vetting::VettedScript;

/// Runs a vetted payload to completion or deadline.
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Cancel Safety
/// Dropping the returned future must not leave a child running past
/// `timeout`: the deadline is enforced independently of the caller.
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Run `script` with a hard wall-clock limit of `timeout`.
    ///
    /// Never fails at the type level. Every failure is reported as a
    /// [`LaunchResult`] with `success == false` and an error kind.
    async fn launch(&self, script: &VettedScript, timeout: Duration) -> LaunchResult;
}
