//! Local process launcher: runs `<interpreter> <script>` as a child process.
//!
//! The child is supervised on a detached task. Awaiting the result is
//! optional; the deadline, kill and reap happen whether or not anyone
//! is still listening.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use arcade_core::{ContentHash, LaunchErrorKind, LaunchResult};
use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};

use crate::backend::ProcessLauncher;
use crate::config::LauncherConfig;
use crate::vetting::VettedScript;

/// Launches payloads with a local interpreter.
#[derive(Debug, Clone)]
pub struct LocalProcessLauncher {
    interpreter: PathBuf,
    max_output_bytes: u64,
}

impl LocalProcessLauncher {
    #[must_use]
    pub fn new(config: &LauncherConfig) -> Self {
        Self {
            interpreter: config.interpreter.clone(),
            max_output_bytes: config.max_output_bytes,
        }
    }
}

/// What the supervision task observed.
enum Supervised {
    Exited { status: ExitStatus, stdout: Captured, stderr: Captured },
    TimedOut,
    Failed(std::io::Error),
}

struct Captured {
    bytes: Vec<u8>,
    truncated: bool,
}

#[async_trait]
impl ProcessLauncher for LocalProcessLauncher {
    async fn launch(&self, script: &VettedScript, timeout: Duration) -> LaunchResult {
        let started_at = Utc::now();
        let wall_start = Instant::now();
        let path = script.path();

        let mut command = Command::new(&self.interpreter);
        command
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = path.parent() {
            command.current_dir(dir);
        }

        let child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(
                    interpreter = %self.interpreter.display(),
                    script = %path.display(),
                    error = %e,
                    "failed to spawn game process"
                );
                return LaunchResult::failed(
                    LaunchErrorKind::LaunchFailure,
                    None,
                    started_at,
                    wall_start.elapsed(),
                );
            }
        };
        let pid = child.id();
        tracing::info!(script = %path.display(), ?pid, timeout_s = timeout.as_secs(), "game process started");

        // Detached: dropping this future leaves the supervisor running.
        let supervisor = tokio::spawn(supervise(child, timeout, self.max_output_bytes));
        let supervised = match supervisor.await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(?pid, error = %e, "supervision task failed");
                return LaunchResult::failed(
                    LaunchErrorKind::LaunchFailure,
                    None,
                    started_at,
                    wall_start.elapsed(),
                );
            }
        };
        let duration = wall_start.elapsed();

        match supervised {
            Supervised::Exited { status, stdout, stderr } => {
                let exit_code = status.code();
                let output_hash = compute_hash(&stdout.bytes, &stderr.bytes);
                let (Some(out), Some(err)) = (decode(stdout), decode(stderr)) else {
                    tracing::warn!(?pid, ?exit_code, "game output is not valid UTF-8");
                    return LaunchResult::failed(LaunchErrorKind::Encoding, exit_code, started_at, duration);
                };
                tracing::info!(
                    ?pid,
                    ?exit_code,
                    %output_hash,
                    elapsed_ms = duration.as_millis(),
                    "game process finished"
                );
                LaunchResult::completed(out, err, exit_code, started_at, duration, output_hash)
            }
            Supervised::TimedOut => {
                tracing::warn!(?pid, timeout_s = timeout.as_secs(), "game process killed at deadline");
                LaunchResult::failed(LaunchErrorKind::Timeout, None, started_at, duration)
            }
            Supervised::Failed(e) => {
                tracing::error!(?pid, error = %e, "lost track of game process");
                LaunchResult::failed(LaunchErrorKind::LaunchFailure, None, started_at, duration)
            }
        }
    }
}

/// Wait for exit and both streams within `timeout`; kill on expiry.
async fn supervise(mut child: Child, timeout: Duration, limit: u64) -> Supervised {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let run = async {
        let (status, stdout, stderr) =
            tokio::join!(child.wait(), read_capped(stdout, limit), read_capped(stderr, limit));
        Ok::<_, std::io::Error>((status?, stdout?, stderr?))
    };

    match tokio::time::timeout(timeout, run).await {
        Ok(Ok((status, stdout, stderr))) => Supervised::Exited { status, stdout, stderr },
        Ok(Err(e)) => {
            kill(&mut child).await;
            Supervised::Failed(e)
        }
        Err(_) => {
            kill(&mut child).await;
            Supervised::TimedOut
        }
    }
}

/// SIGKILL the child and reap it.
async fn kill(child: &mut Child) {
    if let Err(e) = child.kill().await {
        tracing::warn!(pid = ?child.id(), error = %e, "failed to kill game process");
    }
}

/// Keep the first `limit` bytes of a stream and discard the rest.
async fn read_capped<R>(reader: Option<R>, limit: u64) -> std::io::Result<Captured>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Ok(Captured { bytes: Vec::new(), truncated: false });
    };
    let mut bytes = Vec::new();
    (&mut reader).take(limit).read_to_end(&mut bytes).await?;
    let discarded = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;
    if discarded > 0 {
        tracing::debug!(kept = bytes.len(), discarded, "game output truncated");
    }
    Ok(Captured { bytes, truncated: discarded > 0 })
}

/// Strict UTF-8, except that a code point cut by truncation is dropped.
fn decode(captured: Captured) -> Option<String> {
    match String::from_utf8(captured.bytes) {
        Ok(text) => Some(text),
        Err(e) if captured.truncated && e.utf8_error().error_len().is_none() => {
            let valid = e.utf8_error().valid_up_to();
            let mut bytes = e.into_bytes();
            bytes.truncate(valid);
            String::from_utf8(bytes).ok()
        }
        Err(_) => None,
    }
}

/// Compute SHA-256 hash of stdout + stderr concatenated.
///
/// `H(output) = SHA-256(stdout || stderr)`
#[must_use]
pub fn compute_hash(stdout: &[u8], stderr: &[u8]) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(stdout);
    hasher.update(stderr);
    ContentHash::new(hasher.finalize().into())
}
