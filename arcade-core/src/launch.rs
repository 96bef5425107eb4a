use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::GameDescriptor;
use crate::id::{ContentHash, GameId, LaunchId, UserId};

/// Why a launch did not complete.
///
/// Every kind maps to one fixed, user-presentable message. Underlying OS
/// detail never travels inside this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum LaunchErrorKind {
    /// Empty filename or wrong extension.
    InvalidFilename,
    /// The filename resolved outside the base directory.
    Traversal,
    /// Not in the catalog, or no regular file at the resolved path.
    NotFound,
    /// The payload exists but cannot be opened for reading.
    Unreadable,
    /// The payload is larger than the configured maximum.
    SizeExceeded,
    /// Captured output was not valid UTF-8.
    Encoding,
    /// Static vetting matched a banned signature.
    ContentRejected,
    /// The child outlived its deadline and was killed.
    Timeout,
    /// The child could not be spawned or supervised.
    LaunchFailure,
    /// The user is not permitted to launch this game.
    AccessDenied,
}

impl LaunchErrorKind {
    /// Message safe to show to the invoking user.
    #[must_use]
    pub fn user_message(self) -> &'static str {
        match self {
            Self::InvalidFilename => "Invalid game file.",
            Self::Traversal => "Invalid game file path.",
            Self::NotFound => "Game not found.",
            Self::Unreadable => "Game file is not readable.",
            Self::SizeExceeded => "Game file is too large.",
            Self::Encoding => "Game produced unreadable output.",
            Self::ContentRejected => "Game file failed the safety check.",
            Self::Timeout => "Game timed out.",
            Self::LaunchFailure => "Game could not be started.",
            Self::AccessDenied => "Access to this game has been restricted by the administrator.",
        }
    }
}

impl fmt::Display for LaunchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidFilename => "invalid_filename",
            Self::Traversal => "traversal",
            Self::NotFound => "not_found",
            Self::Unreadable => "unreadable",
            Self::SizeExceeded => "size_exceeded",
            Self::Encoding => "encoding",
            Self::ContentRejected => "content_rejected",
            Self::Timeout => "timeout",
            Self::LaunchFailure => "launch_failure",
            Self::AccessDenied => "access_denied",
        };
        f.write_str(name)
    }
}

/// One invocation of a game by a user.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct LaunchRequest {
    /// Correlates all log lines of this invocation.
    pub id: LaunchId,
    pub user_id: UserId,
    pub game: GameDescriptor,
    /// Hard wall-clock limit for the child process.
    pub timeout: Duration,
}

impl LaunchRequest {
    #[must_use]
    pub fn new(user_id: UserId, game: GameDescriptor, timeout: Duration) -> Self {
        Self { id: LaunchId::new(), user_id, game, timeout }
    }
}

/// Structured result of one process execution attempt.
///
/// Fields are read through accessors so the invariant holds for every value:
/// an unsuccessful result has score 0 and an error kind, a successful one
/// has no error kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchResult {
    success: bool,
    stdout: String,
    stderr: String,
    exit_code: Option<i32>,
    score: u64,
    error_kind: Option<LaunchErrorKind>,
    started_at: DateTime<Utc>,
    #[serde(with = "duration_millis")]
    duration: Duration,
    output_hash: Option<ContentHash>,
}

impl LaunchResult {
    /// A child that exited within its deadline with decodable output.
    ///
    /// The score starts at 0; see [`LaunchResult::with_score`].
    #[must_use]
    pub fn completed(
        stdout: String,
        stderr: String,
        exit_code: Option<i32>,
        started_at: DateTime<Utc>,
        duration: Duration,
        output_hash: ContentHash,
    ) -> Self {
        Self {
            success: true,
            stdout,
            stderr,
            exit_code,
            score: 0,
            error_kind: None,
            started_at,
            duration,
            output_hash: Some(output_hash),
        }
    }

    /// A failed attempt. Any captured output is dropped.
    #[must_use]
    pub fn failed(
        kind: LaunchErrorKind,
        exit_code: Option<i32>,
        started_at: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: String::new(),
            exit_code,
            score: 0,
            error_kind: Some(kind),
            started_at,
            duration,
            output_hash: None,
        }
    }

    /// Attach the extracted score. Ignored for failed results.
    #[must_use]
    pub fn with_score(mut self, score: u64) -> Self {
        if self.success {
            self.score = score;
        }
        self
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.success
    }

    #[must_use]
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    #[must_use]
    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// Numeric exit code, when the child exited normally.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    #[must_use]
    pub fn score(&self) -> u64 {
        self.score
    }

    #[must_use]
    pub fn error_kind(&self) -> Option<LaunchErrorKind> {
        self.error_kind
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// SHA-256 of stdout followed by stderr, present on completed results.
    #[must_use]
    pub fn output_hash(&self) -> Option<ContentHash> {
        self.output_hash
    }
}

/// The single structured outcome of a coordinated launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
#[non_exhaustive]
pub enum LaunchOutcome {
    /// The game ran and reported a positive score that was handed to the
    /// score store. `persisted` is the store's answer.
    Completed {
        game_id: GameId,
        score: u64,
        persisted: bool,
        #[serde(skip)]
        result: LaunchResult,
    },
    /// The game ran but no usable score was captured.
    CompletedNoScore {
        game_id: GameId,
        #[serde(skip)]
        result: LaunchResult,
    },
    /// A step of the pipeline refused or failed the launch.
    Failed {
        kind: LaunchErrorKind,
        #[serde(skip)]
        result: Option<LaunchResult>,
    },
}

impl LaunchOutcome {
    /// Score credited to the user; 0 for everything but `Completed`.
    #[must_use]
    pub fn score(&self) -> u64 {
        match self {
            Self::Completed { score, .. } => *score,
            Self::CompletedNoScore { .. } | Self::Failed { .. } => 0,
        }
    }

    /// The failure kind, if the launch failed.
    #[must_use]
    pub fn error_kind(&self) -> Option<LaunchErrorKind> {
        match self {
            Self::Failed { kind, .. } => Some(*kind),
            Self::Completed { .. } | Self::CompletedNoScore { .. } => None,
        }
    }

    /// Process-level result, when a child was actually run.
    #[must_use]
    pub fn result(&self) -> Option<&LaunchResult> {
        match self {
            Self::Completed { result, .. } | Self::CompletedNoScore { result, .. } => Some(result),
            Self::Failed { result, .. } => result.as_ref(),
        }
    }

    /// Message safe to show to the invoking user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Completed { score, persisted: true, .. } => {
                format!("Game completed! Score: {score}")
            }
            Self::Completed { score, persisted: false, .. } => {
                format!("Game completed! Score: {score} (not saved to leaderboard)")
            }
            Self::CompletedNoScore { .. } => {
                "Game completed but no valid score was captured.".to_owned()
            }
            Self::Failed { kind, .. } => kind.user_message().to_owned(),
        }
    }
}

impl From<LaunchErrorKind> for LaunchOutcome {
    fn from(kind: LaunchErrorKind) -> Self {
        Self::Failed { kind, result: None }
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }
}
