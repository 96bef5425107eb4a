//! Game launch coordinator: the single entry point for launching a game.
//!
//! Runs access check, catalog lookup, path validation, static vetting,
//! execution, score extraction and persistence in that order. The first
//! failing step decides the outcome and no later step runs.

use std::sync::Arc;

use arcade_core::{
    extract_score, sanitize_score, GameAccess, GameDescriptor, LaunchErrorKind, LaunchOutcome,
    LaunchRequest, UserId,
};

use crate::access::{AccessGate, AccessStore};
use crate::backend::ProcessLauncher;
use crate::catalog::GameCatalog;
use crate::config::LauncherConfig;
use crate::error::LauncherError;
use crate::path::PathValidator;
use crate::scores::ScoreSink;
use crate::vetting::{StaticVetter, VettedScript};

/// Filesystem-side checks, shared with blocking tasks.
#[derive(Debug)]
struct Resolver {
    config: LauncherConfig,
    validator: PathValidator,
    vetter: StaticVetter,
}

impl Resolver {
    fn catalog(&self) -> Result<GameCatalog, LauncherError> {
        GameCatalog::scan(&self.config)
    }

    /// Catalog lookup, validation and vetting of one requested filename.
    fn resolve(&self, filename: &str) -> Result<(GameDescriptor, VettedScript), LaunchErrorKind> {
        let catalog = self.catalog().map_err(|e| {
            tracing::error!(error = %e, "game catalog unavailable");
            LaunchErrorKind::NotFound
        })?;
        let game = catalog.get(filename).cloned().ok_or(LaunchErrorKind::NotFound)?;

        let validated = self.validator.validate(filename).map_err(|e| {
            tracing::warn!(filename, error = %e, "path validation failed");
            e.kind()
        })?;
        let vetted = self.vetter.scan(validated).map_err(|e| {
            tracing::warn!(filename, error = %e, "static vetting failed");
            e.kind()
        })?;
        Ok((game, vetted))
    }
}

/// Orchestrates one launch per call.
///
/// Generic over the process launcher, access store and score sink so each
/// can be replaced independently.
pub struct GameLaunchCoordinator<L, A, S>
where
    L: ProcessLauncher,
    A: AccessStore,
    S: ScoreSink,
{
    resolver: Arc<Resolver>,
    launcher: L,
    access: AccessGate<A>,
    scores: S,
}

impl<L, A, S> GameLaunchCoordinator<L, A, S>
where
    L: ProcessLauncher,
    A: AccessStore,
    S: ScoreSink,
{
    #[must_use]
    pub fn new(config: LauncherConfig, launcher: L, access: A, scores: S) -> Self {
        let resolver = Resolver {
            validator: PathValidator::new(&config),
            vetter: StaticVetter::default(),
            config,
        };
        Self {
            resolver: Arc::new(resolver),
            launcher,
            access: AccessGate::new(access),
            scores,
        }
    }

    /// Replace the default dangerous-call signatures.
    #[must_use]
    pub fn with_vetter(mut self, vetter: StaticVetter) -> Self {
        let resolver = Resolver {
            config: self.resolver.config.clone(),
            validator: self.resolver.validator.clone(),
            vetter,
        };
        self.resolver = Arc::new(resolver);
        self
    }

    #[must_use]
    pub fn config(&self) -> &LauncherConfig {
        &self.resolver.config
    }

    #[must_use]
    pub fn scores(&self) -> &S {
        &self.scores
    }

    /// Launch `filename` on behalf of `user` and wait for the outcome.
    ///
    /// Never fails at the type level: every refusal and failure is a
    /// [`LaunchOutcome::Failed`] carrying its kind.
    pub async fn launch(&self, user: &UserId, filename: &str) -> LaunchOutcome {
        if !self.access.is_allowed(user, filename).await {
            tracing::info!(user = %user, filename, "launch denied by access policy");
            return LaunchErrorKind::AccessDenied.into();
        }

        let resolver = Arc::clone(&self.resolver);
        let requested = filename.to_owned();
        let resolved = tokio::task::spawn_blocking(move || resolver.resolve(&requested)).await;
        let (game, script) = match resolved {
            Ok(Ok(found)) => found,
            Ok(Err(kind)) => {
                tracing::info!(user = %user, filename, %kind, "launch refused");
                return kind.into();
            }
            Err(e) => {
                tracing::error!(filename, error = %e, "resolve task failed");
                return LaunchErrorKind::LaunchFailure.into();
            }
        };

        let request = LaunchRequest::new(user.clone(), game, self.resolver.config.timeout());
        let game_id = request.game.id();
        tracing::info!(
            launch_id = %request.id,
            user = %request.user_id,
            game = %game_id,
            "launching game"
        );

        let result = self.launcher.launch(&script, request.timeout).await;
        if let Some(kind) = result.error_kind() {
            tracing::warn!(launch_id = %request.id, game = %game_id, %kind, "game run failed");
            return LaunchOutcome::Failed { kind, result: Some(result) };
        }

        let raw = extract_score(result.stdout());
        let score = sanitize_score(raw);
        if score != raw {
            tracing::warn!(launch_id = %request.id, raw, "score out of range, discarded");
        }
        let result = result.with_score(score);

        if score == 0 {
            tracing::info!(launch_id = %request.id, game = %game_id, "game completed without a score");
            return LaunchOutcome::CompletedNoScore { game_id, result };
        }

        let persisted = self.scores.submit_score(user, &game_id, score).await;
        if !persisted {
            tracing::warn!(launch_id = %request.id, game = %game_id, score, "score store refused submission");
        }
        tracing::info!(launch_id = %request.id, game = %game_id, score, persisted, "game completed");
        LaunchOutcome::Completed { game_id, score, persisted, result }
    }

    /// Current catalog, in filename order.
    ///
    /// # Errors
    /// Returns [`LauncherError::Catalog`] if the game directory cannot be listed.
    pub async fn games(&self) -> Result<Vec<GameDescriptor>, LauncherError> {
        let catalog = self.catalog().await?;
        Ok(catalog.games().cloned().collect())
    }

    /// Effective access of `user` to every catalog game.
    ///
    /// # Errors
    /// Returns [`LauncherError`] if the catalog or the access store fails.
    pub async fn get_access(&self, user: &UserId) -> Result<Vec<GameAccess>, LauncherError> {
        let filenames = self.catalog_filenames().await?;
        Ok(self.access.get_access(user, &filenames).await?)
    }

    /// Replace `user`'s permission set with exactly `enabled`.
    ///
    /// # Errors
    /// Returns [`LauncherError`] if the catalog or the access store fails.
    pub async fn set_access(&self, user: &UserId, enabled: &[String]) -> Result<Vec<GameAccess>, LauncherError> {
        let filenames = self.catalog_filenames().await?;
        Ok(self.access.set_access(user, enabled, &filenames).await?)
    }

    async fn catalog(&self) -> Result<GameCatalog, LauncherError> {
        let resolver = Arc::clone(&self.resolver);
        tokio::task::spawn_blocking(move || resolver.catalog())
            .await
            .map_err(|e| LauncherError::Task(e.to_string()))?
    }

    async fn catalog_filenames(&self) -> Result<Vec<String>, LauncherError> {
        let catalog = self.catalog().await?;
        Ok(catalog.filenames().map(str::to_owned).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use arcade_core::{GameId, LaunchResult};
    use async_trait::async_trait;
    use chrono::Utc;
    use tempfile::TempDir;

    use super::*;
    use crate::access::InMemoryAccessStore;
    use crate::process::compute_hash;
    use crate::scores::InMemoryScoreSink;

    /// Launcher that returns a canned result and counts invocations.
    struct ScriptedLauncher {
        stdout: String,
        failure: Option<LaunchErrorKind>,
        calls: AtomicUsize,
    }

    impl ScriptedLauncher {
        fn printing(stdout: &str) -> Self {
            Self { stdout: stdout.to_owned(), failure: None, calls: AtomicUsize::new(0) }
        }

        fn failing(kind: LaunchErrorKind) -> Self {
            Self { stdout: String::new(), failure: Some(kind), calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl ProcessLauncher for ScriptedLauncher {
        async fn launch(&self, _script: &VettedScript, _timeout: Duration) -> LaunchResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.failure {
                Some(kind) => LaunchResult::failed(kind, None, Utc::now(), Duration::ZERO),
                None => LaunchResult::completed(
                    self.stdout.clone(),
                    String::new(),
                    Some(0),
                    Utc::now(),
                    Duration::from_millis(5),
                    compute_hash(self.stdout.as_bytes(), b""),
                ),
            }
        }
    }

    /// Score sink that refuses every submission.
    #[derive(Default)]
    struct RefusingSink {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ScoreSink for RefusingSink {
        async fn submit_score(&self, _user: &UserId, _game: &GameId, _score: u64) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            false
        }
    }

    fn game_dir() -> TempDir {
        let dir = match TempDir::new() {
            Ok(d) => d,
            Err(e) => panic!("failed to create temp dir: {e}"),
        };
        for (name, body) in [
            ("game_a.py", "print('FINAL_SCORE:150')\n"),
            ("game_b.py", "import os\nos.system('whoami')\n"),
            ("game_c.py", "print('bye')\n"),
        ] {
            if let Err(e) = fs::write(dir.path().join(name), body) {
                panic!("write {name} failed: {e}");
            }
        }
        dir
    }

    fn coordinator(
        dir: &TempDir,
        launcher: ScriptedLauncher,
    ) -> GameLaunchCoordinator<ScriptedLauncher, InMemoryAccessStore, InMemoryScoreSink> {
        GameLaunchCoordinator::new(
            LauncherConfig::new(dir.path()),
            launcher,
            InMemoryAccessStore::new(),
            InMemoryScoreSink::new(),
        )
    }

    fn user() -> UserId {
        UserId::new("player-1")
    }

    #[tokio::test]
    async fn completed_launch_submits_score_once() {
        let dir = game_dir();
        let coord = coordinator(&dir, ScriptedLauncher::printing("FINAL_SCORE:150\n"));
        let outcome = coord.launch(&user(), "game_a.py").await;

        match &outcome {
            LaunchOutcome::Completed { game_id, score, persisted, result } => {
                assert_eq!(game_id, &GameId::from_filename("game_a.py"));
                assert_eq!(*score, 150);
                assert!(*persisted);
                assert_eq!(result.score(), 150);
            }
            other => panic!("expected Completed, got {other:?}"),
        }
        let submissions = coord.scores().submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].score, 150);
        assert_eq!(submissions[0].user_id, user());
        assert_eq!(outcome.user_message(), "Game completed! Score: 150");
    }

    #[tokio::test]
    async fn denied_user_never_reaches_launcher() {
        let dir = game_dir();
        let coord = coordinator(&dir, ScriptedLauncher::printing("FINAL_SCORE:1"));
        if let Err(e) = coord.set_access(&user(), &["game_c.py".to_owned()]).await {
            panic!("set_access failed: {e}");
        }
        let outcome = coord.launch(&user(), "game_a.py").await;
        assert_eq!(outcome.error_kind(), Some(LaunchErrorKind::AccessDenied));
        assert_eq!(coord.launcher.calls.load(Ordering::SeqCst), 0);
        assert!(coord.scores().submissions().is_empty());
    }

    #[tokio::test]
    async fn rejected_content_never_reaches_launcher() {
        let dir = game_dir();
        let coord = coordinator(&dir, ScriptedLauncher::printing("FINAL_SCORE:1"));
        let outcome = coord.launch(&user(), "game_b.py").await;
        assert_eq!(outcome.error_kind(), Some(LaunchErrorKind::ContentRejected));
        assert_eq!(coord.launcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn oversized_game_reports_size_exceeded() {
        let dir = game_dir();
        let config = LauncherConfig { max_file_size_bytes: 16, ..LauncherConfig::new(dir.path()) };
        let coord = GameLaunchCoordinator::new(
            config,
            ScriptedLauncher::printing("FINAL_SCORE:1"),
            InMemoryAccessStore::new(),
            InMemoryScoreSink::new(),
        );
        let outcome = coord.launch(&user(), "game_a.py").await;
        assert_eq!(outcome.error_kind(), Some(LaunchErrorKind::SizeExceeded));
        assert_eq!(coord.launcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn non_utf8_game_is_rejected() {
        let dir = game_dir();
        if let Err(e) = fs::write(dir.path().join("latin1.py"), b"print('caf\xe9')\n") {
            panic!("write failed: {e}");
        }
        let coord = coordinator(&dir, ScriptedLauncher::printing("FINAL_SCORE:1"));
        let outcome = coord.launch(&user(), "latin1.py").await;
        assert_eq!(outcome.error_kind(), Some(LaunchErrorKind::ContentRejected));
        assert_eq!(coord.launcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn custom_vetter_replaces_default_signatures() {
        let dir = game_dir();
        let vetter = match StaticVetter::with_signatures(&[("print(", r"\bprint\s*\(")]) {
            Ok(v) => v,
            Err(e) => panic!("signature must compile: {e}"),
        };
        let coord = coordinator(&dir, ScriptedLauncher::printing("FINAL_SCORE:1")).with_vetter(vetter);
        let outcome = coord.launch(&user(), "game_c.py").await;
        assert_eq!(outcome.error_kind(), Some(LaunchErrorKind::ContentRejected));

        let outcome = coord.launch(&user(), "game_b.py").await;
        assert!(outcome.error_kind().is_none(), "os.system is not in the custom set: {outcome:?}");
        assert_eq!(coord.launcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_and_traversing_names_are_not_found() {
        let dir = game_dir();
        let coord = coordinator(&dir, ScriptedLauncher::printing("FINAL_SCORE:1"));
        for name in ["ghost.py", "../game_a.py", "..\\..\\secrets", "", "__init__.py"] {
            let outcome = coord.launch(&user(), name).await;
            assert_eq!(outcome.error_kind(), Some(LaunchErrorKind::NotFound), "{name:?}");
        }
        assert_eq!(coord.launcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn timeout_is_reported_without_submission() {
        let dir = game_dir();
        let coord = coordinator(&dir, ScriptedLauncher::failing(LaunchErrorKind::Timeout));
        let outcome = coord.launch(&user(), "game_a.py").await;
        assert_eq!(outcome.error_kind(), Some(LaunchErrorKind::Timeout));
        assert_eq!(outcome.score(), 0);
        assert!(outcome.result().is_some(), "process result is kept for diagnostics");
        assert!(coord.scores().submissions().is_empty());
    }

    #[tokio::test]
    async fn zero_score_completes_without_persistence() {
        let dir = game_dir();
        let coord = coordinator(&dir, ScriptedLauncher::printing("bye\n"));
        let outcome = coord.launch(&user(), "game_c.py").await;
        assert!(matches!(outcome, LaunchOutcome::CompletedNoScore { .. }), "got {outcome:?}");
        assert!(coord.scores().submissions().is_empty());
    }

    #[tokio::test]
    async fn out_of_range_score_is_discarded() {
        let dir = game_dir();
        let coord = coordinator(&dir, ScriptedLauncher::printing("FINAL_SCORE:1000000\n"));
        let outcome = coord.launch(&user(), "game_a.py").await;
        assert!(matches!(outcome, LaunchOutcome::CompletedNoScore { .. }), "got {outcome:?}");
        assert!(coord.scores().submissions().is_empty());
    }

    #[tokio::test]
    async fn refused_submission_is_reported_not_persisted() {
        let dir = game_dir();
        let coord = GameLaunchCoordinator::new(
            LauncherConfig::new(dir.path()),
            ScriptedLauncher::printing("FINAL_SCORE:42"),
            InMemoryAccessStore::new(),
            RefusingSink::default(),
        );
        let outcome = coord.launch(&user(), "game_a.py").await;
        assert!(matches!(outcome, LaunchOutcome::Completed { score: 42, persisted: false, .. }));
        assert_eq!(coord.scores().calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.user_message(), "Game completed! Score: 42 (not saved to leaderboard)");
    }

    #[tokio::test]
    async fn access_round_trip_uses_current_catalog() {
        let dir = game_dir();
        let coord = coordinator(&dir, ScriptedLauncher::printing(""));
        let before = match coord.get_access(&user()).await {
            Ok(a) => a,
            Err(e) => panic!("get_access failed: {e}"),
        };
        assert_eq!(before.len(), 3);
        assert!(before.iter().all(|a| a.enabled), "no records means everything enabled");

        let after = match coord.set_access(&user(), &["game_b.py".to_owned(), "nope.py".to_owned()]).await {
            Ok(a) => a,
            Err(e) => panic!("set_access failed: {e}"),
        };
        let enabled: Vec<&str> = after.iter().filter(|a| a.enabled).map(|a| a.filename.as_str()).collect();
        assert_eq!(enabled, vec!["game_b.py"]);
    }

    #[tokio::test]
    async fn games_lists_catalog() {
        let dir = game_dir();
        let coord = coordinator(&dir, ScriptedLauncher::printing(""));
        let games = match coord.games().await {
            Ok(g) => g,
            Err(e) => panic!("games failed: {e}"),
        };
        let names: Vec<&str> = games.iter().map(|g| g.filename.as_str()).collect();
        assert_eq!(names, vec!["game_a.py", "game_b.py", "game_c.py"]);
    }
}
