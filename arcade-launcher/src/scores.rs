//! Score persistence collaborator.

use std::sync::RwLock;

use arcade_core::{GameId, UserId};
use async_trait::async_trait;

/// Receives scores of completed launches.
#[async_trait]
pub trait ScoreSink: Send + Sync {
    /// Record `score` for `(user, game)`. Returns `false` if it was not stored.
    async fn submit_score(&self, user: &UserId, game: &GameId, score: u64) -> bool;
}

/// One accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreSubmission {
    pub user_id: UserId,
    pub game_id: GameId,
    pub score: u64,
}

/// Process-local [`ScoreSink`] that keeps every submission in order.
#[derive(Debug, Default)]
pub struct InMemoryScoreSink {
    submissions: RwLock<Vec<ScoreSubmission>>,
}

impl InMemoryScoreSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all submissions so far.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn submissions(&self) -> Vec<ScoreSubmission> {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        self.submissions
            .read()
            .expect("score sink read lock poisoned")
            .clone()
    }

    /// Best score of `user` on `game`, if any.
    #[must_use]
    pub fn best(&self, user: &UserId, game: &GameId) -> Option<u64> {
        self.submissions()
            .into_iter()
            .filter(|s| &s.user_id == user && &s.game_id == game)
            .map(|s| s.score)
            .max()
    }
}

#[async_trait]
impl ScoreSink for InMemoryScoreSink {
    async fn submit_score(&self, user: &UserId, game: &GameId, score: u64) -> bool {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        self.submissions
            .write()
            .expect("score sink write lock poisoned")
            .push(ScoreSubmission { user_id: user.clone(), game_id: game.clone(), score });
        tracing::debug!(user = %user, game = %game, score, "score recorded");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn submissions_are_kept_in_order() {
        let sink = InMemoryScoreSink::new();
        let user = UserId::new("u1");
        let game = GameId::from_filename("game_a.py");
        assert!(sink.submit_score(&user, &game, 10).await);
        assert!(sink.submit_score(&user, &game, 30).await);
        let scores: Vec<u64> = sink.submissions().iter().map(|s| s.score).collect();
        assert_eq!(scores, vec![10, 30]);
        assert_eq!(sink.best(&user, &game), Some(30));
        assert_eq!(sink.best(&UserId::new("u2"), &game), None);
    }
}
