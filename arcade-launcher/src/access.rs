//! Per-user game permissions.
//!
//! Absence of a record means "allowed". Reads are plain point lookups;
//! replacing a user's permission set is serialized per user.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use arcade_core::{AccessRecord, GameAccess, UserId};
use async_trait::async_trait;

use crate::error::AccessError;

/// Backing store for [`AccessRecord`]s.
#[async_trait]
pub trait AccessStore: Send + Sync {
    /// The stored flag for `(user, filename)`, or `None` if no record exists.
    ///
    /// # Errors
    /// Returns [`AccessError`] if the store cannot be queried.
    async fn get(&self, user: &UserId, filename: &str) -> Result<Option<bool>, AccessError>;

    /// Every record stored for `user`.
    ///
    /// # Errors
    /// Returns [`AccessError`] if the store cannot be queried.
    async fn records(&self, user: &UserId) -> Result<Vec<AccessRecord>, AccessError>;

    /// Atomically replace every record of `user` with `records`.
    ///
    /// # Errors
    /// Returns [`AccessError`] if the write fails; the previous set is kept.
    async fn replace_all(&self, user: &UserId, records: Vec<AccessRecord>) -> Result<(), AccessError>;
}

/// Process-local [`AccessStore`].
#[derive(Debug, Default)]
pub struct InMemoryAccessStore {
    records: RwLock<HashMap<UserId, HashMap<String, bool>>>,
}

impl InMemoryAccessStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccessStore for InMemoryAccessStore {
    /// # Panics
    /// Panics if the store lock was poisoned by a panicking writer.
    async fn get(&self, user: &UserId, filename: &str) -> Result<Option<bool>, AccessError> {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let records = self.records.read().expect("access store read lock poisoned");
        Ok(records.get(user).and_then(|games| games.get(filename).copied()))
    }

    /// # Panics
    /// Panics if the store lock was poisoned by a panicking writer.
    async fn records(&self, user: &UserId) -> Result<Vec<AccessRecord>, AccessError> {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let records = self.records.read().expect("access store read lock poisoned");
        let mut out: Vec<AccessRecord> = records
            .get(user)
            .into_iter()
            .flatten()
            .map(|(filename, enabled)| AccessRecord::new(user.clone(), filename.clone(), *enabled))
            .collect();
        out.sort_by(|a, b| a.game_filename.cmp(&b.game_filename));
        Ok(out)
    }

    /// # Panics
    /// Panics if the store lock was poisoned by a panicking writer.
    async fn replace_all(&self, user: &UserId, records: Vec<AccessRecord>) -> Result<(), AccessError> {
        let games = records
            .into_iter()
            .map(|record| (record.game_filename, record.enabled))
            .collect();
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        self.records
            .write()
            .expect("access store write lock poisoned")
            .insert(user.clone(), games);
        Ok(())
    }
}

/// Decides whether a user may launch a game and edits permission sets.
pub struct AccessGate<A: AccessStore> {
    store: A,
    user_locks: Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>,
}

impl<A: AccessStore> AccessGate<A> {
    #[must_use]
    pub fn new(store: A) -> Self {
        Self { store, user_locks: Mutex::new(HashMap::new()) }
    }

    /// The underlying store.
    pub fn store(&self) -> &A {
        &self.store
    }

    /// `true` unless a record explicitly disables the game for `user`.
    ///
    /// A store failure is logged and treated as allowed.
    pub async fn is_allowed(&self, user: &UserId, filename: &str) -> bool {
        match self.store.get(user, filename).await {
            Ok(Some(enabled)) => enabled,
            Ok(None) => true,
            Err(e) => {
                tracing::warn!(user = %user, filename, error = %e, "access lookup failed, allowing launch");
                true
            }
        }
    }

    /// Effective access of `user` to every game in `catalog`.
    ///
    /// # Errors
    /// Returns [`AccessError`] if the store cannot be queried.
    pub async fn get_access(&self, user: &UserId, catalog: &[String]) -> Result<Vec<GameAccess>, AccessError> {
        let stored: HashMap<String, bool> = self
            .store
            .records(user)
            .await?
            .into_iter()
            .map(|r| (r.game_filename, r.enabled))
            .collect();
        Ok(catalog
            .iter()
            .map(|filename| GameAccess::new(filename.clone(), stored.get(filename).copied().unwrap_or(true)))
            .collect())
    }

    /// Replace the whole permission set of `user`.
    ///
    /// Every catalog game is written enabled iff it appears in `enabled`.
    /// Names in `enabled` that are not in `catalog` are ignored.
    ///
    /// # Errors
    /// Returns [`AccessError`] if the write fails.
    ///
    /// # Panics
    /// Panics if the per-user lock table was poisoned.
    pub async fn set_access(
        &self,
        user: &UserId,
        enabled: &[String],
        catalog: &[String],
    ) -> Result<Vec<GameAccess>, AccessError> {
        let lock = self.user_lock(user);
        let result = {
            let _guard = lock.lock().await;
            self.replace(user, enabled, catalog).await
        };
        self.release_user_lock(user, lock);
        result
    }

    async fn replace(&self, user: &UserId, enabled: &[String], catalog: &[String]) -> Result<Vec<GameAccess>, AccessError> {
        let wanted: BTreeSet<&str> = enabled.iter().map(String::as_str).collect();
        let records: Vec<AccessRecord> = catalog
            .iter()
            .map(|filename| AccessRecord::new(user.clone(), filename.clone(), wanted.contains(filename.as_str())))
            .collect();
        let access = records
            .iter()
            .map(|r| GameAccess::new(r.game_filename.clone(), r.enabled))
            .collect();

        self.store.replace_all(user, records).await?;
        tracing::info!(user = %user, enabled = wanted.len(), catalog = catalog.len(), "replaced game access");
        Ok(access)
    }

    fn user_lock(&self, user: &UserId) -> Arc<tokio::sync::Mutex<()>> {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let mut locks = self.user_locks.lock().expect("user lock table poisoned");
        Arc::clone(locks.entry(user.clone()).or_default())
    }

    /// Give back `lock` and drop the table entry once nobody else holds it.
    fn release_user_lock(&self, user: &UserId, lock: Arc<tokio::sync::Mutex<()>>) {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let mut locks = self.user_locks.lock().expect("user lock table poisoned");
        // Clones are only taken under the table lock, so a count of one is final.
        drop(lock);
        if locks.get(user).is_some_and(|entry| Arc::strong_count(entry) == 1) {
            locks.remove(user);
        }
    }
}
