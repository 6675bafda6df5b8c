//! Task manager for async effects
//!
//! Provides lifecycle management for async tasks with supersede-latest
//! semantics:
//! - Every spawn bumps a per-key sequence number
//! - Only the outcome of the most recent spawn for a key is delivered
//! - Superseded tasks keep running (in-flight requests are not aborted),
//!   their outcomes are dropped when they settle
//!
//! # Example
//!
//! ```ignore
//! use state_dispatch::tasks::{TaskManager, TaskKey};
//!
//! let mut tasks = TaskManager::new();
//!
//! tasks.spawn("category_products", async move {
//!     match api.category_products(1).await {
//!         Ok(products) => Action::CategoryProductsDidLoad(products),
//!         Err(e) => Action::CategoryProductsDidFail(e.user_message()),
//!     }
//! });
//!
//! // A second spawn with the same key supersedes the first
//! tasks.spawn("category_products", async move { /* ... */ });
//!
//! // Only the second outcome is yielded
//! while let Some(action) = tasks.next_settled().await {
//!     store.dispatch(action);
//! }
//! ```

use std::collections::HashMap;
use std::future::Future;

use tokio::task::{Id, JoinSet};

use crate::Action;

/// Names a family of tasks. Only the newest spawn under a key is delivered.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TaskKey(String);

impl TaskKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for TaskKey {
    fn from(s: &'static str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TaskKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Outcome of a spawned task, tagged with the sequence it was spawned under.
#[derive(Debug)]
struct TaskOutcome<A> {
    key: TaskKey,
    sequence: u64,
    action: A,
}

/// Manages async effect tasks with supersede-latest delivery.
///
/// The manager is owned by the single thread of control that mutates the
/// store. Sequence comparison happens in [`next_settled`](Self::next_settled)
/// on that thread, so the check and the subsequent dispatch cannot race
/// with a newer spawn.
pub struct TaskManager<A> {
    sequences: HashMap<TaskKey, u64>,
    pending: HashMap<TaskKey, usize>,
    keys_by_id: HashMap<Id, TaskKey>,
    running: JoinSet<TaskOutcome<A>>,
}

impl<A> Default for TaskManager<A>
where
    A: Action,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<A> TaskManager<A>
where
    A: Action,
{
    pub fn new() -> Self {
        Self {
            sequences: HashMap::new(),
            pending: HashMap::new(),
            keys_by_id: HashMap::new(),
            running: JoinSet::new(),
        }
    }

    /// Spawn a task, superseding any earlier task with the same key.
    ///
    /// The future's output is an action that will be yielded by
    /// [`next_settled`](Self::next_settled) if no newer task has been
    /// spawned under the same key by then. Returns the sequence number
    /// captured for this spawn.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(&mut self, key: impl Into<TaskKey>, future: F) -> u64
    where
        F: Future<Output = A> + Send + 'static,
    {
        let key = key.into();
        let sequence = self.bump(&key);
        *self.pending.entry(key.clone()).or_insert(0) += 1;

        tracing::trace!(task = %key.name(), sequence, "Spawning task");

        let owned_key = key.clone();
        let handle = self.running.spawn(async move {
            let action = future.await;
            TaskOutcome {
                key: owned_key,
                sequence,
                action,
            }
        });
        self.keys_by_id.insert(handle.id(), key);

        sequence
    }

    /// Wait for the next outcome that is still current.
    ///
    /// Stale outcomes (superseded or cancelled) and panicked tasks are
    /// dropped. Returns `None` once nothing is in flight.
    pub async fn next_settled(&mut self) -> Option<A> {
        loop {
            let joined = self.running.join_next_with_id().await?;
            match joined {
                Ok((id, outcome)) => {
                    self.keys_by_id.remove(&id);
                    self.settle(&outcome.key);
                    if self.is_current(&outcome.key, outcome.sequence) {
                        return Some(outcome.action);
                    }
                    tracing::debug!(
                        task = %outcome.key.name(),
                        sequence = outcome.sequence,
                        action = %outcome.action.name(),
                        "Dropping superseded task outcome"
                    );
                }
                Err(err) => {
                    let key = self.keys_by_id.remove(&err.id());
                    tracing::error!(
                        task = key.as_ref().map_or("?", TaskKey::name),
                        error = %err,
                        "Task failed before producing an action"
                    );
                    if let Some(key) = key {
                        self.settle(&key);
                    }
                }
            }
        }
    }

    /// Make any pending outcome for `key` stale.
    ///
    /// The underlying task is not aborted; its result is discarded.
    pub fn cancel(&mut self, key: &TaskKey) {
        if self.is_running(key) {
            self.bump(key);
        }
    }

    /// Make every pending outcome stale.
    pub fn cancel_all(&mut self) {
        let keys: Vec<TaskKey> = self.pending.keys().cloned().collect();
        for key in keys {
            self.bump(&key);
        }
    }

    /// Whether `sequence` is the latest spawn for `key`.
    pub fn is_current(&self, key: &TaskKey, sequence: u64) -> bool {
        self.sequences.get(key).copied() == Some(sequence)
    }

    /// Current sequence number for `key` (0 if never spawned).
    pub fn sequence(&self, key: &TaskKey) -> u64 {
        self.sequences.get(key).copied().unwrap_or(0)
    }

    /// Check if at least one task with the given key has not settled yet.
    pub fn is_running(&self, key: &TaskKey) -> bool {
        self.pending.get(key).is_some_and(|n| *n > 0)
    }

    /// Number of spawned tasks that have not settled yet.
    pub fn in_flight(&self) -> usize {
        self.running.len()
    }

    /// True when nothing is in flight.
    pub fn is_idle(&self) -> bool {
        self.running.is_empty()
    }

    /// Keys with unsettled tasks.
    pub fn running_keys(&self) -> impl Iterator<Item = &TaskKey> {
        self.pending
            .iter()
            .filter(|(_, n)| **n > 0)
            .map(|(key, _)| key)
    }

    fn bump(&mut self, key: &TaskKey) -> u64 {
        let sequence = self.sequences.entry(key.clone()).or_insert(0);
        *sequence += 1;
        *sequence
    }

    fn settle(&mut self, key: &TaskKey) {
        if let Some(n) = self.pending.get_mut(key) {
            *n = n.saturating_sub(1);
            if *n == 0 {
                self.pending.remove(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[derive(Clone, Debug, PartialEq)]
    enum Outcome {
        Done(usize),
    }

    impl Action for Outcome {
        fn name(&self) -> &'static str {
            "Done"
        }
    }

    #[test]
    fn test_keys_from_str_and_string_agree() {
        let owned: TaskKey = format!("page/{}", 2).into();
        assert_eq!(owned, TaskKey::new("page/2"));
        assert_eq!(TaskKey::from("search").name(), "search");
    }

    #[tokio::test]
    async fn test_spawn_yields_action() {
        let mut tasks = TaskManager::new();

        let seq = tasks.spawn("search", async { Outcome::Done(42) });
        assert_eq!(seq, 1);
        assert!(tasks.is_running(&TaskKey::new("search")));

        let action = tokio::time::timeout(Duration::from_millis(100), tasks.next_settled())
            .await
            .expect("timeout");

        assert_eq!(action, Some(Outcome::Done(42)));
        assert!(tasks.is_idle());
        assert!(!tasks.is_running(&TaskKey::new("search")));
        assert_eq!(tasks.next_settled().await, None);
    }

    #[tokio::test]
    async fn test_later_spawn_supersedes_slower_earlier_one() {
        let mut tasks = TaskManager::new();
        let (release_first, first_gate) = oneshot::channel::<()>();

        // First task only finishes once released, after the second has settled
        tasks.spawn("search", async move {
            let _ = first_gate.await;
            Outcome::Done(1)
        });
        tasks.spawn("search", async { Outcome::Done(2) });
        assert_eq!(tasks.in_flight(), 2);

        let action = tokio::time::timeout(Duration::from_millis(200), tasks.next_settled())
            .await
            .expect("timeout");
        assert_eq!(action, Some(Outcome::Done(2)));

        release_first.send(()).unwrap();
        let action = tokio::time::timeout(Duration::from_millis(200), tasks.next_settled())
            .await
            .expect("timeout");
        // The stale outcome is dropped and nothing else is in flight
        assert_eq!(action, None);
        assert!(tasks.is_idle());
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let mut tasks = TaskManager::new();

        tasks.spawn("a", async { Outcome::Done(1) });
        tasks.spawn("b", async { Outcome::Done(2) });

        let mut got = Vec::new();
        while let Some(action) = tasks.next_settled().await {
            got.push(action);
        }
        got.sort_by_key(|Outcome::Done(n)| *n);
        assert_eq!(got, vec![Outcome::Done(1), Outcome::Done(2)]);
    }

    #[tokio::test]
    async fn test_cancel_discards_outcome() {
        let mut tasks = TaskManager::new();

        tasks.spawn("search", async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Outcome::Done(1)
        });

        assert!(tasks.is_running(&TaskKey::new("search")));
        tasks.cancel(&TaskKey::new("search"));
        assert_eq!(tasks.sequence(&TaskKey::new("search")), 2);

        let result = tokio::time::timeout(Duration::from_millis(200), tasks.next_settled())
            .await
            .expect("timeout");
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_cancel_all() {
        let mut tasks = TaskManager::new();

        tasks.spawn("a", async { Outcome::Done(1) });
        tasks.spawn("b", async { Outcome::Done(2) });
        assert_eq!(tasks.running_keys().count(), 2);

        tasks.cancel_all();

        assert_eq!(tasks.next_settled().await, None);
        assert!(tasks.is_idle());
    }

    #[tokio::test]
    async fn test_panicking_task_is_dropped() {
        let mut tasks = TaskManager::new();

        let explode = true;
        tasks.spawn("boom", async move {
            if explode {
                panic!("effect blew up");
            }
            Outcome::Done(0)
        });
        tasks.spawn("ok", async { Outcome::Done(3) });

        let mut got = Vec::new();
        while let Some(action) = tasks.next_settled().await {
            got.push(action);
        }
        assert_eq!(got, vec![Outcome::Done(3)]);
        assert!(tasks.is_idle());
    }

    #[tokio::test]
    async fn test_panic_settles_its_own_key_only() {
        let mut tasks = TaskManager::new();
        let (release_slow, slow_gate) = oneshot::channel::<()>();

        let explode = true;
        tasks.spawn("boom", async move {
            if explode {
                panic!("effect blew up");
            }
            Outcome::Done(0)
        });
        tasks.spawn("slow", async move {
            let _ = slow_gate.await;
            Outcome::Done(3)
        });

        // The panic is consumed, then the wait on "slow" times out
        let waited = tokio::time::timeout(Duration::from_millis(50), tasks.next_settled()).await;
        assert!(waited.is_err());
        assert!(!tasks.is_running(&TaskKey::new("boom")));
        assert!(tasks.is_running(&TaskKey::new("slow")));
        assert_eq!(tasks.running_keys().count(), 1);

        release_slow.send(()).unwrap();
        assert_eq!(tasks.next_settled().await, Some(Outcome::Done(3)));
        assert!(tasks.is_idle());
        assert_eq!(tasks.running_keys().count(), 0);
    }

    #[test]
    fn test_empty_manager() {
        let tasks = TaskManager::<Outcome>::new();

        assert!(tasks.is_idle());
        assert_eq!(tasks.in_flight(), 0);
        assert!(!tasks.is_current(&TaskKey::new("x"), 0));
    }
}
