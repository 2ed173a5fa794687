//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers via
//! the `State` extractor.
//!
//! - **Project**: the fixed configuration every computation is handed.
//! - **Tasks**: an ordered in-memory [`Store`]. Every mutation republishes
//!   the completion summary on the [`CompletionFeed`] while still holding
//!   the write lock, so subscribers observe updates in mutation order.
//! - **Draws**: the project's [`DrawRegister`] behind a mutex.
//!
//! Lock order is tasks before draws. Scheduling takes a task snapshot and
//! releases the task lock before touching the register.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;

use cpm_ledger::{summarize, CompletionSummary, DrawRegister, ProjectConfig};
use cpm_state::Task;

use crate::config::AppConfig;
use crate::middleware::metrics::ApiMetrics;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable, insertion-ordered record store.
///
/// The lock is `parking_lot` and never held across `.await`.
#[derive(Debug)]
pub struct Store<T> {
    data: Arc<RwLock<Vec<T>>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone> Store<T> {
    pub fn new() -> Self {
        Self::from_records(Vec::new())
    }

    pub fn from_records(records: Vec<T>) -> Self {
        Self {
            data: Arc::new(RwLock::new(records)),
        }
    }

    /// Copy of every record, in insertion order.
    pub fn list(&self) -> Vec<T> {
        self.data.read().clone()
    }

    /// First record matching `pred`.
    pub fn find(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        self.data.read().iter().find(|r| pred(r)).cloned()
    }

    /// Run `f` against the records under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.data.read())
    }

    /// Run `f` against the records under the write lock.
    ///
    /// Read-validate-update sequences belong in one closure so no other
    /// writer can interleave.
    pub fn write<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> R {
        f(&mut self.data.write())
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Completion Feed ----------------------------------------------------------

/// Latest completion summary, pushed after every task change.
///
/// Subscribers receive a fresh recomputation per change; nothing is
/// accumulated incrementally.
#[derive(Debug, Clone)]
pub struct CompletionFeed {
    tx: Arc<watch::Sender<CompletionSummary>>,
}

impl CompletionFeed {
    pub fn new(initial: CompletionSummary) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Replace the current summary and wake subscribers if it changed.
    pub fn publish(&self, summary: CompletionSummary) {
        self.tx.send_if_modified(|current| {
            if *current == summary {
                false
            } else {
                *current = summary;
                true
            }
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<CompletionSummary> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> CompletionSummary {
        self.tx.borrow().clone()
    }
}

// -- Application State --------------------------------------------------------

/// Everything the handlers share.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tasks: Store<Task>,
    pub draws: Arc<Mutex<DrawRegister>>,
    pub completion: CompletionFeed,
    pub metrics: ApiMetrics,
}

impl AppState {
    /// State for an unconfigured project.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let project_id = config.project.project_id;
        let completion = CompletionFeed::new(summarize(&[], &config.project));
        Self {
            config: Arc::new(config),
            tasks: Store::new(),
            draws: Arc::new(Mutex::new(DrawRegister::new(project_id))),
            completion,
            metrics: ApiMetrics::new(),
        }
    }

    pub fn project(&self) -> &ProjectConfig {
        &self.config.project
    }

    /// Mutate the task set and republish completion in the same critical
    /// section.
    pub fn update_tasks<R>(&self, f: impl FnOnce(&mut Vec<Task>) -> R) -> R {
        self.tasks.write(|tasks| {
            let out = f(tasks);
            self.completion.publish(summarize(tasks, self.project()));
            out
        })
    }

    /// Completion computed from the live task set.
    pub fn completion_now(&self) -> CompletionSummary {
        self.tasks.read(|tasks| summarize(tasks, self.project()))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpm_core::{Money, Percentage};
    use cpm_state::TaskTransitionEvidence;

    fn state() -> AppState {
        let project = ProjectConfig::new(
            "Maple Street",
            Money::from_cents(11_000_000),
            Percentage::from_basis_points(7_000),
        )
        .unwrap();
        AppState::with_config(AppConfig { port: 0, project })
    }

    fn approved(state: &AppState, cents: i64) -> Task {
        let project_id = state.project().project_id;
        let mut task = Task::new(project_id, "Work", Money::from_cents(cents)).unwrap();
        task.start(TaskTransitionEvidence::new("s")).unwrap();
        task.submit(TaskTransitionEvidence::new("s")).unwrap();
        task.approve(TaskTransitionEvidence::new("s"), None).unwrap();
        task
    }

    #[test]
    fn store_preserves_insertion_order() {
        let store = Store::new();
        store.write(|v| v.extend([3, 1, 2]));
        assert_eq!(store.list(), vec![3, 1, 2]);
        assert_eq!(store.find(|x| *x < 3), Some(1));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn task_updates_republish_completion() {
        let state = state();
        let mut rx = state.completion.subscribe();
        assert!(!rx.has_changed().unwrap());

        let task = approved(&state, 7_700_000);
        state.update_tasks(|tasks| tasks.push(task));

        assert!(rx.has_changed().unwrap());
        let summary = rx.borrow_and_update().clone();
        assert_eq!(summary.cwp, Percentage::from_basis_points(7_000));
        assert!(summary.can_schedule_draw);
        assert_eq!(state.completion.current(), state.completion_now());
    }

    #[test]
    fn unchanged_summary_does_not_wake_subscribers() {
        let state = state();
        let rx = state.completion.subscribe();
        state.update_tasks(|_| ());
        assert!(!rx.has_changed().unwrap());
    }
}
