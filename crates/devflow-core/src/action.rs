//! Per-action state machine for AI-backed operations.
//!
//! Each `(user, action, scope)` key moves `Idle -> Loading -> Success | Error`.
//! A second start while `Loading` is rejected; there is no queue and no
//! cancellation. [`ActionGuard`] settles the state: dropping it before
//! calling [`ActionGuard::succeed`] or [`ActionGuard::fail`] records an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{DevflowError, Result};

// ---------------------------------------------------------------------------
// ActionState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ActionState {
    Idle,
    Loading { started_at: DateTime<Utc> },
    Success { finished_at: DateTime<Utc> },
    Error { message: String, finished_at: DateTime<Utc> },
}

impl ActionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ActionState::Loading { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionKey {
    pub user_id: String,
    pub action: String,
    /// What the action targets, usually a project id; empty for global tools.
    pub scope: String,
}

impl ActionKey {
    pub fn new(user_id: &str, action: &str, scope: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            action: action.to_string(),
            scope: scope.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionEntry {
    pub action: String,
    pub scope: String,
    #[serde(flatten)]
    pub state: ActionState,
}

// ---------------------------------------------------------------------------
// ActionTracker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ActionTracker {
    states: Arc<Mutex<HashMap<ActionKey, ActionState>>>,
}

impl ActionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ActionKey, ActionState>> {
        // A panic while holding the lock cannot leave the map half-written.
        self.states.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Move `key` to `Loading`. Fails with `AlreadyRunning` if it is loading.
    pub fn start(&self, key: ActionKey) -> Result<ActionGuard> {
        let mut states = self.lock();
        if states.get(&key).is_some_and(ActionState::is_loading) {
            return Err(DevflowError::AlreadyRunning(format!(
                "{} ({})",
                key.action, key.scope
            )));
        }
        states.insert(
            key.clone(),
            ActionState::Loading {
                started_at: Utc::now(),
            },
        );
        Ok(ActionGuard {
            tracker: self.clone(),
            key,
            settled: false,
        })
    }

    pub fn state(&self, key: &ActionKey) -> ActionState {
        self.lock().get(key).cloned().unwrap_or(ActionState::Idle)
    }

    /// Every recorded action for `user_id`, sorted by action then scope.
    pub fn list(&self, user_id: &str) -> Vec<ActionEntry> {
        let mut entries: Vec<ActionEntry> = self
            .lock()
            .iter()
            .filter(|(k, _)| k.user_id == user_id)
            .map(|(k, s)| ActionEntry {
                action: k.action.clone(),
                scope: k.scope.clone(),
                state: s.clone(),
            })
            .collect();
        entries.sort_by(|a, b| (&a.action, &a.scope).cmp(&(&b.action, &b.scope)));
        entries
    }

    fn settle(&self, key: &ActionKey, state: ActionState) {
        self.lock().insert(key.clone(), state);
    }
}

// ---------------------------------------------------------------------------
// ActionGuard
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ActionGuard {
    tracker: ActionTracker,
    key: ActionKey,
    settled: bool,
}

impl ActionGuard {
    pub fn key(&self) -> &ActionKey {
        &self.key
    }

    pub fn succeed(mut self) {
        self.settled = true;
        self.tracker.settle(
            &self.key,
            ActionState::Success {
                finished_at: Utc::now(),
            },
        );
    }

    pub fn fail(mut self, message: impl Into<String>) {
        self.settled = true;
        self.tracker.settle(
            &self.key,
            ActionState::Error {
                message: message.into(),
                finished_at: Utc::now(),
            },
        );
    }

    /// Settle from a result, passing it through.
    pub fn finish<T, E: std::fmt::Display>(self, result: std::result::Result<T, E>) -> std::result::Result<T, E> {
        match &result {
            Ok(_) => self.succeed(),
            Err(e) => self.fail(e.to_string()),
        }
        result
    }
}

impl Drop for ActionGuard {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!(action = %self.key.action, scope = %self.key.scope, "action dropped before settling");
            self.tracker.settle(
                &self.key,
                ActionState::Error {
                    message: "interrupted".into(),
                    finished_at: Utc::now(),
                },
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ActionKey {
        ActionKey::new("alice", "review", "p1")
    }

    #[test]
    fn unknown_action_is_idle() {
        assert_eq!(ActionTracker::new().state(&key()), ActionState::Idle);
    }

    #[test]
    fn start_then_succeed() {
        let tracker = ActionTracker::new();
        let guard = tracker.start(key()).unwrap();
        assert!(tracker.state(&key()).is_loading());
        guard.succeed();
        assert!(matches!(tracker.state(&key()), ActionState::Success { .. }));
    }

    #[test]
    fn second_start_while_loading_rejected() {
        let tracker = ActionTracker::new();
        let _guard = tracker.start(key()).unwrap();
        assert!(matches!(
            tracker.start(key()),
            Err(DevflowError::AlreadyRunning(_))
        ));
        // A different scope is independent.
        assert!(tracker.start(ActionKey::new("alice", "review", "p2")).is_ok());
    }

    #[test]
    fn restart_after_settling() {
        let tracker = ActionTracker::new();
        tracker.start(key()).unwrap().fail("boom");
        assert!(matches!(
            tracker.state(&key()),
            ActionState::Error { ref message, .. } if message == "boom"
        ));
        assert!(tracker.start(key()).is_ok());
    }

    #[test]
    fn dropped_guard_records_error() {
        let tracker = ActionTracker::new();
        drop(tracker.start(key()).unwrap());
        assert!(matches!(tracker.state(&key()), ActionState::Error { .. }));
    }

    #[test]
    fn finish_maps_result() {
        let tracker = ActionTracker::new();
        let out: std::result::Result<u8, String> = tracker.start(key()).unwrap().finish(Err("bad".into()));
        assert!(out.is_err());
        assert!(matches!(tracker.state(&key()), ActionState::Error { .. }));
    }

    #[test]
    fn list_is_per_user() {
        let tracker = ActionTracker::new();
        tracker.start(key()).unwrap().succeed();
        tracker
            .start(ActionKey::new("bob", "review", "p1"))
            .unwrap()
            .succeed();
        let entries = tracker.list("alice");
        assert_eq!(entries.len(), 1);
        let json = serde_json::to_value(&entries[0]).unwrap();
        assert_eq!(json["state"], "success");
        assert_eq!(json["action"], "review");
    }
}
