//! Per-action outcome tracking
//!
//! Every write a room performs is recorded as pending, then committed or
//! failed. A failed send keeps its draft so the caller can offer a retry
//! instead of losing the text.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Failed actions kept for inspection; older ones are evicted first
pub const MAX_FAILED: usize = 32;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub enum ActionState {
    Pending,
    Committed,
    Failed { reason: String },
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum ActionKind {
    SendText,
    SendPoll,
    SendAnnouncement,
    Delete,
    React,
    Vote,
    MarkSeen,
}

#[derive(Debug, Clone, Serialize)]
pub struct Action {
    pub id: u64,
    pub kind: ActionKind,
    /// Text to restore if the action fails
    pub draft: Option<String>,
    pub state: ActionState,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ActionTracker {
    next_id: u64,
    actions: Vec<Action>,
}

impl ActionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, kind: ActionKind, draft: Option<String>) -> u64 {
        self.next_id += 1;
        self.actions.push(Action {
            id: self.next_id,
            kind,
            draft,
            state: ActionState::Pending,
            started_at: Utc::now(),
        });
        self.next_id
    }

    /// Committed actions are forgotten
    pub fn commit(&mut self, id: u64) {
        self.actions.retain(|action| action.id != id);
    }

    pub fn fail(&mut self, id: u64, reason: impl Into<String>) {
        let Some(action) = self.actions.iter_mut().find(|action| action.id == id) else {
            return;
        };
        action.state = ActionState::Failed {
            reason: reason.into(),
        };

        let mut excess = self.failed().len().saturating_sub(MAX_FAILED);
        self.actions.retain(|action| {
            if excess > 0 && matches!(action.state, ActionState::Failed { .. }) {
                excess -= 1;
                return false;
            }
            true
        });
    }

    pub fn get(&self, id: u64) -> Option<&Action> {
        self.actions.iter().find(|action| action.id == id)
    }

    /// State of `id`; anything no longer tracked has committed or was
    /// evicted as an old failure
    pub fn state(&self, id: u64) -> ActionState {
        self.get(id)
            .map(|action| action.state.clone())
            .unwrap_or(ActionState::Committed)
    }

    pub fn pending(&self) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|action| action.state == ActionState::Pending)
            .collect()
    }

    pub fn failed(&self) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|action| matches!(action.state, ActionState::Failed { .. }))
            .collect()
    }

    /// Take back the draft of a failed action, dropping the record
    pub fn take_draft(&mut self, id: u64) -> Option<String> {
        let index = self.actions.iter().position(|action| {
            action.id == id && matches!(action.state, ActionState::Failed { .. })
        })?;
        self.actions.remove(index).draft
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_forgets_action() {
        let mut tracker = ActionTracker::new();
        let id = tracker.begin(ActionKind::React, None);
        assert_eq!(tracker.state(id), ActionState::Pending);
        assert_eq!(tracker.pending().len(), 1);

        tracker.commit(id);
        assert_eq!(tracker.state(id), ActionState::Committed);
        assert!(tracker.pending().is_empty());
    }

    #[test]
    fn test_failed_send_keeps_draft() {
        let mut tracker = ActionTracker::new();
        let id = tracker.begin(ActionKind::SendText, Some("see you at 10".to_string()));
        tracker.fail(id, "database is locked");

        assert_eq!(tracker.failed().len(), 1);
        assert!(matches!(tracker.state(id), ActionState::Failed { .. }));
        assert_eq!(tracker.take_draft(id), Some("see you at 10".to_string()));
        assert!(tracker.failed().is_empty());
        assert_eq!(tracker.take_draft(id), None);
    }

    #[test]
    fn test_old_failures_are_evicted() {
        let mut tracker = ActionTracker::new();
        let ids: Vec<u64> = (0..MAX_FAILED + 5)
            .map(|i| {
                let id = tracker.begin(ActionKind::Vote, Some(format!("vote {}", i)));
                tracker.fail(id, "database is locked");
                id
            })
            .collect();
        let pending = tracker.begin(ActionKind::React, None);

        assert_eq!(tracker.failed().len(), MAX_FAILED);
        assert_eq!(tracker.take_draft(ids[0]), None);
        assert_eq!(tracker.failed()[0].id, ids[5]);
        assert_eq!(
            tracker.take_draft(ids[MAX_FAILED + 4]),
            Some(format!("vote {}", MAX_FAILED + 4))
        );
        assert_eq!(tracker.state(pending), ActionState::Pending);
    }
}
