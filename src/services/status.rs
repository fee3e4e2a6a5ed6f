//! Run status shared with the control layer

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

use crate::types::RunStatus;

/// Fine-grained scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerPhase {
    #[default]
    Idle,
    Searching,
    Committing,
    Done,
}

/// Point-in-time view of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunProgress {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub phase: SchedulerPhase,
    pub started_at: Option<DateTime<Utc>>,
    pub total: usize,
    pub processed: usize,
    pub served: usize,
    pub unserved: usize,
    /// Set when the run aborted
    pub error: Option<String>,
}

impl RunProgress {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            status: RunStatus::Idle,
            phase: SchedulerPhase::Idle,
            started_at: None,
            total: 0,
            processed: 0,
            served: 0,
            unserved: 0,
            error: None,
        }
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.processed as f64 / self.total as f64 * 100.0
        }
    }
}

/// Cloneable read-only handle on a scheduler's progress.
///
/// Only the owning scheduler writes through it.
#[derive(Debug, Clone)]
pub struct StatusHandle {
    inner: Arc<RwLock<RunProgress>>,
}

impl StatusHandle {
    pub(crate) fn new(run_id: Uuid) -> Self {
        Self {
            inner: Arc::new(RwLock::new(RunProgress::new(run_id))),
        }
    }

    pub fn status(&self) -> RunStatus {
        self.inner.read().status
    }

    pub fn snapshot(&self) -> RunProgress {
        self.inner.read().clone()
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut RunProgress)) {
        f(&mut self.inner.write());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let handle = StatusHandle::new(Uuid::new_v4());
        let observer = handle.clone();
        assert_eq!(observer.status(), RunStatus::Idle);

        handle.update(|p| {
            p.status = RunStatus::Running;
            p.total = 4;
            p.processed = 1;
        });

        let snapshot = observer.snapshot();
        assert_eq!(snapshot.status, RunStatus::Running);
        assert_eq!(snapshot.percent(), 25.0);
    }

    #[test]
    fn test_empty_run_is_complete() {
        let handle = StatusHandle::new(Uuid::new_v4());
        assert_eq!(handle.snapshot().percent(), 100.0);
    }
}
