//! In-memory run status records keyed by run id.

use chrono::Utc;
use dashmap::DashMap;
use steprpc_core::{RunRecord, RunState};
use tracing::debug;

/// Authoritative record of every accepted invocation's outcome.
///
/// Records are never expired. Concurrent updates to the same run resolve
/// last-write-wins.
#[derive(Debug, Default)]
pub struct RunStore {
    by_run_id: DashMap<String, RunRecord>,
}

impl RunStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new record stamped with the current time, replacing any
    /// record already held for `run_id`.
    pub fn create(
        &self,
        request_id: &str,
        run_id: &str,
        operation: &str,
        state: RunState,
        error_code: Option<String>,
        error_message: Option<String>,
    ) -> RunRecord {
        let record = RunRecord {
            request_id: request_id.to_string(),
            run_id: run_id.to_string(),
            operation: operation.to_string(),
            state,
            created_at: Utc::now(),
            error_code,
            error_message,
        };
        self.by_run_id.insert(run_id.to_string(), record.clone());
        debug!(run_id = %run_id, state = %state, "run record created");
        record
    }

    #[must_use]
    pub fn get(&self, run_id: &str) -> Option<RunRecord> {
        self.by_run_id.get(run_id).map(|r| r.value().clone())
    }

    /// Replaces the state and error fields of an existing record.
    ///
    /// Any state other than `failed` clears the error fields regardless of
    /// the arguments. Returns `None` without side effects for an unknown run.
    pub fn update(
        &self,
        run_id: &str,
        state: RunState,
        error_code: Option<String>,
        error_message: Option<String>,
    ) -> Option<RunRecord> {
        let mut entry = self.by_run_id.get_mut(run_id)?;
        let record = entry.value_mut();
        record.state = state;
        if state == RunState::Failed {
            record.error_code = error_code;
            record.error_message = error_message;
        } else {
            record.error_code = None;
            record.error_message = None;
        }
        debug!(run_id = %run_id, state = %state, "run record updated");
        Some(record.clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_run_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_run_id.is_empty()
    }
}
