//! Run lifecycle types: state machine and the authoritative run record.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RunState
// ---------------------------------------------------------------------------

/// Lifecycle state of an accepted invocation.
///
/// `Queued` is the only non-terminal state and is reachable only through the
/// bridge path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Queued,
    Succeeded,
    Failed,
    Cancelled,
}

impl RunState {
    /// States a bridge poller may report on completion.
    pub const TERMINAL: [RunState; 3] = [Self::Succeeded, Self::Failed, Self::Cancelled];

    /// Returns the wire name of this state.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Queued)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the four run state names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown run state: {0}")]
pub struct UnknownRunState(pub String);

impl FromStr for RunState {
    type Err = UnknownRunState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "succeeded" => Ok(Self::Succeeded),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownRunState(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// RunError
// ---------------------------------------------------------------------------

/// Machine-readable code plus human-readable message attached to a failed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    pub code: String,
    pub message: String,
}

impl RunError {
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// RunRecord
// ---------------------------------------------------------------------------

/// Status record for one accepted invocation, keyed by `run_id`.
///
/// Updates replace `state` and the error fields only; `request_id`,
/// `operation` and `created_at` are fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub request_id: String,
    pub run_id: String,
    pub operation: String,
    pub state: RunState,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl RunRecord {
    /// Returns the error pair when the record carries an error code.
    ///
    /// A code without a message falls back to a generic message.
    #[must_use]
    pub fn error(&self) -> Option<RunError> {
        self.error_code.as_ref().map(|code| {
            RunError::new(
                code.clone(),
                self.error_message
                    .clone()
                    .unwrap_or_else(|| "operation execution failed".to_string()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_round_trips_through_str() {
        for state in [
            RunState::Queued,
            RunState::Succeeded,
            RunState::Failed,
            RunState::Cancelled,
        ] {
            assert_eq!(state.as_str().parse::<RunState>().unwrap(), state);
        }
    }

    #[test]
    fn unknown_state_is_rejected() {
        let err = "running".parse::<RunState>().unwrap_err();
        assert_eq!(err, UnknownRunState("running".to_string()));
        assert!("Succeeded".parse::<RunState>().is_err());
    }

    #[test]
    fn only_queued_is_non_terminal() {
        assert!(!RunState::Queued.is_terminal());
        assert!(RunState::TERMINAL.iter().all(|s| s.is_terminal()));
    }

    #[test]
    fn error_falls_back_to_generic_message() {
        let record = RunRecord {
            request_id: "req-1".to_string(),
            run_id: "rpc-1".to_string(),
            operation: "junit".to_string(),
            state: RunState::Failed,
            created_at: Utc::now(),
            error_code: Some("operation_failed".to_string()),
            error_message: None,
        };
        let err = record.error().unwrap();
        assert_eq!(err.code, "operation_failed");
        assert_eq!(err.message, "operation execution failed");
    }

    #[test]
    fn record_without_code_has_no_error() {
        let record = RunRecord {
            request_id: "req-1".to_string(),
            run_id: "rpc-1".to_string(),
            operation: "junit".to_string(),
            state: RunState::Succeeded,
            created_at: Utc::now(),
            error_code: None,
            error_message: Some("stray".to_string()),
        };
        assert!(record.error().is_none());
    }
}
