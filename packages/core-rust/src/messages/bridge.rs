//! Bridge poll/complete messages exchanged with the owning execution context.

use serde::{Deserialize, Serialize};

use crate::bridge::PendingBridgeRequest;
use crate::run::RunState;

/// `GET /v1/bridge/pending` payload: the full head item of the context's queue.
pub type BridgePendingResponse = PendingBridgeRequest;

/// Error reported by the poller alongside a terminal state.
///
/// Blank fields are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionError {
    pub code: String,
    pub message: String,
}

/// `POST /v1/bridge/complete` body.
///
/// `state` stays a raw string so that unknown values are reported as a
/// validation error instead of a body parse error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeCompleteRequest {
    pub run_id: String,
    pub state: String,
    pub error: Option<CompletionError>,
}

/// Finalized summary returned after a successful completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeCompleteResponse {
    pub request_id: String,
    pub run_id: String,
    pub state: RunState,
}
