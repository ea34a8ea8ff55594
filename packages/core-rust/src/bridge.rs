use serde::{Deserialize, Serialize};

use crate::Args;

/// Work item waiting for its target execution context to pick it up.
///
/// Immutable once enqueued. `run_id` is the correlation key the poller
/// reports completion with; `target_context_id` names the context that must
/// perform the work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingBridgeRequest {
    pub request_id: String,
    pub run_id: String,
    pub operation: String,
    /// Invocation arguments with the context locator removed.
    pub args: Args,
    pub target_context_id: String,
}
