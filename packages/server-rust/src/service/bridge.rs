//! Bridge-facing API: the interpreted-context poller fetches queued requests
//! and reports their terminal outcome.

use std::sync::Arc;

use steprpc_core::messages::{BridgeCompleteRequest, BridgeCompleteResponse};
use steprpc_core::{PendingBridgeRequest, RunState};
use tracing::{instrument, warn};

use super::error::{codes, RpcError};
use crate::audit::{AuditAction, AuditEvent, Caller};
use crate::storage::{BridgeQueue, RunStore};

const DEFAULT_FAILURE_MESSAGE: &str = "bridge reported failure";

/// Poll-and-complete surface over the bridge queue.
pub struct BridgeService {
    queue: Arc<BridgeQueue>,
    run_store: Arc<RunStore>,
}

impl BridgeService {
    #[must_use]
    pub fn new(queue: Arc<BridgeQueue>, run_store: Arc<RunStore>) -> Self {
        Self { queue, run_store }
    }

    /// Head of the target context's queue. Does not claim it.
    ///
    /// # Errors
    ///
    /// [`RpcError::Validation`] for a blank target, [`RpcError::NotFound`]
    /// with `no_pending_request` when nothing is queued.
    pub fn pending(
        &self,
        caller: &Caller,
        target_context_id: &str,
    ) -> Result<PendingBridgeRequest, RpcError> {
        if target_context_id.trim().is_empty() {
            return Err(RpcError::bad_request("runExternalizableId query parameter is required"));
        }
        let pending = self.queue.peek_next(target_context_id).ok_or_else(|| {
            RpcError::not_found(
                codes::NO_PENDING_REQUEST,
                format!("no pending bridge request for run '{target_context_id}'"),
            )
        })?;

        AuditEvent::new(AuditAction::BridgePending, caller)
            .field("target", target_context_id)
            .field("runId", &pending.run_id)
            .field("operation", &pending.operation)
            .emit();
        Ok(pending)
    }

    /// Applies a terminal outcome reported by the bridge.
    ///
    /// Requests for one run may be completed in any order relative to their
    /// queue position. A `failed` report without an error gets
    /// `operation_failed`.
    ///
    /// # Errors
    ///
    /// - [`RpcError::Validation`] for blank fields or a non-terminal state
    /// - [`RpcError::NotFound`] with `run_not_found` when no pending request matches
    #[instrument(skip_all, fields(run_id = %request.run_id))]
    pub fn complete(
        &self,
        caller: &Caller,
        request: BridgeCompleteRequest,
    ) -> Result<BridgeCompleteResponse, RpcError> {
        if request.run_id.trim().is_empty() || request.state.trim().is_empty() {
            return Err(RpcError::bad_request("runId and state are required"));
        }
        let state = request
            .state
            .parse::<RunState>()
            .ok()
            .filter(|s| s.is_terminal())
            .ok_or_else(|| {
                RpcError::bad_request("state must be one of succeeded, failed, cancelled")
            })?;

        let pending = self.queue.complete(&request.run_id).ok_or_else(|| {
            RpcError::not_found(
                codes::RUN_NOT_FOUND,
                format!("no pending bridge request found for run '{}'", request.run_id),
            )
        })?;

        let (code, message) = match (state, request.error) {
            (RunState::Failed, error) => {
                let error = error.unwrap_or_default();
                (
                    non_blank(error.code).unwrap_or_else(|| codes::OPERATION_FAILED.to_string()),
                    non_blank(error.message)
                        .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
                )
            }
            _ => (String::new(), String::new()),
        };
        let updated = self.run_store.update(
            &pending.run_id,
            state,
            non_blank(code.clone()),
            non_blank(message),
        );
        if updated.is_none() {
            warn!(run_id = %pending.run_id, "completed bridge request had no run record");
        }

        let mut event = AuditEvent::new(AuditAction::BridgeComplete, caller)
            .field("runId", &pending.run_id)
            .field("operation", &pending.operation)
            .field("state", state);
        if !code.is_empty() {
            event = event.field("errorCode", code);
        }
        event.emit();
        metrics::counter!("steprpc_bridge_completions_total", "state" => state.as_str())
            .increment(1);

        Ok(BridgeCompleteResponse {
            request_id: pending.request_id,
            run_id: pending.run_id,
            state,
        })
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
