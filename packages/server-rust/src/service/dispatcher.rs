//! Single-invocation orchestration: resolve, classify, then execute or bridge.
//!
//! Dispatch-time validation and not-found errors return before anything is
//! written. Every other path produces exactly one [`RunRecord`]:
//!
//! - unknown operation -> `failed` / `operation_not_found`
//! - bridge required   -> `queued`, plus one pending bridge request
//! - direct            -> `succeeded`, or `failed` / `operation_failed`

use std::sync::Arc;

use steprpc_core::{operation_args, Args, ContextLocator, PendingBridgeRequest, RunRecord, RunState};
use tracing::{debug, warn};

use super::catalog::OperationCatalog;
use super::classify::Classification;
use super::config::StepRpcConfig;
use super::error::{codes, RpcError};
use super::table::DirectRegistration;
use crate::storage::{BridgeQueue, RunStore};
use crate::traits::{ContextResolver, ResolveError, ResolvedContext};

// ---------------------------------------------------------------------------
// RunIdGenerator
// ---------------------------------------------------------------------------

/// Generates `<prefix><random hex>` run ids.
///
/// Collisions are not checked; the random suffix makes them unlikely at the
/// accepted load.
#[derive(Debug, Clone)]
pub struct RunIdGenerator {
    prefix: String,
    suffix_len: usize,
}

impl RunIdGenerator {
    #[must_use]
    pub fn new(prefix: impl Into<String>, suffix_len: usize) -> Self {
        Self {
            prefix: prefix.into(),
            suffix_len: suffix_len.clamp(1, 32),
        }
    }

    #[must_use]
    pub fn next_id(&self) -> String {
        let random = uuid::Uuid::new_v4().simple().to_string();
        format!("{}{}", self.prefix, &random[..self.suffix_len])
    }
}

// ---------------------------------------------------------------------------
// OperationDispatcher
// ---------------------------------------------------------------------------

/// Executes one operation request against its target context.
pub struct OperationDispatcher {
    catalog: Arc<OperationCatalog>,
    resolver: Arc<dyn ContextResolver>,
    bridge_queue: Arc<BridgeQueue>,
    run_store: Arc<RunStore>,
    run_ids: RunIdGenerator,
}

impl OperationDispatcher {
    #[must_use]
    pub fn new(
        catalog: Arc<OperationCatalog>,
        resolver: Arc<dyn ContextResolver>,
        bridge_queue: Arc<BridgeQueue>,
        run_store: Arc<RunStore>,
        config: &StepRpcConfig,
    ) -> Self {
        Self {
            catalog,
            resolver,
            bridge_queue,
            run_store,
            run_ids: RunIdGenerator::new(config.run_id_prefix.clone(), config.run_id_suffix_len),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &OperationCatalog {
        &self.catalog
    }

    /// Dispatches `operation` and returns the persisted run record.
    ///
    /// Direct operations are awaited to completion; bridged operations
    /// return as soon as the request is queued. For bridged runs the record
    /// is written before the request becomes visible to pollers. A direct run
    /// whose caller is dropped mid-flight still finishes and is recorded.
    ///
    /// # Errors
    ///
    /// - [`RpcError::Validation`] when the context locator is missing or malformed
    /// - [`RpcError::NotFound`] when the locator names no live context
    /// - [`RpcError::Internal`] when the resolver itself fails
    pub async fn dispatch(
        &self,
        request_id: &str,
        operation: &str,
        args: &Args,
    ) -> Result<RunRecord, RpcError> {
        let locator =
            ContextLocator::from_args(args).map_err(|e| RpcError::bad_request(e.to_string()))?;
        let ctx = self.resolver.resolve(&locator).await.map_err(|e| match e {
            ResolveError::NotFound(message) => {
                RpcError::not_found(codes::CONTEXT_NOT_FOUND, message)
            }
            ResolveError::Other(e) => RpcError::Internal(e),
        })?;

        let run_id = self.run_ids.next_id();
        let op_args = operation_args(args);

        let record = match self.catalog.classify(operation) {
            Classification::Direct(registration) => {
                debug!(run_id = %run_id, operation, context = %ctx.context_id, "executing directly");
                // The outcome is recorded by the spawned task, so a caller that
                // stops waiting does not lose the run.
                let store = Arc::clone(&self.run_store);
                let (request_id, run_id, operation) =
                    (request_id.to_string(), run_id.clone(), operation.to_string());
                let recording = tokio::spawn(async move {
                    let failure = execute_direct(registration, op_args, ctx).await.err();
                    record_direct_outcome(&store, &request_id, &run_id, &operation, failure)
                });
                recording
                    .await
                    .map_err(|e| RpcError::Internal(anyhow::anyhow!("direct run task failed: {e}")))?
            }
            Classification::BridgeRequired => {
                let record = self.run_store.create(
                    request_id,
                    &run_id,
                    operation,
                    RunState::Queued,
                    None,
                    None,
                );
                self.bridge_queue.enqueue(PendingBridgeRequest {
                    request_id: request_id.to_string(),
                    run_id: run_id.clone(),
                    operation: operation.to_string(),
                    args: op_args,
                    target_context_id: ctx.context_id,
                });
                record
            }
            Classification::Unknown => self.run_store.create(
                request_id,
                &run_id,
                operation,
                RunState::Failed,
                Some(codes::OPERATION_NOT_FOUND.to_string()),
                Some(format!(
                    "operation '{operation}' was not found among installed operations"
                )),
            ),
        };

        Ok(record)
    }
}

fn record_direct_outcome(
    store: &RunStore,
    request_id: &str,
    run_id: &str,
    operation: &str,
    failure: Option<String>,
) -> RunRecord {
    match failure {
        None => store.create(request_id, run_id, operation, RunState::Succeeded, None, None),
        Some(message) => {
            warn!(run_id = %run_id, operation, error = %message, "direct operation failed");
            store.create(
                request_id,
                run_id,
                operation,
                RunState::Failed,
                Some(codes::OPERATION_FAILED.to_string()),
                Some(message),
            )
        }
    }
}

/// Instantiates and runs a direct operation on its own task.
///
/// Factory rejection, workspace preparation failure, execution errors and
/// panics all come back as the failure message.
async fn execute_direct(
    registration: Arc<DirectRegistration>,
    args: Args,
    ctx: ResolvedContext,
) -> Result<(), String> {
    let task = tokio::spawn(async move {
        let op = registration.instantiate(&args)?;
        if op.requires_workspace() {
            ctx.launcher.prepare_workspace(&ctx.workspace).await?;
        }
        op.perform(&ctx).await
    });

    match task.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            let message = format!("{e:#}");
            if message.is_empty() {
                Err("operation execution failed".to_string())
            } else {
                Err(message)
            }
        }
        Err(join) if join.is_panic() => Err("operation panicked during execution".to_string()),
        Err(_) => Err("operation execution was cancelled".to_string()),
    }
}
