//! Client-facing invocation API: catalog, invoke, run status.

use std::sync::Arc;

use steprpc_core::messages::{CatalogResponse, InvokeRequest, InvokeResponse, RunStatusResponse};
use tracing::instrument;

use super::dispatcher::OperationDispatcher;
use super::error::{codes, RpcError};
use super::registry::OperationRegistry;
use crate::audit::{AuditAction, AuditEvent, Caller};
use crate::storage::RunStore;

/// Policy-checked entry point for operation invocations.
pub struct InvocationService {
    registry: Arc<OperationRegistry>,
    dispatcher: Arc<OperationDispatcher>,
    run_store: Arc<RunStore>,
}

impl InvocationService {
    #[must_use]
    pub fn new(
        registry: Arc<OperationRegistry>,
        dispatcher: Arc<OperationDispatcher>,
        run_store: Arc<RunStore>,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            run_store,
        }
    }

    /// Discoverable operations after the allow-list is applied.
    #[must_use]
    pub fn catalog(&self) -> CatalogResponse {
        let catalog = self.dispatcher.catalog();
        CatalogResponse {
            operations: self
                .registry
                .catalog(catalog.discover(), |name| catalog.direct().definition_for(name)),
        }
    }

    /// Validates, authorizes, audits and dispatches one invocation.
    ///
    /// A returned response may still describe a `failed` run; only request
    /// rejections are errors.
    ///
    /// # Errors
    ///
    /// - [`RpcError::Validation`] for a blank `requestId`/`operation` or a bad locator
    /// - [`RpcError::PolicyDenied`] when the operation is outside the allow-list
    /// - [`RpcError::NotFound`] when the target context does not exist
    #[instrument(skip_all, fields(operation = %request.operation, request_id = %request.request_id))]
    pub async fn invoke(
        &self,
        caller: &Caller,
        request: InvokeRequest,
    ) -> Result<InvokeResponse, RpcError> {
        if request.request_id.trim().is_empty() || request.operation.trim().is_empty() {
            return Err(RpcError::bad_request("requestId and operation are required"));
        }
        if !self.registry.is_allowed(&request.operation) {
            return Err(RpcError::PolicyDenied {
                operation: request.operation,
            });
        }

        AuditEvent::new(AuditAction::InvokeStart, caller)
            .field("requestId", &request.request_id)
            .field("operation", &request.operation)
            .args(&request.args)
            .emit();

        let record = self
            .dispatcher
            .dispatch(&request.request_id, &request.operation, &request.args)
            .await?;

        let mut complete = AuditEvent::new(AuditAction::InvokeComplete, caller)
            .field("requestId", &record.request_id)
            .field("runId", &record.run_id)
            .field("state", record.state);
        if let Some(code) = &record.error_code {
            complete = complete.field("errorCode", code);
        }
        complete.emit();
        metrics::counter!("steprpc_invocations_total", "state" => record.state.as_str())
            .increment(1);

        Ok(InvokeResponse::from(&record))
    }

    /// Current status of a run.
    ///
    /// # Errors
    ///
    /// [`RpcError::Validation`] for a blank id, [`RpcError::NotFound`] for an
    /// unknown one.
    pub fn run_status(&self, run_id: &str) -> Result<RunStatusResponse, RpcError> {
        if run_id.trim().is_empty() {
            return Err(RpcError::bad_request("run id is required"));
        }
        self.run_store
            .get(run_id)
            .map(|record| RunStatusResponse::from(&record))
            .ok_or_else(|| {
                RpcError::not_found(codes::RUN_NOT_FOUND, format!("no run found for id '{run_id}'"))
            })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use serde_json::json;
    use steprpc_core::{ExecutionMode, RunState};

    use super::*;
    use crate::service::dispatcher::tests::{args_for, harness, Harness};
    use crate::service::error::ErrorKind;
    use crate::service::registry::NOT_DISCOVERED_DESCRIPTION;
    use crate::service::test_metrics;
    use crate::storage::BridgeQueue;

    struct Fixture {
        svc: InvocationService,
        queue: Arc<BridgeQueue>,
        store: Arc<RunStore>,
    }

    fn service(allow: &[&str]) -> Fixture {
        let Harness {
            dispatcher,
            queue,
            store,
            ..
        } = harness();
        let allowlist: BTreeSet<String> = allow.iter().map(|s| (*s).to_string()).collect();
        let svc = InvocationService::new(
            Arc::new(OperationRegistry::new(allowlist)),
            Arc::new(dispatcher),
            Arc::clone(&store),
        );
        Fixture { svc, queue, store }
    }

    fn request(request_id: &str, operation: &str) -> InvokeRequest {
        InvokeRequest {
            request_id: request_id.to_string(),
            operation: operation.to_string(),
            args: args_for("demo#1", json!({ "message": "Deploy?" })),
        }
    }

    #[tokio::test]
    async fn blank_fields_are_rejected_before_anything_else() {
        let f = service(&["input"]);
        let err = f.svc
            .invoke(&Caller::anonymous(), request(" ", "input"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "bad_request");
        assert_eq!(err.to_string(), "requestId and operation are required");

        let err = f.svc
            .invoke(&Caller::anonymous(), request("req-1", ""))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "bad_request");
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn allowlist_rejects_without_side_effects() {
        let f = service(&["input"]);
        let err = f.svc
            .invoke(&Caller::anonymous(), request("req-1", "archiveArtifacts"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PolicyDenied);
        assert_eq!(err.to_string(), "operation 'archiveArtifacts' is not in allowlist");
        assert!(f.store.is_empty());
        assert!(f.queue.is_empty());
    }

    #[tokio::test]
    async fn allowed_bridged_invoke_is_queued_and_status_visible() {
        let f = service(&["input"]);
        let resp = f.svc
            .invoke(&Caller::new(Some("alice")), request("req-1", "input"))
            .await
            .unwrap();

        assert_eq!(resp.request_id, "req-1");
        assert_eq!(resp.state, RunState::Queued);
        assert!(resp.error.is_none());
        assert!(f.queue.peek_next("demo#1").is_some());

        let status = f.svc.run_status(&resp.run_id).unwrap();
        assert_eq!(status.operation, "input");
        assert_eq!(status.state, RunState::Queued);
    }

    #[tokio::test]
    async fn unknown_operation_is_a_failed_run_not_an_error() {
        let f = service(&[]);
        let resp = f.svc
            .invoke(&Caller::anonymous(), request("req-1", "doesNotExist"))
            .await
            .unwrap();
        assert_eq!(resp.state, RunState::Failed);
        assert_eq!(resp.error.unwrap().code, "operation_not_found");
    }

    #[tokio::test]
    async fn direct_failure_surfaces_error_body() {
        let f = service(&[]);
        let resp = f.svc
            .invoke(&Caller::anonymous(), request("req-1", "junit"))
            .await
            .unwrap();
        let error = resp.error.unwrap();
        assert_eq!(error.code, "operation_failed");
        assert_eq!(error.message, "no test report files were found");
    }

    #[tokio::test]
    async fn missing_context_is_not_found() {
        let f = service(&[]);
        let mut req = request("req-1", "input");
        req.args = args_for("gone#3", json!({}));
        let err = f.svc.invoke(&Caller::anonymous(), req).await.unwrap_err();
        assert_eq!(err.code(), "context_not_found");
        assert!(f.store.is_empty());
    }

    #[test]
    fn invocations_are_counted_by_final_state() {
        let f = service(&[]);
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let caller = Caller::anonymous();
        let (_, rendered) = test_metrics::capture(|| {
            rt.block_on(async {
                f.svc.invoke(&caller, request("req-1", "archiveArtifacts")).await.unwrap();
                f.svc.invoke(&caller, request("req-2", "input")).await.unwrap();
                f.svc.invoke(&caller, request("req-3", "input")).await.unwrap();
                f.svc.invoke(&caller, request(" ", "input")).await.unwrap_err();
            });
        });
        assert!(rendered.contains(r#"steprpc_invocations_total{state="succeeded"} 1"#), "{rendered}");
        assert!(rendered.contains(r#"steprpc_invocations_total{state="queued"} 2"#), "{rendered}");
        assert!(!rendered.contains(r#"state="failed""#), "{rendered}");
    }

    #[test]
    fn run_status_errors() {
        let f = service(&[]);
        assert_eq!(f.svc.run_status("").unwrap_err().code(), "bad_request");
        let err = f.svc.run_status("rpc-missing").unwrap_err();
        assert_eq!(err.code(), "run_not_found");
        assert_eq!(err.to_string(), "no run found for id 'rpc-missing'");
    }

    #[test]
    fn catalog_applies_allowlist() {
        let f = service(&["input", "archiveArtifacts", "ghost"]);
        let ops = f.svc.catalog().operations;
        let names: Vec<_> = ops.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["archiveArtifacts", "ghost", "input"]);
        assert_eq!(ops[0].execution_mode, ExecutionMode::Direct);
        assert_eq!(ops[1].description, NOT_DISCOVERED_DESCRIPTION);
        assert_eq!(ops[2].execution_mode, ExecutionMode::BridgeRequired);
    }

    #[tokio::test]
    async fn allowlisted_alias_is_listed_as_direct() {
        let f = service(&["ArtifactArchiver"]);
        let ops = f.svc.catalog().operations;
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].name, "ArtifactArchiver");
        assert_eq!(ops[0].execution_mode, ExecutionMode::Direct);
        assert_ne!(ops[0].description, NOT_DISCOVERED_DESCRIPTION);

        let resp = f.svc
            .invoke(&Caller::anonymous(), request("req-1", "ArtifactArchiver"))
            .await
            .unwrap();
        assert_eq!(resp.state, RunState::Succeeded);
        assert!(f.queue.is_empty());
    }

    #[test]
    fn catalog_without_allowlist_lists_everything_sorted() {
        let f = service(&[]);
        let names: Vec<_> = f.svc
            .catalog()
            .operations
            .into_iter()
            .map(|d| d.name)
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(names.contains(&"milestone".to_string()));
        assert!(names.contains(&"archiveArtifacts".to_string()));
    }
}
