//! Wires stores, catalog, dispatcher and services into one handle.

use std::sync::Arc;

use crate::service::{
    BridgeService, DirectOperationTable, InvocationService, OperationCatalog, OperationDispatcher,
    OperationRegistry, StepRpcConfig,
};
use crate::storage::{BridgeQueue, RunStore};
use crate::traits::{ContextResolver, InterpretedOperationSource};

/// Shared state of one Step RPC server instance.
///
/// Cloning shares the same stores.
#[derive(Clone)]
pub struct StepRpc {
    pub invocations: Arc<InvocationService>,
    pub bridge: Arc<BridgeService>,
    pub run_store: Arc<RunStore>,
    pub bridge_queue: Arc<BridgeQueue>,
}

impl StepRpc {
    #[must_use]
    pub fn new(
        config: &StepRpcConfig,
        direct: Arc<DirectOperationTable>,
        interpreted: Arc<dyn InterpretedOperationSource>,
        resolver: Arc<dyn ContextResolver>,
    ) -> Self {
        let run_store = Arc::new(RunStore::new());
        let bridge_queue = Arc::new(BridgeQueue::new());
        let catalog = Arc::new(OperationCatalog::new(direct, interpreted));
        let dispatcher = Arc::new(OperationDispatcher::new(
            catalog,
            resolver,
            Arc::clone(&bridge_queue),
            Arc::clone(&run_store),
            config,
        ));
        let registry = Arc::new(OperationRegistry::new(config.allowlist.clone()));

        Self {
            invocations: Arc::new(InvocationService::new(
                registry,
                dispatcher,
                Arc::clone(&run_store),
            )),
            bridge: Arc::new(BridgeService::new(
                Arc::clone(&bridge_queue),
                Arc::clone(&run_store),
            )),
            run_store,
            bridge_queue,
        }
    }
}
