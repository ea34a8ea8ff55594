//! Step RPC service layer.
//!
//! Requests flow through four stages:
//!
//! 1. **Policy** (`registry`): allow-list check and catalog filtering
//! 2. **Discovery** (`catalog`, `classify`): direct table plus interpreted steps
//! 3. **Dispatch** (`dispatcher`): resolve context, execute or enqueue, record
//! 4. **Bridge** (`bridge`): interpreted-context pollers fetch and complete work

pub mod bridge;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod invocation;
pub mod registry;
pub mod table;

pub use bridge::BridgeService;
pub use catalog::OperationCatalog;
pub use classify::Classification;
pub use config::StepRpcConfig;
pub use dispatcher::{OperationDispatcher, RunIdGenerator};
pub use error::{codes, ErrorKind, RpcError};
pub use invocation::InvocationService;
pub use registry::OperationRegistry;
pub use table::{DirectOperationTable, DirectRegistration, OperationFactory};

#[cfg(test)]
pub(crate) mod test_metrics {
    use metrics_exporter_prometheus::PrometheusBuilder;

    /// Runs `f` against a thread-local Prometheus recorder and returns its
    /// output along with the rendered exposition text.
    pub(crate) fn capture<T>(f: impl FnOnce() -> T) -> (T, String) {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let out = metrics::with_local_recorder(&recorder, f);
        (out, handle.render())
    }
}
