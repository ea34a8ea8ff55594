//! Step RPC core: operation catalog types, run records, bridge requests,
//! context locators, wire message schemas, and audit redaction.

pub mod bridge;
pub mod context;
pub mod messages;
pub mod operation;
pub mod redact;
pub mod run;

pub use bridge::PendingBridgeRequest;
pub use context::{operation_args, ContextLocator, LocatorError, RUN_CONTEXT_KEY};
pub use operation::{ExecutionMode, OperationDefinition};
pub use redact::{is_sensitive_key, redact_args, REDACTION_MASK};
pub use run::{RunError, RunRecord, RunState};

/// Operation arguments as an insertion-ordered JSON object.
pub type Args = serde_json::Map<String, serde_json::Value>;
