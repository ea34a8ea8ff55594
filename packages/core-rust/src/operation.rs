use serde::{Deserialize, Serialize};

/// How an operation reaches the execution context it runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionMode {
    /// Executed on the calling task against the resolved environment.
    Direct,
    /// Only runnable inside the context's interpreter; queued for the
    /// context to poll and report back.
    BridgeRequired,
}

impl ExecutionMode {
    /// Returns the wire name of this mode.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "DIRECT",
            Self::BridgeRequired => "BRIDGE_REQUIRED",
        }
    }
}

/// One entry of the operation catalog.
///
/// Produced fresh by every discovery pass; there is no identity across calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDefinition {
    /// Unique operation name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Execution path for this operation.
    pub execution_mode: ExecutionMode,
}

impl OperationDefinition {
    /// Creates a definition.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        execution_mode: ExecutionMode,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            execution_mode,
        }
    }
}
