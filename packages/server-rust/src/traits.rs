//! Capability interfaces for the execution platform this server bridges into.
//!
//! The server never owns jobs, nodes, or workspaces. It resolves them through
//! these traits, which the embedding process implements.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use steprpc_core::ContextLocator;

/// Environment variables of a running execution context.
pub type Environment = BTreeMap<String, String>;

/// Everything a direct operation needs to run against one execution context.
#[derive(Clone)]
pub struct ResolvedContext {
    /// Stable identifier of the context; also the bridge target id.
    pub context_id: String,
    /// Node the workspace lives on.
    pub node_name: String,
    pub workspace: PathBuf,
    pub environment: Environment,
    pub launcher: Arc<dyn Launcher>,
}

impl std::fmt::Debug for ResolvedContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedContext")
            .field("context_id", &self.context_id)
            .field("node_name", &self.node_name)
            .field("workspace", &self.workspace)
            .finish_non_exhaustive()
    }
}

/// Failure to resolve a [`ContextLocator`].
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The job, build, node, or workspace channel does not exist.
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Maps a context locator onto a live execution context.
#[async_trait]
pub trait ContextResolver: Send + Sync {
    /// Resolve the locator to a context handle, environment, workspace and launcher.
    async fn resolve(&self, locator: &ContextLocator) -> Result<ResolvedContext, ResolveError>;
}

/// A command to run on a context's node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Environment,
}

/// Result of a finished launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchOutcome {
    /// Process exit code; `None` when terminated by a signal.
    pub exit_code: Option<i32>,
}

impl LaunchOutcome {
    #[must_use]
    pub fn success(self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Process launcher bound to a node.
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Create the workspace directory (and parents) if it does not exist.
    async fn prepare_workspace(&self, path: &Path) -> anyhow::Result<()>;

    /// Run a command to completion.
    async fn launch(&self, spec: LaunchSpec) -> anyhow::Result<LaunchOutcome>;
}

/// An instantiated operation ready to run against a resolved context.
#[async_trait]
pub trait DirectOperation: Send + Sync {
    /// Whether the operation needs its workspace to exist before running.
    fn requires_workspace(&self) -> bool {
        true
    }

    /// Run the operation. Any error marks the run `failed`.
    async fn perform(&self, ctx: &ResolvedContext) -> anyhow::Result<()>;
}

/// A step known to the interpreted-context engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpretedStep {
    pub function_name: String,
    pub display_name: Option<String>,
}

/// Registry of operations that only the interpreted context can execute.
pub trait InterpretedOperationSource: Send + Sync {
    /// Enumerate the currently registered steps.
    ///
    /// # Errors
    ///
    /// Any enumeration failure; callers degrade it to an empty list.
    fn list(&self) -> anyhow::Result<Vec<InterpretedStep>>;
}
