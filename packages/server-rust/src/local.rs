//! Single-node collaborators used by the standalone binary.
//!
//! Every context lives on this machine: workspaces are local directories and
//! commands run through `tokio::process`.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use steprpc_core::{Args, ContextLocator};
use tracing::debug;

use crate::service::{DirectOperationTable, DirectRegistration};
use crate::traits::{
    ContextResolver, DirectOperation, Environment, InterpretedOperationSource, InterpretedStep,
    LaunchOutcome, LaunchSpec, Launcher, ResolveError, ResolvedContext,
};

/// Node names that always mean "this machine".
pub const LOCAL_NODE_NAMES: &[&str] = &["built-in", "master"];

// ---------------------------------------------------------------------------
// LocalLauncher
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalLauncher;

impl LocalLauncher {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Launcher for LocalLauncher {
    async fn prepare_workspace(&self, path: &Path) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(path)
            .await
            .with_context(|| format!("failed to create workspace '{}'", path.display()))
    }

    async fn launch(&self, spec: LaunchSpec) -> anyhow::Result<LaunchOutcome> {
        debug!(program = %spec.program, cwd = %spec.cwd.display(), "launching");
        let status = tokio::process::Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(&spec.cwd)
            .envs(&spec.env)
            .kill_on_drop(true)
            .status()
            .await
            .with_context(|| format!("failed to launch '{}'", spec.program))?;
        Ok(LaunchOutcome {
            exit_code: status.code(),
        })
    }
}

// ---------------------------------------------------------------------------
// LocalContextResolver
// ---------------------------------------------------------------------------

/// Resolves every locator whose node is this machine.
///
/// The context id is the handle itself, or `<contextName>#<buildNumber>`.
#[derive(Debug, Clone)]
pub struct LocalContextResolver {
    node_name: String,
    environment: Environment,
}

impl LocalContextResolver {
    #[must_use]
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            environment: Environment::new(),
        }
    }

    /// Variables injected into every resolved context.
    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    fn is_local(&self, node: &str) -> bool {
        node == self.node_name || LOCAL_NODE_NAMES.contains(&node)
    }
}

#[async_trait]
impl ContextResolver for LocalContextResolver {
    async fn resolve(&self, locator: &ContextLocator) -> Result<ResolvedContext, ResolveError> {
        let node = locator.node_name();
        if !self.is_local(node) {
            return Err(ResolveError::NotFound(format!(
                "no node found with name '{node}'"
            )));
        }

        let mut environment = self.environment.clone();
        let context_id = match locator {
            ContextLocator::ByHandle { context_handle, .. } => context_handle.clone(),
            ContextLocator::ByCoordinates {
                context_name,
                build_number,
                ..
            } => {
                environment.insert("JOB_NAME".to_string(), context_name.clone());
                environment.insert("BUILD_NUMBER".to_string(), build_number.to_string());
                format!("{context_name}#{build_number}")
            }
        };
        environment.insert("NODE_NAME".to_string(), node.to_string());
        environment.insert("WORKSPACE".to_string(), locator.workspace().to_string());

        Ok(ResolvedContext {
            context_id,
            node_name: node.to_string(),
            workspace: locator.workspace().into(),
            environment,
            launcher: Arc::new(LocalLauncher),
        })
    }
}

// ---------------------------------------------------------------------------
// ShellOperation
// ---------------------------------------------------------------------------

/// Runs `args.script` with `sh -c` inside the workspace.
#[derive(Debug, Clone)]
pub struct ShellOperation {
    script: String,
}

impl ShellOperation {
    /// # Errors
    ///
    /// Fails when `script` is missing, blank, or not a string.
    pub fn from_args(args: &Args) -> anyhow::Result<Self> {
        match args.get("script").and_then(serde_json::Value::as_str) {
            Some(script) if !script.trim().is_empty() => Ok(Self {
                script: script.to_string(),
            }),
            _ => anyhow::bail!("args.script is required"),
        }
    }

    #[must_use]
    pub fn registration() -> DirectRegistration {
        DirectRegistration::new("sh", "Shell Script", |args: &Args| {
            Ok(Box::new(Self::from_args(args)?) as Box<dyn DirectOperation>)
        })
    }
}

#[async_trait]
impl DirectOperation for ShellOperation {
    async fn perform(&self, ctx: &ResolvedContext) -> anyhow::Result<()> {
        let outcome = ctx
            .launcher
            .launch(LaunchSpec {
                program: "sh".to_string(),
                args: vec!["-c".to_string(), self.script.clone()],
                cwd: ctx.workspace.clone(),
                env: ctx.environment.clone(),
            })
            .await?;
        match outcome.exit_code {
            Some(0) => Ok(()),
            Some(code) => anyhow::bail!("script returned exit code {code}"),
            None => anyhow::bail!("script was terminated by a signal"),
        }
    }
}

/// Table holding the operations this binary executes directly.
#[must_use]
pub fn local_operations() -> DirectOperationTable {
    let table = DirectOperationTable::new();
    table.register(ShellOperation::registration());
    table
}

// ---------------------------------------------------------------------------
// StaticInterpretedSource
// ---------------------------------------------------------------------------

/// Fixed list of steps that a bridge poller executes.
#[derive(Debug, Clone, Default)]
pub struct StaticInterpretedSource {
    steps: Vec<InterpretedStep>,
}

impl StaticInterpretedSource {
    #[must_use]
    pub fn new(steps: Vec<InterpretedStep>) -> Self {
        Self { steps }
    }

    /// Parses `name` or `name=Display Name` entries.
    #[must_use]
    pub fn from_specs<I, S>(specs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let steps = specs
            .into_iter()
            .filter_map(|spec| {
                let spec = spec.as_ref();
                let (name, display) = match spec.split_once('=') {
                    Some((name, display)) => (name, Some(display.trim())),
                    None => (spec, None),
                };
                let name = name.trim();
                (!name.is_empty()).then(|| InterpretedStep {
                    function_name: name.to_string(),
                    display_name: display.filter(|d| !d.is_empty()).map(str::to_string),
                })
            })
            .collect();
        Self { steps }
    }
}

impl InterpretedOperationSource for StaticInterpretedSource {
    fn list(&self) -> anyhow::Result<Vec<InterpretedStep>> {
        Ok(self.steps.clone())
    }
}
