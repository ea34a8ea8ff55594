//! Context locator: identifies which running execution an invocation targets.
//!
//! The locator travels inside the invocation args under [`RUN_CONTEXT_KEY`]
//! and is parsed into a tagged union before dispatch, so malformed
//! combinations are rejected before any execution attempt.

use serde_json::Value;

use crate::Args;

/// Reserved args key holding the context locator object.
pub const RUN_CONTEXT_KEY: &str = "runContext";

/// Where an operation must run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextLocator {
    /// A direct handle to the running context.
    ByHandle {
        context_handle: String,
        node_name: String,
        workspace: String,
    },
    /// The context's job name and build number.
    ByCoordinates {
        context_name: String,
        build_number: u64,
        node_name: String,
        workspace: String,
    },
}

/// Errors from parsing a context locator out of invocation args.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocatorError {
    #[error("args.{RUN_CONTEXT_KEY} is required")]
    Missing,
    #[error("args.{RUN_CONTEXT_KEY} must be an object")]
    NotAnObject,
    #[error("args.{RUN_CONTEXT_KEY}.nodeName and args.{RUN_CONTEXT_KEY}.workspace are required")]
    MissingPlacement,
    #[error(
        "args.{RUN_CONTEXT_KEY} must include either contextHandle or contextName/buildNumber plus nodeName/workspace"
    )]
    Incomplete,
}

impl ContextLocator {
    /// Parses the locator embedded in `args`.
    ///
    /// A non-blank `contextHandle` selects [`ContextLocator::ByHandle`] and
    /// then only requires `nodeName` and `workspace`. Otherwise all four
    /// coordinate fields are required. The legacy names
    /// `runExternalizableId` and `jobFullName` are accepted as aliases.
    ///
    /// # Errors
    ///
    /// Returns a [`LocatorError`] describing the first missing requirement.
    pub fn from_args(args: &Args) -> Result<Self, LocatorError> {
        let value = args.get(RUN_CONTEXT_KEY).ok_or(LocatorError::Missing)?;
        let Value::Object(fields) = value else {
            return Err(LocatorError::NotAnObject);
        };

        let handle = text_field(fields, &["contextHandle", "runExternalizableId"]);
        let name = text_field(fields, &["contextName", "jobFullName"]);
        let build_number = fields.get("buildNumber").and_then(parse_build_number);
        let node_name = text_field(fields, &["nodeName"]);
        let workspace = text_field(fields, &["workspace"]);

        if let Some(context_handle) = handle {
            let (Some(node_name), Some(workspace)) = (node_name, workspace) else {
                return Err(LocatorError::MissingPlacement);
            };
            return Ok(Self::ByHandle {
                context_handle,
                node_name,
                workspace,
            });
        }

        match (name, build_number, node_name, workspace) {
            (Some(context_name), Some(build_number), Some(node_name), Some(workspace)) => {
                Ok(Self::ByCoordinates {
                    context_name,
                    build_number,
                    node_name,
                    workspace,
                })
            }
            _ => Err(LocatorError::Incomplete),
        }
    }

    #[must_use]
    pub fn node_name(&self) -> &str {
        match self {
            Self::ByHandle { node_name, .. } | Self::ByCoordinates { node_name, .. } => node_name,
        }
    }

    #[must_use]
    pub fn workspace(&self) -> &str {
        match self {
            Self::ByHandle { workspace, .. } | Self::ByCoordinates { workspace, .. } => workspace,
        }
    }
}

/// Returns a copy of `args` without the locator entry.
#[must_use]
pub fn operation_args(args: &Args) -> Args {
    args.iter()
        .filter(|(key, _)| key.as_str() != RUN_CONTEXT_KEY)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn text_field(fields: &Args, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match fields.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_build_number(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            // JSON clients that only know doubles send `7.0`.
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(f))
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
