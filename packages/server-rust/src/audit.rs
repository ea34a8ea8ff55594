//! Structured audit trail for invocations and bridge traffic.
//!
//! Each event renders as one `action=<a> caller=<c> key=value ...` line on
//! the `steprpc::audit` tracing target. Args are always redacted first.

use std::fmt;

use steprpc_core::{redact_args, Args};
use tracing::info;

/// Tracing target of every audit line.
pub const AUDIT_TARGET: &str = "steprpc::audit";

/// Caller identity used when the transport carries none.
pub const ANONYMOUS: &str = "anonymous";

/// Authenticated identity of whoever issued a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(String);

impl Caller {
    /// Falls back to [`ANONYMOUS`] for a missing or blank identity.
    #[must_use]
    pub fn new(identity: Option<&str>) -> Self {
        match identity.map(str::trim) {
            Some(id) if !id.is_empty() => Self(id.to_string()),
            _ => Self::anonymous(),
        }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self(ANONYMOUS.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Audited actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    InvokeStart,
    InvokeComplete,
    BridgePending,
    BridgeComplete,
}

impl AuditAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvokeStart => "invoke.start",
            Self::InvokeComplete => "invoke.complete",
            Self::BridgePending => "bridge.pending",
            Self::BridgeComplete => "bridge.complete",
        }
    }
}

/// One audit line under construction.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    action: AuditAction,
    caller: String,
    fields: Vec<(&'static str, String)>,
}

impl AuditEvent {
    #[must_use]
    pub fn new(action: AuditAction, caller: &Caller) -> Self {
        Self {
            action,
            caller: caller.as_str().to_string(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        self.fields.push((key, value.to_string()));
        self
    }

    /// Appends `args=<json>` with sensitive values masked.
    #[must_use]
    pub fn args(self, args: &Args) -> Self {
        let redacted = serde_json::Value::Object(redact_args(args));
        self.field("args", redacted)
    }

    #[must_use]
    pub fn line(&self) -> String {
        let mut line = format!("action={} caller={}", self.action.as_str(), self.caller);
        for (key, value) in &self.fields {
            line.push(' ');
            line.push_str(key);
            line.push('=');
            line.push_str(value);
        }
        line
    }

    pub fn emit(self) {
        info!(target: AUDIT_TARGET, action = self.action.as_str(), "{}", self.line());
    }
}
