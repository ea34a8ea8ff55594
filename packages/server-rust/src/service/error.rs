//! Service-level error taxonomy.
//!
//! Every variant carries a stable machine-readable code. Operation execution
//! failures are not errors at this level: they become terminal `failed` runs.

use steprpc_core::messages::ErrorBody;

/// Error codes surfaced on the wire.
pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const BAD_JSON: &str = "bad_json";
    pub const OPERATION_NOT_ALLOWED: &str = "operation_not_allowed";
    pub const OPERATION_NOT_FOUND: &str = "operation_not_found";
    pub const OPERATION_FAILED: &str = "operation_failed";
    pub const CONTEXT_NOT_FOUND: &str = "context_not_found";
    pub const NO_PENDING_REQUEST: &str = "no_pending_request";
    pub const RUN_NOT_FOUND: &str = "run_not_found";
    pub const INTERNAL: &str = "internal_error";
}

/// Coarse error category; decides the transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    PolicyDenied,
    Internal,
}

/// Errors returned synchronously by the invocation and bridge services.
///
/// None of these mutate the run store or the bridge queue.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("{message}")]
    Validation { code: &'static str, message: String },
    #[error("{message}")]
    NotFound { code: &'static str, message: String },
    #[error("operation '{operation}' is not in allowlist")]
    PolicyDenied { operation: String },
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl RpcError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Validation {
            code: codes::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn bad_json(message: impl Into<String>) -> Self {
        Self::Validation {
            code: codes::BAD_JSON,
            message: message.into(),
        }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::PolicyDenied { .. } => ErrorKind::PolicyDenied,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { code, .. } | Self::NotFound { code, .. } => code,
            Self::PolicyDenied { .. } => codes::OPERATION_NOT_ALLOWED,
            Self::Internal(_) => codes::INTERNAL,
        }
    }

    /// Wire form of this error.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody::new(self.code(), self.to_string())
    }
}
