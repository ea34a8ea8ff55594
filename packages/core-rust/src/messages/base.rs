//! Message types shared by every endpoint.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::run::RunError;

/// Error payload carried by failed runs and by error responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
}

impl ErrorBody {
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: BTreeMap::new(),
        }
    }
}

impl From<RunError> for ErrorBody {
    fn from(err: RunError) -> Self {
        Self::new(err.code, err.message)
    }
}

/// Top-level body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// `GET /v1/` health payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub api_version: String,
    pub service: String,
    pub status: String,
}

/// Root index listing the API versions served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceIndex {
    pub service: String,
    pub version: String,
    pub status: String,
    pub api: Vec<String>,
}
