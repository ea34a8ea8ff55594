//! Invocation, catalog and run-status messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::base::ErrorBody;
use crate::operation::OperationDefinition;
use crate::run::{RunRecord, RunState};
use crate::Args;

/// `POST /v1/invoke` body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvokeRequest {
    pub request_id: String,
    pub operation: String,
    /// Operation arguments; the context locator lives under `runContext`.
    pub args: Args,
}

/// Synchronous acknowledgement of an invocation.
///
/// For `queued` runs this is not the final result; poll the run status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeResponse {
    pub request_id: String,
    pub run_id: String,
    pub state: RunState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl From<&RunRecord> for InvokeResponse {
    fn from(record: &RunRecord) -> Self {
        Self {
            request_id: record.request_id.clone(),
            run_id: record.run_id.clone(),
            state: record.state,
            error: record.error().map(ErrorBody::from),
        }
    }
}

/// `GET /v1/catalog` payload, sorted by operation name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub operations: Vec<OperationDefinition>,
}

/// `GET /v1/runs/{runId}` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatusResponse {
    pub request_id: String,
    pub run_id: String,
    pub operation: String,
    pub state: RunState,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl From<&RunRecord> for RunStatusResponse {
    fn from(record: &RunRecord) -> Self {
        Self {
            request_id: record.request_id.clone(),
            run_id: record.run_id.clone(),
            operation: record.operation.clone(),
            state: record.state,
            created_at: record.created_at,
            error: record.error().map(ErrorBody::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn invoke_request_defaults_missing_fields() {
        let req: InvokeRequest = serde_json::from_value(json!({ "operation": "junit" })).unwrap();
        assert_eq!(req.operation, "junit");
        assert!(req.request_id.is_empty());
        assert!(req.args.is_empty());
    }

    #[test]
    fn invoke_response_from_failed_record() {
        let record = RunRecord {
            request_id: "req-1".to_string(),
            run_id: "rpc-abc".to_string(),
            operation: "nope".to_string(),
            state: RunState::Failed,
            created_at: Utc::now(),
            error_code: Some("operation_not_found".to_string()),
            error_message: Some("operation 'nope' was not found".to_string()),
        };
        let json = serde_json::to_value(InvokeResponse::from(&record)).unwrap();
        assert_eq!(json["requestId"], "req-1");
        assert_eq!(json["state"], "failed");
        assert_eq!(json["error"]["code"], "operation_not_found");
    }

    #[test]
    fn successful_status_omits_error() {
        let record = RunRecord {
            request_id: "req-1".to_string(),
            run_id: "rpc-abc".to_string(),
            operation: "junit".to_string(),
            state: RunState::Succeeded,
            created_at: Utc::now(),
            error_code: None,
            error_message: None,
        };
        let json = serde_json::to_value(RunStatusResponse::from(&record)).unwrap();
        assert_eq!(json["state"], "succeeded");
        assert!(json.get("error").is_none());
        assert!(json["createdAt"].is_string());
    }
}
