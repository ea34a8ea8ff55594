//! Bridge poller API: pending and complete.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use steprpc_core::messages::{BridgeCompleteRequest, BridgeCompleteResponse, BridgePendingResponse};

use super::extract::{JsonBody, QueryParams};
use super::AppState;
use crate::audit::Caller;
use crate::service::RpcError;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PendingQuery {
    #[serde(rename = "runExternalizableId", alias = "contextId")]
    pub target: Option<String>,
}

pub async fn pending_handler(
    State(state): State<AppState>,
    caller: Caller,
    QueryParams(query): QueryParams<PendingQuery>,
) -> Result<Json<BridgePendingResponse>, RpcError> {
    let target = query.target.unwrap_or_default();
    state.rpc.bridge.pending(&caller, &target).map(Json)
}

pub async fn complete_handler(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(request): JsonBody<BridgeCompleteRequest>,
) -> Result<Json<BridgeCompleteResponse>, RpcError> {
    state.rpc.bridge.complete(&caller, request).map(Json)
}
