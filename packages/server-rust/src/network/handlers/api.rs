//! Client API: index, v1 health, catalog, invoke and run status.

use axum::extract::{Path, State};
use axum::Json;
use steprpc_core::messages::{
    CatalogResponse, HealthResponse, InvokeRequest, InvokeResponse, RunStatusResponse,
    ServiceIndex,
};

use super::extract::JsonBody;
use super::{AppState, SERVICE_NAME};
use crate::audit::Caller;
use crate::service::RpcError;

pub async fn index_handler() -> Json<ServiceIndex> {
    Json(ServiceIndex {
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "ok".to_string(),
        api: vec!["v1".to_string()],
    })
}

pub async fn v1_health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        api_version: "v1".to_string(),
        service: SERVICE_NAME.to_string(),
        status: "ok".to_string(),
    })
}

pub async fn catalog_handler(State(state): State<AppState>) -> Json<CatalogResponse> {
    Json(state.rpc.invocations.catalog())
}

/// `200` with the run outcome, including `failed` runs.
pub async fn invoke_handler(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(request): JsonBody<InvokeRequest>,
) -> Result<Json<InvokeResponse>, RpcError> {
    state.rpc.invocations.invoke(&caller, request).await.map(Json)
}

pub async fn run_status_handler(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<RunStatusResponse>, RpcError> {
    state.rpc.invocations.run_status(&run_id).map(Json)
}

/// `/v1/runs` without an id.
pub async fn missing_run_id_handler(
    State(state): State<AppState>,
) -> Result<Json<RunStatusResponse>, RpcError> {
    state.rpc.invocations.run_status("").map(Json)
}
