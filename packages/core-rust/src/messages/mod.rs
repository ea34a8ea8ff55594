//! Wire message schemas for the Step RPC v1 API.
//!
//! All structs use `#[serde(rename_all = "camelCase")]`. Request types
//! default missing fields so that blank-field validation happens in the
//! service layer with a proper error code rather than as a parse failure.

pub mod base;
pub mod bridge;
pub mod invoke;

pub use base::{ErrorBody, ErrorResponse, HealthResponse, ServiceIndex};
pub use bridge::{BridgeCompleteRequest, BridgeCompleteResponse, BridgePendingResponse, CompletionError};
pub use invoke::{CatalogResponse, InvokeRequest, InvokeResponse, RunStatusResponse};
