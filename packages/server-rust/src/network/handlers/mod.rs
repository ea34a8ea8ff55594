//! axum handlers for the Step RPC HTTP surface.
//!
//! `AppState` carries the services into every handler. Handlers stay thin:
//! extract, call one service method, serialize.

pub mod api;
pub mod bridge;
pub mod error;
pub mod extract;
pub mod health;

pub use api::{
    catalog_handler, index_handler, invoke_handler, missing_run_id_handler, run_status_handler,
    v1_health_handler,
};
pub use bridge::{complete_handler, pending_handler};
pub use health::{health_handler, liveness_handler, readiness_handler};

use std::sync::Arc;
use std::time::Instant;

use super::ShutdownController;
use crate::StepRpc;

/// Service name reported by the index and health endpoints.
pub const SERVICE_NAME: &str = "steprpc-server";

/// Shared state passed to all handlers via `State` extraction.
#[derive(Clone)]
pub struct AppState {
    pub rpc: StepRpc,
    pub shutdown: Arc<ShutdownController>,
    /// Process start, for uptime reporting.
    pub start_time: Instant,
}
