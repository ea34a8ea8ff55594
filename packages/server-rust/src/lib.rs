//! Step RPC server: invoke named operations inside running execution
//! contexts, either directly or through a poll-based bridge.

pub mod app;
pub mod audit;
pub mod local;
pub mod network;
pub mod service;
pub mod storage;
pub mod traits;

pub use app::StepRpc;
pub use audit::Caller;
pub use network::{NetworkConfig, NetworkModule};
pub use service::{RpcError, StepRpcConfig};
