//! In-memory state shared across invocations.
//!
//! - [`BridgeQueue`]: per-context FIFO of work waiting for a bridge poller
//! - [`RunStore`]: authoritative status record of every accepted invocation
//!
//! Both live for the process lifetime only. Each method is individually safe
//! for concurrent callers; no external locking is required.

pub mod bridge_queue;
pub mod run_store;

pub use bridge_queue::BridgeQueue;
pub use run_store::RunStore;
