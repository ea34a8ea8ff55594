//! Per-target-context FIFO of pending bridge requests.

use std::collections::VecDeque;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use steprpc_core::PendingBridgeRequest;
use tracing::debug;

/// Hand-off queue between invokers and the execution contexts that poll it.
///
/// Requests for one context are exposed in enqueue order. Polling does not
/// remove anything; only [`BridgeQueue::complete`] does, and it addresses the
/// item by `run_id` so a context may acknowledge items out of arrival order.
#[derive(Debug, Default)]
pub struct BridgeQueue {
    by_target: DashMap<String, VecDeque<PendingBridgeRequest>>,
    /// Owning context of every live `run_id`.
    target_by_run: DashMap<String, String>,
}

impl BridgeQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `request` to the tail of its target context's queue.
    pub fn enqueue(&self, request: PendingBridgeRequest) {
        let target = request.target_context_id.clone();
        let run_id = request.run_id.clone();
        debug!(run_id = %run_id, target = %target, operation = %request.operation, "bridge request enqueued");

        self.by_target
            .entry(target.clone())
            .or_default()
            .push_back(request);
        // Recorded after the push: a completion racing ahead of this line
        // finds nothing and leaves the item in place for a retry.
        self.target_by_run.insert(run_id, target);
    }

    /// Returns the head of `target_context_id`'s queue without removing it.
    #[must_use]
    pub fn peek_next(&self, target_context_id: &str) -> Option<PendingBridgeRequest> {
        self.by_target
            .get(target_context_id)
            .and_then(|queue| queue.front().cloned())
    }

    /// Removes the pending request for `run_id`, wherever it sits in its queue.
    ///
    /// Returns `None` when the run is unknown or was already completed. A
    /// queue left empty is dropped so idle contexts hold no memory.
    pub fn complete(&self, run_id: &str) -> Option<PendingBridgeRequest> {
        let (_, target) = self.target_by_run.remove(run_id)?;

        let Entry::Occupied(mut entry) = self.by_target.entry(target) else {
            return None;
        };
        let queue = entry.get_mut();
        let removed = queue
            .iter()
            .position(|r| r.run_id == run_id)
            .and_then(|pos| queue.remove(pos));
        if queue.is_empty() {
            entry.remove();
        }

        if let Some(ref req) = removed {
            debug!(run_id = %run_id, target = %req.target_context_id, "bridge request completed");
        }
        removed
    }

    /// Number of pending requests for one context.
    #[must_use]
    pub fn pending_count(&self, target_context_id: &str) -> usize {
        self.by_target
            .get(target_context_id)
            .map_or(0, |queue| queue.len())
    }

    /// Number of contexts with at least one pending request.
    #[must_use]
    pub fn context_count(&self) -> usize {
        self.by_target.len()
    }

    /// Total pending requests across all contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.target_by_run.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.target_by_run.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    fn req(request_id: &str, run_id: &str, target: &str) -> PendingBridgeRequest {
        let mut args = serde_json::Map::new();
        args.insert("testResults".to_string(), json!("**/*.xml"));
        PendingBridgeRequest {
            request_id: request_id.to_string(),
            run_id: run_id.to_string(),
            operation: "junit".to_string(),
            args,
            target_context_id: target.to_string(),
        }
    }

    #[test]
    fn enqueue_poll_complete_lifecycle() {
        let queue = BridgeQueue::new();
        queue.enqueue(req("req-1", "rpc-1", "demo#1"));

        let pending = queue.peek_next("demo#1").unwrap();
        assert_eq!(pending.run_id, "rpc-1");

        let completed = queue.complete("rpc-1").unwrap();
        assert_eq!(completed.request_id, "req-1");
        assert!(queue.peek_next("demo#1").is_none());
        assert!(queue.complete("rpc-1").is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn peek_is_idempotent() {
        let queue = BridgeQueue::new();
        queue.enqueue(req("req-1", "rpc-1", "demo#1"));
        assert_eq!(queue.peek_next("demo#1"), queue.peek_next("demo#1"));
        assert_eq!(queue.pending_count("demo#1"), 1);
    }

    #[test]
    fn unknown_run_returns_none() {
        let queue = BridgeQueue::new();
        assert!(queue.complete("nonexistent").is_none());
        assert!(queue.peek_next("demo#1").is_none());
    }

    #[test]
    fn fifo_within_one_context() {
        let queue = BridgeQueue::new();
        queue.enqueue(req("req-1", "rpc-1", "demo#1"));
        queue.enqueue(req("req-2", "rpc-2", "demo#1"));

        assert_eq!(queue.peek_next("demo#1").unwrap().request_id, "req-1");
        queue.complete("rpc-1");
        assert_eq!(queue.peek_next("demo#1").unwrap().request_id, "req-2");
    }

    #[test]
    fn completion_out_of_arrival_order() {
        let queue = BridgeQueue::new();
        queue.enqueue(req("req-1", "rpc-1", "demo#1"));
        queue.enqueue(req("req-2", "rpc-2", "demo#1"));
        queue.enqueue(req("req-3", "rpc-3", "demo#1"));

        assert_eq!(queue.complete("rpc-2").unwrap().request_id, "req-2");
        assert_eq!(queue.peek_next("demo#1").unwrap().request_id, "req-1");
        queue.complete("rpc-1");
        assert_eq!(queue.peek_next("demo#1").unwrap().request_id, "req-3");
    }

    #[test]
    fn contexts_are_isolated() {
        let queue = BridgeQueue::new();
        queue.enqueue(req("req-a", "rpc-a", "demo#1"));
        queue.enqueue(req("req-b", "rpc-b", "demo#2"));

        assert_eq!(queue.peek_next("demo#2").unwrap().request_id, "req-b");
        queue.complete("rpc-a");
        assert!(queue.peek_next("demo#1").is_none());
        assert_eq!(queue.pending_count("demo#2"), 1);
    }

    #[test]
    fn drained_context_is_removed() {
        let queue = BridgeQueue::new();
        queue.enqueue(req("req-1", "rpc-1", "demo#1"));
        queue.enqueue(req("req-2", "rpc-2", "demo#2"));
        assert_eq!(queue.context_count(), 2);

        queue.complete("rpc-1");
        assert_eq!(queue.context_count(), 1);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn concurrent_enqueue_and_complete() {
        let queue = Arc::new(BridgeQueue::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let run_id = format!("rpc-{t}-{i}");
                        queue.enqueue(req("req", &run_id, &format!("ctx-{}", t % 3)));
                    }
                    for i in 0..100 {
                        assert!(queue.complete(&format!("rpc-{t}-{i}")).is_some());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(queue.is_empty());
        assert_eq!(queue.context_count(), 0);
    }

    proptest! {
        #[test]
        fn poll_order_matches_enqueue_order(count in 1usize..20) {
            let queue = BridgeQueue::new();
            for i in 0..count {
                queue.enqueue(req(&format!("req-{i}"), &format!("rpc-{i}"), "ctx"));
            }
            for i in 0..count {
                let head = queue.peek_next("ctx").unwrap();
                prop_assert_eq!(head.run_id, format!("rpc-{i}"));
                let run_id = format!("rpc-{i}");
                prop_assert!(queue.complete(&run_id).is_some());
            }
            prop_assert!(queue.peek_next("ctx").is_none());
        }
    }
}
