use std::sync::Arc;

use async_trait::async_trait;

use super::events::OrderEventEnvelope;

// ============================================================================
// Event Router - inbound demultiplexing with ack/requeue semantics
// ============================================================================
//
// Handlers are registered against topic-style routing patterns:
// - exact keys:       "order.created"
// - `*` matches exactly one segment:  "order.*"
// - `#` matches zero or more trailing segments: "order.#", "#"
//
// Dispatch decodes the envelope, runs every matching handler, and yields
// exactly one of two terminal outcomes per message: Ack (remove) or Requeue
// (redeliver). Malformed messages are requeued, not dropped - the fault may
// be transient version skew; dead-letter ceilings are operator policy.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ack,
    Requeue,
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &OrderEventEnvelope) -> anyhow::Result<()>;
}

/// Match a hierarchical routing key against a binding pattern.
pub fn pattern_matches(pattern: &str, key: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('.').collect();
    let key: Vec<&str> = key.split('.').collect();
    segments_match(&pattern, &key)
}

fn segments_match(pattern: &[&str], key: &[&str]) -> bool {
    match pattern.first() {
        None => key.is_empty(),
        Some(&"#") => {
            // `#` absorbs zero or more segments
            segments_match(&pattern[1..], key)
                || (!key.is_empty() && segments_match(pattern, &key[1..]))
        }
        Some(segment) => match key.first() {
            Some(k) => (*segment == "*" || segment == k) && segments_match(&pattern[1..], &key[1..]),
            None => false,
        },
    }
}

pub struct EventRouter {
    bindings: Vec<(String, Arc<dyn EventHandler>)>,
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRouter {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Register a handler for every message whose routing key matches
    /// `pattern`.
    pub fn bind(mut self, pattern: impl Into<String>, handler: Arc<dyn EventHandler>) -> Self {
        let pattern = pattern.into();
        tracing::info!(pattern = %pattern, "handler bound");
        self.bindings.push((pattern, handler));
        self
    }

    pub fn patterns(&self) -> Vec<&str> {
        self.bindings.iter().map(|(p, _)| p.as_str()).collect()
    }

    /// Decode and dispatch one message. Ack only if every matching handler
    /// succeeded; otherwise requeue so another attempt (or consumer) can
    /// process it.
    pub async fn dispatch(&self, routing_key: &str, body: &[u8]) -> Outcome {
        let envelope: OrderEventEnvelope = match serde_json::from_slice(body) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(
                    routing_key = %routing_key,
                    error = %err,
                    "malformed event, requeueing"
                );
                return Outcome::Requeue;
            }
        };

        for (pattern, handler) in &self.bindings {
            if !pattern_matches(pattern, routing_key) {
                continue;
            }

            if let Err(err) = handler.handle(&envelope).await {
                tracing::error!(
                    routing_key = %routing_key,
                    pattern = %pattern,
                    order_id = envelope.order_id,
                    error = %err,
                    "handler failed, requeueing"
                );
                return Outcome::Requeue;
            }
        }

        Outcome::Ack
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_exact_pattern_match() {
        assert!(pattern_matches("order.created", "order.created"));
        assert!(!pattern_matches("order.created", "order.cancelled"));
        assert!(!pattern_matches("order.created", "order"));
    }

    #[test]
    fn test_star_matches_exactly_one_segment() {
        assert!(pattern_matches("order.*", "order.created"));
        assert!(pattern_matches("order.*", "order.status_changed"));
        assert!(!pattern_matches("order.*", "order"));
        assert!(!pattern_matches("order.*", "order.created.v2"));
        assert!(!pattern_matches("order.*", "invoice.created"));
    }

    #[test]
    fn test_hash_matches_any_remainder() {
        assert!(pattern_matches("#", "order.created"));
        assert!(pattern_matches("order.#", "order.created"));
        assert!(pattern_matches("order.#", "order.created.v2"));
        assert!(pattern_matches("order.#", "order"));
        assert!(!pattern_matches("order.#", "invoice.created"));
    }

    struct CountingHandler {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingHandler {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl EventHandler for CountingHandler {
        async fn handle(&self, _event: &OrderEventEnvelope) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("handler rejected event");
            }
            Ok(())
        }
    }

    fn body(kind: &str) -> Vec<u8> {
        format!(r#"{{"type":"{kind}","order_id":1,"data":{{}}}}"#).into_bytes()
    }

    #[tokio::test]
    async fn test_dispatch_acks_when_all_handlers_succeed() {
        let exact = CountingHandler::new(false);
        let wildcard = CountingHandler::new(false);
        let router = EventRouter::new()
            .bind("order.created", exact.clone() as Arc<dyn EventHandler>)
            .bind("order.*", wildcard.clone() as Arc<dyn EventHandler>);

        let outcome = router.dispatch("order.created", &body("created")).await;

        assert_eq!(outcome, Outcome::Ack);
        assert_eq!(exact.calls.load(Ordering::SeqCst), 1);
        assert_eq!(wildcard.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispatch_requeues_on_handler_failure() {
        let failing = CountingHandler::new(true);
        let router =
            EventRouter::new().bind("order.*", failing.clone() as Arc<dyn EventHandler>);

        let outcome = router.dispatch("order.cancelled", &body("cancelled")).await;

        assert_eq!(outcome, Outcome::Requeue);
        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispatch_requeues_malformed_body_without_invoking_handlers() {
        let handler = CountingHandler::new(false);
        let router =
            EventRouter::new().bind("order.*", handler.clone() as Arc<dyn EventHandler>);

        let outcome = router.dispatch("order.created", b"not json").await;

        assert_eq!(outcome, Outcome::Requeue);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dispatch_acks_unmatched_messages() {
        let handler = CountingHandler::new(false);
        let router =
            EventRouter::new().bind("order.created", handler.clone() as Arc<dyn EventHandler>);

        let outcome = router.dispatch("order.cancelled", &body("cancelled")).await;

        assert_eq!(outcome, Outcome::Ack);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }
}
