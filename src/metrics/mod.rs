use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

// ============================================================================
// Metrics - Prometheus counters for the order lifecycle
// ============================================================================
//
// Registered against a local registry and scraped via GET /metrics on the
// API server. Event emission failures get their own counter so best-effort
// delivery stays observable even though it never surfaces to callers.
//
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub orders_created: IntCounter,
    pub orders_cancelled: IntCounter,
    pub status_changes: IntCounterVec,
    pub events_published: IntCounterVec,
    pub events_publish_failed: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_created =
            IntCounter::new("orders_created_total", "Total orders created")?;
        registry.register(Box::new(orders_created.clone()))?;

        let orders_cancelled =
            IntCounter::new("orders_cancelled_total", "Total orders cancelled")?;
        registry.register(Box::new(orders_cancelled.clone()))?;

        let status_changes = IntCounterVec::new(
            Opts::new("order_status_changes_total", "Status transitions applied"),
            &["from", "to"],
        )?;
        registry.register(Box::new(status_changes.clone()))?;

        let events_published = IntCounterVec::new(
            Opts::new("order_events_published_total", "Lifecycle events published"),
            &["kind"],
        )?;
        registry.register(Box::new(events_published.clone()))?;

        let events_publish_failed = IntCounterVec::new(
            Opts::new(
                "order_events_publish_failed_total",
                "Lifecycle events that failed to publish",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(events_publish_failed.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            orders_cancelled,
            status_changes,
            events_published,
            events_publish_failed,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_reach_exposition_output() {
        let metrics = Metrics::new().unwrap();
        metrics.orders_created.inc();
        metrics
            .events_published
            .with_label_values(&["created"])
            .inc();

        let output = metrics.encode().unwrap();
        assert!(output.contains("orders_created_total 1"));
        assert!(output.contains("order_events_published_total{kind=\"created\"} 1"));
    }
}
