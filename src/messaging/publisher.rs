use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};

use crate::utils::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState};

use super::events::OrderEventEnvelope;

// ============================================================================
// Event Publisher - outbound handoff to the bus
// ============================================================================
//
// Delivery is at-most-once from the core's point of view: the caller awaits
// only the local handoff, bounded by the producer timeouts, and a failed
// publish never invalidates the domain mutation that triggered it. Callers
// needing guaranteed delivery must add an outbox layer outside this core.
//
// `PublishError` has no conversion into `OrderError`; keeping the two error
// types incompatible keeps the "never rolls back" contract compiler-checked.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("event bus unavailable (circuit open)")]
    CircuitOpen,

    #[error("event bus rejected publish: {0}")]
    Transport(String),
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, envelope: &OrderEventEnvelope) -> Result<(), PublishError>;
}

/// Kafka-backed publisher. One shared producer handles concurrent publish
/// calls; rdkafka's producer handle is safe for use from many tasks, and the
/// circuit breaker serializes only its own state bookkeeping.
pub struct KafkaEventPublisher {
    producer: FutureProducer,
    topic: String,
    circuit_breaker: CircuitBreaker,
}

impl KafkaEventPublisher {
    pub fn new(brokers: &str, topic: &str) -> anyhow::Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        tracing::info!(brokers = %brokers, topic = %topic, "event publisher connected");

        Ok(Self {
            producer,
            topic: topic.to_string(),
            circuit_breaker: CircuitBreaker::new(CircuitBreakerConfig::default()),
        })
    }

    pub async fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state().await
    }
}

#[async_trait]
impl EventPublisher for KafkaEventPublisher {
    async fn publish(&self, envelope: &OrderEventEnvelope) -> Result<(), PublishError> {
        let body = serde_json::to_string(envelope)?;
        let routing_key = envelope.kind.routing_key();
        let order_id = envelope.order_id.to_string();

        // Headers allow subscribers to filter without deserializing the body
        let headers = OwnedHeaders::new()
            .insert(Header {
                key: "event_type",
                value: Some(envelope.kind.as_str()),
            })
            .insert(Header {
                key: "order_id",
                value: Some(order_id.as_str()),
            });

        let result = self
            .circuit_breaker
            .call(async {
                let record = FutureRecord::to(&self.topic)
                    .key(&routing_key)
                    .payload(&body)
                    .headers(headers);

                self.producer
                    .send(record, rdkafka::util::Timeout::After(Duration::from_secs(5)))
                    .await
                    .map_err(|(err, _)| err.to_string())?;

                Ok::<(), String>(())
            })
            .await;

        match result {
            Ok(()) => {
                tracing::info!(
                    topic = %self.topic,
                    routing_key = %routing_key,
                    order_id = envelope.order_id,
                    "event published"
                );
                Ok(())
            }
            Err(CircuitBreakerError::CircuitOpen) => Err(PublishError::CircuitOpen),
            Err(CircuitBreakerError::OperationFailed(reason)) => {
                Err(PublishError::Transport(reason))
            }
        }
    }
}
