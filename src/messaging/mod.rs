// ============================================================================
// Messaging - outbound event emission and inbound event routing
// ============================================================================

pub mod consumer;
pub mod events;
pub mod publisher;
pub mod router;

pub use consumer::KafkaEventConsumer;
pub use events::{EventKind, OrderEventEnvelope};
pub use publisher::{EventPublisher, KafkaEventPublisher, PublishError};
pub use router::{EventHandler, EventRouter, Outcome};
