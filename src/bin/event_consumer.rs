use std::sync::Arc;

use async_trait::async_trait;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use order_service::config::Config;
use order_service::messaging::{
    EventHandler, EventRouter, KafkaEventConsumer, OrderEventEnvelope,
};

// ============================================================================
// Event Consumer - subscribes to all order lifecycle events and logs them
// ============================================================================

struct LoggingHandler;

#[async_trait]
impl EventHandler for LoggingHandler {
    async fn handle(&self, event: &OrderEventEnvelope) -> anyhow::Result<()> {
        tracing::info!(
            kind = event.kind.as_str(),
            order_id = event.order_id,
            data = %event.data,
            "event received"
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_service=debug")),
        )
        .init();

    let cfg = Config::load();
    tracing::info!("starting event consumer");

    let router = EventRouter::new().bind("order.*", Arc::new(LoggingHandler));
    let consumer = KafkaEventConsumer::new(
        &cfg.kafka.brokers,
        &cfg.kafka.consumer_group,
        &cfg.kafka.topic,
        router,
    )?;

    tracing::info!("consumer running, press ctrl-c to stop");

    tokio::select! {
        result = consumer.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }

    Ok(())
}
