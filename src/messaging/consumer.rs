use std::time::Duration;

use futures_util::StreamExt;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Message};
use rdkafka::Offset;

use super::router::{EventRouter, Outcome};

// ============================================================================
// Kafka Event Consumer - at-least-once worker loop
// ============================================================================
//
// Auto-commit is disabled; offsets advance only after the router acks a
// message. Messages are pulled and handled strictly one at a time, so at
// most one unacknowledged message is in flight per consumer. A requeued
// message rewinds the partition to its own offset and is redelivered.
//
// ============================================================================

pub struct KafkaEventConsumer {
    consumer: StreamConsumer,
    router: EventRouter,
}

impl KafkaEventConsumer {
    pub fn new(
        brokers: &str,
        group: &str,
        topic: &str,
        router: EventRouter,
    ) -> anyhow::Result<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .create()?;

        consumer.subscribe(&[topic])?;

        tracing::info!(
            brokers = %brokers,
            group = %group,
            topic = %topic,
            patterns = ?router.patterns(),
            "consumer subscribed"
        );

        Ok(Self { consumer, router })
    }

    /// Run the worker loop until the stream ends or the task is cancelled.
    pub async fn run(self) -> anyhow::Result<()> {
        let mut stream = self.consumer.stream();

        while let Some(result) = stream.next().await {
            match result {
                Ok(message) => self.process(&message).await,
                Err(err) => {
                    tracing::error!(error = %err, "failed to receive message");
                }
            }
        }

        tracing::info!("consumer stream ended");
        Ok(())
    }

    async fn process(&self, message: &BorrowedMessage<'_>) {
        let routing_key = message
            .key()
            .map(|key| String::from_utf8_lossy(key).into_owned())
            .unwrap_or_default();
        let body = message.payload().unwrap_or_default();

        tracing::debug!(
            routing_key = %routing_key,
            partition = message.partition(),
            offset = message.offset(),
            "received message"
        );

        match self.router.dispatch(&routing_key, body).await {
            Outcome::Ack => {
                if let Err(err) = self.consumer.commit_message(message, CommitMode::Async) {
                    tracing::warn!(
                        offset = message.offset(),
                        error = %err,
                        "failed to commit offset (message may be redelivered)"
                    );
                }
            }
            Outcome::Requeue => {
                // Rewind so the same message is polled again; uncommitted, so
                // a crash here also redelivers it.
                if let Err(err) = self.consumer.seek(
                    message.topic(),
                    message.partition(),
                    Offset::Offset(message.offset()),
                    Duration::from_secs(5),
                ) {
                    tracing::error!(
                        offset = message.offset(),
                        error = %err,
                        "failed to rewind for requeue"
                    );
                }
                // Brief pause before redelivery
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }
}
