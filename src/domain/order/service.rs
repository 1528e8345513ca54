use std::sync::Arc;

use rust_decimal::Decimal;

use crate::messaging::{EventPublisher, OrderEventEnvelope};
use crate::metrics::Metrics;
use crate::repository::OrderRepository;

use super::errors::OrderError;
use super::model::{NewOrderItem, Order};
use super::transitions::is_transition_allowed;
use super::value_objects::OrderStatus;

pub const DEFAULT_PAGE_LIMIT: i64 = 10;

// ============================================================================
// Order Service - the aggregate manager
// ============================================================================
//
// Orchestrates: validate -> consult transition table -> persist -> emit.
// Persistence failure aborts the operation and surfaces. Emission is
// best-effort: a publish failure is logged with enough context to replay
// manually and never propagates to the caller - `emit` returns `()`, and
// `PublishError` has no conversion into `OrderError`.
//
// ============================================================================

pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    publisher: Arc<dyn EventPublisher>,
    metrics: Arc<Metrics>,
}

/// Clamp caller-supplied paging values, falling back to defaults rather than
/// erroring on invalid input.
pub fn page_params(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_PAGE_LIMIT);
    let offset = offset.filter(|o| *o >= 0).unwrap_or(0);
    (limit, offset)
}

impl OrderService {
    pub fn new(
        repo: Arc<dyn OrderRepository>,
        publisher: Arc<dyn EventPublisher>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            repo,
            publisher,
            metrics,
        }
    }

    /// Create an order in `pending` status with its items in one atomic
    /// step, then announce it.
    pub async fn create_order(
        &self,
        customer_id: i64,
        items: Vec<NewOrderItem>,
    ) -> Result<Order, OrderError> {
        validate_items(&items)?;

        let order = self.repo.create(customer_id, items).await?;

        tracing::info!(
            order_id = order.id,
            customer_id = order.customer_id,
            total_amount = %order.total_amount,
            "order created"
        );
        self.metrics.orders_created.inc();

        self.emit(OrderEventEnvelope::created(&order)).await;
        Ok(order)
    }

    pub async fn get_order(&self, id: i64) -> Result<Order, OrderError> {
        self.repo.get_by_id(id).await
    }

    pub async fn list_orders_by_customer(
        &self,
        customer_id: i64,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Order>, OrderError> {
        let (limit, offset) = page_params(limit, offset);
        self.repo.list_by_customer(customer_id, limit, offset).await
    }

    /// Apply a sanctioned status transition and announce it. Returns the
    /// re-read order so the snapshot reflects storage truth.
    pub async fn update_order_status(
        &self,
        id: i64,
        new_status: OrderStatus,
    ) -> Result<Order, OrderError> {
        let order = self.repo.get_by_id(id).await?;

        if !is_transition_allowed(order.status, new_status) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: new_status,
            });
        }

        self.repo.update_status(id, order.status, new_status).await?;

        tracing::info!(
            order_id = id,
            from = %order.status,
            to = %new_status,
            "order status changed"
        );
        self.metrics
            .status_changes
            .with_label_values(&[order.status.as_str(), new_status.as_str()])
            .inc();

        self.emit(OrderEventEnvelope::status_changed(id, order.status, new_status))
            .await;

        self.repo.get_by_id(id).await
    }

    /// Cancel an order still in `pending` or `confirmed`.
    pub async fn cancel_order(&self, id: i64) -> Result<(), OrderError> {
        let order = self.repo.get_by_id(id).await?;

        if !is_transition_allowed(order.status, OrderStatus::Cancelled) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Cancelled,
            });
        }

        self.repo
            .update_status(id, order.status, OrderStatus::Cancelled)
            .await?;

        tracing::info!(order_id = id, "order cancelled");
        self.metrics.orders_cancelled.inc();

        self.emit(OrderEventEnvelope::cancelled(id)).await;
        Ok(())
    }

    /// Hand the fact to the bus. The domain mutation has already committed;
    /// a failure here is logged with the serialized payload for manual
    /// replay and swallowed.
    async fn emit(&self, envelope: OrderEventEnvelope) {
        match self.publisher.publish(&envelope).await {
            Ok(()) => {
                self.metrics
                    .events_published
                    .with_label_values(&[envelope.kind.as_str()])
                    .inc();
            }
            Err(err) => {
                let payload = serde_json::to_string(&envelope).unwrap_or_default();
                tracing::error!(
                    kind = envelope.kind.as_str(),
                    order_id = envelope.order_id,
                    error = %err,
                    payload = %payload,
                    "failed to publish lifecycle event"
                );
                self.metrics
                    .events_publish_failed
                    .with_label_values(&[envelope.kind.as_str()])
                    .inc();
            }
        }
    }
}

fn validate_items(items: &[NewOrderItem]) -> Result<(), OrderError> {
    if items.is_empty() {
        return Err(OrderError::Validation(
            "order must contain at least one item".to_string(),
        ));
    }

    for item in items {
        if item.price < Decimal::ZERO {
            return Err(OrderError::Validation(format!(
                "item '{}' has a negative price",
                item.name
            )));
        }
        if item.quantity < 1 {
            return Err(OrderError::Validation(format!(
                "item '{}' has a non-positive quantity",
                item.name
            )));
        }
    }

    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================
