use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::order::{Order, OrderStatus};

// ============================================================================
// Order Lifecycle Events - wire contract
// ============================================================================
//
// Envelope: {"type": "<kind>", "order_id": <integer>, "data": {...}}
// Routing key: "order.<kind>", so subscribers may bind exact keys or
// wildcard patterns such as "order.*".
//
// Envelopes are immutable once constructed; construction is complete before
// the envelope is handed to a publisher.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Created,
    StatusChanged,
    Cancelled,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Created => "created",
            EventKind::StatusChanged => "status_changed",
            EventKind::Cancelled => "cancelled",
        }
    }

    /// Hierarchical routing key, e.g. `order.status_changed`.
    pub fn routing_key(self) -> String {
        format!("order.{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEventEnvelope {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub order_id: i64,
    pub data: serde_json::Value,
}

impl OrderEventEnvelope {
    /// Fact: an order was created. Carries a snapshot of the order at the
    /// moment of the fact.
    pub fn created(order: &Order) -> Self {
        Self {
            kind: EventKind::Created,
            order_id: order.id,
            data: json!({
                "order_id": order.id,
                "customer_id": order.customer_id,
                "status": order.status,
                "total_amount": order.total_amount,
                "items": order.items,
                "created_at": order.created_at,
            }),
        }
    }

    /// Fact: an order moved from `old` to `new`.
    pub fn status_changed(order_id: i64, old: OrderStatus, new: OrderStatus) -> Self {
        Self {
            kind: EventKind::StatusChanged,
            order_id,
            data: json!({
                "order_id": order_id,
                "old_status": old,
                "new_status": new,
                "changed_at": Utc::now(),
            }),
        }
    }

    /// Fact: an order was cancelled.
    pub fn cancelled(order_id: i64) -> Self {
        Self {
            kind: EventKind::Cancelled,
            order_id,
            data: json!({
                "order_id": order_id,
                "cancelled_at": Utc::now(),
            }),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_keys() {
        assert_eq!(EventKind::Created.routing_key(), "order.created");
        assert_eq!(EventKind::StatusChanged.routing_key(), "order.status_changed");
        assert_eq!(EventKind::Cancelled.routing_key(), "order.cancelled");
    }

    #[test]
    fn test_envelope_wire_shape() {
        let envelope = OrderEventEnvelope::status_changed(
            7,
            OrderStatus::Pending,
            OrderStatus::Confirmed,
        );

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["type"], "status_changed");
        assert_eq!(value["order_id"], 7);
        assert_eq!(value["data"]["old_status"], "pending");
        assert_eq!(value["data"]["new_status"], "confirmed");
    }

    #[test]
    fn test_envelope_decodes_from_wire_json() {
        let raw = r#"{"type":"cancelled","order_id":12,"data":{"order_id":12}}"#;
        let envelope: OrderEventEnvelope = serde_json::from_str(raw).unwrap();

        assert_eq!(envelope.kind, EventKind::Cancelled);
        assert_eq!(envelope.order_id, 12);
    }

    #[test]
    fn test_malformed_envelope_is_rejected() {
        let raw = r#"{"type":"exploded","order_id":12,"data":{}}"#;
        assert!(serde_json::from_str::<OrderEventEnvelope>(raw).is_err());
    }
}
