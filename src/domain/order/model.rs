use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::pricing;
use super::value_objects::OrderStatus;

// ============================================================================
// Order Model
// ============================================================================

/// A purchase order with its line items. `total_amount` is always derived
/// from the items' subtotals; it is never set independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item. `order_id` is a back-reference only; the order owns its
/// items. `subtotal` is always recomputed from `price` and `quantity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub subtotal: Decimal,
}

/// Caller-supplied shape for one item at order creation. Items cannot be
/// added after creation; mutation is limited to status transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
}

impl OrderItem {
    pub fn recompute_subtotal(&mut self) {
        self.subtotal = pricing::subtotal(self.price, self.quantity);
    }
}

impl Order {
    /// Re-derive every item subtotal and the order total. Called after
    /// construction and after every read from storage.
    pub fn recompute_totals(&mut self) {
        for item in &mut self.items {
            item.recompute_subtotal();
        }
        self.total_amount = pricing::order_total(&self.items);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recompute_totals_repairs_drifted_values() {
        let mut order = Order {
            id: 1,
            customer_id: 42,
            status: OrderStatus::Pending,
            // Stored values drifted; recompute must repair them.
            total_amount: Decimal::new(99999, 2),
            items: vec![OrderItem {
                id: 1,
                order_id: 1,
                product_id: 7,
                name: "A".to_string(),
                price: Decimal::new(1000, 2),
                quantity: 2,
                subtotal: Decimal::new(123, 2),
            }],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        order.recompute_totals();

        assert_eq!(order.items[0].subtotal, Decimal::new(2000, 2));
        assert_eq!(order.total_amount, Decimal::new(2000, 2));
    }

    #[test]
    fn test_order_json_shape() {
        let order = Order {
            id: 5,
            customer_id: 42,
            status: OrderStatus::Pending,
            total_amount: Decimal::new(2550, 2),
            items: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["id"], 5);
        assert_eq!(value["customer_id"], 42);
        assert_eq!(value["status"], "pending");
    }
}
