use rust_decimal::Decimal;

use super::model::OrderItem;

// ============================================================================
// Pricing - derived money values
// ============================================================================
//
// Pure functions, no failure modes. Invoked when items are constructed and
// again whenever rows come back from storage, so a drifted stored value can
// never violate the total invariant.
//
// ============================================================================

/// A line item's subtotal: `price * quantity`.
pub fn subtotal(price: Decimal, quantity: i32) -> Decimal {
    price * Decimal::from(quantity)
}

/// An order's total: the sum of its items' subtotals.
pub fn order_total(items: &[OrderItem]) -> Decimal {
    items
        .iter()
        .fold(Decimal::ZERO, |acc, item| acc + item.subtotal)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: Decimal, quantity: i32) -> OrderItem {
        let mut item = OrderItem {
            id: 0,
            order_id: 0,
            product_id: 1,
            name: "widget".to_string(),
            price,
            quantity,
            subtotal: Decimal::ZERO,
        };
        item.recompute_subtotal();
        item
    }

    #[test]
    fn test_subtotal_is_price_times_quantity() {
        assert_eq!(subtotal(Decimal::new(1000, 2), 2), Decimal::new(2000, 2));
        assert_eq!(subtotal(Decimal::new(550, 2), 1), Decimal::new(550, 2));
        assert_eq!(subtotal(Decimal::ZERO, 99), Decimal::ZERO);
    }

    #[test]
    fn test_order_total_sums_subtotals() {
        let items = vec![item(Decimal::new(1000, 2), 2), item(Decimal::new(550, 2), 1)];
        assert_eq!(order_total(&items), Decimal::new(2550, 2));
    }

    #[test]
    fn test_order_total_of_empty_items_is_zero() {
        assert_eq!(order_total(&[]), Decimal::ZERO);
    }
}
