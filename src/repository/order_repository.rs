use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::order::{pricing, NewOrderItem, Order, OrderError, OrderItem, OrderStatus};

// ============================================================================
// Order Repository - storage collaborator
// ============================================================================
//
// The repository provides per-row atomicity only; it does not lock orders
// across reads. `update_status` carries the previously read status in its
// WHERE clause (compare-and-swap), so a lost race surfaces instead of
// silently overwriting a concurrent writer.
//
// ============================================================================

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist a new order and its items in a single transaction. Subtotals
    /// and the order total are derived here, never taken from the caller.
    async fn create(&self, customer_id: i64, items: Vec<NewOrderItem>) -> Result<Order, OrderError>;

    async fn get_by_id(&self, id: i64) -> Result<Order, OrderError>;

    /// Most-recent-first page of a customer's orders.
    async fn list_by_customer(
        &self,
        customer_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, OrderError>;

    /// Compare-and-swap status update: succeeds only if the row still holds
    /// `from`. On a lost race the error reports the freshly read status.
    async fn update_status(
        &self,
        id: i64,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<(), OrderError>;

    /// Soft delete: tombstone the order and its items for audit.
    async fn soft_delete(&self, id: i64) -> Result<(), OrderError>;
}

pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn order_from_row(row: &PgRow) -> Result<Order, sqlx::Error> {
        let status_text: String = row.try_get("status")?;
        let status = status_text
            .parse::<OrderStatus>()
            .map_err(|err| sqlx::Error::Decode(err.into()))?;

        Ok(Order {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            status,
            total_amount: row.try_get("total_amount")?,
            items: Vec::new(),
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }

    fn item_from_row(row: &PgRow) -> Result<OrderItem, sqlx::Error> {
        Ok(OrderItem {
            id: row.try_get("id")?,
            order_id: row.try_get("order_id")?,
            product_id: row.try_get("product_id")?,
            name: row.try_get("name")?,
            price: row.try_get("price")?,
            quantity: row.try_get("quantity")?,
            subtotal: row.try_get("subtotal")?,
        })
    }

    async fn load_items(&self, order_ids: &[i64]) -> Result<Vec<OrderItem>, OrderError> {
        let rows = sqlx::query(
            "SELECT id, order_id, product_id, name, price, quantity, subtotal
             FROM order_items
             WHERE order_id = ANY($1) AND deleted_at IS NULL
             ORDER BY id",
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Self::item_from_row(row).map_err(OrderError::from))
            .collect()
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn create(&self, customer_id: i64, items: Vec<NewOrderItem>) -> Result<Order, OrderError> {
        // Derive money values before anything touches storage
        let subtotals: Vec<Decimal> = items
            .iter()
            .map(|item| pricing::subtotal(item.price, item.quantity))
            .collect();
        let total: Decimal = subtotals.iter().copied().sum();

        let mut tx = self.pool.begin().await?;

        let order_row = sqlx::query(
            "INSERT INTO orders (customer_id, status, total_amount)
             VALUES ($1, $2, $3)
             RETURNING id, customer_id, status, total_amount, created_at, updated_at",
        )
        .bind(customer_id)
        .bind(OrderStatus::Pending.as_str())
        .bind(total)
        .fetch_one(&mut *tx)
        .await?;

        let mut order = Self::order_from_row(&order_row)?;

        for (item, subtotal) in items.into_iter().zip(subtotals) {
            let item_row = sqlx::query(
                "INSERT INTO order_items (order_id, product_id, name, price, quantity, subtotal)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 RETURNING id, order_id, product_id, name, price, quantity, subtotal",
            )
            .bind(order.id)
            .bind(item.product_id)
            .bind(&item.name)
            .bind(item.price)
            .bind(item.quantity)
            .bind(subtotal)
            .fetch_one(&mut *tx)
            .await?;

            order.items.push(Self::item_from_row(&item_row)?);
        }

        tx.commit().await?;

        order.recompute_totals();
        Ok(order)
    }

    async fn get_by_id(&self, id: i64) -> Result<Order, OrderError> {
        let row = sqlx::query(
            "SELECT id, customer_id, status, total_amount, created_at, updated_at
             FROM orders
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(OrderError::NotFound(id))?;

        let mut order = Self::order_from_row(&row)?;
        order.items = self.load_items(&[order.id]).await?;

        // Defensive recomputation: stored values must not drift the invariant
        order.recompute_totals();
        Ok(order)
    }

    async fn list_by_customer(
        &self,
        customer_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, OrderError> {
        let rows = sqlx::query(
            "SELECT id, customer_id, status, total_amount, created_at, updated_at
             FROM orders
             WHERE customer_id = $1 AND deleted_at IS NULL
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(customer_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let mut orders: Vec<Order> = rows
            .iter()
            .map(|row| Self::order_from_row(row).map_err(OrderError::from))
            .collect::<Result<_, _>>()?;

        if orders.is_empty() {
            return Ok(orders);
        }

        let ids: Vec<i64> = orders.iter().map(|order| order.id).collect();
        let items = self.load_items(&ids).await?;

        for item in items {
            if let Some(order) = orders.iter_mut().find(|o| o.id == item.order_id) {
                order.items.push(item);
            }
        }

        for order in &mut orders {
            order.recompute_totals();
        }

        Ok(orders)
    }

    async fn update_status(
        &self,
        id: i64,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<(), OrderError> {
        let result = sqlx::query(
            "UPDATE orders
             SET status = $1, updated_at = NOW()
             WHERE id = $2 AND status = $3 AND deleted_at IS NULL",
        )
        .bind(to.as_str())
        .bind(id)
        .bind(from.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Either the row vanished or a concurrent writer won the race;
            // re-read to report which.
            let current = self.get_by_id(id).await?;
            return Err(OrderError::InvalidTransition {
                from: current.status,
                to,
            });
        }

        Ok(())
    }

    async fn soft_delete(&self, id: i64) -> Result<(), OrderError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE orders SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(OrderError::NotFound(id));
        }

        sqlx::query(
            "UPDATE order_items SET deleted_at = NOW() WHERE order_id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
