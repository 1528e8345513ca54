use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;

// ============================================================================
// Database - Postgres pool construction and schema migration
// ============================================================================

/// Connect to Postgres with bounded pool and acquire timeout. Each call into
/// the pool is an independent suspension point; per-row write atomicity is
/// the database's guarantee.
pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .min_connections(10.min(cfg.max_connections))
        .max_lifetime(Duration::from_secs(3600))
        .acquire_timeout(Duration::from_secs(5))
        .connect(&cfg.url())
        .await?;

    // Verify the connection before handing the pool out
    sqlx::query("SELECT 1").execute(&pool).await?;

    tracing::info!(host = %cfg.host, dbname = %cfg.dbname, "connected to Postgres");
    Ok(pool)
}

/// Create the orders schema if it does not exist. Items cascade with their
/// parent order; rows are soft-deleted via `deleted_at` rather than removed.
pub async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    tracing::info!("running migrations");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS orders (
            id           BIGSERIAL PRIMARY KEY,
            customer_id  BIGINT NOT NULL,
            status       VARCHAR(20) NOT NULL DEFAULT 'pending',
            total_amount NUMERIC(10,2) NOT NULL DEFAULT 0,
            created_at   TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at   TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            deleted_at   TIMESTAMPTZ
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS order_items (
            id         BIGSERIAL PRIMARY KEY,
            order_id   BIGINT NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
            product_id BIGINT NOT NULL,
            name       VARCHAR(255) NOT NULL,
            price      NUMERIC(10,2) NOT NULL,
            quantity   INT NOT NULL,
            subtotal   NUMERIC(10,2) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            deleted_at TIMESTAMPTZ
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_orders_customer_created
         ON orders (customer_id, created_at DESC)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_order_items_order ON order_items (order_id)")
        .execute(pool)
        .await?;

    tracing::info!("migrations complete");
    Ok(())
}
