use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use order_service::config::Config;
use order_service::db;
use order_service::domain::order::OrderService;
use order_service::http::{self, AppState};
use order_service::messaging::KafkaEventPublisher;
use order_service::metrics::Metrics;
use order_service::repository::PgOrderRepository;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging with environment-based filtering; override with
    // RUST_LOG, e.g. RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_service=debug")),
        )
        .init();

    let cfg = Config::load();
    tracing::info!(port = cfg.server.port, "starting order service");

    let pool = db::connect(&cfg.database).await?;
    db::migrate(&pool).await?;

    let metrics = Arc::new(Metrics::new()?);
    let publisher = Arc::new(KafkaEventPublisher::new(
        &cfg.kafka.brokers,
        &cfg.kafka.topic,
    )?);
    let repo = Arc::new(PgOrderRepository::new(pool));
    let orders = Arc::new(OrderService::new(repo, publisher, metrics.clone()));

    let state = web::Data::new(AppState { orders, metrics });

    HttpServer::new(move || App::new().app_data(state.clone()).configure(http::configure))
        .bind(("0.0.0.0", cfg.server.port))?
        .run()
        .await?;

    Ok(())
}
