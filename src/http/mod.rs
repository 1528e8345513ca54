use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};

use crate::domain::order::{page_params, NewOrderItem, Order, OrderError, OrderService, OrderStatus};
use crate::metrics::Metrics;

// ============================================================================
// HTTP Layer - request surface
// ============================================================================
//
// Each route maps 1:1 to an order service operation. Error kinds map to
// status codes here and nowhere else: validation and illegal transitions are
// the client's fault (400), a missing order is 404, storage failure is 500.
//
// ============================================================================

pub struct AppState {
    pub orders: Arc<OrderService>,
    pub metrics: Arc<Metrics>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/metrics", web::get().to(metrics))
        .service(
            web::scope("/orders")
                .route("", web::post().to(create_order))
                .route("", web::get().to(list_orders))
                .route("/{id}", web::get().to(get_order))
                .route("/{id}/status", web::patch().to(update_order_status))
                .route("/{id}", web::delete().to(cancel_order)),
        );
}

// ============================================================================
// Request / response shapes
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: i64,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub customer_id: i64,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<Order>,
    pub count: usize,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ResponseError for OrderError {
    fn status_code(&self) -> StatusCode {
        match self {
            OrderError::Validation(_) | OrderError::InvalidTransition { .. } => {
                StatusCode::BAD_REQUEST
            }
            OrderError::NotFound(_) => StatusCode::NOT_FOUND,
            OrderError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            OrderError::Validation(_) => "validation_error",
            OrderError::NotFound(_) => "not_found",
            OrderError::InvalidTransition { .. } => "invalid_transition",
            OrderError::Storage(_) => "storage_failure",
        };

        HttpResponse::build(self.status_code()).json(ErrorBody {
            error,
            message: self.to_string(),
        })
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn create_order(
    state: web::Data<AppState>,
    req: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, OrderError> {
    let req = req.into_inner();
    let order = state.orders.create_order(req.customer_id, req.items).await?;
    Ok(HttpResponse::Created().json(order))
}

async fn get_order(
    state: web::Data<AppState>,
    id: web::Path<i64>,
) -> Result<HttpResponse, OrderError> {
    let order = state.orders.get_order(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

async fn list_orders(
    state: web::Data<AppState>,
    query: web::Query<ListOrdersQuery>,
) -> Result<HttpResponse, OrderError> {
    let query = query.into_inner();
    let orders = state
        .orders
        .list_orders_by_customer(query.customer_id, query.limit, query.offset)
        .await?;

    let (limit, offset) = page_params(query.limit, query.offset);
    Ok(HttpResponse::Ok().json(OrderListResponse {
        count: orders.len(),
        orders,
        limit,
        offset,
    }))
}

async fn update_order_status(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    req: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, OrderError> {
    let order = state
        .orders
        .update_order_status(id.into_inner(), req.status)
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

async fn cancel_order(
    state: web::Data<AppState>,
    id: web::Path<i64>,
) -> Result<HttpResponse, OrderError> {
    state.orders.cancel_order(id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "order-service"
    }))
}

async fn metrics(state: web::Data<AppState>) -> HttpResponse {
    match state.metrics.encode() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(err) => {
            tracing::error!(error = %err, "failed to encode metrics");
            HttpResponse::InternalServerError().finish()
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
    fn test_error_status_mapping() {
        assert_eq!(
            OrderError::Validation("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(OrderError::NotFound(1).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            OrderError::InvalidTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Pending,
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            OrderError::Storage(sqlx::Error::PoolTimedOut).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_create_request_decodes_items() {
        let raw = r#"{
            "customer_id": 42,
            "items": [
                {"product_id": 1, "name": "A", "price": "10.00", "quantity": 2}
            ]
        }"#;

        let req: CreateOrderRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(req.customer_id, 42);
        assert_eq!(req.items.len(), 1);
        assert_eq!(req.items[0].quantity, 2);
    }
}
