use super::value_objects::OrderStatus;

// ============================================================================
// Order Business Rule Errors
// ============================================================================
//
// Publish failures are deliberately NOT represented here: the emission path
// has its own error type in `messaging`, with no conversion into this enum,
// so a failed publish cannot surface as (or roll back) a domain failure.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("invalid order: {0}")]
    Validation(String),

    #[error("order {0} not found")]
    NotFound(i64),

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}
