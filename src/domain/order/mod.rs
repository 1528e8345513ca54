// ============================================================================
// Order Domain - Business Logic for the Order Aggregate
// ============================================================================
//
// This module contains ALL Order-specific code:
// - Value objects (OrderStatus)
// - Pricing (subtotal and order total derivation)
// - Transitions (the lifecycle state machine table)
// - Model (Order, OrderItem, creation inputs)
// - Errors (OrderError enum)
// - Service (OrderService: validate, persist, emit)
//
// ============================================================================

pub mod errors;
pub mod model;
pub mod pricing;
pub mod service;
pub mod transitions;
pub mod value_objects;

// Re-export for convenience
pub use errors::*;
pub use model::*;
pub use service::*;
pub use transitions::*;
pub use value_objects::*;
