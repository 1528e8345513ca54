// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// This module contains the order aggregate and everything it owns:
// - Value objects (status enum)
// - Pricing (subtotal/total derivation)
// - The lifecycle transition table
// - The order model and its derived-total invariant
// - Errors
// - The order service orchestrating validation, persistence, and emission
//
// This layer knows nothing about HTTP or the message bus wire format.
//
// ============================================================================

pub mod order;
