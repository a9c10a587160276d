//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → API layer → Frontend    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (entity, id, amounts)
//! 3. Errors are enum variants, never String
//! 4. Business rule errors never partially apply: the order, cart or
//!    invoice is left exactly as it was

use thiserror::Error;

use crate::types::{InvoiceStatus, OrderStatus};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. They are raised
/// synchronously, are user-correctable, and should be caught and
/// translated to user-facing messages by the caller.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Checkout attempted with no line items.
    #[error("Cannot check out an empty order")]
    EmptyOrder,

    /// Required table/customer not selected per organization policy.
    ///
    /// ## When This Occurs
    /// - Dine-in checkout without a table, where settings require one
    /// - Delivery checkout without a customer, where settings require one
    #[error("A {what} must be selected before checkout")]
    MissingContext { what: &'static str },

    /// Completion attempted before payment sufficiency is met.
    ///
    /// ## When This Occurs
    /// Transition into `Completed` with neither the paid flag set nor
    /// payments covering the order total. The order keeps its current
    /// status.
    #[error("Order is not paid: {paid_cents} of {total_cents} covered")]
    UnpaidOrder { total_cents: i64, paid_cents: i64 },

    /// The requested status change is not allowed from the current state.
    #[error("Cannot transition order from {from:?} to {to:?}")]
    InvalidOrderTransition { from: OrderStatus, to: OrderStatus },

    /// The order is in a state that does not accept the operation.
    ///
    /// ## When This Occurs
    /// - Recording a payment against a completed or cancelled order
    #[error("Order {id} is {status:?}, cannot perform operation")]
    OrderClosed { id: String, status: OrderStatus },

    /// The requested invoice status change is not allowed.
    #[error("Cannot transition invoice from {from:?} to {to:?}")]
    InvalidInvoiceTransition {
        from: InvoiceStatus,
        to: InvoiceStatus,
    },

    /// A referenced entity no longer exists, in a context where the
    /// operation targets it for mutation.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Re-parenting a category would create a cycle.
    #[error("Re-parenting category {id} would create a cycle")]
    CategoryCycle { id: String },

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and id.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::UnpaidOrder {
            total_cents: 10000,
            paid_cents: 9999,
        };
        assert_eq!(err.to_string(), "Order is not paid: 9999 of 10000 covered");

        let err = CoreError::MissingContext { what: "table" };
        assert_eq!(err.to_string(), "A table must be selected before checkout");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "amount".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
