//! # Order Status State Machine
//!
//! Governs every order status change. This is the one hard invariant in
//! the system: **an order must never complete unpaid**, because completion
//! triggers side effects (releasing the assigned table) that must not
//! happen for unpaid business.
//!
//! ## State Diagram
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │        ┌────────┐  hold   ┌─────────┐                                   │
//! │   ───► │  OPEN  │ ──────► │ ON_HOLD │                                   │
//! │        │        │ ◄────── │         │                                   │
//! │        └───┬────┘ resume  └────┬────┘                                   │
//! │     ▲      │    \              │    \                                   │
//! │     │      │     \             │     ▼                                  │
//! │     │      ▼      ▼            ▼   ┌───────────┐                        │
//! │     │ ┌───────────┐ (paid only!) ─►│ CANCELLED │ (terminal)             │
//! │     │ │ COMPLETED │◄──────────┘    └───────────┘                        │
//! │     │ └─────┬─────┘                                                     │
//! │     └───────┘ reopen (no guard)                                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Payment Sufficiency
//! An order counts as paid when its `paid` flag is set OR the recorded
//! payments cover the total. The payment sum is the authoritative signal;
//! the flag is a cache re-derived whenever a payment lands. Checking both
//! keeps a manually flagged order (e.g. comped by a manager) completable.

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Order, OrderPayment, OrderStatus};

// =============================================================================
// Payment Sufficiency
// =============================================================================

/// Sum of all recorded payment amounts.
pub fn payment_total(payments: &[OrderPayment]) -> Money {
    payments.iter().map(|p| p.amount()).sum()
}

/// Whether the order may complete: flagged paid, or payments cover the
/// total.
pub fn is_paid(order: &Order, payments: &[OrderPayment]) -> bool {
    order.paid || payment_total(payments) >= order.total()
}

// =============================================================================
// Transitions
// =============================================================================

impl OrderStatus {
    /// Whether no further transitions are expected from this status.
    /// (`Completed` can still be explicitly reopened.)
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Whether `self → target` is a legal edge, ignoring the paid guard.
    fn allows(&self, target: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, target),
            (Open, OnHold)
                | (Open, Cancelled)
                | (Open, Completed)
                | (OnHold, Open)
                | (OnHold, Cancelled)
                | (OnHold, Completed)
                | (Completed, Open) // reopen
        )
    }
}

/// Validates a status change for `order`, returning the new status.
///
/// Pure: nothing is mutated here. The storage layer applies the result —
/// and re-runs this same check inside its transaction so the guard is
/// evaluated against current state, not a stale client read.
///
/// ## Errors
/// - [`CoreError::UnpaidOrder`] on a completion attempt without payment
///   sufficiency; the order keeps its current status
/// - [`CoreError::InvalidOrderTransition`] for any edge not in the diagram
///
/// ## Example
/// ```rust
/// use tally_core::order::transition;
/// use tally_core::types::{Order, OrderStatus, OrderType};
/// use chrono::Utc;
///
/// let order = Order {
///     id: "o1".into(), org_id: "org-1".into(), order_number: "0001".into(),
///     status: OrderStatus::Open, order_type: OrderType::TakeAway,
///     subtotal_cents: 2500, tax_rate_bps: 1500, tax_cents: 375,
///     total_cents: 2875, paid: true, table_id: None, customer_id: None,
///     notes: None, created_at: Utc::now(), updated_at: Utc::now(),
///     completed_at: None,
/// };
///
/// // Flagged paid: completion is allowed even with no payment rows.
/// let next = transition(&order, OrderStatus::Completed, &[]).unwrap();
/// assert_eq!(next, OrderStatus::Completed);
/// ```
pub fn transition(
    order: &Order,
    target: OrderStatus,
    payments: &[OrderPayment],
) -> CoreResult<OrderStatus> {
    if !order.status.allows(target) {
        return Err(CoreError::InvalidOrderTransition {
            from: order.status,
            to: target,
        });
    }

    if target == OrderStatus::Completed && !is_paid(order, payments) {
        return Err(CoreError::UnpaidOrder {
            total_cents: order.total_cents,
            paid_cents: payment_total(payments).cents(),
        });
    }

    Ok(target)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderType, PaymentMethod};
    use chrono::Utc;

    fn test_order(status: OrderStatus, total_cents: i64, paid: bool) -> Order {
        Order {
            id: "order-1".to_string(),
            org_id: "org-1".to_string(),
            order_number: "20260805-0001".to_string(),
            status,
            order_type: OrderType::DineIn,
            subtotal_cents: total_cents,
            tax_rate_bps: 0,
            tax_cents: 0,
            total_cents,
            paid,
            table_id: Some("table-1".to_string()),
            customer_id: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            completed_at: None,
        }
    }

    fn payment(amount_cents: i64) -> OrderPayment {
        OrderPayment {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: "order-1".to_string(),
            amount_cents,
            method: PaymentMethod::Cash,
            reference: None,
            paid_at: Utc::now(),
        }
    }

    #[test]
    fn test_completion_refused_one_cent_short() {
        // total 100.00, payments 99.99 → refused, status unchanged
        let order = test_order(OrderStatus::Open, 10000, false);
        let payments = vec![payment(5000), payment(4999)];

        let err = transition(&order, OrderStatus::Completed, &payments).unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnpaidOrder {
                total_cents: 10000,
                paid_cents: 9999,
            }
        ));
        assert_eq!(order.status, OrderStatus::Open);
    }

    #[test]
    fn test_completion_allowed_at_exact_total() {
        let order = test_order(OrderStatus::Open, 10000, false);
        let payments = vec![payment(5000), payment(5000)];

        let next = transition(&order, OrderStatus::Completed, &payments).unwrap();
        assert_eq!(next, OrderStatus::Completed);
    }

    #[test]
    fn test_completion_allowed_by_paid_flag() {
        let order = test_order(OrderStatus::Open, 10000, true);

        let next = transition(&order, OrderStatus::Completed, &[]).unwrap();
        assert_eq!(next, OrderStatus::Completed);
    }

    #[test]
    fn test_completion_allowed_on_overpayment() {
        let order = test_order(OrderStatus::Open, 10000, false);
        let payments = vec![payment(12000)];

        assert!(transition(&order, OrderStatus::Completed, &payments).is_ok());
    }

    #[test]
    fn test_hold_and_resume_unguarded() {
        let order = test_order(OrderStatus::Open, 10000, false);
        assert_eq!(
            transition(&order, OrderStatus::OnHold, &[]).unwrap(),
            OrderStatus::OnHold
        );

        let held = test_order(OrderStatus::OnHold, 10000, false);
        assert_eq!(
            transition(&held, OrderStatus::Open, &[]).unwrap(),
            OrderStatus::Open
        );
    }

    #[test]
    fn test_cancel_from_open_and_hold_unguarded() {
        let order = test_order(OrderStatus::Open, 10000, false);
        assert!(transition(&order, OrderStatus::Cancelled, &[]).is_ok());

        let held = test_order(OrderStatus::OnHold, 10000, false);
        assert!(transition(&held, OrderStatus::Cancelled, &[]).is_ok());
    }

    #[test]
    fn test_completion_from_hold_is_guarded() {
        let held = test_order(OrderStatus::OnHold, 10000, false);
        assert!(matches!(
            transition(&held, OrderStatus::Completed, &[]).unwrap_err(),
            CoreError::UnpaidOrder { .. }
        ));

        let paid_held = test_order(OrderStatus::OnHold, 10000, true);
        assert!(transition(&paid_held, OrderStatus::Completed, &[]).is_ok());
    }

    #[test]
    fn test_reopen_completed_without_guard() {
        let done = test_order(OrderStatus::Completed, 10000, false);
        assert_eq!(
            transition(&done, OrderStatus::Open, &[]).unwrap(),
            OrderStatus::Open
        );
    }

    #[test]
    fn test_cancelled_is_terminal() {
        let cancelled = test_order(OrderStatus::Cancelled, 10000, true);
        for target in [
            OrderStatus::Open,
            OrderStatus::OnHold,
            OrderStatus::Completed,
        ] {
            assert!(matches!(
                transition(&cancelled, target, &[]).unwrap_err(),
                CoreError::InvalidOrderTransition { .. }
            ));
        }
    }

    #[test]
    fn test_completed_cannot_cancel_or_hold() {
        let done = test_order(OrderStatus::Completed, 10000, true);
        assert!(transition(&done, OrderStatus::Cancelled, &[]).is_err());
        assert!(transition(&done, OrderStatus::OnHold, &[]).is_err());
    }

    #[test]
    fn test_payment_total() {
        let payments = vec![payment(100), payment(250), payment(5)];
        assert_eq!(payment_total(&payments).cents(), 355);
        assert_eq!(payment_total(&[]).cents(), 0);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Open.is_terminal());
        assert!(!OrderStatus::OnHold.is_terminal());
    }
}
