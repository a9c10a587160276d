//! # Invoice Lifecycle
//!
//! Status progression for billing documents. Simpler than the order
//! machine: a linear path with a cancellation escape hatch that closes
//! once the invoice is paid.
//!
//! ```text
//!   DRAFT ──► SENT ──► PAID        (terminal)
//!               │        ▲
//!               ▼        │ late settlement
//!            OVERDUE ────┘
//!
//!   DRAFT | SENT | OVERDUE ──► CANCELLED   (terminal)
//! ```

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::types::{Invoice, InvoiceStatus};

impl InvoiceStatus {
    /// Whether no further transitions are allowed from this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
    }

    /// Whether `self → target` is a legal edge.
    fn allows(&self, target: InvoiceStatus) -> bool {
        use InvoiceStatus::*;
        matches!(
            (self, target),
            (Draft, Sent)
                | (Sent, Paid)
                | (Sent, Overdue)
                | (Overdue, Paid) // customer settles late
                | (Draft, Cancelled)
                | (Sent, Cancelled)
                | (Overdue, Cancelled)
        )
    }

    /// Validates a status change, returning the new status.
    ///
    /// ## Errors
    /// [`CoreError::InvalidInvoiceTransition`] for any edge not in the
    /// diagram; the invoice keeps its current status.
    pub fn transition(self, target: InvoiceStatus) -> CoreResult<InvoiceStatus> {
        if self.allows(target) {
            Ok(target)
        } else {
            Err(CoreError::InvalidInvoiceTransition {
                from: self,
                to: target,
            })
        }
    }
}

/// Whether a sent invoice has slipped past its due date.
///
/// Drives the overdue sweep in the storage layer: invoices where this
/// holds are moved `Sent → Overdue`.
pub fn is_past_due(invoice: &Invoice, now: DateTime<Utc>) -> bool {
    invoice.status == InvoiceStatus::Sent
        && invoice.due_date.map(|due| due < now).unwrap_or(false)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::PricingMode;
    use chrono::Duration;

    fn test_invoice(status: InvoiceStatus, due: Option<DateTime<Utc>>) -> Invoice {
        Invoice {
            id: "inv-1".to_string(),
            org_id: "org-1".to_string(),
            invoice_number: "INV-0001".to_string(),
            status,
            subtotal_cents: 2500,
            tax_rate_bps: 1500,
            tax_cents: 375,
            total_cents: 2875,
            pricing_mode: PricingMode::Exclusive,
            customer_id: Some("cust-1".to_string()),
            due_date: due,
            issued_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_linear_progression() {
        assert_eq!(
            InvoiceStatus::Draft.transition(InvoiceStatus::Sent).unwrap(),
            InvoiceStatus::Sent
        );
        assert_eq!(
            InvoiceStatus::Sent.transition(InvoiceStatus::Paid).unwrap(),
            InvoiceStatus::Paid
        );
        assert_eq!(
            InvoiceStatus::Sent.transition(InvoiceStatus::Overdue).unwrap(),
            InvoiceStatus::Overdue
        );
        assert_eq!(
            InvoiceStatus::Overdue.transition(InvoiceStatus::Paid).unwrap(),
            InvoiceStatus::Paid
        );
    }

    #[test]
    fn test_no_skipping_draft_to_paid() {
        assert!(InvoiceStatus::Draft.transition(InvoiceStatus::Paid).is_err());
        assert!(InvoiceStatus::Draft.transition(InvoiceStatus::Overdue).is_err());
    }

    #[test]
    fn test_cancellation_before_paid_only() {
        assert!(InvoiceStatus::Draft.transition(InvoiceStatus::Cancelled).is_ok());
        assert!(InvoiceStatus::Sent.transition(InvoiceStatus::Cancelled).is_ok());
        assert!(InvoiceStatus::Overdue.transition(InvoiceStatus::Cancelled).is_ok());

        assert!(InvoiceStatus::Paid.transition(InvoiceStatus::Cancelled).is_err());
        assert!(InvoiceStatus::Cancelled.transition(InvoiceStatus::Sent).is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(InvoiceStatus::Paid.is_terminal());
        assert!(InvoiceStatus::Cancelled.is_terminal());
        assert!(!InvoiceStatus::Sent.is_terminal());
    }

    #[test]
    fn test_past_due_detection() {
        let now = Utc::now();

        let overdue = test_invoice(InvoiceStatus::Sent, Some(now - Duration::days(1)));
        assert!(is_past_due(&overdue, now));

        let current = test_invoice(InvoiceStatus::Sent, Some(now + Duration::days(7)));
        assert!(!is_past_due(&current, now));

        let no_due_date = test_invoice(InvoiceStatus::Sent, None);
        assert!(!is_past_due(&no_due_date, now));

        // Only sent invoices go overdue
        let draft = test_invoice(InvoiceStatus::Draft, Some(now - Duration::days(1)));
        assert!(!is_past_due(&draft, now));
    }
}
