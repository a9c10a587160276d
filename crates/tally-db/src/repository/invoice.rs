//! # Invoice Repository
//!
//! Database operations for invoices and their line items. Status changes
//! go through the core lifecycle rules; the overdue sweep promotes sent
//! invoices whose due date has passed.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::feed::{ChangeAction, ChangeEvent, ChangeFeed, Collection};
use crate::repository::settings::SettingsRepository;
use tally_core::cart::CartLine;
use tally_core::money::{compute_totals, Money};
use tally_core::types::{Invoice, InvoiceItem, InvoiceStatus};
use tally_core::CoreError;

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        InvoiceRepository { pool, feed }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Gets an invoice by id.
    pub async fn get(&self, org_id: &str, id: &str) -> DbResult<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, org_id, invoice_number, status,
                   subtotal_cents, tax_rate_bps, tax_cents, total_cents,
                   pricing_mode, customer_id, due_date, issued_at,
                   created_at, updated_at
            FROM invoices
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    /// Lists an organization's invoices, newest first.
    pub async fn list(&self, org_id: &str) -> DbResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, org_id, invoice_number, status,
                   subtotal_cents, tax_rate_bps, tax_cents, total_cents,
                   pricing_mode, customer_id, due_date, issued_at,
                   created_at, updated_at
            FROM invoices
            WHERE org_id = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    /// Lists invoices in a given status, newest first.
    pub async fn list_by_status(
        &self,
        org_id: &str,
        status: InvoiceStatus,
    ) -> DbResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, org_id, invoice_number, status,
                   subtotal_cents, tax_rate_bps, tax_cents, total_cents,
                   pricing_mode, customer_id, due_date, issued_at,
                   created_at, updated_at
            FROM invoices
            WHERE org_id = ?1 AND status = ?2
            ORDER BY created_at DESC
            "#,
        )
        .bind(org_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    /// Gets all line items for an invoice.
    pub async fn get_items(&self, invoice_id: &str) -> DbResult<Vec<InvoiceItem>> {
        let items = sqlx::query_as::<_, InvoiceItem>(
            r#"
            SELECT id, invoice_id, item_id, kind, name_snapshot,
                   unit_price_cents, quantity, line_total_cents, created_at
            FROM invoice_items
            WHERE invoice_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    /// Creates a draft invoice from priced lines.
    ///
    /// Totals are computed under the organization's configured tax rate
    /// and pricing mode, both frozen onto the invoice.
    pub async fn create(
        &self,
        org_id: &str,
        lines: &[CartLine],
        customer_id: Option<String>,
        due_date: Option<DateTime<Utc>>,
    ) -> DbResult<Invoice> {
        if lines.is_empty() {
            return Err(CoreError::EmptyOrder.into());
        }

        let settings = SettingsRepository::new(self.pool.clone(), self.feed.clone())
            .get_or_default(org_id)
            .await?;

        let line_sum = Money::from_cents(lines.iter().map(|l| l.line_total_cents()).sum());
        let totals = compute_totals(line_sum, settings.tax_rate(), settings.pricing_mode);

        let now = Utc::now();
        let invoice = Invoice {
            id: Uuid::new_v4().to_string(),
            org_id: org_id.to_string(),
            invoice_number: generate_invoice_number(now),
            status: InvoiceStatus::Draft,
            subtotal_cents: totals.subtotal_cents,
            tax_rate_bps: settings.tax_rate_bps,
            tax_cents: totals.tax_cents,
            total_cents: totals.total_cents,
            pricing_mode: settings.pricing_mode,
            customer_id,
            due_date,
            issued_at: None,
            created_at: now,
            updated_at: now,
        };

        debug!(org_id = %org_id, invoice_number = %invoice.invoice_number, "Creating invoice");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, org_id, invoice_number, status,
                subtotal_cents, tax_rate_bps, tax_cents, total_cents,
                pricing_mode, customer_id, due_date, issued_at,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.org_id)
        .bind(&invoice.invoice_number)
        .bind(invoice.status)
        .bind(invoice.subtotal_cents)
        .bind(invoice.tax_rate_bps)
        .bind(invoice.tax_cents)
        .bind(invoice.total_cents)
        .bind(invoice.pricing_mode)
        .bind(&invoice.customer_id)
        .bind(invoice.due_date)
        .bind(invoice.issued_at)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&mut *tx)
        .await?;

        for line in lines {
            sqlx::query(
                r#"
                INSERT INTO invoice_items (
                    id, invoice_id, item_id, kind, name_snapshot,
                    unit_price_cents, quantity, line_total_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&invoice.id)
            .bind(&line.item_id)
            .bind(line.kind)
            .bind(&line.name)
            .bind(line.unit_price_cents)
            .bind(line.quantity)
            .bind(line.line_total_cents())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.feed.publish(ChangeEvent {
            org_id: org_id.to_string(),
            collection: Collection::Invoices,
            entity_id: invoice.id.clone(),
            action: ChangeAction::Created,
        });

        Ok(invoice)
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Applies a status change through the core lifecycle rules.
    ///
    /// Moving to `Sent` stamps `issued_at` (first send only).
    pub async fn transition(
        &self,
        org_id: &str,
        invoice_id: &str,
        target: InvoiceStatus,
    ) -> DbResult<Invoice> {
        let mut tx = self.pool.begin().await?;

        let mut invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, org_id, invoice_number, status,
                   subtotal_cents, tax_rate_bps, tax_cents, total_cents,
                   pricing_mode, customer_id, due_date, issued_at,
                   created_at, updated_at
            FROM invoices
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(invoice_id)
        .bind(org_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Invoice", invoice_id))?;

        let new_status = invoice.status.transition(target)?;

        let now = Utc::now();
        let issued_at = match (new_status, invoice.issued_at) {
            (InvoiceStatus::Sent, None) => Some(now),
            (_, existing) => existing,
        };

        sqlx::query(
            r#"
            UPDATE invoices SET status = ?3, issued_at = ?4, updated_at = ?5
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(invoice_id)
        .bind(org_id)
        .bind(new_status)
        .bind(issued_at)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(invoice_id = %invoice_id, from = ?invoice.status, to = ?new_status, "Invoice status changed");

        invoice.status = new_status;
        invoice.issued_at = issued_at;
        invoice.updated_at = now;

        self.feed.publish(ChangeEvent {
            org_id: org_id.to_string(),
            collection: Collection::Invoices,
            entity_id: invoice_id.to_string(),
            action: ChangeAction::Updated,
        });

        Ok(invoice)
    }

    /// Moves every sent invoice whose due date has passed to `Overdue`.
    ///
    /// Returns the number of invoices promoted. Intended to run
    /// periodically (or on dashboard load).
    pub async fn mark_overdue_past_due(&self, org_id: &str, now: DateTime<Utc>) -> DbResult<usize> {
        let past_due: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT id FROM invoices
            WHERE org_id = ?1 AND status = 'sent'
              AND due_date IS NOT NULL AND due_date < ?2
            "#,
        )
        .bind(org_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        for id in &past_due {
            self.transition(org_id, id, InvoiceStatus::Overdue).await?;
        }

        if !past_due.is_empty() {
            info!(org_id = %org_id, count = past_due.len(), "Invoices marked overdue");
        }

        Ok(past_due.len())
    }
}

/// Generates an invoice number in format: INV-YYYYMMDD-NNNNN
///
/// ## Example
/// `INV-20260805-40731`
///
/// Microsecond-derived sequence, same scheme as order numbers: creations
/// in the same process never collide on the (org, number) unique index.
fn generate_invoice_number(now: DateTime<Utc>) -> String {
    let date_part = now.format("%Y%m%d");
    let seq = (now.timestamp_micros() % 100000) as u32;
    format!("INV-{}-{:05}", date_part, seq)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{cart_line, test_db};
    use chrono::Duration;

    const ORG: &str = "org-test";

    #[tokio::test]
    async fn test_create_computes_totals_from_settings() {
        let db = test_db().await;
        // Default settings: 15% exclusive
        let lines = vec![cart_line("consulting", 10000, 2), cart_line("travel", 5000, 1)];

        let invoice = db.invoices().create(ORG, &lines, None, None).await.unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert_eq!(invoice.subtotal_cents, 25000);
        assert_eq!(invoice.tax_cents, 3750);
        assert_eq!(invoice.total_cents, 28750);

        let items = db.invoices().get_items(&invoice.id).await.unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_invoice_rejected() {
        let db = test_db().await;
        let err = db.invoices().create(ORG, &[], None, None).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::EmptyOrder)));
        assert!(db.invoices().list(ORG).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_stamps_issued_at_once() {
        let db = test_db().await;
        let lines = vec![cart_line("consulting", 10000, 1)];
        let invoice = db.invoices().create(ORG, &lines, None, None).await.unwrap();
        assert!(invoice.issued_at.is_none());

        let sent = db
            .invoices()
            .transition(ORG, &invoice.id, InvoiceStatus::Sent)
            .await
            .unwrap();
        assert_eq!(sent.status, InvoiceStatus::Sent);
        assert!(sent.issued_at.is_some());
    }

    #[tokio::test]
    async fn test_illegal_transition_is_rejected() {
        let db = test_db().await;
        let lines = vec![cart_line("consulting", 10000, 1)];
        let invoice = db.invoices().create(ORG, &lines, None, None).await.unwrap();

        // Draft cannot jump straight to paid
        let err = db
            .invoices()
            .transition(ORG, &invoice.id, InvoiceStatus::Paid)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidInvoiceTransition { .. })
        ));

        let current = db.invoices().get(ORG, &invoice.id).await.unwrap().unwrap();
        assert_eq!(current.status, InvoiceStatus::Draft);
    }

    #[tokio::test]
    async fn test_paid_is_terminal() {
        let db = test_db().await;
        let lines = vec![cart_line("consulting", 10000, 1)];
        let invoice = db.invoices().create(ORG, &lines, None, None).await.unwrap();

        db.invoices().transition(ORG, &invoice.id, InvoiceStatus::Sent).await.unwrap();
        db.invoices().transition(ORG, &invoice.id, InvoiceStatus::Paid).await.unwrap();

        let err = db
            .invoices()
            .transition(ORG, &invoice.id, InvoiceStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(_)));
    }

    #[tokio::test]
    async fn test_overdue_sweep_promotes_only_past_due_sent() {
        let db = test_db().await;
        let now = Utc::now();
        let lines = vec![cart_line("consulting", 10000, 1)];

        // Past due, sent → should be promoted
        let overdue = db
            .invoices()
            .create(ORG, &lines, None, Some(now - Duration::days(3)))
            .await
            .unwrap();
        db.invoices().transition(ORG, &overdue.id, InvoiceStatus::Sent).await.unwrap();

        // Future due, sent → untouched
        let current = db
            .invoices()
            .create(ORG, &lines, None, Some(now + Duration::days(14)))
            .await
            .unwrap();
        db.invoices().transition(ORG, &current.id, InvoiceStatus::Sent).await.unwrap();

        // Past due but still draft → untouched
        let draft = db
            .invoices()
            .create(ORG, &lines, None, Some(now - Duration::days(3)))
            .await
            .unwrap();

        let promoted = db.invoices().mark_overdue_past_due(ORG, now).await.unwrap();
        assert_eq!(promoted, 1);

        let check = |id: &str| {
            let db = db.clone();
            let id = id.to_string();
            async move { db.invoices().get(ORG, &id).await.unwrap().unwrap().status }
        };
        assert_eq!(check(&overdue.id).await, InvoiceStatus::Overdue);
        assert_eq!(check(&current.id).await, InvoiceStatus::Sent);
        assert_eq!(check(&draft.id).await, InvoiceStatus::Draft);

        // Overdue invoice can still be settled late
        db.invoices().transition(ORG, &overdue.id, InvoiceStatus::Paid).await.unwrap();
    }
}
