//! # Order Repository
//!
//! Database operations for orders, their line items, their payments, and
//! every status change.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── create_from_draft() → Order { status: Open }                   │
//! │         (dine-in: assigned table becomes occupied, same transaction)   │
//! │                                                                         │
//! │  2. PAY (repeatable, split tender)                                     │
//! │     └── add_payment() → recomputes the paid flag from the sum          │
//! │                                                                         │
//! │  3. COMPLETE                                                           │
//! │     └── complete() → SINGLE TRANSACTION:                               │
//! │           re-read order + payment sum                                  │
//! │           evaluate paid guard against CURRENT state                    │
//! │           status = completed, completed_at = now                       │
//! │           assigned table released to available                         │
//! │         A crash cannot leave a completed order with a stuck table,    │
//! │         and two racing sessions cannot both slip past the guard on    │
//! │         stale reads.                                                   │
//! │                                                                         │
//! │  (hold / resume / cancel / reopen go through the same transition      │
//! │   path, minus the guard)                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::feed::{ChangeAction, ChangeEvent, ChangeFeed, Collection};
use tally_core::cart::OrderDraft;
use tally_core::order as order_rules;
use tally_core::types::{
    Order, OrderItem, OrderPayment, OrderStatus, OrderType, PaymentMethod, TableStatus,
};
use tally_core::validation;
use tally_core::CoreError;

/// Outcome of recording a payment: the stored payment plus the running
/// tender arithmetic for the cashier display.
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub payment: OrderPayment,
    pub paid_total_cents: i64,
    pub remaining_cents: i64,
    pub change_cents: i64,
    /// Whether the order now counts as paid.
    pub order_paid: bool,
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        OrderRepository { pool, feed }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Gets an order by id.
    pub async fn get(&self, org_id: &str, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, org_id, order_number, status, order_type,
                   subtotal_cents, tax_rate_bps, tax_cents, total_cents, paid,
                   table_id, customer_id, notes,
                   created_at, updated_at, completed_at
            FROM orders
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Lists an organization's orders, newest first.
    pub async fn list(&self, org_id: &str) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, org_id, order_number, status, order_type,
                   subtotal_cents, tax_rate_bps, tax_cents, total_cents, paid,
                   table_id, customer_id, notes,
                   created_at, updated_at, completed_at
            FROM orders
            WHERE org_id = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Lists orders in a given status, newest first.
    pub async fn list_by_status(&self, org_id: &str, status: OrderStatus) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, org_id, order_number, status, order_type,
                   subtotal_cents, tax_rate_bps, tax_cents, total_cents, paid,
                   table_id, customer_id, notes,
                   created_at, updated_at, completed_at
            FROM orders
            WHERE org_id = ?1 AND status = ?2
            ORDER BY created_at DESC
            "#,
        )
        .bind(org_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Gets all line items for an order.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, item_id, kind, name_snapshot,
                   unit_price_cents, quantity, line_total_cents, created_at
            FROM order_items
            WHERE order_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets all payments for an order.
    pub async fn get_payments(&self, order_id: &str) -> DbResult<Vec<OrderPayment>> {
        let payments = sqlx::query_as::<_, OrderPayment>(
            r#"
            SELECT id, order_id, amount_cents, method, reference, paid_at
            FROM order_payments
            WHERE order_id = ?1
            ORDER BY paid_at
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    /// Persists a checked-out cart as an open order.
    ///
    /// One transaction inserts the order and all of its line items and,
    /// for a dine-in order with an assigned table, marks that table
    /// occupied.
    pub async fn create_from_draft(
        &self,
        org_id: &str,
        draft: &OrderDraft,
        notes: Option<String>,
    ) -> DbResult<Order> {
        if draft.lines.is_empty() {
            return Err(CoreError::EmptyOrder.into());
        }

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            org_id: org_id.to_string(),
            order_number: generate_order_number(now),
            status: OrderStatus::Open,
            order_type: draft.order_type,
            subtotal_cents: draft.totals.subtotal_cents,
            tax_rate_bps: draft.tax_rate_bps,
            tax_cents: draft.totals.tax_cents,
            total_cents: draft.totals.total_cents,
            paid: false,
            table_id: draft.table_id.clone(),
            customer_id: draft.customer_id.clone(),
            notes,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };

        debug!(org_id = %org_id, order_number = %order.order_number, "Creating order");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, org_id, order_number, status, order_type,
                subtotal_cents, tax_rate_bps, tax_cents, total_cents, paid,
                table_id, customer_id, notes,
                created_at, updated_at, completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
        )
        .bind(&order.id)
        .bind(&order.org_id)
        .bind(&order.order_number)
        .bind(order.status)
        .bind(order.order_type)
        .bind(order.subtotal_cents)
        .bind(order.tax_rate_bps)
        .bind(order.tax_cents)
        .bind(order.total_cents)
        .bind(order.paid)
        .bind(&order.table_id)
        .bind(&order.customer_id)
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(order.completed_at)
        .execute(&mut *tx)
        .await?;

        for line in &draft.lines {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, item_id, kind, name_snapshot,
                    unit_price_cents, quantity, line_total_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&order.id)
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

        // Seat the party: a dine-in order claims its table immediately.
        if order.order_type == OrderType::DineIn {
            if let Some(table_id) = &order.table_id {
                sqlx::query(
                    r#"
                    UPDATE dining_tables SET status = ?3, updated_at = ?4
                    WHERE id = ?1 AND org_id = ?2
                    "#,
                )
                .bind(table_id)
                .bind(org_id)
                .bind(TableStatus::Occupied)
                .bind(now)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        info!(
            order_id = %order.id,
            total_cents = order.total_cents,
            items = draft.lines.len(),
            "Order created"
        );

        self.feed.publish(ChangeEvent {
            org_id: org_id.to_string(),
            collection: Collection::Orders,
            entity_id: order.id.clone(),
            action: ChangeAction::Created,
        });
        if let Some(table_id) = &order.table_id {
            self.feed.publish(ChangeEvent {
                org_id: org_id.to_string(),
                collection: Collection::Tables,
                entity_id: table_id.clone(),
                action: ChangeAction::Updated,
            });
        }

        Ok(order)
    }

    // -------------------------------------------------------------------------
    // Payments
    // -------------------------------------------------------------------------

    /// Records a payment and re-derives the order's paid flag from the
    /// payment sum (the sum is the authoritative signal; the flag is a
    /// cache of it).
    pub async fn add_payment(
        &self,
        org_id: &str,
        order_id: &str,
        amount_cents: i64,
        method: PaymentMethod,
        reference: Option<String>,
    ) -> DbResult<PaymentReceipt> {
        validation::validate_payment_amount(amount_cents).map_err(CoreError::from)?;

        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, org_id, order_number, status, order_type,
                   subtotal_cents, tax_rate_bps, tax_cents, total_cents, paid,
                   table_id, customer_id, notes,
                   created_at, updated_at, completed_at
            FROM orders
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(order_id)
        .bind(org_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Order", order_id))?;

        if order.status.is_terminal() {
            return Err(CoreError::OrderClosed {
                id: order.id,
                status: order.status,
            }
            .into());
        }

        let now = Utc::now();
        let payment = OrderPayment {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            amount_cents,
            method,
            reference,
            paid_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO order_payments (
                id, order_id, amount_cents, method, reference, paid_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.order_id)
        .bind(payment.amount_cents)
        .bind(payment.method)
        .bind(&payment.reference)
        .bind(payment.paid_at)
        .execute(&mut *tx)
        .await?;

        let paid_total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM order_payments WHERE order_id = ?1",
        )
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        let order_paid = paid_total >= order.total_cents;

        sqlx::query("UPDATE orders SET paid = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(order_id)
            .bind(order_paid)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            order_id = %order_id,
            amount_cents,
            paid_total,
            order_paid,
            "Payment recorded"
        );

        self.feed.publish(ChangeEvent {
            org_id: org_id.to_string(),
            collection: Collection::Orders,
            entity_id: order_id.to_string(),
            action: ChangeAction::Updated,
        });

        Ok(PaymentReceipt {
            payment,
            paid_total_cents: paid_total,
            remaining_cents: (order.total_cents - paid_total).max(0),
            change_cents: (paid_total - order.total_cents).max(0),
            order_paid,
        })
    }

    /// Flags an order as paid without payment rows (e.g. comped by a
    /// manager). The completion guard honors the flag.
    pub async fn mark_paid(&self, org_id: &str, order_id: &str) -> DbResult<()> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE orders SET paid = 1, updated_at = ?3
            WHERE id = ?1 AND org_id = ?2 AND status IN ('open', 'on_hold')
            "#,
        )
        .bind(order_id)
        .bind(org_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order (open)", order_id));
        }

        self.feed.publish(ChangeEvent {
            org_id: org_id.to_string(),
            collection: Collection::Orders,
            entity_id: order_id.to_string(),
            action: ChangeAction::Updated,
        });

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Status Changes
    // -------------------------------------------------------------------------

    /// Applies a status change through the core state machine, atomically.
    ///
    /// The order and its payment sum are re-read inside the transaction,
    /// so the completion guard is evaluated against current database
    /// state rather than whatever the client last saw. On completion the
    /// assigned table is released in the same transaction.
    pub async fn transition(
        &self,
        org_id: &str,
        order_id: &str,
        target: OrderStatus,
    ) -> DbResult<Order> {
        let mut tx = self.pool.begin().await?;

        let mut order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, org_id, order_number, status, order_type,
                   subtotal_cents, tax_rate_bps, tax_cents, total_cents, paid,
                   table_id, customer_id, notes,
                   created_at, updated_at, completed_at
            FROM orders
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(order_id)
        .bind(org_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Order", order_id))?;

        let payments = sqlx::query_as::<_, OrderPayment>(
            "SELECT id, order_id, amount_cents, method, reference, paid_at \
             FROM order_payments WHERE order_id = ?1",
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

        // Guard evaluated here, inside the transaction. A refusal rolls
        // back with nothing written.
        let new_status = order_rules::transition(&order, target, &payments)?;

        let now = Utc::now();
        let completed_at = match new_status {
            OrderStatus::Completed => Some(now),
            _ => None,
        };

        sqlx::query(
            r#"
            UPDATE orders SET status = ?3, completed_at = ?4, updated_at = ?5
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(order_id)
        .bind(org_id)
        .bind(new_status)
        .bind(completed_at)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        // Completing a table-bound order frees the table as part of the
        // same logical operation. Reopening does not re-occupy it.
        let mut released_table = None;
        if new_status == OrderStatus::Completed {
            if let Some(table_id) = &order.table_id {
                sqlx::query(
                    r#"
                    UPDATE dining_tables SET status = ?3, updated_at = ?4
                    WHERE id = ?1 AND org_id = ?2
                    "#,
                )
                .bind(table_id)
                .bind(org_id)
                .bind(TableStatus::Available)
                .bind(now)
                .execute(&mut *tx)
                .await?;
                released_table = Some(table_id.clone());
            }
        }

        tx.commit().await?;

        info!(order_id = %order_id, from = ?order.status, to = ?new_status, "Order status changed");

        order.status = new_status;
        order.completed_at = completed_at;
        order.updated_at = now;

        self.feed.publish(ChangeEvent {
            org_id: org_id.to_string(),
            collection: Collection::Orders,
            entity_id: order_id.to_string(),
            action: ChangeAction::Updated,
        });
        if let Some(table_id) = released_table {
            self.feed.publish(ChangeEvent {
                org_id: org_id.to_string(),
                collection: Collection::Tables,
                entity_id: table_id,
                action: ChangeAction::Updated,
            });
        }

        Ok(order)
    }

    /// Completes an order. Refused with `UnpaidOrder` unless the paid
    /// flag is set or payments cover the total; on success the assigned
    /// table is released in the same transaction.
    pub async fn complete(&self, org_id: &str, order_id: &str) -> DbResult<Order> {
        self.transition(org_id, order_id, OrderStatus::Completed).await
    }

    /// Reopens a completed order. No guard beyond the legal edge; the
    /// table is not re-occupied.
    pub async fn reopen(&self, org_id: &str, order_id: &str) -> DbResult<Order> {
        self.transition(org_id, order_id, OrderStatus::Open).await
    }
}

/// Generates an order number in format: YYYYMMDD-NNNNN
///
/// ## Example
/// `20260805-40731`
///
/// The sequence is derived from the microsecond clock, so two orders
/// created back-to-back never collide on the (org, number) unique index.
/// TODO: replace with a per-organization daily counter.
fn generate_order_number(now: chrono::DateTime<Utc>) -> String {
    let date_part = now.format("%Y%m%d");
    let seq = (now.timestamp_micros() % 100000) as u32;
    format!("{}-{:05}", date_part, seq)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::table::NewTable;
    use crate::testutil::{draft_from_lines, test_db};
    use tally_core::cart::{Cart, CheckoutContext};
    use tally_core::types::OrgSettings;

    const ORG: &str = "org-test";

    /// Draft for a take-away order with a single 100.00 line.
    fn simple_draft() -> OrderDraft {
        draft_from_lines(&[("espresso", 10000, 1)], OrderType::TakeAway, None)
    }

    #[tokio::test]
    async fn test_create_from_draft_persists_items_and_totals() {
        let db = test_db().await;
        let repo = db.orders();

        let draft = draft_from_lines(
            &[("espresso", 1000, 2), ("scone", 500, 1)],
            OrderType::TakeAway,
            None,
        );
        let order = repo.create_from_draft(ORG, &draft, None).await.unwrap();

        assert_eq!(order.status, OrderStatus::Open);
        assert_eq!(order.subtotal_cents, 2500);
        assert_eq!(order.tax_cents, 375);
        assert_eq!(order.total_cents, 2875);

        let items = repo.get_items(&order.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items.iter().map(|i| i.line_total_cents).sum::<i64>(), 2500);
    }

    #[tokio::test]
    async fn test_dine_in_creation_occupies_table() {
        let db = test_db().await;
        let table = db
            .tables()
            .create(
                ORG,
                NewTable {
                    name: "Table 5".to_string(),
                    capacity: 4,
                },
            )
            .await
            .unwrap();

        let draft = draft_from_lines(&[("espresso", 1000, 1)], OrderType::DineIn, Some(&table.id));
        db.orders().create_from_draft(ORG, &draft, None).await.unwrap();

        let table = db.tables().get(ORG, &table.id).await.unwrap().unwrap();
        assert_eq!(table.status, TableStatus::Occupied);
    }

    #[tokio::test]
    async fn test_completion_guard_one_cent_short() {
        let db = test_db().await;
        let repo = db.orders();
        let order = repo.create_from_draft(ORG, &simple_draft(), None).await.unwrap();
        assert_eq!(order.total_cents, 11500); // 100.00 + 15% VAT

        repo.add_payment(ORG, &order.id, 11499, PaymentMethod::Cash, None)
            .await
            .unwrap();

        // One cent short: refused, status unchanged
        let err = repo.complete(ORG, &order.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::UnpaidOrder {
                total_cents: 11500,
                paid_cents: 11499,
            })
        ));
        let current = repo.get(ORG, &order.id).await.unwrap().unwrap();
        assert_eq!(current.status, OrderStatus::Open);
        assert!(current.completed_at.is_none());

        // The last cent arrives: completion succeeds
        repo.add_payment(ORG, &order.id, 1, PaymentMethod::Cash, None)
            .await
            .unwrap();
        let done = repo.complete(ORG, &order.id).await.unwrap();
        assert_eq!(done.status, OrderStatus::Completed);
        assert!(done.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_completion_releases_table_atomically() {
        let db = test_db().await;
        let table = db
            .tables()
            .create(
                ORG,
                NewTable {
                    name: "Table 2".to_string(),
                    capacity: 2,
                },
            )
            .await
            .unwrap();

        let draft = draft_from_lines(&[("set menu", 10000, 1)], OrderType::DineIn, Some(&table.id));
        let order = db.orders().create_from_draft(ORG, &draft, None).await.unwrap();

        // Unpaid completion attempt must leave the table occupied
        assert!(db.orders().complete(ORG, &order.id).await.is_err());
        let mid = db.tables().get(ORG, &table.id).await.unwrap().unwrap();
        assert_eq!(mid.status, TableStatus::Occupied);

        db.orders()
            .add_payment(ORG, &order.id, order.total_cents, PaymentMethod::Card, None)
            .await
            .unwrap();
        db.orders().complete(ORG, &order.id).await.unwrap();

        let released = db.tables().get(ORG, &table.id).await.unwrap().unwrap();
        assert_eq!(released.status, TableStatus::Available);
    }

    #[tokio::test]
    async fn test_paid_flag_allows_completion_without_payments() {
        let db = test_db().await;
        let repo = db.orders();
        let order = repo.create_from_draft(ORG, &simple_draft(), None).await.unwrap();

        repo.mark_paid(ORG, &order.id).await.unwrap();
        let done = repo.complete(ORG, &order.id).await.unwrap();
        assert_eq!(done.status, OrderStatus::Completed);
        assert!(repo.get_payments(&order.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_split_tender_derives_paid_flag() {
        let db = test_db().await;
        let repo = db.orders();
        let order = repo.create_from_draft(ORG, &simple_draft(), None).await.unwrap();

        let first = repo
            .add_payment(ORG, &order.id, 5000, PaymentMethod::Cash, None)
            .await
            .unwrap();
        assert!(!first.order_paid);
        assert_eq!(first.remaining_cents, 6500);

        let second = repo
            .add_payment(ORG, &order.id, 7000, PaymentMethod::Card, None)
            .await
            .unwrap();
        assert!(second.order_paid);
        assert_eq!(second.remaining_cents, 0);
        assert_eq!(second.change_cents, 500);

        let current = repo.get(ORG, &order.id).await.unwrap().unwrap();
        assert!(current.paid);
    }

    #[tokio::test]
    async fn test_payment_rejected_on_closed_order() {
        let db = test_db().await;
        let repo = db.orders();
        let order = repo.create_from_draft(ORG, &simple_draft(), None).await.unwrap();

        repo.transition(ORG, &order.id, OrderStatus::Cancelled).await.unwrap();

        let err = repo
            .add_payment(ORG, &order.id, 1000, PaymentMethod::Cash, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::OrderClosed { .. })));
    }

    #[tokio::test]
    async fn test_nonpositive_payment_rejected() {
        let db = test_db().await;
        let repo = db.orders();
        let order = repo.create_from_draft(ORG, &simple_draft(), None).await.unwrap();

        for amount in [0, -100] {
            let err = repo
                .add_payment(ORG, &order.id, amount, PaymentMethod::Cash, None)
                .await
                .unwrap_err();
            assert!(matches!(err, DbError::Core(_)));
        }
        assert!(repo.get_payments(&order.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hold_resume_cancel_flow() {
        let db = test_db().await;
        let repo = db.orders();
        let order = repo.create_from_draft(ORG, &simple_draft(), None).await.unwrap();

        let held = repo.transition(ORG, &order.id, OrderStatus::OnHold).await.unwrap();
        assert_eq!(held.status, OrderStatus::OnHold);

        let resumed = repo.transition(ORG, &order.id, OrderStatus::Open).await.unwrap();
        assert_eq!(resumed.status, OrderStatus::Open);

        let cancelled = repo
            .transition(ORG, &order.id, OrderStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        // Terminal: further transitions refused
        let err = repo.transition(ORG, &order.id, OrderStatus::Open).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidOrderTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_reopen_keeps_table_available() {
        let db = test_db().await;
        let table = db
            .tables()
            .create(
                ORG,
                NewTable {
                    name: "Table 9".to_string(),
                    capacity: 6,
                },
            )
            .await
            .unwrap();

        let draft = draft_from_lines(&[("banquet", 50000, 1)], OrderType::DineIn, Some(&table.id));
        let order = db.orders().create_from_draft(ORG, &draft, None).await.unwrap();
        db.orders().mark_paid(ORG, &order.id).await.unwrap();
        db.orders().complete(ORG, &order.id).await.unwrap();

        let reopened = db.orders().reopen(ORG, &order.id).await.unwrap();
        assert_eq!(reopened.status, OrderStatus::Open);
        assert!(reopened.completed_at.is_none());

        // Reopening does not re-occupy the table
        let t = db.tables().get(ORG, &table.id).await.unwrap().unwrap();
        assert_eq!(t.status, TableStatus::Available);
    }

    #[tokio::test]
    async fn test_empty_checkout_creates_no_order() {
        let db = test_db().await;
        let cart = Cart::new();
        let settings = OrgSettings::defaults(ORG, "Demo Bistro");
        let context = CheckoutContext {
            order_type: OrderType::TakeAway,
            table_id: None,
            customer_id: None,
        };

        assert!(matches!(
            cart.checkout(&settings, &context).unwrap_err(),
            CoreError::EmptyOrder
        ));
        assert!(db.orders().list(ORG).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_orders_are_org_scoped() {
        let db = test_db().await;
        let order = db
            .orders()
            .create_from_draft(ORG, &simple_draft(), None)
            .await
            .unwrap();

        assert!(db.orders().get("other-org", &order.id).await.unwrap().is_none());
        let err = db.orders().complete("other-org", &order.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
