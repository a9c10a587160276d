//! # Domain Types
//!
//! Core domain types used throughout Tally POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Catalog                    Sales                      Billing          │
//! │  ┌──────────────┐           ┌──────────────┐           ┌─────────────┐  │
//! │  │ Category     │           │ Order        │           │ Invoice     │  │
//! │  │ Product      │──snapshot─► OrderItem    │           │ InvoiceItem │  │
//! │  │ Service      │           │ OrderPayment │           │             │  │
//! │  └──────────────┘           └──────────────┘           └─────────────┘  │
//! │                                                                         │
//! │  Floor                      Parties                    Config           │
//! │  ┌──────────────┐           ┌──────────────┐           ┌─────────────┐  │
//! │  │ DiningTable  │           │ Customer     │           │ OrgSettings │  │
//! │  └──────────────┘           └──────────────┘           └─────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tenancy
//! Every entity carries `org_id`: the organization that owns it. The
//! database layer filters every query on it; no record is ever visible
//! across organizations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, PricingMode, TaxRate};

// =============================================================================
// Category
// =============================================================================

/// What a category may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Product,
    Service,
    /// Matches a filter for either products or services.
    Both,
}

impl CategoryKind {
    /// Whether this category shows up when browsing for `kind` entries.
    pub fn includes(&self, kind: ItemKind) -> bool {
        match self {
            CategoryKind::Both => true,
            CategoryKind::Product => kind == ItemKind::Product,
            CategoryKind::Service => kind == ItemKind::Service,
        }
    }
}

/// A node in the catalog category forest.
///
/// Multiple roots, unbounded depth. `parent_id = None` marks a root; a
/// `parent_id` pointing at a deleted category makes the node an effective
/// root for traversal (see [`crate::catalog`]).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub org_id: String,
    pub name: String,
    pub description: Option<String>,
    pub kind: CategoryKind,
    pub parent_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Catalog Entries
// =============================================================================

/// Discriminates product lines from service lines in carts and orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Product,
    Service,
}

/// A sellable product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub org_id: String,
    pub name: String,
    pub description: Option<String>,
    /// Price in cents (smallest currency unit).
    pub price_cents: i64,
    /// Owning category; `None` means uncategorized.
    pub category_id: Option<String>,
    /// Whether the product is active (soft delete).
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// A sellable service. Structurally parallel to [`Product`].
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub org_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub category_id: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Service {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Dining Table
// =============================================================================

/// Floor status of a dining table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Available,
    Occupied,
    Reserved,
    Maintenance,
}

impl Default for TableStatus {
    fn default() -> Self {
        TableStatus::Available
    }
}

/// A dining table on the restaurant floor.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiningTable {
    pub id: String,
    pub org_id: String,
    pub name: String,
    pub capacity: i64,
    pub status: TableStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Customer
// =============================================================================

/// A customer of the organization (walk-in or billed).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub org_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Tax registration number, printed on invoices when present.
    pub vat_number: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Order
// =============================================================================

/// The status of an order. Transitions are governed by
/// [`Order::transition`](crate::order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order is being taken or awaiting payment.
    Open,
    /// Parked (e.g. customer stepped away); resumable.
    OnHold,
    /// Paid and finished. Terminal, except explicit reopen.
    Completed,
    /// Abandoned before completion. Terminal.
    Cancelled,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Open
    }
}

/// How the order is fulfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    DineIn,
    TakeAway,
    Delivery,
}

/// A customer order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub org_id: String,
    pub order_number: String,
    pub status: OrderStatus,
    pub order_type: OrderType,
    pub subtotal_cents: i64,
    /// Tax rate in basis points at order time (frozen).
    pub tax_rate_bps: u32,
    pub tax_cents: i64,
    pub total_cents: i64,
    /// Cached payment-sufficiency flag; re-derived whenever a payment is
    /// recorded. The payment sum is the authoritative signal.
    pub paid: bool,
    pub table_id: Option<String>,
    pub customer_id: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Returns the frozen tax rate.
    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}

/// A line item in an order.
/// Uses snapshot pattern to freeze catalog data at order time.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    /// Catalog entry this line came from.
    pub item_id: String,
    pub kind: ItemKind,
    /// Name at order time (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at order time (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// unit_price × quantity. Stored for queries; recomputed, never set
    /// independently.
    pub line_total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Payment
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Other,
}

/// A payment towards an order.
/// An order can have multiple payments for split tender scenarios.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayment {
    pub id: String,
    pub order_id: String,
    /// Amount paid in cents. Strictly positive.
    pub amount_cents: i64,
    pub method: PaymentMethod,
    /// External reference (card auth code, transfer id).
    pub reference: Option<String>,
    #[ts(as = "String")]
    pub paid_at: DateTime<Utc>,
}

impl OrderPayment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// The status of an invoice. Linear progression, see
/// [`InvoiceStatus::transition`](crate::invoice).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Draft
    }
}

/// A billing document, structurally parallel to [`Order`] but oriented to
/// invoicing: it has a due date and a linear status progression instead of
/// a table and a payment guard.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub org_id: String,
    pub invoice_number: String,
    pub status: InvoiceStatus,
    pub subtotal_cents: i64,
    pub tax_rate_bps: u32,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub pricing_mode: PricingMode,
    pub customer_id: Option<String>,
    #[ts(as = "Option<String>")]
    pub due_date: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub issued_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item on an invoice. Same snapshot pattern as [`OrderItem`].
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub id: String,
    pub invoice_id: String,
    pub item_id: String,
    pub kind: ItemKind,
    pub name_snapshot: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub line_total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl InvoiceItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Organization Settings
// =============================================================================

/// Per-organization business configuration.
///
/// Lives in the settings collection, one row per organization. The tax
/// rate and pricing mode here are the defaults frozen onto new orders and
/// invoices at creation time.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrgSettings {
    pub org_id: String,
    pub business_name: String,
    pub address: Option<String>,
    pub vat_number: Option<String>,
    /// Symbol prefixed to formatted amounts on printed documents.
    pub currency_symbol: String,
    pub tax_rate_bps: u32,
    pub pricing_mode: PricingMode,
    /// Dine-in orders must name a table before checkout.
    pub require_table_for_dine_in: bool,
    /// Delivery orders must name a customer before checkout.
    pub require_customer_for_delivery: bool,
}

impl OrgSettings {
    /// Sensible defaults for a newly created organization.
    pub fn defaults(org_id: impl Into<String>, business_name: impl Into<String>) -> Self {
        OrgSettings {
            org_id: org_id.into(),
            business_name: business_name.into(),
            address: None,
            vat_number: None,
            currency_symbol: "$".to_string(),
            tax_rate_bps: 1500,
            pricing_mode: PricingMode::Exclusive,
            require_table_for_dine_in: true,
            require_customer_for_delivery: false,
        }
    }

    /// Returns the configured tax rate.
    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_kind_both_matches_either_filter() {
        assert!(CategoryKind::Both.includes(ItemKind::Product));
        assert!(CategoryKind::Both.includes(ItemKind::Service));
        assert!(CategoryKind::Product.includes(ItemKind::Product));
        assert!(!CategoryKind::Product.includes(ItemKind::Service));
        assert!(!CategoryKind::Service.includes(ItemKind::Product));
    }

    #[test]
    fn test_order_status_default() {
        assert_eq!(OrderStatus::default(), OrderStatus::Open);
    }

    #[test]
    fn test_table_status_default() {
        assert_eq!(TableStatus::default(), TableStatus::Available);
    }

    #[test]
    fn test_settings_defaults() {
        let settings = OrgSettings::defaults("org-1", "Demo Bistro");
        assert_eq!(settings.pricing_mode, PricingMode::Exclusive);
        assert_eq!(settings.tax_rate().bps(), 1500);
        assert!(settings.require_table_for_dine_in);
    }
}
