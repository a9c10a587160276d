//! # Cart Engine
//!
//! Maintains the list of line items for an in-progress order and computes
//! monetary totals consistently.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  UI Action                Operation              Cart Change            │
//! │  ─────────                ─────────              ───────────            │
//! │  Tap product ───────────► add_product() ───────► merge or push line    │
//! │  Tap service ───────────► add_service() ───────► merge or push line    │
//! │  Change quantity ───────► update_quantity() ───► qty = n (0 removes)   │
//! │  Tap remove ────────────► remove_line() ───────► line dropped          │
//! │  Checkout ──────────────► checkout() ──────────► OrderDraft            │
//! │  Confirm discard ───────► clear() ─────────────► lines emptied         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Merge Policy (the contract)
//! Lines are keyed by `(kind, item_id)`. Adding a key that is already
//! present sums quantities instead of pushing a duplicate line. This is
//! the single documented add-to-cart policy for the whole system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{compute_totals, Money, Totals};
use crate::types::{ItemKind, OrderType, OrgSettings, Product, Service};
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// A line in the cart.
///
/// ## Design Notes
/// - `item_id` + `kind`: the merge key, referencing the catalog entry
/// - name and price are frozen at the moment of adding, so the cart
///   displays consistent data even if the catalog changes underneath it
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Catalog entry id (product or service).
    pub item_id: String,

    /// Whether this line is a product or a service.
    pub kind: ItemKind,

    /// Name at time of adding (frozen).
    pub name: String,

    /// Price in cents at time of adding (frozen).
    pub unit_price_cents: i64,

    /// Quantity in cart. Always positive.
    pub quantity: i64,

    /// When this line was first added.
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Calculates the line total (unit price × quantity).
    ///
    /// This is always computed, never stored, so it cannot drift from its
    /// inputs.
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }

    /// Returns the line total as Money.
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents())
    }
}

// =============================================================================
// Checkout Inputs / Output
// =============================================================================

/// Selections accompanying a checkout: how the order is fulfilled and for
/// whom. Organization settings decide which of these are mandatory.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutContext {
    pub order_type: OrderType,
    pub table_id: Option<String>,
    pub customer_id: Option<String>,
}

/// The outcome of a successful checkout: everything needed to persist an
/// order, with totals already computed. Nothing has been written yet.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub order_type: OrderType,
    pub table_id: Option<String>,
    pub customer_id: Option<String>,
    pub lines: Vec<CartLine>,
    pub totals: Totals,
    /// Tax rate frozen from settings at checkout time.
    pub tax_rate_bps: u32,
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `(kind, item_id)` (adding merges quantities)
/// - Quantity is always > 0 (updating to 0 or below removes the line)
/// - Maximum lines: [`MAX_CART_LINES`]
/// - Maximum quantity per line: [`MAX_LINE_QUANTITY`]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Lines in the cart.
    pub lines: Vec<CartLine>,

    /// When the cart was created/last cleared.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds a product to the cart, merging with an existing line for the
    /// same product.
    pub fn add_product(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        self.add_line(
            ItemKind::Product,
            &product.id,
            &product.name,
            product.price_cents,
            quantity,
        )
    }

    /// Adds a service to the cart, merging with an existing line for the
    /// same service.
    pub fn add_service(&mut self, service: &Service, quantity: i64) -> CoreResult<()> {
        self.add_line(
            ItemKind::Service,
            &service.id,
            &service.name,
            service.price_cents,
            quantity,
        )
    }

    /// Adds a line, merging by `(kind, item_id)`.
    ///
    /// ## Behavior
    /// - Key already in cart: quantities are summed (price stays frozen
    ///   at the original line's value)
    /// - New key: a new line is pushed
    ///
    /// ## Errors
    /// - [`CoreError::QuantityTooLarge`] if the merged quantity would
    ///   exceed [`MAX_LINE_QUANTITY`]
    /// - [`CoreError::CartTooLarge`] if a new line would exceed
    ///   [`MAX_CART_LINES`]
    /// - [`CoreError::Validation`] for a non-positive quantity
    pub fn add_line(
        &mut self,
        kind: ItemKind,
        item_id: &str,
        name: &str,
        unit_price_cents: i64,
        quantity: i64,
    ) -> CoreResult<()> {
        crate::validation::validate_quantity(quantity)?;

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.kind == kind && l.item_id == item_id)
        {
            let new_qty = line.quantity + quantity;
            if new_qty > MAX_LINE_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_LINE_QUANTITY,
                });
            }
            line.quantity = new_qty;
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        self.lines.push(CartLine {
            item_id: item_id.to_string(),
            kind,
            name: name.to_string(),
            unit_price_cents,
            quantity,
            added_at: Utc::now(),
        });
        Ok(())
    }

    /// Removes a line by its `(kind, item_id)` key.
    ///
    /// Idempotent: removing an absent key leaves the cart unchanged.
    pub fn remove_line(&mut self, kind: ItemKind, item_id: &str) {
        self.lines
            .retain(|l| !(l.kind == kind && l.item_id == item_id));
    }

    /// Updates the quantity of a line.
    ///
    /// ## Behavior
    /// - `quantity <= 0`: removes the line (a zero or negative quantity is
    ///   never persisted)
    /// - Line not found: [`CoreError::NotFound`]
    pub fn update_quantity(&mut self, kind: ItemKind, item_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            self.remove_line(kind, item_id);
            return Ok(());
        }

        if quantity > MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_LINE_QUANTITY,
            });
        }

        match self
            .lines
            .iter_mut()
            .find(|l| l.kind == kind && l.item_id == item_id)
        {
            Some(line) => {
                line.quantity = quantity;
                Ok(())
            }
            None => Err(CoreError::not_found("Cart line", item_id)),
        }
    }

    /// Clears all lines from the cart.
    ///
    /// Destructive and irrecoverable: callers invoke this only after a
    /// successful checkout, or after the user explicitly confirms
    /// discarding the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.created_at = Utc::now();
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the number of lines in the cart.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns the total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of all line totals, unrounded aggregate of whole-cent lines.
    ///
    /// Net of tax under exclusive pricing, gross under inclusive pricing.
    pub fn line_sum(&self) -> Money {
        Money::from_cents(self.lines.iter().map(|l| l.line_total_cents()).sum())
    }

    /// Computes the cart's monetary summary under the organization's
    /// configured tax rate and pricing mode.
    pub fn totals(&self, settings: &OrgSettings) -> Totals {
        compute_totals(self.line_sum(), settings.tax_rate(), settings.pricing_mode)
    }

    /// Validates the cart against organization policy and produces an
    /// [`OrderDraft`] ready for persistence.
    ///
    /// ## Errors
    /// - [`CoreError::EmptyOrder`] with zero lines
    /// - [`CoreError::MissingContext`] when the policy requires a table
    ///   (dine-in) or a customer (delivery) and the context lacks it
    ///
    /// Nothing is persisted here; the caller hands the draft to the
    /// storage layer. The cart itself is untouched, so a failed checkout
    /// loses nothing.
    pub fn checkout(
        &self,
        settings: &OrgSettings,
        context: &CheckoutContext,
    ) -> CoreResult<OrderDraft> {
        if self.is_empty() {
            return Err(CoreError::EmptyOrder);
        }

        if settings.require_table_for_dine_in
            && context.order_type == OrderType::DineIn
            && context.table_id.is_none()
        {
            return Err(CoreError::MissingContext { what: "table" });
        }

        if settings.require_customer_for_delivery
            && context.order_type == OrderType::Delivery
            && context.customer_id.is_none()
        {
            return Err(CoreError::MissingContext { what: "customer" });
        }

        Ok(OrderDraft {
            order_type: context.order_type,
            table_id: context.table_id.clone(),
            customer_id: context.customer_id.clone(),
            lines: self.lines.clone(),
            totals: self.totals(settings),
            tax_rate_bps: settings.tax_rate_bps,
        })
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::PricingMode;

    fn test_product(id: &str, price_cents: i64) -> Product {
        Product {
            id: id.to_string(),
            org_id: "org-1".to_string(),
            name: format!("Product {}", id),
            description: None,
            price_cents,
            category_id: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn test_service(id: &str, price_cents: i64) -> Service {
        Service {
            id: id.to_string(),
            org_id: "org-1".to_string(),
            name: format!("Service {}", id),
            description: None,
            price_cents,
            category_id: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn test_settings() -> OrgSettings {
        OrgSettings::defaults("org-1", "Demo Bistro")
    }

    #[test]
    fn test_add_merges_by_kind_and_id() {
        let mut cart = Cart::new();
        let product = test_product("1", 999);

        cart.add_product(&product, 2).unwrap();
        cart.add_product(&product, 3).unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_same_id_different_kind_stays_separate() {
        // A product and a service can share an id; the merge key is
        // (kind, item_id), so they remain distinct lines.
        let mut cart = Cart::new();
        cart.add_product(&test_product("1", 1000), 1).unwrap();
        cart.add_service(&test_service("1", 2000), 1).unwrap();

        assert_eq!(cart.line_count(), 2);
        assert_eq!(cart.line_sum().cents(), 3000);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut cart = Cart::new();
        cart.add_product(&test_product("1", 999), 2).unwrap();

        cart.remove_line(ItemKind::Product, "no-such-line");
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total_quantity(), 2);

        cart.remove_line(ItemKind::Product, "1");
        cart.remove_line(ItemKind::Product, "1");
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_zero_removes() {
        let mut cart = Cart::new();
        cart.add_product(&test_product("1", 999), 2).unwrap();

        cart.update_quantity(ItemKind::Product, "1", 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_negative_removes() {
        let mut cart = Cart::new();
        cart.add_product(&test_product("1", 999), 2).unwrap();

        cart.update_quantity(ItemKind::Product, "1", -5).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_missing_line_errors() {
        let mut cart = Cart::new();
        let err = cart
            .update_quantity(ItemKind::Product, "ghost", 3)
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn test_quantity_cap_on_merge() {
        let mut cart = Cart::new();
        let product = test_product("1", 100);
        cart.add_product(&product, crate::MAX_LINE_QUANTITY).unwrap();

        let err = cart.add_product(&product, 1).unwrap_err();
        assert!(matches!(err, CoreError::QuantityTooLarge { .. }));
        assert_eq!(cart.total_quantity(), crate::MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_exclusive_totals_through_cart() {
        // [(10.00 × 2), (5.00 × 1)] at 15% → 25.00 / 3.75 / 28.75
        let mut cart = Cart::new();
        cart.add_product(&test_product("1", 1000), 2).unwrap();
        cart.add_product(&test_product("2", 500), 1).unwrap();

        let totals = cart.totals(&test_settings());
        assert_eq!(totals.subtotal_cents, 2500);
        assert_eq!(totals.tax_cents, 375);
        assert_eq!(totals.total_cents, 2875);
    }

    #[test]
    fn test_inclusive_totals_through_cart() {
        let mut cart = Cart::new();
        cart.add_product(&test_product("1", 2875), 1).unwrap();

        let mut settings = test_settings();
        settings.pricing_mode = PricingMode::Inclusive;

        let totals = cart.totals(&settings);
        assert_eq!(totals.total_cents, 2875);
        assert_eq!(totals.tax_cents, 375);
        assert_eq!(totals.subtotal_cents, 2500);
    }

    #[test]
    fn test_checkout_empty_cart_fails() {
        let cart = Cart::new();
        let context = CheckoutContext {
            order_type: OrderType::TakeAway,
            table_id: None,
            customer_id: None,
        };

        let err = cart.checkout(&test_settings(), &context).unwrap_err();
        assert!(matches!(err, CoreError::EmptyOrder));
    }

    #[test]
    fn test_checkout_dine_in_requires_table() {
        let mut cart = Cart::new();
        cart.add_product(&test_product("1", 1000), 1).unwrap();

        let context = CheckoutContext {
            order_type: OrderType::DineIn,
            table_id: None,
            customer_id: None,
        };

        let err = cart.checkout(&test_settings(), &context).unwrap_err();
        assert!(matches!(err, CoreError::MissingContext { what: "table" }));

        // Same cart, with a table selected
        let context = CheckoutContext {
            order_type: OrderType::DineIn,
            table_id: Some("table-5".to_string()),
            customer_id: None,
        };
        let draft = cart.checkout(&test_settings(), &context).unwrap();
        assert_eq!(draft.table_id.as_deref(), Some("table-5"));
        assert_eq!(draft.totals.total_cents, 1150);
    }

    #[test]
    fn test_checkout_take_away_needs_no_table() {
        let mut cart = Cart::new();
        cart.add_product(&test_product("1", 1000), 1).unwrap();

        let context = CheckoutContext {
            order_type: OrderType::TakeAway,
            table_id: None,
            customer_id: None,
        };
        assert!(cart.checkout(&test_settings(), &context).is_ok());
    }

    #[test]
    fn test_checkout_delivery_requires_customer_when_configured() {
        let mut cart = Cart::new();
        cart.add_product(&test_product("1", 1000), 1).unwrap();

        let mut settings = test_settings();
        settings.require_customer_for_delivery = true;

        let context = CheckoutContext {
            order_type: OrderType::Delivery,
            table_id: None,
            customer_id: None,
        };
        let err = cart.checkout(&settings, &context).unwrap_err();
        assert!(matches!(err, CoreError::MissingContext { what: "customer" }));
    }

    #[test]
    fn test_checkout_leaves_cart_intact() {
        let mut cart = Cart::new();
        cart.add_product(&test_product("1", 1000), 2).unwrap();

        let context = CheckoutContext {
            order_type: OrderType::TakeAway,
            table_id: None,
            customer_id: None,
        };
        let draft = cart.checkout(&test_settings(), &context).unwrap();
        assert_eq!(draft.lines.len(), 1);

        // The cart still has its lines; clearing is the caller's call
        assert_eq!(cart.line_count(), 1);
        cart.clear();
        assert!(cart.is_empty());
    }
}
