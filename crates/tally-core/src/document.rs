//! # Document Projection
//!
//! Flattens orders and invoices into the pre-formatted key/value shape the
//! template renderer consumes. The renderer (a collaborator outside this
//! crate) substitutes named placeholders and iterates the line list inside
//! an HTML template; everything it needs arrives here already computed
//! and formatted, so no templating or HTML logic lives in the core.
//!
//! ```text
//!  Order + OrgSettings + Table? + Customer?
//!        │
//!        ▼
//!  DocumentData {
//!      fields: { "orderNumber": "20260805-0042",
//!                "subtotal": "$25.00", "taxAmount": "$3.75", ... },
//!      lines:  [ { "name": "Flat White", "quantity": "2",
//!                  "unitPrice": "$10.00", "lineTotal": "$20.00" }, ... ],
//!  }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Customer, DiningTable, Invoice, InvoiceItem, Order, OrderItem, OrgSettings};

/// A fully computed, flat projection of a printable document.
///
/// `fields` holds scalar placeholders; `lines` holds one map per line
/// item for the renderer's repeat section. All monetary values are
/// pre-formatted with the organization's currency symbol; dates are
/// RFC 3339.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DocumentData {
    pub fields: BTreeMap<String, String>,
    pub lines: Vec<BTreeMap<String, String>>,
}

/// Formats a basis-point rate for display: `1500 → "15%"`, `825 → "8.25%"`.
fn format_rate(bps: u32) -> String {
    if bps % 100 == 0 {
        format!("{}%", bps / 100)
    } else {
        format!("{}%", bps as f64 / 100.0)
    }
}

fn insert_business(fields: &mut BTreeMap<String, String>, settings: &OrgSettings) {
    fields.insert("businessName".into(), settings.business_name.clone());
    if let Some(address) = &settings.address {
        fields.insert("businessAddress".into(), address.clone());
    }
    if let Some(vat) = &settings.vat_number {
        fields.insert("businessVatNumber".into(), vat.clone());
    }
}

fn insert_customer(fields: &mut BTreeMap<String, String>, customer: &Customer) {
    fields.insert("customerName".into(), customer.name.clone());
    if let Some(email) = &customer.email {
        fields.insert("customerEmail".into(), email.clone());
    }
    if let Some(phone) = &customer.phone {
        fields.insert("customerPhone".into(), phone.clone());
    }
    if let Some(address) = &customer.address {
        fields.insert("customerAddress".into(), address.clone());
    }
    if let Some(vat) = &customer.vat_number {
        fields.insert("customerVatNumber".into(), vat.clone());
    }
}

fn line_entry(
    name: &str,
    quantity: i64,
    unit_price_cents: i64,
    line_total_cents: i64,
    symbol: &str,
) -> BTreeMap<String, String> {
    let mut line = BTreeMap::new();
    line.insert("name".into(), name.to_string());
    line.insert("quantity".into(), quantity.to_string());
    line.insert(
        "unitPrice".into(),
        Money::from_cents(unit_price_cents).formatted(symbol),
    );
    line.insert(
        "lineTotal".into(),
        Money::from_cents(line_total_cents).formatted(symbol),
    );
    line
}

/// Projects an order (receipt) into renderer-ready form.
pub fn order_document(
    order: &Order,
    items: &[OrderItem],
    settings: &OrgSettings,
    table: Option<&DiningTable>,
    customer: Option<&Customer>,
) -> DocumentData {
    let symbol = settings.currency_symbol.as_str();
    let mut fields = BTreeMap::new();

    insert_business(&mut fields, settings);

    fields.insert("documentType".into(), "order".into());
    fields.insert("orderNumber".into(), order.order_number.clone());
    fields.insert(
        "status".into(),
        format!("{:?}", order.status).to_lowercase(),
    );
    fields.insert("date".into(), order.created_at.to_rfc3339());
    if let Some(completed_at) = order.completed_at {
        fields.insert("completedAt".into(), completed_at.to_rfc3339());
    }

    if let Some(table) = table {
        fields.insert("tableName".into(), table.name.clone());
    }
    if let Some(customer) = customer {
        insert_customer(&mut fields, customer);
    }

    fields.insert(
        "subtotal".into(),
        Money::from_cents(order.subtotal_cents).formatted(symbol),
    );
    fields.insert("taxRate".into(), format_rate(order.tax_rate_bps));
    fields.insert(
        "taxAmount".into(),
        Money::from_cents(order.tax_cents).formatted(symbol),
    );
    fields.insert(
        "total".into(),
        Money::from_cents(order.total_cents).formatted(symbol),
    );
    fields.insert("paid".into(), if order.paid { "yes" } else { "no" }.into());

    let lines = items
        .iter()
        .map(|item| {
            line_entry(
                &item.name_snapshot,
                item.quantity,
                item.unit_price_cents,
                item.line_total_cents,
                symbol,
            )
        })
        .collect();

    DocumentData { fields, lines }
}

/// Projects an invoice into renderer-ready form.
pub fn invoice_document(
    invoice: &Invoice,
    items: &[InvoiceItem],
    settings: &OrgSettings,
    customer: Option<&Customer>,
) -> DocumentData {
    let symbol = settings.currency_symbol.as_str();
    let mut fields = BTreeMap::new();

    insert_business(&mut fields, settings);

    fields.insert("documentType".into(), "invoice".into());
    fields.insert("invoiceNumber".into(), invoice.invoice_number.clone());
    fields.insert(
        "status".into(),
        format!("{:?}", invoice.status).to_lowercase(),
    );
    fields.insert("date".into(), invoice.created_at.to_rfc3339());
    if let Some(issued_at) = invoice.issued_at {
        fields.insert("issuedAt".into(), issued_at.to_rfc3339());
    }
    if let Some(due_date) = invoice.due_date {
        fields.insert("dueDate".into(), due_date.to_rfc3339());
    }

    if let Some(customer) = customer {
        insert_customer(&mut fields, customer);
    }

    fields.insert(
        "subtotal".into(),
        Money::from_cents(invoice.subtotal_cents).formatted(symbol),
    );
    fields.insert("taxRate".into(), format_rate(invoice.tax_rate_bps));
    fields.insert(
        "taxAmount".into(),
        Money::from_cents(invoice.tax_cents).formatted(symbol),
    );
    fields.insert(
        "total".into(),
        Money::from_cents(invoice.total_cents).formatted(symbol),
    );

    let lines = items
        .iter()
        .map(|item| {
            line_entry(
                &item.name_snapshot,
                item.quantity,
                item.unit_price_cents,
                item.line_total_cents,
                symbol,
            )
        })
        .collect();

    DocumentData { fields, lines }
}

// =============================================================================
// Unit Tests
// =============================================================================
