//! # Repository Module
//!
//! Database repository implementations for Tally POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  API handler                                                           │
//! │       │                                                                 │
//! │       │  db.orders().complete(org_id, order_id)                        │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  OrderRepository                                                       │
//! │  ├── create_from_draft(org_id, draft)                                  │
//! │  ├── add_payment(org_id, payment)                                      │
//! │  └── complete(org_id, order_id)                                        │
//! │       │                                                                 │
//! │       │  SQL query (always filtered on org_id)                         │
//! │       ▼                                                                 │
//! │  SQLite Database ──► ChangeFeed.publish(...) on success                │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • Tenancy filtering lives in one place                                │
//! │  • SQL is isolated per collection                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`category::CategoryRepository`] - Category tree CRUD and re-parenting
//! - [`catalog::ProductRepository`] / [`catalog::ServiceRepository`] - Catalog entries
//! - [`table::TableRepository`] - Dining tables
//! - [`customer::CustomerRepository`] - Customers
//! - [`order::OrderRepository`] - Orders, items, payments, status changes
//! - [`invoice::InvoiceRepository`] - Invoices and their lifecycle
//! - [`settings::SettingsRepository`] - Per-organization configuration

pub mod catalog;
pub mod category;
pub mod customer;
pub mod invoice;
pub mod order;
pub mod settings;
pub mod table;
