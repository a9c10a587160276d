//! # tally-db: Database Layer for Tally POS
//!
//! This crate provides database access for the Tally POS system.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Data Flow                              │
//! │                                                                         │
//! │  API handler (complete_order)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  ChangeFeed  │  │   │
//! │  │   │   (pool.rs)   │    │ (per entity)  │    │  (feed.rs)   │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ org-filtered  │───►│ broadcast    │  │   │
//! │  │   │ Migrations    │    │ queries + tx  │    │ per (org,    │  │   │
//! │  │   │               │    │               │    │  collection) │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (WAL mode, foreign keys on)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`feed`] - Reference-counted change notification (live-query analog)
//! - [`repository`] - Repository implementations per collection
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/tally.db")).await?;
//!
//! let categories = db.categories().list(org_id).await?;
//! let order = db.orders().create_from_draft(org_id, &draft, None).await?;
//! db.orders().complete(org_id, &order.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod feed;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use feed::{ChangeAction, ChangeEvent, ChangeFeed, Collection, FeedSubscription};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::catalog::{NewCatalogEntry, ProductRepository, ServiceRepository};
pub use repository::category::{CategoryRepository, NewCategory};
pub use repository::customer::{CustomerRepository, NewCustomer};
pub use repository::invoice::InvoiceRepository;
pub use repository::order::{OrderRepository, PaymentReceipt};
pub use repository::settings::SettingsRepository;
pub use repository::table::{NewTable, TableRepository};

// =============================================================================
// Test Utilities
// =============================================================================
