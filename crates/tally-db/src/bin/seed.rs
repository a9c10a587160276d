//! # Seed Data Generator
//!
//! Populates the database with a demo organization for development.
//!
//! ## Usage
//! ```bash
//! # Seed into ./tally.db (default)
//! cargo run -p tally-db --bin seed
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//!
//! # Or via environment
//! TALLY_DB_PATH=./data/tally.db cargo run -p tally-db --bin seed
//! ```
//!
//! ## Generated Data
//! One organization ("demo") with:
//! - Settings: 15% VAT, exclusive pricing, dine-in requires a table
//! - A small category tree (Drinks → Hot/Cold, Food, Repairs)
//! - Products and services spread across the categories
//! - A handful of dining tables and one billing customer

use std::env;

use tally_core::types::{CategoryKind, OrgSettings};
use tally_db::{Database, DbConfig, NewCatalogEntry, NewCategory, NewCustomer, NewTable};
use tracing::info;

const ORG_ID: &str = "demo";

const HOT_DRINKS: &[(&str, i64)] = &[
    ("Espresso", 350),
    ("Flat White", 450),
    ("Cappuccino", 475),
    ("Pot of Tea", 400),
];

const COLD_DRINKS: &[(&str, i64)] = &[
    ("Fresh Orange Juice", 550),
    ("Sparkling Water", 300),
    ("Iced Latte", 500),
];

const FOOD: &[(&str, i64)] = &[
    ("Club Sandwich", 1250),
    ("Margherita Pizza", 1450),
    ("Caesar Salad", 1100),
    ("Scone with Jam", 500),
];

const REPAIR_SERVICES: &[(&str, i64)] = &[
    ("Screen Replacement", 9900),
    ("Battery Swap", 4500),
    ("Diagnostics", 2500),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let db_path = parse_db_path();
    info!(path = %db_path, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    seed_settings(&db).await?;
    seed_catalog(&db).await?;
    seed_floor(&db).await?;
    seed_customers(&db).await?;

    info!("Seed complete");
    db.close().await;
    Ok(())
}

/// Reads the database path from `--db <path>` or `TALLY_DB_PATH`,
/// defaulting to `./tally.db`.
fn parse_db_path() -> String {
    let args: Vec<String> = env::args().collect();
    if let Some(pos) = args.iter().position(|a| a == "--db") {
        if let Some(path) = args.get(pos + 1) {
            return path.clone();
        }
    }
    env::var("TALLY_DB_PATH").unwrap_or_else(|_| "./tally.db".to_string())
}

async fn seed_settings(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = OrgSettings::defaults(ORG_ID, "Demo Bistro & Repair");
    settings.address = Some("1 Harbour Street".to_string());
    settings.vat_number = Some("310123456700003".to_string());
    db.settings().upsert(&settings).await?;
    info!(org_id = ORG_ID, "Settings seeded");
    Ok(())
}

async fn seed_catalog(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    let categories = db.categories();
    let products = db.products();
    let services = db.services();

    let drinks = categories
        .create(ORG_ID, category("Drinks", CategoryKind::Product, None))
        .await?;
    let hot = categories
        .create(ORG_ID, category("Hot", CategoryKind::Product, Some(&drinks.id)))
        .await?;
    let cold = categories
        .create(ORG_ID, category("Cold", CategoryKind::Product, Some(&drinks.id)))
        .await?;
    let food = categories
        .create(ORG_ID, category("Food", CategoryKind::Product, None))
        .await?;
    let repairs = categories
        .create(ORG_ID, category("Repairs", CategoryKind::Service, None))
        .await?;

    for (name, price) in HOT_DRINKS {
        products.create(ORG_ID, entry(name, *price, &hot.id)).await?;
    }
    for (name, price) in COLD_DRINKS {
        products.create(ORG_ID, entry(name, *price, &cold.id)).await?;
    }
    for (name, price) in FOOD {
        products.create(ORG_ID, entry(name, *price, &food.id)).await?;
    }
    for (name, price) in REPAIR_SERVICES {
        services.create(ORG_ID, entry(name, *price, &repairs.id)).await?;
    }

    info!(
        products = HOT_DRINKS.len() + COLD_DRINKS.len() + FOOD.len(),
        services = REPAIR_SERVICES.len(),
        "Catalog seeded"
    );
    Ok(())
}

async fn seed_floor(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    let tables = db.tables();
    for (name, capacity) in [("Table 1", 2), ("Table 2", 2), ("Table 3", 4), ("Table 4", 6)] {
        tables
            .create(
                ORG_ID,
                NewTable {
                    name: name.to_string(),
                    capacity,
                },
            )
            .await?;
    }
    info!("Floor seeded");
    Ok(())
}

async fn seed_customers(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    db.customers()
        .create(
            ORG_ID,
            NewCustomer {
                name: "Acme Ltd".to_string(),
                email: Some("billing@acme.example".to_string()),
                phone: Some("+1 555 0100".to_string()),
                address: Some("42 Industrial Way".to_string()),
                vat_number: Some("GB123456789".to_string()),
            },
        )
        .await?;
    info!("Customers seeded");
    Ok(())
}

fn category(name: &str, kind: CategoryKind, parent: Option<&str>) -> NewCategory {
    NewCategory {
        name: name.to_string(),
        description: None,
        kind,
        parent_id: parent.map(String::from),
    }
}

fn entry(name: &str, price_cents: i64, category_id: &str) -> NewCatalogEntry {
    NewCatalogEntry {
        name: name.to_string(),
        description: None,
        price_cents,
        category_id: Some(category_id.to_string()),
    }
}
