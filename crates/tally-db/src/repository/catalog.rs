//! # Catalog Repositories
//!
//! Database operations for products and services. The two collections are
//! structurally identical; each gets its own table and repository so the
//! schemas can drift independently (stock tracking is on the roadmap for
//! products only).
//!
//! Deletion is soft (`is_active = 0`): historical order lines keep their
//! snapshots, and a deactivated entry can be restored.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::feed::{ChangeAction, ChangeEvent, ChangeFeed, Collection};
use tally_core::types::{Product, Service};
use tally_core::validation;

/// Input for creating a product or service.
#[derive(Debug, Clone)]
pub struct NewCatalogEntry {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub category_id: Option<String>,
}

// =============================================================================
// Product Repository
// =============================================================================

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        ProductRepository { pool, feed }
    }

    /// Lists active products, ordered by name.
    pub async fn list(&self, org_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, org_id, name, description, price_cents, category_id,
                   is_active, created_at, updated_at
            FROM products
            WHERE org_id = ?1 AND is_active = 1
            ORDER BY name
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists active products in a category (`None` = uncategorized).
    pub async fn list_by_category(
        &self,
        org_id: &str,
        category_id: Option<&str>,
    ) -> DbResult<Vec<Product>> {
        let products = match category_id {
            Some(category_id) => {
                sqlx::query_as::<_, Product>(
                    r#"
                    SELECT id, org_id, name, description, price_cents, category_id,
                           is_active, created_at, updated_at
                    FROM products
                    WHERE org_id = ?1 AND is_active = 1 AND category_id = ?2
                    ORDER BY name
                    "#,
                )
                .bind(org_id)
                .bind(category_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Product>(
                    r#"
                    SELECT id, org_id, name, description, price_cents, category_id,
                           is_active, created_at, updated_at
                    FROM products
                    WHERE org_id = ?1 AND is_active = 1 AND category_id IS NULL
                    ORDER BY name
                    "#,
                )
                .bind(org_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(products)
    }

    /// Gets a product by id (active or not).
    pub async fn get(&self, org_id: &str, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, org_id, name, description, price_cents, category_id,
                   is_active, created_at, updated_at
            FROM products
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Creates a product.
    pub async fn create(&self, org_id: &str, new: NewCatalogEntry) -> DbResult<Product> {
        validation::validate_name(&new.name).map_err(tally_core::CoreError::from)?;
        validation::validate_price_cents(new.price_cents).map_err(tally_core::CoreError::from)?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            org_id: org_id.to_string(),
            name: new.name.trim().to_string(),
            description: new.description,
            price_cents: new.price_cents,
            category_id: new.category_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(org_id = %org_id, name = %product.name, "Creating product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, org_id, name, description, price_cents, category_id,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.org_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(&product.category_id)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        self.feed.publish(ChangeEvent {
            org_id: org_id.to_string(),
            collection: Collection::Products,
            entity_id: product.id.clone(),
            action: ChangeAction::Created,
        });

        Ok(product)
    }

    /// Updates a product's editable fields.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        validation::validate_name(&product.name).map_err(tally_core::CoreError::from)?;
        validation::validate_price_cents(product.price_cents)
            .map_err(tally_core::CoreError::from)?;

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?3,
                description = ?4,
                price_cents = ?5,
                category_id = ?6,
                is_active = ?7,
                updated_at = ?8
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(&product.id)
        .bind(&product.org_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(&product.category_id)
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        self.feed.publish(ChangeEvent {
            org_id: product.org_id.clone(),
            collection: Collection::Products,
            entity_id: product.id.clone(),
            action: ChangeAction::Updated,
        });

        Ok(())
    }

    /// Soft-deletes a product by setting `is_active = 0`.
    pub async fn soft_delete(&self, org_id: &str, id: &str) -> DbResult<()> {
        debug!(org_id = %org_id, id = %id, "Soft-deleting product");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE products SET is_active = 0, updated_at = ?3
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.feed.publish(ChangeEvent {
            org_id: org_id.to_string(),
            collection: Collection::Products,
            entity_id: id.to_string(),
            action: ChangeAction::Deleted,
        });

        Ok(())
    }
}

// =============================================================================
// Service Repository
// =============================================================================

/// Repository for service database operations.
#[derive(Debug, Clone)]
pub struct ServiceRepository {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl ServiceRepository {
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        ServiceRepository { pool, feed }
    }

    /// Lists active services, ordered by name.
    pub async fn list(&self, org_id: &str) -> DbResult<Vec<Service>> {
        let services = sqlx::query_as::<_, Service>(
            r#"
            SELECT id, org_id, name, description, price_cents, category_id,
                   is_active, created_at, updated_at
            FROM services
            WHERE org_id = ?1 AND is_active = 1
            ORDER BY name
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(services)
    }

    /// Lists active services in a category (`None` = uncategorized).
    pub async fn list_by_category(
        &self,
        org_id: &str,
        category_id: Option<&str>,
    ) -> DbResult<Vec<Service>> {
        let services = match category_id {
            Some(category_id) => {
                sqlx::query_as::<_, Service>(
                    r#"
                    SELECT id, org_id, name, description, price_cents, category_id,
                           is_active, created_at, updated_at
                    FROM services
                    WHERE org_id = ?1 AND is_active = 1 AND category_id = ?2
                    ORDER BY name
                    "#,
                )
                .bind(org_id)
                .bind(category_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Service>(
                    r#"
                    SELECT id, org_id, name, description, price_cents, category_id,
                           is_active, created_at, updated_at
                    FROM services
                    WHERE org_id = ?1 AND is_active = 1 AND category_id IS NULL
                    ORDER BY name
                    "#,
                )
                .bind(org_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(services)
    }

    /// Gets a service by id (active or not).
    pub async fn get(&self, org_id: &str, id: &str) -> DbResult<Option<Service>> {
        let service = sqlx::query_as::<_, Service>(
            r#"
            SELECT id, org_id, name, description, price_cents, category_id,
                   is_active, created_at, updated_at
            FROM services
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(service)
    }

    /// Creates a service.
    pub async fn create(&self, org_id: &str, new: NewCatalogEntry) -> DbResult<Service> {
        validation::validate_name(&new.name).map_err(tally_core::CoreError::from)?;
        validation::validate_price_cents(new.price_cents).map_err(tally_core::CoreError::from)?;

        let now = Utc::now();
        let service = Service {
            id: Uuid::new_v4().to_string(),
            org_id: org_id.to_string(),
            name: new.name.trim().to_string(),
            description: new.description,
            price_cents: new.price_cents,
            category_id: new.category_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(org_id = %org_id, name = %service.name, "Creating service");

        sqlx::query(
            r#"
            INSERT INTO services (
                id, org_id, name, description, price_cents, category_id,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&service.id)
        .bind(&service.org_id)
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.price_cents)
        .bind(&service.category_id)
        .bind(service.is_active)
        .bind(service.created_at)
        .bind(service.updated_at)
        .execute(&self.pool)
        .await?;

        self.feed.publish(ChangeEvent {
            org_id: org_id.to_string(),
            collection: Collection::Services,
            entity_id: service.id.clone(),
            action: ChangeAction::Created,
        });

        Ok(service)
    }

    /// Updates a service's editable fields.
    pub async fn update(&self, service: &Service) -> DbResult<()> {
        validation::validate_name(&service.name).map_err(tally_core::CoreError::from)?;
        validation::validate_price_cents(service.price_cents)
            .map_err(tally_core::CoreError::from)?;

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE services SET
                name = ?3,
                description = ?4,
                price_cents = ?5,
                category_id = ?6,
                is_active = ?7,
                updated_at = ?8
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(&service.id)
        .bind(&service.org_id)
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.price_cents)
        .bind(&service.category_id)
        .bind(service.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Service", &service.id));
        }

        self.feed.publish(ChangeEvent {
            org_id: service.org_id.clone(),
            collection: Collection::Services,
            entity_id: service.id.clone(),
            action: ChangeAction::Updated,
        });

        Ok(())
    }

    /// Soft-deletes a service by setting `is_active = 0`.
    pub async fn soft_delete(&self, org_id: &str, id: &str) -> DbResult<()> {
        debug!(org_id = %org_id, id = %id, "Soft-deleting service");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE services SET is_active = 0, updated_at = ?3
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Service", id));
        }

        self.feed.publish(ChangeEvent {
            org_id: org_id.to_string(),
            collection: Collection::Services,
            entity_id: id.to_string(),
            action: ChangeAction::Deleted,
        });

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
