//! # Customer Repository
//!
//! Database operations for customers.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::feed::{ChangeAction, ChangeEvent, ChangeFeed, Collection};
use tally_core::types::Customer;
use tally_core::validation;

/// Input for creating a customer.
#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub vat_number: Option<String>,
}

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        CustomerRepository { pool, feed }
    }

    /// Lists all customers of an organization, ordered by name.
    pub async fn list(&self, org_id: &str) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, org_id, name, email, phone, address, vat_number,
                   created_at, updated_at
            FROM customers
            WHERE org_id = ?1
            ORDER BY name
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Gets a customer by id.
    pub async fn get(&self, org_id: &str, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, org_id, name, email, phone, address, vat_number,
                   created_at, updated_at
            FROM customers
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Creates a customer.
    pub async fn create(&self, org_id: &str, new: NewCustomer) -> DbResult<Customer> {
        validation::validate_name(&new.name).map_err(tally_core::CoreError::from)?;

        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            org_id: org_id.to_string(),
            name: new.name.trim().to_string(),
            email: new.email,
            phone: new.phone,
            address: new.address,
            vat_number: new.vat_number,
            created_at: now,
            updated_at: now,
        };

        debug!(org_id = %org_id, name = %customer.name, "Creating customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, org_id, name, email, phone, address, vat_number,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.org_id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(&customer.vat_number)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        self.feed.publish(ChangeEvent {
            org_id: org_id.to_string(),
            collection: Collection::Customers,
            entity_id: customer.id.clone(),
            action: ChangeAction::Created,
        });

        Ok(customer)
    }

    /// Updates a customer's contact details.
    pub async fn update(&self, customer: &Customer) -> DbResult<()> {
        validation::validate_name(&customer.name).map_err(tally_core::CoreError::from)?;

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?3,
                email = ?4,
                phone = ?5,
                address = ?6,
                vat_number = ?7,
                updated_at = ?8
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.org_id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(&customer.vat_number)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", &customer.id));
        }

        self.feed.publish(ChangeEvent {
            org_id: customer.org_id.clone(),
            collection: Collection::Customers,
            entity_id: customer.id.clone(),
            action: ChangeAction::Updated,
        });

        Ok(())
    }

    /// Deletes a customer.
    pub async fn delete(&self, org_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?1 AND org_id = ?2")
            .bind(id)
            .bind(org_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        self.feed.publish(ChangeEvent {
            org_id: org_id.to_string(),
            collection: Collection::Customers,
            entity_id: id.to_string(),
            action: ChangeAction::Deleted,
        });

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
