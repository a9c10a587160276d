//! # Dining Table Repository
//!
//! Floor management. Status changes flow through here directly for manual
//! operations (reserve, maintenance); order completion releases tables
//! through the order repository's transaction instead.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::feed::{ChangeAction, ChangeEvent, ChangeFeed, Collection};
use tally_core::types::{DiningTable, TableStatus};
use tally_core::validation;

/// Input for creating a dining table.
#[derive(Debug, Clone)]
pub struct NewTable {
    pub name: String,
    pub capacity: i64,
}

/// Repository for dining table database operations.
#[derive(Debug, Clone)]
pub struct TableRepository {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl TableRepository {
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        TableRepository { pool, feed }
    }

    /// Lists all tables of an organization, ordered by name.
    pub async fn list(&self, org_id: &str) -> DbResult<Vec<DiningTable>> {
        let tables = sqlx::query_as::<_, DiningTable>(
            r#"
            SELECT id, org_id, name, capacity, status, created_at, updated_at
            FROM dining_tables
            WHERE org_id = ?1
            ORDER BY name
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tables)
    }

    /// Gets a table by id.
    pub async fn get(&self, org_id: &str, id: &str) -> DbResult<Option<DiningTable>> {
        let table = sqlx::query_as::<_, DiningTable>(
            r#"
            SELECT id, org_id, name, capacity, status, created_at, updated_at
            FROM dining_tables
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(table)
    }

    /// Creates a table, initially available.
    pub async fn create(&self, org_id: &str, new: NewTable) -> DbResult<DiningTable> {
        validation::validate_name(&new.name).map_err(tally_core::CoreError::from)?;
        validation::validate_capacity(new.capacity).map_err(tally_core::CoreError::from)?;

        let now = Utc::now();
        let table = DiningTable {
            id: Uuid::new_v4().to_string(),
            org_id: org_id.to_string(),
            name: new.name.trim().to_string(),
            capacity: new.capacity,
            status: TableStatus::Available,
            created_at: now,
            updated_at: now,
        };

        debug!(org_id = %org_id, name = %table.name, "Creating dining table");

        sqlx::query(
            r#"
            INSERT INTO dining_tables (
                id, org_id, name, capacity, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&table.id)
        .bind(&table.org_id)
        .bind(&table.name)
        .bind(table.capacity)
        .bind(table.status)
        .bind(table.created_at)
        .bind(table.updated_at)
        .execute(&self.pool)
        .await?;

        self.feed.publish(ChangeEvent {
            org_id: org_id.to_string(),
            collection: Collection::Tables,
            entity_id: table.id.clone(),
            action: ChangeAction::Created,
        });

        Ok(table)
    }

    /// Updates a table's name and capacity.
    pub async fn update(&self, table: &DiningTable) -> DbResult<()> {
        validation::validate_name(&table.name).map_err(tally_core::CoreError::from)?;
        validation::validate_capacity(table.capacity).map_err(tally_core::CoreError::from)?;

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE dining_tables SET
                name = ?3,
                capacity = ?4,
                updated_at = ?5
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(&table.id)
        .bind(&table.org_id)
        .bind(&table.name)
        .bind(table.capacity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Table", &table.id));
        }

        self.feed.publish(ChangeEvent {
            org_id: table.org_id.clone(),
            collection: Collection::Tables,
            entity_id: table.id.clone(),
            action: ChangeAction::Updated,
        });

        Ok(())
    }

    /// Sets a table's floor status (reserve, occupy, maintenance, free).
    pub async fn set_status(&self, org_id: &str, id: &str, status: TableStatus) -> DbResult<()> {
        debug!(org_id = %org_id, id = %id, status = ?status, "Setting table status");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE dining_tables SET status = ?3, updated_at = ?4
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .bind(status)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Table", id));
        }

        self.feed.publish(ChangeEvent {
            org_id: org_id.to_string(),
            collection: Collection::Tables,
            entity_id: id.to_string(),
            action: ChangeAction::Updated,
        });

        Ok(())
    }

    /// Deletes a table.
    pub async fn delete(&self, org_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM dining_tables WHERE id = ?1 AND org_id = ?2")
            .bind(id)
            .bind(org_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Table", id));
        }

        self.feed.publish(ChangeEvent {
            org_id: org_id.to_string(),
            collection: Collection::Tables,
            entity_id: id.to_string(),
            action: ChangeAction::Deleted,
        });

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_db;

    const ORG: &str = "org-test";

    #[tokio::test]
    async fn test_create_and_set_status() {
        let db = test_db().await;
        let repo = db.tables();

        let table = repo
            .create(
                ORG,
                NewTable {
                    name: "Table 5".to_string(),
                    capacity: 4,
                },
            )
            .await
            .unwrap();
        assert_eq!(table.status, TableStatus::Available);

        repo.set_status(ORG, &table.id, TableStatus::Reserved).await.unwrap();
        let fetched = repo.get(ORG, &table.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, TableStatus::Reserved);
    }

    #[tokio::test]
    async fn test_capacity_must_be_positive() {
        let db = test_db().await;
        let err = db
            .tables()
            .create(
                ORG,
                NewTable {
                    name: "Broken".to_string(),
                    capacity: 0,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(_)));
    }

    #[tokio::test]
    async fn test_status_change_is_org_scoped() {
        let db = test_db().await;
        let table = db
            .tables()
            .create(
                ORG,
                NewTable {
                    name: "Table 1".to_string(),
                    capacity: 2,
                },
            )
            .await
            .unwrap();

        let err = db
            .tables()
            .set_status("other-org", &table.id, TableStatus::Occupied)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
