//! # Category Repository
//!
//! Database operations for the category tree.
//!
//! Tree *traversal* (levels, breadcrumbs, counts) is pure logic in
//! `tally_core::catalog`; this repository loads the org's categories and
//! persists mutations. Re-parenting re-validates acyclicity against
//! current database state before writing.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::feed::{ChangeAction, ChangeEvent, ChangeFeed, Collection};
use tally_core::catalog::CategoryTree;
use tally_core::types::{Category, CategoryKind};
use tally_core::validation;

/// Input for creating a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub kind: CategoryKind,
    pub parent_id: Option<String>,
}

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        CategoryRepository { pool, feed }
    }

    /// Lists all categories of an organization, ordered by name.
    pub async fn list(&self, org_id: &str) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, org_id, name, description, kind, parent_id,
                   created_at, updated_at
            FROM categories
            WHERE org_id = ?1
            ORDER BY name
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Gets a category by id.
    pub async fn get(&self, org_id: &str, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, org_id, name, description, kind, parent_id,
                   created_at, updated_at
            FROM categories
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Creates a category.
    ///
    /// A `parent_id` is accepted as given: pointing at a missing parent
    /// just makes the node an effective root, matching traversal
    /// semantics. Cycles cannot be created here because the new node has
    /// no descendants yet.
    pub async fn create(&self, org_id: &str, new: NewCategory) -> DbResult<Category> {
        validation::validate_name(&new.name).map_err(tally_core::CoreError::from)?;

        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4().to_string(),
            org_id: org_id.to_string(),
            name: new.name.trim().to_string(),
            description: new.description,
            kind: new.kind,
            parent_id: new.parent_id,
            created_at: now,
            updated_at: now,
        };

        debug!(org_id = %org_id, name = %category.name, "Creating category");

        sqlx::query(
            r#"
            INSERT INTO categories (
                id, org_id, name, description, kind, parent_id,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&category.id)
        .bind(&category.org_id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.kind)
        .bind(&category.parent_id)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;

        self.feed.publish(ChangeEvent {
            org_id: org_id.to_string(),
            collection: Collection::Categories,
            entity_id: category.id.clone(),
            action: ChangeAction::Created,
        });

        Ok(category)
    }

    /// Updates a category's name, description and kind.
    ///
    /// The parent link is deliberately not touched here; moves go through
    /// [`CategoryRepository::reparent`] so they cannot bypass the cycle
    /// check.
    pub async fn update(
        &self,
        org_id: &str,
        id: &str,
        name: &str,
        description: Option<&str>,
        kind: CategoryKind,
    ) -> DbResult<()> {
        validation::validate_name(name).map_err(tally_core::CoreError::from)?;

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE categories SET
                name = ?3,
                description = ?4,
                kind = ?5,
                updated_at = ?6
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .bind(name.trim())
        .bind(description)
        .bind(kind)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        self.feed.publish(ChangeEvent {
            org_id: org_id.to_string(),
            collection: Collection::Categories,
            entity_id: id.to_string(),
            action: ChangeAction::Updated,
        });

        Ok(())
    }

    /// Moves a category under a new parent (or to the roots with `None`).
    ///
    /// Validates acyclicity against the organization's current tree
    /// before writing: the new parent must exist and must not be the
    /// category itself or one of its descendants.
    pub async fn reparent(
        &self,
        org_id: &str,
        id: &str,
        new_parent: Option<&str>,
    ) -> DbResult<()> {
        let categories = self.list(org_id).await?;
        CategoryTree::new(&categories).validate_reparent(id, new_parent)?;

        debug!(org_id = %org_id, id = %id, new_parent = ?new_parent, "Re-parenting category");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE categories SET
                parent_id = ?3,
                updated_at = ?4
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .bind(new_parent)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        self.feed.publish(ChangeEvent {
            org_id: org_id.to_string(),
            collection: Collection::Categories,
            entity_id: id.to_string(),
            action: ChangeAction::Updated,
        });

        Ok(())
    }

    /// Deletes a category.
    ///
    /// Children and assigned items are not cascaded: children become
    /// effective roots and items become uncategorized, both handled
    /// gracefully by traversal and listing.
    pub async fn delete(&self, org_id: &str, id: &str) -> DbResult<()> {
        debug!(org_id = %org_id, id = %id, "Deleting category");

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1 AND org_id = ?2")
            .bind(id)
            .bind(org_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        self.feed.publish(ChangeEvent {
            org_id: org_id.to_string(),
            collection: Collection::Categories,
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

    fn new_category(name: &str, parent: Option<&str>) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            description: None,
            kind: CategoryKind::Both,
            parent_id: parent.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_create_list_and_org_isolation() {
        let db = test_db().await;
        let repo = db.categories();

        repo.create(ORG, new_category("Drinks", None)).await.unwrap();
        repo.create(ORG, new_category("Food", None)).await.unwrap();
        repo.create("other-org", new_category("Elsewhere", None))
            .await
            .unwrap();

        let listed = repo.list(ORG).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "Drinks"); // name order
        assert!(listed.iter().all(|c| c.org_id == ORG));
    }

    #[tokio::test]
    async fn test_reparent_rejects_cycle() {
        let db = test_db().await;
        let repo = db.categories();

        let root = repo.create(ORG, new_category("Root", None)).await.unwrap();
        let child = repo
            .create(ORG, new_category("Child", Some(&root.id)))
            .await
            .unwrap();

        // Legal: move child to the roots
        repo.reparent(ORG, &child.id, None).await.unwrap();
        // Legal: move it back
        repo.reparent(ORG, &child.id, Some(&root.id)).await.unwrap();

        // Illegal: root under its own descendant
        let err = repo.reparent(ORG, &root.id, Some(&child.id)).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(tally_core::CoreError::CategoryCycle { .. })
        ));

        // The tree is unchanged
        let root_row = repo.get(ORG, &root.id).await.unwrap().unwrap();
        assert!(root_row.parent_id.is_none());
    }

    #[tokio::test]
    async fn test_delete_leaves_children_as_effective_roots() {
        let db = test_db().await;
        let repo = db.categories();

        let root = repo.create(ORG, new_category("Root", None)).await.unwrap();
        let child = repo
            .create(ORG, new_category("Child", Some(&root.id)))
            .await
            .unwrap();

        repo.delete(ORG, &root.id).await.unwrap();

        let remaining = repo.list(ORG).await.unwrap();
        assert_eq!(remaining.len(), 1);
        // The dangling parent makes the child list among the roots
        let tree = CategoryTree::new(&remaining);
        let roots = tree.children_of(None);
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].id, child.id);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let db = test_db().await;
        let err = db.categories().delete(ORG, "ghost").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_create_publishes_change_event() {
        let db = test_db().await;
        let mut feed = db.subscribe(ORG, Collection::Categories);

        let created = db
            .categories()
            .create(ORG, new_category("Drinks", None))
            .await
            .unwrap();

        let event = feed.next().await.unwrap();
        assert_eq!(event.entity_id, created.id);
        assert_eq!(event.action, ChangeAction::Created);
    }
}
