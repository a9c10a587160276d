//! # Category Tree
//!
//! Presents an organization's categories as a navigable hierarchy and
//! computes the aggregate counts shown while browsing.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Category Forest                                     │
//! │                                                                         │
//! │   Drinks (root)          Food (root)           Repairs (root)          │
//! │   ├── Hot                ├── Starters          └── Phone               │
//! │   │   ├── Coffee         └── Mains                                      │
//! │   │   └── Tea                                                           │
//! │   └── Cold                                                              │
//! │                                                                         │
//! │   Multiple roots, unbounded depth. Products/services hang off any      │
//! │   node via category_id (or none at all).                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Degradation Rules
//! - A `parent_id` pointing at a missing category makes that node an
//!   effective root: it lists under the roots and its parent walk stops
//!   there. Not an error.
//! - Parent walks carry a visited set, so a pre-existing cycle in corrupt
//!   data terminates instead of hanging. New cycles are rejected up front
//!   by [`CategoryTree::validate_reparent`].
//! - Item counts are **shallow**: a category's count excludes items in
//!   its subcategories.

use std::collections::HashSet;

use crate::error::{CoreError, CoreResult};
use crate::types::{Category, ItemKind, Product, Service};

/// A read-only view over one organization's categories.
///
/// The storage layer supplies the slice (already org-filtered); everything
/// here is pure traversal.
#[derive(Debug, Clone, Copy)]
pub struct CategoryTree<'a> {
    categories: &'a [Category],
}

impl<'a> CategoryTree<'a> {
    /// Wraps a slice of categories belonging to a single organization.
    pub fn new(categories: &'a [Category]) -> Self {
        CategoryTree { categories }
    }

    /// Looks up a category by id.
    pub fn get(&self, id: &str) -> Option<&'a Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Whether an id refers to an existing category.
    fn exists(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Returns categories whose parent is `parent`.
    ///
    /// `None` selects the roots, which include nodes whose recorded parent
    /// no longer exists (they would otherwise be unreachable in the
    /// browse UI). Input order is preserved; callers sort by name if they
    /// want an ordering.
    pub fn children_of(&self, parent: Option<&str>) -> Vec<&'a Category> {
        match parent {
            Some(parent_id) => self
                .categories
                .iter()
                .filter(|c| c.parent_id.as_deref() == Some(parent_id))
                .collect(),
            None => self
                .categories
                .iter()
                .filter(|c| match c.parent_id.as_deref() {
                    None => true,
                    Some(p) => !self.exists(p),
                })
                .collect(),
        }
    }

    /// Count of direct children only (not further descendants).
    pub fn subcategory_count(&self, category_id: &str) -> usize {
        self.categories
            .iter()
            .filter(|c| c.parent_id.as_deref() == Some(category_id))
            .count()
    }

    /// Count of products + services directly assigned to the category.
    ///
    /// Deliberately does NOT recurse into subcategories: the displayed
    /// count for a category excludes descendant items.
    pub fn item_count(&self, category_id: &str, products: &[Product], services: &[Service]) -> usize {
        let in_category = |cid: &Option<String>| cid.as_deref() == Some(category_id);
        products.iter().filter(|p| in_category(&p.category_id)).count()
            + services.iter().filter(|s| in_category(&s.category_id)).count()
    }

    /// Depth of a category: number of parent hops to its effective root.
    ///
    /// A root (or a node with a dangling parent) is level 0. Used for
    /// visual styling tiers. Unknown ids report level 0.
    pub fn hierarchy_level(&self, category_id: &str) -> usize {
        let mut level = 0;
        let mut visited = HashSet::new();
        let mut current = self.get(category_id);

        while let Some(category) = current {
            if !visited.insert(category.id.as_str()) {
                break;
            }
            match category.parent_id.as_deref().and_then(|p| self.get(p)) {
                Some(parent) => {
                    level += 1;
                    current = Some(parent);
                }
                None => break,
            }
        }

        level
    }

    /// Breadcrumb label: ancestor names joined root-first.
    ///
    /// Returns `None` for an unknown id. A dangling parent truncates the
    /// path at the last known ancestor.
    ///
    /// ## Example
    /// ```rust
    /// # use tally_core::catalog::CategoryTree;
    /// # use tally_core::types::{Category, CategoryKind};
    /// # use chrono::Utc;
    /// # fn cat(id: &str, name: &str, parent: Option<&str>) -> Category {
    /// #     Category {
    /// #         id: id.into(), org_id: "org-1".into(), name: name.into(),
    /// #         description: None, kind: CategoryKind::Both,
    /// #         parent_id: parent.map(Into::into),
    /// #         created_at: Utc::now(), updated_at: Utc::now(),
    /// #     }
    /// # }
    /// let categories = vec![
    ///     cat("a", "Drinks", None),
    ///     cat("b", "Hot", Some("a")),
    ///     cat("c", "Coffee", Some("b")),
    /// ];
    /// let tree = CategoryTree::new(&categories);
    /// assert_eq!(tree.path_label("c", " > "), Some("Drinks > Hot > Coffee".to_string()));
    /// ```
    pub fn path_label(&self, category_id: &str, separator: &str) -> Option<String> {
        let start = self.get(category_id)?;

        let mut names = vec![start.name.as_str()];
        let mut visited = HashSet::new();
        visited.insert(start.id.as_str());

        let mut current = start;
        while let Some(parent) = current.parent_id.as_deref().and_then(|p| self.get(p)) {
            if !visited.insert(parent.id.as_str()) {
                break;
            }
            names.push(parent.name.as_str());
            current = parent;
        }

        names.reverse();
        Some(names.join(separator))
    }

    /// Categories visible when browsing for `kind` entries.
    ///
    /// A category of kind `Both` matches either filter.
    pub fn filtered_by_kind(&self, kind: ItemKind) -> Vec<&'a Category> {
        self.categories
            .iter()
            .filter(|c| c.kind.includes(kind))
            .collect()
    }

    /// Validates a re-parent operation before it is persisted.
    ///
    /// ## Errors
    /// - [`CoreError::NotFound`] if the category or the new parent does
    ///   not exist
    /// - [`CoreError::CategoryCycle`] if the new parent is the category
    ///   itself or one of its descendants
    pub fn validate_reparent(&self, category_id: &str, new_parent: Option<&str>) -> CoreResult<()> {
        if !self.exists(category_id) {
            return Err(CoreError::not_found("Category", category_id));
        }

        let Some(parent_id) = new_parent else {
            return Ok(()); // becoming a root is always fine
        };

        if parent_id == category_id {
            return Err(CoreError::CategoryCycle {
                id: category_id.to_string(),
            });
        }

        let parent = self
            .get(parent_id)
            .ok_or_else(|| CoreError::not_found("Category", parent_id))?;

        // Walk up from the proposed parent; hitting the category being
        // moved means the parent sits inside its subtree.
        let mut visited = HashSet::new();
        let mut current = parent;
        loop {
            if current.id == category_id {
                return Err(CoreError::CategoryCycle {
                    id: category_id.to_string(),
                });
            }
            if !visited.insert(current.id.as_str()) {
                break;
            }
            match current.parent_id.as_deref().and_then(|p| self.get(p)) {
                Some(next) => current = next,
                None => break,
            }
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CategoryKind;
    use chrono::Utc;

    fn cat(id: &str, name: &str, kind: CategoryKind, parent: Option<&str>) -> Category {
        Category {
            id: id.to_string(),
            org_id: "org-1".to_string(),
            name: name.to_string(),
            description: None,
            kind,
            parent_id: parent.map(String::from),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn product(id: &str, category: Option<&str>) -> Product {
        Product {
            id: id.to_string(),
            org_id: "org-1".to_string(),
            name: format!("Product {}", id),
            description: None,
            price_cents: 1000,
            category_id: category.map(String::from),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service(id: &str, category: Option<&str>) -> Service {
        Service {
            id: id.to_string(),
            org_id: "org-1".to_string(),
            name: format!("Service {}", id),
            description: None,
            price_cents: 2000,
            category_id: category.map(String::from),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_forest() -> Vec<Category> {
        vec![
            cat("drinks", "Drinks", CategoryKind::Product, None),
            cat("hot", "Hot", CategoryKind::Product, Some("drinks")),
            cat("coffee", "Coffee", CategoryKind::Product, Some("hot")),
            cat("repairs", "Repairs", CategoryKind::Service, None),
            cat("misc", "Misc", CategoryKind::Both, None),
        ]
    }

    #[test]
    fn test_children_of_roots_and_nodes() {
        let categories = sample_forest();
        let tree = CategoryTree::new(&categories);

        let roots = tree.children_of(None);
        assert_eq!(roots.len(), 3);

        let under_drinks = tree.children_of(Some("drinks"));
        assert_eq!(under_drinks.len(), 1);
        assert_eq!(under_drinks[0].id, "hot");

        assert!(tree.children_of(Some("coffee")).is_empty());
    }

    #[test]
    fn test_dangling_parent_is_effective_root() {
        let mut categories = sample_forest();
        categories.push(cat("orphan", "Orphan", CategoryKind::Product, Some("deleted")));
        let tree = CategoryTree::new(&categories);

        let roots = tree.children_of(None);
        assert!(roots.iter().any(|c| c.id == "orphan"));
        assert_eq!(tree.hierarchy_level("orphan"), 0);
        assert_eq!(tree.path_label("orphan", " > "), Some("Orphan".to_string()));
    }

    #[test]
    fn test_item_count_is_shallow() {
        // Root with one direct product and a subcategory holding two more:
        // the root reports 1, not 3.
        let categories = sample_forest();
        let tree = CategoryTree::new(&categories);

        let products = vec![
            product("p1", Some("drinks")),
            product("p2", Some("hot")),
            product("p3", Some("hot")),
        ];
        let services: Vec<Service> = vec![];

        assert_eq!(tree.item_count("drinks", &products, &services), 1);
        assert_eq!(tree.item_count("hot", &products, &services), 2);
        assert_eq!(tree.item_count("coffee", &products, &services), 0);
    }

    #[test]
    fn test_item_count_spans_products_and_services() {
        let categories = sample_forest();
        let tree = CategoryTree::new(&categories);

        let products = vec![product("p1", Some("misc"))];
        let services = vec![service("s1", Some("misc")), service("s2", None)];

        assert_eq!(tree.item_count("misc", &products, &services), 2);
    }

    #[test]
    fn test_subcategory_count_direct_only() {
        let categories = sample_forest();
        let tree = CategoryTree::new(&categories);

        assert_eq!(tree.subcategory_count("drinks"), 1); // hot, not coffee
        assert_eq!(tree.subcategory_count("hot"), 1);
        assert_eq!(tree.subcategory_count("repairs"), 0);
    }

    #[test]
    fn test_hierarchy_level() {
        let categories = sample_forest();
        let tree = CategoryTree::new(&categories);

        assert_eq!(tree.hierarchy_level("drinks"), 0);
        assert_eq!(tree.hierarchy_level("hot"), 1);
        assert_eq!(tree.hierarchy_level("coffee"), 2);
        assert_eq!(tree.hierarchy_level("unknown"), 0);
    }

    #[test]
    fn test_path_label() {
        let categories = sample_forest();
        let tree = CategoryTree::new(&categories);

        assert_eq!(
            tree.path_label("coffee", " > "),
            Some("Drinks > Hot > Coffee".to_string())
        );
        assert_eq!(tree.path_label("drinks", " > "), Some("Drinks".to_string()));
        assert_eq!(tree.path_label("unknown", " > "), None);
    }

    #[test]
    fn test_corrupt_cycle_does_not_hang() {
        // a → b → a: traversal must terminate
        let categories = vec![
            cat("a", "A", CategoryKind::Both, Some("b")),
            cat("b", "B", CategoryKind::Both, Some("a")),
        ];
        let tree = CategoryTree::new(&categories);

        let _ = tree.hierarchy_level("a");
        let _ = tree.path_label("a", "/");
        // No roots exist in this corrupt forest; children_of(None) must
        // still return without looping.
        assert!(tree.children_of(None).is_empty());
    }

    #[test]
    fn test_filtered_by_kind() {
        let categories = sample_forest();
        let tree = CategoryTree::new(&categories);

        let for_products = tree.filtered_by_kind(ItemKind::Product);
        assert!(for_products.iter().any(|c| c.id == "misc")); // Both matches
        assert!(for_products.iter().all(|c| c.id != "repairs"));

        let for_services = tree.filtered_by_kind(ItemKind::Service);
        assert!(for_services.iter().any(|c| c.id == "repairs"));
        assert!(for_services.iter().any(|c| c.id == "misc"));
    }

    #[test]
    fn test_validate_reparent_accepts_legal_moves() {
        let categories = sample_forest();
        let tree = CategoryTree::new(&categories);

        assert!(tree.validate_reparent("coffee", Some("drinks")).is_ok());
        assert!(tree.validate_reparent("hot", None).is_ok());
        assert!(tree.validate_reparent("repairs", Some("misc")).is_ok());
    }

    #[test]
    fn test_validate_reparent_rejects_cycles() {
        let categories = sample_forest();
        let tree = CategoryTree::new(&categories);

        // Self-parenting
        let err = tree.validate_reparent("drinks", Some("drinks")).unwrap_err();
        assert!(matches!(err, CoreError::CategoryCycle { .. }));

        // Moving a node under its own descendant
        let err = tree.validate_reparent("drinks", Some("coffee")).unwrap_err();
        assert!(matches!(err, CoreError::CategoryCycle { .. }));
    }

    #[test]
    fn test_validate_reparent_missing_targets() {
        let categories = sample_forest();
        let tree = CategoryTree::new(&categories);

        assert!(matches!(
            tree.validate_reparent("ghost", None).unwrap_err(),
            CoreError::NotFound { .. }
        ));
        assert!(matches!(
            tree.validate_reparent("hot", Some("ghost")).unwrap_err(),
            CoreError::NotFound { .. }
        ));
    }
}
