//! Category tree rendering and navigation.

use std::collections::HashMap;
use std::sync::Arc;

use catalog_core::error::AppError;
use catalog_core::result::AppResult;
use catalog_core::types::{CategoryId, SortField};
use catalog_database::{CategoryLinkStore, CategoryStore};
use catalog_entity::{Category, CategoryNode, CategoryQuery, CategoryTree, EntityKind};

/// Builds category trees and resolves ancestry.
#[derive(Clone)]
pub struct TreeService {
    /// Category store.
    categories: Arc<dyn CategoryStore>,
    /// Entity link store, for per-node entity counts.
    links: Arc<dyn CategoryLinkStore>,
}

impl std::fmt::Debug for TreeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeService").finish()
    }
}

impl TreeService {
    /// Creates a new tree service.
    pub fn new(categories: Arc<dyn CategoryStore>, links: Arc<dyn CategoryLinkStore>) -> Self {
        Self { categories, links }
    }

    /// Loads every category of one kind into an arena tree.
    pub async fn load(&self, kind: EntityKind) -> AppResult<CategoryTree> {
        let categories = self.categories.find_by_kind(kind).await?;
        Ok(CategoryTree::from_categories(categories))
    }

    /// The nested forest of one kind, with child and entity counts.
    ///
    /// With `active_only`, inactive categories and their subtrees are left
    /// out.
    pub async fn tree(&self, kind: EntityKind, active_only: bool) -> AppResult<Vec<CategoryNode>> {
        let tree = self.load(kind).await?;
        let counts = self.links.counts_by_kind(kind).await?;
        Ok(tree.to_nodes(active_only, &counts))
    }

    /// The nested subtree rooted at one category.
    pub async fn subtree(&self, id: CategoryId, active_only: bool) -> AppResult<CategoryNode> {
        let kind = self.kind_of(id).await?;
        let tree = self.load(kind).await?;
        let counts = self.links.counts_by_kind(kind).await?;
        tree.subtree(id, active_only, &counts)
    }

    /// The path from the root down to `id`, inclusive.
    pub async fn breadcrumbs(&self, id: CategoryId) -> AppResult<Vec<Category>> {
        let kind = self.kind_of(id).await?;
        let tree = self.load(kind).await?;
        Ok(tree.breadcrumbs(id)?.into_iter().cloned().collect())
    }

    /// Direct sub-categories of `id`, sorted by name.
    pub async fn sub_categories(&self, id: CategoryId) -> AppResult<Vec<Category>> {
        self.kind_of(id).await?;
        let mut children = self.categories.find_children(id).await?;
        CategoryQuery::sort_categories(&SortField::asc("name"), &mut children);
        Ok(children)
    }

    /// Whether `id` has at least one sub-category.
    pub async fn has_sub_categories(&self, id: CategoryId) -> AppResult<bool> {
        Ok(self.categories.count_children(id).await? > 0)
    }

    /// Number of linked entities per category of one kind.
    pub async fn entity_counts(&self, kind: EntityKind) -> AppResult<HashMap<CategoryId, u64>> {
        self.links.counts_by_kind(kind).await
    }

    async fn kind_of(&self, id: CategoryId) -> AppResult<EntityKind> {
        self.categories
            .find_by_id(id)
            .await?
            .map(|c| c.kind)
            .ok_or_else(|| AppError::not_found(format!("Category {id} not found")))
    }
}
