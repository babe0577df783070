//! Category lifecycle and entity assignment.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use catalog_core::config::{CatalogConfig, DeletePolicy, DuplicatePolicy};
use catalog_core::error::{AppError, ErrorKind};
use catalog_core::result::AppResult;
use catalog_core::types::{CategoryId, PageResponse, SortField};
use catalog_database::{CategoryLinkStore, CategoryStore};
use catalog_entity::{
    AttachmentOwner, AuditableEntity, Category, CategoryChanges, CategoryLink, CategoryQuery,
    CategoryTree, EntityKind, EntityRef, NewCategory,
};

use crate::attachment::AttachmentService;
use crate::context::RequestContext;

/// What a delete removed or moved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    /// Sub-categories handed to a new parent.
    pub moved_children: u64,
    /// Entity links removed with the category.
    pub removed_links: u64,
    /// Attachment links of the category itself that were removed.
    pub removed_attachments: usize,
}

/// Manages category trees and entity-to-category assignments.
#[derive(Clone)]
pub struct CategoryService {
    /// Category store.
    categories: Arc<dyn CategoryStore>,
    /// Entity link store.
    links: Arc<dyn CategoryLinkStore>,
    /// Attachment service, for the category's own files.
    attachments: Arc<AttachmentService>,
    /// Behaviour policies.
    config: CatalogConfig,
}

impl std::fmt::Debug for CategoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryService")
            .field("config", &self.config)
            .finish()
    }
}

impl CategoryService {
    /// Creates a new category service.
    pub fn new(
        categories: Arc<dyn CategoryStore>,
        links: Arc<dyn CategoryLinkStore>,
        attachments: Arc<AttachmentService>,
        config: CatalogConfig,
    ) -> Self {
        Self {
            categories,
            links,
            attachments,
            config,
        }
    }

    /// Gets a category by ID.
    pub async fn get(&self, id: CategoryId) -> AppResult<Category> {
        self.categories
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Category {id} not found")))
    }

    /// Gets a category with its attachments loaded.
    pub async fn get_with_files(&self, id: CategoryId) -> AppResult<Category> {
        let mut category = self.get(id).await?;
        self.attachments.load_into(&mut category).await?;
        Ok(category)
    }

    /// Lists categories page by page.
    pub async fn list(&self, query: &CategoryQuery) -> AppResult<PageResponse<Category>> {
        query.effective_sort()?;
        self.categories.search(query).await
    }

    /// Creates a new active category.
    ///
    /// The name is trimmed before validation. A parent must exist and be
    /// of the same kind.
    pub async fn create(&self, ctx: &RequestContext, mut new: NewCategory) -> AppResult<Category> {
        new.name = new.name.trim().to_string();
        new.validate()?;

        if let Some(parent_id) = new.parent_id {
            let parent = self.get_parent(parent_id).await?;
            if parent.kind != new.kind {
                warn!(parent_id = %parent_id, kind = %new.kind, "Rejected cross-kind parent");
                return Err(AppError::invariant(format!(
                    "A {} category cannot be placed under {} category '{}'",
                    new.kind, parent.kind, parent.name
                )));
            }
        }

        let category = self.categories.insert(&new.into_category()).await?;

        info!(
            request_id = %ctx.request_id,
            actor = %ctx.actor,
            category_id = %category.id,
            kind = %category.kind,
            name = %category.name,
            parent_id = ?category.parent_id,
            "Category created"
        );

        Ok(category)
    }

    /// Updates name, description, flags, slogans and web tags.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: CategoryId,
        mut changes: CategoryChanges,
        expected_version: i64,
    ) -> AppResult<Category> {
        if let Some(name) = changes.name.as_mut() {
            *name = name.trim().to_string();
        }
        changes.validate()?;

        let mut category = self.get(id).await?;
        ensure_version(&category, expected_version)?;
        category.apply(changes);
        category.touch();
        let category = self.categories.update(&category, expected_version).await?;

        info!(
            request_id = %ctx.request_id,
            actor = %ctx.actor,
            category_id = %id,
            version = category.version,
            "Category updated"
        );

        Ok(category)
    }

    /// Moves a category under a new parent, or to the root with `None`.
    ///
    /// Fails with `NotFound` if the parent is missing and with
    /// `InvariantViolation` if it is of another kind or would close a cycle.
    pub async fn reparent(
        &self,
        ctx: &RequestContext,
        id: CategoryId,
        new_parent: Option<CategoryId>,
        expected_version: i64,
    ) -> AppResult<Category> {
        let mut category = self.get(id).await?;
        ensure_version(&category, expected_version)?;
        if category.parent_id == new_parent {
            return Ok(category);
        }

        if let Some(parent_id) = new_parent {
            let parent = self.get_parent(parent_id).await?;
            if parent.kind != category.kind {
                warn!(category_id = %id, parent_id = %parent_id, "Rejected cross-kind reparent");
                return Err(AppError::invariant(format!(
                    "A {} category cannot be placed under {} category '{}'",
                    category.kind, parent.kind, parent.name
                )));
            }
            let tree = CategoryTree::from_categories(self.categories.find_by_kind(category.kind).await?);
            if let Err(e) = tree.check_parent(id, new_parent) {
                warn!(category_id = %id, parent_id = %parent_id, error = %e, "Rejected reparent");
                return Err(e);
            }
        }

        let previous = category.parent_id;
        category.parent_id = new_parent;
        category.touch();
        let category = self.categories.update(&category, expected_version).await?;

        info!(
            request_id = %ctx.request_id,
            actor = %ctx.actor,
            category_id = %id,
            from = ?previous,
            to = ?new_parent,
            "Category moved"
        );

        Ok(category)
    }

    /// Hides a category. Children and entity links are left untouched.
    pub async fn deactivate(&self, ctx: &RequestContext, id: CategoryId) -> AppResult<Category> {
        self.set_active(ctx, id, false).await
    }

    /// Shows a previously deactivated category again.
    pub async fn reactivate(&self, ctx: &RequestContext, id: CategoryId) -> AppResult<Category> {
        self.set_active(ctx, id, true).await
    }

    /// Deletes a category.
    ///
    /// With `Restrict` the delete fails with `Conflict` while sub-categories
    /// or entity links exist. The reparenting policies first move the
    /// children, then drop the entity links. The category's own attachments
    /// are always removed. `None` uses the configured default policy.
    pub async fn delete(
        &self,
        ctx: &RequestContext,
        id: CategoryId,
        policy: Option<DeletePolicy>,
    ) -> AppResult<DeleteOutcome> {
        let policy = policy.unwrap_or(self.config.delete_policy);
        let category = self.get(id).await?;
        let mut outcome = DeleteOutcome::default();

        match policy {
            DeletePolicy::Restrict => {
                let children = self.categories.count_children(id).await?;
                let members = self.links.count_by_category(id).await?;
                if children > 0 || members > 0 {
                    warn!(
                        category_id = %id,
                        children,
                        members,
                        "Rejected delete of category in use"
                    );
                    return Err(AppError::conflict(format!(
                        "Category '{}' still has {children} sub-categories and {members} linked entities",
                        category.name
                    )));
                }
            }
            DeletePolicy::ReparentToRoot | DeletePolicy::ReparentToParent => {
                let target = match policy {
                    DeletePolicy::ReparentToParent => category.parent_id,
                    _ => None,
                };
                outcome.moved_children = self.categories.reparent_children(id, target).await?;
                outcome.removed_links = self.links.delete_by_category(id).await?;
            }
        }

        if !self.categories.delete(id).await? {
            return Err(AppError::not_found(format!("Category {id} not found")));
        }

        // Attachments go only after the row delete succeeds.
        outcome.removed_attachments = self
            .attachments
            .remove_all(ctx, AttachmentOwner::category(id))
            .await?;

        info!(
            request_id = %ctx.request_id,
            actor = %ctx.actor,
            category_id = %id,
            policy = ?policy,
            moved_children = outcome.moved_children,
            removed_links = outcome.removed_links,
            "Category deleted"
        );

        Ok(outcome)
    }

    /// Assigns an entity to a category of the same kind.
    ///
    /// A repeated assignment returns the existing link, or fails with
    /// `Duplicate` when the duplicate policy is `reject`.
    pub async fn assign<E: AuditableEntity + Sync + ?Sized>(
        &self,
        ctx: &RequestContext,
        entity: &E,
        category_id: CategoryId,
    ) -> AppResult<CategoryLink> {
        let category = self.get(category_id).await?;
        let link = CategoryLink::between(entity, &category).inspect_err(|e| {
            warn!(category_id = %category_id, error = %e, "Rejected cross-kind assignment");
        })?;
        self.store_link(ctx, link).await
    }

    /// Assigns an entity known only by reference.
    pub async fn assign_ref(
        &self,
        ctx: &RequestContext,
        entity: EntityRef,
        category_id: CategoryId,
    ) -> AppResult<CategoryLink> {
        let category = self.get(category_id).await?;
        if category.kind != entity.kind {
            warn!(category_id = %category_id, entity = %entity, "Rejected cross-kind assignment");
            return Err(AppError::invariant(format!(
                "Cannot assign a {} to {} category '{}'",
                entity.kind, category.kind, category.name
            )));
        }
        self.store_link(ctx, CategoryLink::new(entity, category_id))
            .await
    }

    /// Removes an entity from a category. Returns `false` if it was not
    /// assigned.
    pub async fn unassign(
        &self,
        ctx: &RequestContext,
        entity: EntityRef,
        category_id: CategoryId,
    ) -> AppResult<bool> {
        let removed = self.links.delete(entity, category_id).await?;
        if removed {
            info!(
                request_id = %ctx.request_id,
                actor = %ctx.actor,
                entity = %entity,
                category_id = %category_id,
                "Entity unassigned from category"
            );
        }
        Ok(removed)
    }

    /// Categories an entity is assigned to, sorted by name.
    pub async fn categories_for_entity(&self, entity: EntityRef) -> AppResult<Vec<Category>> {
        let mut categories = Vec::new();
        for link in self.links.find_by_entity(entity).await? {
            if let Some(category) = self.categories.find_by_id(link.category_id).await? {
                categories.push(category);
            }
        }
        CategoryQuery::sort_categories(&SortField::asc("name"), &mut categories);
        Ok(categories)
    }

    /// Entities assigned to a category, oldest assignment first.
    pub async fn entities_in_category(&self, category_id: CategoryId) -> AppResult<Vec<EntityRef>> {
        self.get(category_id).await?;
        let links = self.links.find_by_category(category_id).await?;
        Ok(links.iter().map(CategoryLink::entity).collect())
    }

    /// Active categories flagged for the main menu.
    pub async fn menu_categories(&self, kind: EntityKind) -> AppResult<Vec<Category>> {
        self.flagged(kind, |c| c.display_in_main_menu).await
    }

    /// Active categories flagged as slider items.
    pub async fn slider_categories(&self, kind: EntityKind) -> AppResult<Vec<Category>> {
        self.flagged(kind, |c| c.display_as_slider_item).await
    }

    async fn flagged(
        &self,
        kind: EntityKind,
        flag: impl Fn(&Category) -> bool + Send,
    ) -> AppResult<Vec<Category>> {
        let mut categories: Vec<Category> = self
            .categories
            .find_by_kind(kind)
            .await?
            .into_iter()
            .filter(|c| c.active && flag(c))
            .collect();
        CategoryQuery::sort_categories(&SortField::asc("name"), &mut categories);
        Ok(categories)
    }

    async fn set_active(
        &self,
        ctx: &RequestContext,
        id: CategoryId,
        active: bool,
    ) -> AppResult<Category> {
        let mut category = self.get(id).await?;
        if category.active == active {
            return Ok(category);
        }
        let expected_version = category.version;
        category.active = active;
        category.touch();
        let category = self.categories.update(&category, expected_version).await?;

        info!(
            request_id = %ctx.request_id,
            actor = %ctx.actor,
            category_id = %id,
            active,
            "Category {}",
            if active { "reactivated" } else { "deactivated" }
        );

        Ok(category)
    }

    async fn get_parent(&self, parent_id: CategoryId) -> AppResult<Category> {
        self.categories
            .find_by_id(parent_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Parent category {parent_id} not found")))
    }

    async fn store_link(&self, ctx: &RequestContext, link: CategoryLink) -> AppResult<CategoryLink> {
        let target = link.entity();
        let category_id = link.category_id;

        if let Some(existing) = self.links.find(target, category_id).await? {
            return self.on_duplicate(existing);
        }

        let link = match self.links.insert(&link).await {
            Ok(link) => link,
            Err(e) if e.is(ErrorKind::Duplicate) => {
                match self.links.find(target, category_id).await? {
                    Some(existing) => return self.on_duplicate(existing),
                    None => return Err(e),
                }
            }
            Err(e) => return Err(e),
        };

        info!(
            request_id = %ctx.request_id,
            actor = %ctx.actor,
            entity = %target,
            category_id = %category_id,
            "Entity assigned to category"
        );

        Ok(link)
    }

    fn on_duplicate(&self, existing: CategoryLink) -> AppResult<CategoryLink> {
        match self.config.duplicate_assignment {
            DuplicatePolicy::Ignore => Ok(existing),
            DuplicatePolicy::Reject => Err(AppError::duplicate(format!(
                "{} is already assigned to category {}",
                existing.entity(),
                existing.category_id
            ))),
        }
    }
}

/// Fail with `Conflict` when the caller's copy is stale.
fn ensure_version(category: &Category, expected_version: i64) -> AppResult<()> {
    if category.version != expected_version {
        return Err(AppError::conflict(format!(
            "Category {} is at version {}, not {expected_version}",
            category.id, category.version
        )));
    }
    Ok(())
}
