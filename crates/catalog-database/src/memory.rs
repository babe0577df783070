//! In-memory catalog store for tests and single-process embedding.
//!
//! Mirrors the constraints of the PostgreSQL schema: restricted parent
//! deletes, cascading entity links, unique assignments and restricted file
//! deletes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use catalog_core::error::AppError;
use catalog_core::result::AppResult;
use catalog_core::types::{CategoryId, FileId, LinkId, PageResponse, SortField};
use catalog_entity::{
    AttachmentKind, AttachmentLink, AttachmentOwner, Category, CategoryLink, CategoryQuery,
    EntityKind, EntityRef, FileCollection, StoredMedia,
};

use crate::store::{AttachmentStore, CategoryLinkStore, CategoryStore};

#[derive(Debug, Default)]
struct MemoryState {
    categories: HashMap<CategoryId, Category>,
    category_links: HashMap<LinkId, CategoryLink>,
    files: HashMap<(AttachmentKind, FileId), StoredMedia>,
    attachment_links: HashMap<LinkId, AttachmentLink>,
}

impl MemoryState {
    fn has_children(&self, id: CategoryId) -> bool {
        self.categories.values().any(|c| c.parent_id == Some(id))
    }

    fn file_is_referenced(&self, kind: AttachmentKind, file_id: FileId) -> bool {
        self.attachment_links
            .values()
            .any(|l| l.kind == kind && l.file_id == Some(file_id))
    }
}

/// Category rows are stored without their attachment collections, just as
/// the database keeps attachments in their own tables.
fn detached(category: &Category) -> Category {
    Category {
        files: FileCollection::default(),
        ..category.clone()
    }
}

/// Every catalog store behind one `tokio::sync::RwLock`.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalogStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryCatalogStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored files of every kind.
    pub async fn file_count(&self) -> usize {
        self.state.read().await.files.len()
    }

    /// Number of stored entity-to-category links.
    pub async fn category_link_count(&self) -> usize {
        self.state.read().await.category_links.len()
    }
}

#[async_trait]
impl CategoryStore for MemoryCatalogStore {
    async fn find_by_id(&self, id: CategoryId) -> AppResult<Option<Category>> {
        Ok(self.state.read().await.categories.get(&id).cloned())
    }

    async fn find_by_kind(&self, kind: EntityKind) -> AppResult<Vec<Category>> {
        let state = self.state.read().await;
        Ok(state
            .categories
            .values()
            .filter(|c| c.kind == kind)
            .cloned()
            .collect())
    }

    async fn find_children(&self, parent_id: CategoryId) -> AppResult<Vec<Category>> {
        let mut children: Vec<Category> = {
            let state = self.state.read().await;
            state
                .categories
                .values()
                .filter(|c| c.parent_id == Some(parent_id))
                .cloned()
                .collect()
        };
        CategoryQuery::sort_categories(&SortField::asc("name"), &mut children);
        Ok(children)
    }

    async fn count_children(&self, parent_id: CategoryId) -> AppResult<u64> {
        let state = self.state.read().await;
        Ok(state
            .categories
            .values()
            .filter(|c| c.parent_id == Some(parent_id))
            .count() as u64)
    }

    async fn search(&self, query: &CategoryQuery) -> AppResult<PageResponse<Category>> {
        let sort = query.effective_sort()?;
        let mut matching: Vec<Category> = {
            let state = self.state.read().await;
            state
                .categories
                .values()
                .filter(|c| query.matches(c))
                .cloned()
                .collect()
        };
        CategoryQuery::sort_categories(&sort, &mut matching);
        Ok(PageResponse::paginate(matching, &query.page))
    }

    async fn insert(&self, category: &Category) -> AppResult<Category> {
        let mut state = self.state.write().await;
        if state.categories.contains_key(&category.id) {
            return Err(AppError::conflict(format!(
                "Category {} already exists",
                category.id
            )));
        }
        if let Some(parent_id) = category.parent_id {
            if !state.categories.contains_key(&parent_id) {
                return Err(AppError::conflict(format!(
                    "Parent category {parent_id} does not exist"
                )));
            }
        }
        let row = detached(category);
        state.categories.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(&self, category: &Category, expected_version: i64) -> AppResult<Category> {
        let mut state = self.state.write().await;
        let stored_version = state
            .categories
            .get(&category.id)
            .map(|c| c.version)
            .ok_or_else(|| AppError::not_found(format!("Category {} not found", category.id)))?;
        if stored_version != expected_version {
            return Err(AppError::conflict(format!(
                "Category {} was modified concurrently (expected version {expected_version}, found {stored_version})",
                category.id
            )));
        }
        if let Some(parent_id) = category.parent_id {
            if !state.categories.contains_key(&parent_id) {
                return Err(AppError::conflict(format!(
                    "Parent category {parent_id} does not exist"
                )));
            }
        }
        let row = detached(category);
        state.categories.insert(row.id, row.clone());
        Ok(row)
    }

    async fn reparent_children(
        &self,
        parent_id: CategoryId,
        new_parent: Option<CategoryId>,
    ) -> AppResult<u64> {
        let mut state = self.state.write().await;
        if let Some(target) = new_parent {
            if !state.categories.contains_key(&target) {
                return Err(AppError::conflict(format!(
                    "Parent category {target} does not exist"
                )));
            }
        }
        let now = Utc::now();
        let mut moved = 0;
        for child in state
            .categories
            .values_mut()
            .filter(|c| c.parent_id == Some(parent_id))
        {
            child.parent_id = new_parent;
            child.version += 1;
            child.updated_at = now;
            moved += 1;
        }
        Ok(moved)
    }

    async fn delete(&self, id: CategoryId) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if !state.categories.contains_key(&id) {
            return Ok(false);
        }
        if state.has_children(id) {
            return Err(AppError::conflict(format!(
                "Category {id} still has sub-categories"
            )));
        }
        state.categories.remove(&id);
        state.category_links.retain(|_, link| link.category_id != id);
        Ok(true)
    }
}

#[async_trait]
impl CategoryLinkStore for MemoryCatalogStore {
    async fn insert(&self, link: &CategoryLink) -> AppResult<CategoryLink> {
        let mut state = self.state.write().await;
        if !state.categories.contains_key(&link.category_id) {
            return Err(AppError::not_found(format!(
                "Category {} not found",
                link.category_id
            )));
        }
        let exists = state.category_links.values().any(|l| {
            l.entity_kind == link.entity_kind
                && l.entity_id == link.entity_id
                && l.category_id == link.category_id
        });
        if exists {
            return Err(AppError::duplicate(format!(
                "{} is already assigned to category {}",
                link.entity(),
                link.category_id
            )));
        }
        state.category_links.insert(link.id, link.clone());
        Ok(link.clone())
    }

    async fn find(
        &self,
        entity: EntityRef,
        category_id: CategoryId,
    ) -> AppResult<Option<CategoryLink>> {
        let state = self.state.read().await;
        Ok(state
            .category_links
            .values()
            .find(|l| l.entity() == entity && l.category_id == category_id)
            .cloned())
    }

    async fn delete(&self, entity: EntityRef, category_id: CategoryId) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let before = state.category_links.len();
        state
            .category_links
            .retain(|_, l| !(l.entity() == entity && l.category_id == category_id));
        Ok(state.category_links.len() < before)
    }

    async fn find_by_category(&self, category_id: CategoryId) -> AppResult<Vec<CategoryLink>> {
        let state = self.state.read().await;
        let mut links: Vec<CategoryLink> = state
            .category_links
            .values()
            .filter(|l| l.category_id == category_id)
            .cloned()
            .collect();
        links.sort_by_key(|l| (l.created_at, l.id.into_uuid()));
        Ok(links)
    }

    async fn find_by_entity(&self, entity: EntityRef) -> AppResult<Vec<CategoryLink>> {
        let state = self.state.read().await;
        let mut links: Vec<CategoryLink> = state
            .category_links
            .values()
            .filter(|l| l.entity() == entity)
            .cloned()
            .collect();
        links.sort_by_key(|l| (l.created_at, l.id.into_uuid()));
        Ok(links)
    }

    async fn count_by_category(&self, category_id: CategoryId) -> AppResult<u64> {
        let state = self.state.read().await;
        Ok(state
            .category_links
            .values()
            .filter(|l| l.category_id == category_id)
            .count() as u64)
    }

    async fn counts_by_kind(&self, kind: EntityKind) -> AppResult<HashMap<CategoryId, u64>> {
        let state = self.state.read().await;
        let mut counts = HashMap::new();
        for link in state.category_links.values().filter(|l| l.entity_kind == kind) {
            *counts.entry(link.category_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn delete_by_category(&self, category_id: CategoryId) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let before = state.category_links.len();
        state
            .category_links
            .retain(|_, l| l.category_id != category_id);
        Ok((before - state.category_links.len()) as u64)
    }
}

#[async_trait]
impl AttachmentStore for MemoryCatalogStore {
    async fn insert_file(&self, media: &StoredMedia) -> AppResult<StoredMedia> {
        let mut state = self.state.write().await;
        let key = (media.kind(), media.id());
        if state.files.contains_key(&key) {
            return Err(AppError::conflict(format!(
                "{} {} already exists",
                media.kind(),
                media.id()
            )));
        }
        state.files.insert(key, media.clone());
        Ok(media.clone())
    }

    async fn find_file(&self, kind: AttachmentKind, id: FileId) -> AppResult<Option<StoredMedia>> {
        Ok(self.state.read().await.files.get(&(kind, id)).cloned())
    }

    async fn delete_file(&self, kind: AttachmentKind, id: FileId) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if state.file_is_referenced(kind, id) {
            return Err(AppError::conflict(format!(
                "{kind} {id} is still attached"
            )));
        }
        Ok(state.files.remove(&(kind, id)).is_some())
    }

    async fn insert_link(&self, link: &AttachmentLink) -> AppResult<AttachmentLink> {
        let mut state = self.state.write().await;
        if let Some(file_id) = link.file_id {
            if !state.files.contains_key(&(link.kind, file_id)) {
                return Err(AppError::not_found(format!(
                    "{} {file_id} not found",
                    link.kind
                )));
            }
            let linked = state.attachment_links.values().any(|l| {
                l.kind == link.kind && l.owner == link.owner && l.file_id == Some(file_id)
            });
            if linked {
                return Err(AppError::duplicate(format!(
                    "{} is already attached to {}",
                    link.kind, link.owner
                )));
            }
        }
        state.attachment_links.insert(link.id, link.clone());
        Ok(link.clone())
    }

    async fn find_link(
        &self,
        kind: AttachmentKind,
        owner: AttachmentOwner,
        file_id: FileId,
    ) -> AppResult<Option<AttachmentLink>> {
        let state = self.state.read().await;
        Ok(state
            .attachment_links
            .values()
            .find(|l| l.kind == kind && l.owner == owner && l.file_id == Some(file_id))
            .cloned())
    }

    async fn find_links(&self, owner: AttachmentOwner) -> AppResult<Vec<AttachmentLink>> {
        let state = self.state.read().await;
        let mut links: Vec<AttachmentLink> = state
            .attachment_links
            .values()
            .filter(|l| l.owner == owner)
            .cloned()
            .collect();
        links.sort_by_key(|l| (l.created_at, l.id.into_uuid()));
        Ok(links)
    }

    async fn delete_link(
        &self,
        kind: AttachmentKind,
        owner: AttachmentOwner,
        file_id: FileId,
    ) -> AppResult<Option<AttachmentLink>> {
        let mut state = self.state.write().await;
        let target = state
            .attachment_links
            .values()
            .filter(|l| l.kind == kind && l.owner == owner && l.file_id == Some(file_id))
            .min_by_key(|l| (l.created_at, l.id.into_uuid()))
            .map(|l| l.id);
        Ok(target.and_then(|id| state.attachment_links.remove(&id)))
    }

    async fn delete_links_for_owner(
        &self,
        owner: AttachmentOwner,
    ) -> AppResult<Vec<AttachmentLink>> {
        let mut state = self.state.write().await;
        let ids: Vec<LinkId> = state
            .attachment_links
            .values()
            .filter(|l| l.owner == owner)
            .map(|l| l.id)
            .collect();
        Ok(ids
            .into_iter()
            .filter_map(|id| state.attachment_links.remove(&id))
            .collect())
    }

    async fn count_file_references(&self, kind: AttachmentKind, file_id: FileId) -> AppResult<u64> {
        let state = self.state.read().await;
        Ok(state
            .attachment_links
            .values()
            .filter(|l| l.kind == kind && l.file_id == Some(file_id))
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::error::ErrorKind;
    use catalog_core::types::EntityId;
    use catalog_entity::{FileRecord, Image, MediaFile, NewCategory, ParentFilter};

    fn lodging(name: &str) -> Category {
        NewCategory::new(EntityKind::Lodging, name).into_category()
    }

    #[tokio::test]
    async fn test_insert_requires_existing_parent() {
        let store = MemoryCatalogStore::new();
        let mut orphan = lodging("Orphan");
        orphan.parent_id = Some(CategoryId::new());
        let err = CategoryStore::insert(&store, &orphan).await.unwrap_err();
        assert!(err.is(ErrorKind::Conflict));
    }

    #[tokio::test]
    async fn test_update_checks_version() {
        let store = MemoryCatalogStore::new();
        let mut category = CategoryStore::insert(&store, &lodging("Hotels")).await.unwrap();
        category.name = "Boutique Hotels".into();
        category.touch();

        let saved = store.update(&category, 1).await.unwrap();
        assert_eq!(saved.version, 2);

        let err = store.update(&category, 1).await.unwrap_err();
        assert!(err.is(ErrorKind::Conflict));
    }

    #[tokio::test]
    async fn test_delete_restricts_children_and_cascades_links() {
        let store = MemoryCatalogStore::new();
        let root = CategoryStore::insert(&store, &lodging("Root")).await.unwrap();
        let mut child = lodging("Child");
        child.parent_id = Some(root.id);
        CategoryStore::insert(&store, &child).await.unwrap();

        let err = CategoryStore::delete(&store, root.id).await.unwrap_err();
        assert!(err.is(ErrorKind::Conflict));

        let entity = EntityRef::new(EntityKind::Lodging, EntityId::new());
        CategoryLinkStore::insert(&store, &CategoryLink::new(entity, child.id))
            .await
            .unwrap();
        assert!(CategoryStore::delete(&store, child.id).await.unwrap());
        assert_eq!(store.category_link_count().await, 0);
        assert!(CategoryStore::delete(&store, root.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_link_rejected() {
        let store = MemoryCatalogStore::new();
        let hotels = CategoryStore::insert(&store, &lodging("Hotels")).await.unwrap();
        let entity = EntityRef::new(EntityKind::Lodging, EntityId::new());
        CategoryLinkStore::insert(&store, &CategoryLink::new(entity, hotels.id))
            .await
            .unwrap();
        let err = CategoryLinkStore::insert(&store, &CategoryLink::new(entity, hotels.id))
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::Duplicate));
        assert_eq!(store.count_by_category(hotels.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reparent_children_bumps_versions() {
        let store = MemoryCatalogStore::new();
        let root = CategoryStore::insert(&store, &lodging("Root")).await.unwrap();
        let mut child = lodging("Child");
        child.parent_id = Some(root.id);
        CategoryStore::insert(&store, &child).await.unwrap();

        assert_eq!(store.reparent_children(root.id, None).await.unwrap(), 1);
        let moved = store.find_by_id(child.id).await.unwrap().unwrap();
        assert!(moved.is_root());
        assert_eq!(moved.version, 2);
    }

    #[tokio::test]
    async fn test_search_pages_filtered_results() {
        let store = MemoryCatalogStore::new();
        for name in ["Cabins", "Apartments", "Hostels"] {
            CategoryStore::insert(&store, &lodging(name)).await.unwrap();
        }
        CategoryStore::insert(
            &store,
            &NewCategory::new(EntityKind::Product, "Tools").into_category(),
        )
        .await
        .unwrap();

        let query = CategoryQuery {
            kind: Some(EntityKind::Lodging),
            parent: ParentFilter::Root,
            page: catalog_core::types::PageRequest::new(1, 2),
            ..CategoryQuery::default()
        };
        let page = store.search(&query).await.unwrap();
        assert_eq!(page.total_items, 3);
        let names: Vec<&str> = page.items.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Apartments", "Cabins"]);
        assert!(page.has_next);
    }

    #[tokio::test]
    async fn test_file_delete_restricted_while_linked() {
        let store = MemoryCatalogStore::new();
        let image = Image::new(FileRecord::new("a.png", None, 10, None));
        let media = store.insert_file(&image.clone().into_stored()).await.unwrap();
        let owner = AttachmentOwner::category(CategoryId::new());
        let link = catalog_entity::EntityImage::new(owner, image.clone()).to_link();
        store.insert_link(&link).await.unwrap();

        let err = store
            .delete_file(AttachmentKind::Image, media.id())
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::Conflict));

        let removed = store
            .delete_link(AttachmentKind::Image, owner, image.id())
            .await
            .unwrap();
        assert_eq!(removed.map(|l| l.id), Some(link.id));
        assert!(store.delete_file(AttachmentKind::Image, image.id()).await.unwrap());
        assert_eq!(store.file_count().await, 0);
    }

    #[tokio::test]
    async fn test_link_to_missing_file_is_not_found() {
        let store = MemoryCatalogStore::new();
        let image = Image::new(FileRecord::new("a.png", None, 10, None));
        let owner = AttachmentOwner::category(CategoryId::new());
        let link = catalog_entity::EntityImage::new(owner, image).to_link();
        let err = store.insert_link(&link).await.unwrap_err();
        assert!(err.is(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_second_link_to_same_file_is_duplicate() {
        let store = MemoryCatalogStore::new();
        let image = Image::new(FileRecord::new("a.png", None, 10, None));
        store.insert_file(&image.clone().into_stored()).await.unwrap();
        let owner = AttachmentOwner::category(CategoryId::new());
        let first = catalog_entity::EntityImage::new(owner, image.clone()).to_link();
        store.insert_link(&first).await.unwrap();

        let second = catalog_entity::EntityImage::new(owner, image.clone()).to_link();
        let err = store.insert_link(&second).await.unwrap_err();
        assert!(err.is(ErrorKind::Duplicate));

        let found = store
            .find_link(AttachmentKind::Image, owner, image.id())
            .await
            .unwrap();
        assert_eq!(found.map(|l| l.id), Some(first.id));
        assert_eq!(store.find_links(owner).await.unwrap().len(), 1);
    }
}
