//! Persistence seams used by the services.
//!
//! Every store mirrors the relational constraints of the migrations, so the
//! in-memory and PostgreSQL implementations fail the same way:
//!
//! - deleting a category that still has children is a `Conflict`;
//! - deleting a category removes its entity links;
//! - a second link for the same entity and category is a `Duplicate`;
//! - a second link from one owner to the same file is a `Duplicate`;
//! - deleting a file that is still linked is a `Conflict`.

use std::collections::HashMap;

use async_trait::async_trait;

use catalog_core::result::AppResult;
use catalog_core::types::{CategoryId, FileId, PageResponse};
use catalog_entity::{
    AttachmentKind, AttachmentLink, AttachmentOwner, Category, CategoryLink, CategoryQuery,
    EntityKind, EntityRef, StoredMedia,
};

/// Category rows.
#[async_trait]
pub trait CategoryStore: Send + Sync + 'static {
    /// Find a category by id.
    async fn find_by_id(&self, id: CategoryId) -> AppResult<Option<Category>>;

    /// Every category of one kind, unsorted.
    async fn find_by_kind(&self, kind: EntityKind) -> AppResult<Vec<Category>>;

    /// Direct children of a category.
    async fn find_children(&self, parent_id: CategoryId) -> AppResult<Vec<Category>>;

    /// Number of direct children of a category.
    async fn count_children(&self, parent_id: CategoryId) -> AppResult<u64>;

    /// Filtered, sorted and paged listing.
    async fn search(&self, query: &CategoryQuery) -> AppResult<PageResponse<Category>>;

    /// Insert a new category. The parent, if any, must exist.
    async fn insert(&self, category: &Category) -> AppResult<Category>;

    /// Persist `category` if the stored row is still at `expected_version`.
    ///
    /// Fails with `NotFound` when the row is gone and `Conflict` when another
    /// writer got there first.
    async fn update(&self, category: &Category, expected_version: i64) -> AppResult<Category>;

    /// Move every child of `parent_id` under `new_parent`, bumping their
    /// versions. Returns the number of moved children.
    async fn reparent_children(
        &self,
        parent_id: CategoryId,
        new_parent: Option<CategoryId>,
    ) -> AppResult<u64>;

    /// Delete a category row. Returns `false` if it did not exist.
    async fn delete(&self, id: CategoryId) -> AppResult<bool>;
}

/// Entity-to-category links.
#[async_trait]
pub trait CategoryLinkStore: Send + Sync + 'static {
    /// Insert a link. Fails with `Duplicate` if the pair is already linked
    /// and `NotFound` if the category does not exist.
    async fn insert(&self, link: &CategoryLink) -> AppResult<CategoryLink>;

    /// Find the link between an entity and a category.
    async fn find(&self, entity: EntityRef, category_id: CategoryId)
    -> AppResult<Option<CategoryLink>>;

    /// Delete the link between an entity and a category. Returns `false` if
    /// there was none.
    async fn delete(&self, entity: EntityRef, category_id: CategoryId) -> AppResult<bool>;

    /// Links of one category.
    async fn find_by_category(&self, category_id: CategoryId) -> AppResult<Vec<CategoryLink>>;

    /// Links of one entity.
    async fn find_by_entity(&self, entity: EntityRef) -> AppResult<Vec<CategoryLink>>;

    /// Number of entities linked to one category.
    async fn count_by_category(&self, category_id: CategoryId) -> AppResult<u64>;

    /// Number of linked entities per category, for every category of `kind`
    /// that has at least one link.
    async fn counts_by_kind(&self, kind: EntityKind) -> AppResult<HashMap<CategoryId, u64>>;

    /// Delete every link of one category. Returns the number removed.
    async fn delete_by_category(&self, category_id: CategoryId) -> AppResult<u64>;
}

/// Attachment files and their owner links.
#[async_trait]
pub trait AttachmentStore: Send + Sync + 'static {
    /// Insert a file row into the table of its variant.
    async fn insert_file(&self, media: &StoredMedia) -> AppResult<StoredMedia>;

    /// Find a file by variant and id.
    async fn find_file(&self, kind: AttachmentKind, id: FileId) -> AppResult<Option<StoredMedia>>;

    /// Delete a file row. Fails with `Conflict` while links reference it.
    async fn delete_file(&self, kind: AttachmentKind, id: FileId) -> AppResult<bool>;

    /// Insert a link row. The referenced file must exist (`NotFound`) and
    /// must not already be linked to the same owner (`Duplicate`).
    async fn insert_link(&self, link: &AttachmentLink) -> AppResult<AttachmentLink>;

    /// The owner's link to one file, if any.
    async fn find_link(
        &self,
        kind: AttachmentKind,
        owner: AttachmentOwner,
        file_id: FileId,
    ) -> AppResult<Option<AttachmentLink>>;

    /// Every link of one owner, oldest first.
    async fn find_links(&self, owner: AttachmentOwner) -> AppResult<Vec<AttachmentLink>>;

    /// Delete the owner's link to a file. Returns the removed link, if any.
    async fn delete_link(
        &self,
        kind: AttachmentKind,
        owner: AttachmentOwner,
        file_id: FileId,
    ) -> AppResult<Option<AttachmentLink>>;

    /// Delete every link of one owner. Returns the removed links.
    async fn delete_links_for_owner(&self, owner: AttachmentOwner)
    -> AppResult<Vec<AttachmentLink>>;

    /// Number of links, across all owners, that reference a file.
    async fn count_file_references(&self, kind: AttachmentKind, file_id: FileId) -> AppResult<u64>;
}
