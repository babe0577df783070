//! Category entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use catalog_core::types::CategoryId;

use crate::attachment::{AttachmentOwner, FileCollection, FileOwner};
use crate::kind::EntityKind;

/// Longest accepted category name, in characters.
pub const NAME_MAX_LEN: u64 = 100;
/// Longest accepted category description, in characters.
pub const DESCRIPTION_MAX_LEN: u64 = 5000;

/// Visibility state of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryState {
    /// Shown in customer-facing listings.
    Active,
    /// Soft-deleted: hidden but kept for referential integrity.
    Inactive,
}

/// Position of a category in its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreePosition {
    /// No parent.
    Root,
    /// Has a parent of the same kind.
    Child,
}

/// A node in the category tree of one entity kind.
///
/// Sub-categories are not stored on the node; they are derived from
/// `parent_id` through [`super::CategoryTree`] or a store query.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    /// Unique category identifier.
    pub id: CategoryId,
    /// Entity family this category classifies.
    pub kind: EntityKind,
    /// Category name.
    pub name: String,
    /// Optional long description.
    pub description: Option<String>,
    /// Soft-delete flag.
    pub active: bool,
    /// Highlighted in storefront listings.
    pub featured: bool,
    /// Comma-separated slugs.
    pub web_tags: Option<String>,
    /// Shown in the main navigation menu.
    pub display_in_main_menu: bool,
    /// Shown as a slider item on landing pages.
    pub display_as_slider_item: bool,
    /// Marketing slogan.
    pub slogan: Option<String>,
    /// Secondary slogan.
    pub sub_slogan: Option<String>,
    /// Parent category (None for roots).
    pub parent_id: Option<CategoryId>,
    /// Optimistic concurrency token, bumped on every update.
    pub version: i64,
    /// When the category was created.
    pub created_at: DateTime<Utc>,
    /// When the category was last updated.
    pub updated_at: DateTime<Utc>,
    /// Attachments owned by the category itself (icons, banners).
    #[sqlx(skip)]
    #[serde(default)]
    pub files: FileCollection,
}

impl Category {
    /// Check if this is a root category.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Current visibility state.
    pub fn state(&self) -> CategoryState {
        if self.active {
            CategoryState::Active
        } else {
            CategoryState::Inactive
        }
    }

    /// Current tree position.
    pub fn position(&self) -> TreePosition {
        if self.is_root() {
            TreePosition::Root
        } else {
            TreePosition::Child
        }
    }

    /// Split `web_tags` into trimmed, lowercase, non-empty slugs.
    pub fn web_tag_slugs(&self) -> Vec<String> {
        self.web_tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|tag| tag.trim().to_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect()
    }

    /// Whether `needle` appears (case-insensitively) in the name,
    /// description or web tags.
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [
            Some(self.name.as_str()),
            self.description.as_deref(),
            self.web_tags.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Record a modification: bump the version and the update timestamp.
    pub fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }

    /// Apply validated changes.
    pub fn apply(&mut self, changes: CategoryChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if changes.clear_description {
            self.description = None;
        } else if let Some(description) = changes.description {
            self.description = Some(description);
        }
        if let Some(featured) = changes.featured {
            self.featured = featured;
        }
        if let Some(web_tags) = changes.web_tags {
            self.web_tags = Some(web_tags).filter(|t| !t.trim().is_empty());
        }
        if let Some(flag) = changes.display_in_main_menu {
            self.display_in_main_menu = flag;
        }
        if let Some(flag) = changes.display_as_slider_item {
            self.display_as_slider_item = flag;
        }
        if let Some(slogan) = changes.slogan {
            self.slogan = Some(slogan).filter(|s| !s.is_empty());
        }
        if let Some(sub_slogan) = changes.sub_slogan {
            self.sub_slogan = Some(sub_slogan).filter(|s| !s.is_empty());
        }
    }
}

impl FileOwner for Category {
    fn attachment_owner(&self) -> AttachmentOwner {
        AttachmentOwner::category(self.id)
    }

    fn files(&self) -> &FileCollection {
        &self.files
    }

    fn files_mut(&mut self) -> &mut FileCollection {
        &mut self.files
    }
}

/// Data required to create a new category.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewCategory {
    /// Entity family.
    pub kind: EntityKind,
    /// Category name.
    #[validate(length(min = 1, max = NAME_MAX_LEN, message = "must be 1 to 100 characters"))]
    pub name: String,
    /// Optional description.
    #[validate(length(max = DESCRIPTION_MAX_LEN, message = "must be at most 5000 characters"))]
    pub description: Option<String>,
    /// Parent category (None for a root).
    pub parent_id: Option<CategoryId>,
    /// Highlighted in listings.
    #[serde(default)]
    pub featured: bool,
    /// Comma-separated slugs.
    pub web_tags: Option<String>,
    /// Shown in the main menu.
    #[serde(default)]
    pub display_in_main_menu: bool,
    /// Shown as a slider item.
    #[serde(default)]
    pub display_as_slider_item: bool,
    /// Marketing slogan.
    pub slogan: Option<String>,
    /// Secondary slogan.
    pub sub_slogan: Option<String>,
}

impl NewCategory {
    /// A root category with just a name.
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            description: None,
            parent_id: None,
            featured: false,
            web_tags: None,
            display_in_main_menu: false,
            display_as_slider_item: false,
            slogan: None,
            sub_slogan: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the parent.
    pub fn with_parent(mut self, parent_id: CategoryId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Build the active category row.
    pub fn into_category(self) -> Category {
        let now = Utc::now();
        Category {
            id: CategoryId::new(),
            kind: self.kind,
            name: self.name,
            description: self.description,
            active: true,
            featured: self.featured,
            web_tags: self.web_tags.filter(|t| !t.trim().is_empty()),
            display_in_main_menu: self.display_in_main_menu,
            display_as_slider_item: self.display_as_slider_item,
            slogan: self.slogan,
            sub_slogan: self.sub_slogan,
            parent_id: self.parent_id,
            version: 1,
            created_at: now,
            updated_at: now,
            files: FileCollection::default(),
        }
    }
}

/// Partial update of category metadata. Tree position and the active flag
/// change through their own operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CategoryChanges {
    /// New name.
    #[validate(length(min = 1, max = NAME_MAX_LEN, message = "must be 1 to 100 characters"))]
    pub name: Option<String>,
    /// New description.
    #[validate(length(max = DESCRIPTION_MAX_LEN, message = "must be at most 5000 characters"))]
    pub description: Option<String>,
    /// Remove the description.
    #[serde(default)]
    pub clear_description: bool,
    /// New featured flag.
    pub featured: Option<bool>,
    /// New web tags; empty clears.
    pub web_tags: Option<String>,
    /// New main-menu flag.
    pub display_in_main_menu: Option<bool>,
    /// New slider flag.
    pub display_as_slider_item: Option<bool>,
    /// New slogan; empty clears.
    pub slogan: Option<String>,
    /// New sub-slogan; empty clears.
    pub sub_slogan: Option<String>,
}
