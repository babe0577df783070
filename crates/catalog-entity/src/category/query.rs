//! Category listing filters.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use catalog_core::result::AppResult;
use catalog_core::types::{CategoryId, PageRequest, SortDirection, SortField};

use crate::kind::EntityKind;

use super::model::Category;

/// Fields a category listing may be sorted by.
pub const SORTABLE_FIELDS: [&str; 3] = ["name", "created_at", "updated_at"];

/// Which tree level a listing covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "scope", content = "id")]
pub enum ParentFilter {
    /// Every level.
    #[default]
    Any,
    /// Only root categories.
    Root,
    /// Only direct children of the given category.
    Of(CategoryId),
}

/// Filters, sort and page for a category listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryQuery {
    /// Restrict to one entity family.
    pub kind: Option<EntityKind>,
    /// Restrict to one tree level.
    #[serde(default)]
    pub parent: ParentFilter,
    /// Restrict by active flag.
    pub active: Option<bool>,
    /// Restrict by featured flag.
    pub featured: Option<bool>,
    /// Free-text search over name, description and web tags.
    pub search: Option<String>,
    /// Sort order; defaults to name ascending.
    pub sort: Option<SortField>,
    /// Page to return.
    #[serde(default)]
    pub page: PageRequest,
}

impl CategoryQuery {
    /// Listing of one kind, every level.
    pub fn for_kind(kind: EntityKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// Parse and attach a `"{field} asc|desc"` sort expression.
    pub fn sorted_by(mut self, expr: &str) -> AppResult<Self> {
        let sort = SortField::parse(expr)?;
        sort.ensure_allowed(&SORTABLE_FIELDS)?;
        self.sort = Some(sort);
        Ok(self)
    }

    /// The effective sort, checked against [`SORTABLE_FIELDS`].
    pub fn effective_sort(&self) -> AppResult<SortField> {
        let sort = self.sort.clone().unwrap_or_else(|| SortField::asc("name"));
        sort.ensure_allowed(&SORTABLE_FIELDS)?;
        Ok(sort)
    }

    /// The trimmed search term, if any.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Whether a category passes every filter.
    pub fn matches(&self, category: &Category) -> bool {
        if self.kind.is_some_and(|k| k != category.kind) {
            return false;
        }
        let parent_ok = match self.parent {
            ParentFilter::Any => true,
            ParentFilter::Root => category.parent_id.is_none(),
            ParentFilter::Of(id) => category.parent_id == Some(id),
        };
        if !parent_ok {
            return false;
        }
        if self.active.is_some_and(|a| a != category.active) {
            return false;
        }
        if self.featured.is_some_and(|f| f != category.featured) {
            return false;
        }
        self.search_term()
            .is_none_or(|term| category.matches_text(term))
    }

    /// Sort categories in place by `sort`.
    pub fn sort_categories(sort: &SortField, categories: &mut [Category]) {
        categories.sort_by(|a, b| {
            let ordering = match sort.field.as_str() {
                "created_at" => a.created_at.cmp(&b.created_at),
                "updated_at" => a.updated_at.cmp(&b.updated_at),
                _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            }
            .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()));
            match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    /// The SQL `ORDER BY` clause for the effective sort. Field names come
    /// from [`SORTABLE_FIELDS`] only.
    pub fn order_by_sql(&self) -> AppResult<String> {
        let sort = self.effective_sort()?;
        let column = match sort.field.as_str() {
            "name" => "LOWER(name)",
            other => other,
        };
        Ok(format!("{column} {}, id ASC", sort.direction.as_sql()))
    }
}

/// Sibling order used when rendering trees.
pub(crate) fn by_name(a: &Category, b: &Category) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::NewCategory;
    use catalog_core::error::ErrorKind;

    fn category(name: &str) -> Category {
        NewCategory::new(EntityKind::Lodging, name).into_category()
    }

    #[test]
    fn test_parent_filter() {
        let root = category("Root");
        let mut child = category("Child");
        child.parent_id = Some(root.id);

        let roots = CategoryQuery {
            parent: ParentFilter::Root,
            ..CategoryQuery::default()
        };
        assert!(roots.matches(&root));
        assert!(!roots.matches(&child));

        let children = CategoryQuery {
            parent: ParentFilter::Of(root.id),
            ..CategoryQuery::default()
        };
        assert!(children.matches(&child));
        assert!(!children.matches(&root));
    }

    #[test]
    fn test_kind_active_featured_and_search() {
        let mut hut = category("Mountain Huts");
        hut.featured = true;
        let query = CategoryQuery {
            kind: Some(EntityKind::Lodging),
            active: Some(true),
            featured: Some(true),
            search: Some("  mountain ".into()),
            ..CategoryQuery::default()
        };
        assert!(query.matches(&hut));
        hut.active = false;
        assert!(!query.matches(&hut));

        let products = CategoryQuery::for_kind(EntityKind::Product);
        assert!(!products.matches(&category("Hotels")));
    }

    #[test]
    fn test_sorted_by_rejects_unknown_field() {
        let err = CategoryQuery::default().sorted_by("secret desc").unwrap_err();
        assert!(err.is(ErrorKind::Validation));
    }

    #[test]
    fn test_sort_by_name_desc() {
        let mut list = vec![category("b"), category("C"), category("a")];
        let sort = SortField::desc("name");
        CategoryQuery::sort_categories(&sort, &mut list);
        let names: Vec<&str> = list.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["C", "b", "a"]);
    }

    #[test]
    fn test_order_by_sql() {
        let query = CategoryQuery::default().sorted_by("created_at desc").unwrap();
        assert_eq!(query.order_by_sql().unwrap(), "created_at DESC, id ASC");
        assert_eq!(
            CategoryQuery::default().order_by_sql().unwrap(),
            "LOWER(name) ASC, id ASC"
        );
    }
}
