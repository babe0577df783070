//! Entity-to-category association rows.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use catalog_core::error::AppError;
use catalog_core::result::AppResult;
use catalog_core::types::{CategoryId, EntityId, LinkId};

use crate::kind::{AuditableEntity, EntityKind, EntityRef};

use super::model::Category;

/// Many-to-many join between a business entity and a category of the
/// same kind. The pair `(entity_kind, entity_id, category_id)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CategoryLink {
    /// Link identifier.
    pub id: LinkId,
    /// Kind of the linked entity; always equal to the category's kind.
    pub entity_kind: EntityKind,
    /// The linked entity.
    pub entity_id: EntityId,
    /// The linked category.
    pub category_id: CategoryId,
    /// Optimistic concurrency token.
    pub version: i64,
    /// When the link was created.
    pub created_at: DateTime<Utc>,
}

impl CategoryLink {
    /// Link by ids only. The caller vouches that the category's kind
    /// matches `entity.kind`.
    pub fn new(entity: EntityRef, category_id: CategoryId) -> Self {
        Self {
            id: LinkId::new(),
            entity_kind: entity.kind,
            entity_id: entity.id,
            category_id,
            version: 1,
            created_at: Utc::now(),
        }
    }

    /// Link an entity to a loaded category, checking that both belong to
    /// the same kind.
    pub fn between<E: AuditableEntity + ?Sized>(entity: &E, category: &Category) -> AppResult<Self> {
        if entity.entity_kind() != category.kind {
            return Err(AppError::invariant(format!(
                "Cannot assign a {} to {} category '{}'",
                entity.entity_kind(),
                category.kind,
                category.name
            )));
        }
        Ok(Self::new(entity.entity_ref(), category.id))
    }

    /// The linked entity.
    pub fn entity(&self) -> EntityRef {
        EntityRef::new(self.entity_kind, self.entity_id)
    }
}

impl fmt::Display for CategoryLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Category for {}", self.entity_kind)
    }
}
