//! Entity families and the auditable-entity capability.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_core::error::AppError;
use catalog_core::types::EntityId;

/// The family of business entity a category or link belongs to.
///
/// Categories of different kinds share one table; the kind keeps a
/// lodging category from ever parenting or tagging a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Accommodation listings.
    Lodging,
    /// Catalog products.
    Product,
    /// Bookable or billable services.
    Service,
    /// Business directory entries.
    Business,
    /// Filed documents.
    Filing,
}

impl EntityKind {
    /// Every kind, in declaration order.
    pub const ALL: [EntityKind; 5] = [
        Self::Lodging,
        Self::Product,
        Self::Service,
        Self::Business,
        Self::Filing,
    ];

    /// Return the kind as a string for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lodging => "lodging",
            Self::Product => "product",
            Self::Service => "service",
            Self::Business => "business",
            Self::Filing => "filing",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::validation(format!("Unknown entity kind '{s}'")))
    }
}

text_enum_sqlx!(EntityKind);

/// Capability required of anything that can be categorized: a stable id,
/// a kind and audit timestamps.
pub trait AuditableEntity {
    /// The family this entity belongs to.
    fn entity_kind(&self) -> EntityKind;

    /// The entity's identifier.
    fn entity_id(&self) -> EntityId;

    /// When the entity was created.
    fn created_at(&self) -> DateTime<Utc>;

    /// When the entity was last updated.
    fn updated_at(&self) -> DateTime<Utc>;

    /// A kind-qualified reference to this entity.
    fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.entity_kind(), self.entity_id())
    }
}

/// Kind-qualified reference to a business entity, used where only ids
/// are at hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    /// The entity family.
    pub kind: EntityKind,
    /// The entity identifier.
    pub id: EntityId,
}

impl EntityRef {
    /// Create a new entity reference.
    pub fn new(kind: EntityKind, id: EntityId) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// The kind of aggregate that owns a file collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
    /// A category node (icons, banners).
    Category,
    /// A business entity.
    Entity(EntityKind),
}

impl OwnerKind {
    /// Return the owner kind as a string for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Entity(kind) => kind.as_str(),
        }
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OwnerKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("category") {
            Ok(Self::Category)
        } else {
            s.parse().map(Self::Entity)
        }
    }
}

text_enum_sqlx!(OwnerKind);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_round_trips_through_str() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
        assert!("spaceship".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_owner_kind_parse() {
        assert_eq!("category".parse::<OwnerKind>().unwrap(), OwnerKind::Category);
        assert_eq!(
            "product".parse::<OwnerKind>().unwrap(),
            OwnerKind::Entity(EntityKind::Product)
        );
    }

    #[test]
    fn test_entity_ref_display() {
        let id = EntityId::new();
        let r = EntityRef::new(EntityKind::Lodging, id);
        assert_eq!(r.to_string(), format!("lodging:{id}"));
    }
}
