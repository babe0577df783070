//! Attachment owner references.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use catalog_core::types::CategoryId;

use crate::kind::{EntityRef, OwnerKind};

/// The aggregate a file collection belongs to. The id is the foreign key
/// target of every link in that collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttachmentOwner {
    /// What kind of aggregate owns the files.
    pub kind: OwnerKind,
    /// The owner's id.
    pub id: Uuid,
}

impl AttachmentOwner {
    /// Files owned by a category.
    pub fn category(id: CategoryId) -> Self {
        Self {
            kind: OwnerKind::Category,
            id: id.into_uuid(),
        }
    }

    /// Files owned by a business entity.
    pub fn entity(entity: EntityRef) -> Self {
        Self {
            kind: OwnerKind::Entity(entity.kind),
            id: entity.id.into_uuid(),
        }
    }
}

impl fmt::Display for AttachmentOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}
