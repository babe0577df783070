//! # catalog-entity
//!
//! Domain models for the catalog. Categories of every entity family live
//! in one flat table discriminated by [`kind::EntityKind`]; files are
//! attached to categories and business entities through typed link rows
//! gathered in a [`attachment::FileCollection`].
//!
//! Everything here is passive data plus pure invariant checks. Storage
//! and orchestration live in `catalog-database` and `catalog-service`.

#[macro_use]
mod text_enum;

pub mod attachment;
pub mod category;
pub mod file;
pub mod kind;

pub use attachment::{
    AttachmentLink, AttachmentOwner, EntityAttachment, EntityDocument, EntityImage, EntityVideo,
    FileCollection, FileOwner,
};
pub use category::{
    Category, CategoryChanges, CategoryLink, CategoryNode, CategoryQuery, CategoryTree,
    NewCategory, ParentFilter,
};
pub use file::{
    AttachmentKind, Document, FileRecord, Image, ImageType, MediaFile, StoredMedia, Video,
};
pub use kind::{AuditableEntity, EntityKind, EntityRef, OwnerKind};
