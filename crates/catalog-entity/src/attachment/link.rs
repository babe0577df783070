//! Attachment link rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_core::error::AppError;
use catalog_core::result::AppResult;
use catalog_core::types::{FileId, LinkId};

use crate::file::{AttachmentKind, Document, Image, MediaFile, StoredMedia, Video};

use super::owner::AttachmentOwner;

/// Untyped link row as persisted: one file, one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentLink {
    /// Link identifier.
    pub id: LinkId,
    /// Which link table the row lives in.
    pub kind: AttachmentKind,
    /// The linked file. Nullable in storage; a link without a file is
    /// tolerated but never created by the services.
    pub file_id: Option<FileId>,
    /// The owning aggregate.
    pub owner: AttachmentOwner,
    /// Optimistic concurrency token.
    pub version: i64,
    /// When the link was created.
    pub created_at: DateTime<Utc>,
}

/// A typed link between one file of variant `F` and one owner, with the
/// file navigation loaded when available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityAttachment<F> {
    /// Link identifier.
    pub id: LinkId,
    /// The linked file id.
    pub file_id: Option<FileId>,
    /// The linked file, when loaded.
    pub file: Option<F>,
    /// The owning aggregate.
    pub owner: AttachmentOwner,
    /// Optimistic concurrency token.
    pub version: i64,
    /// When the link was created.
    pub created_at: DateTime<Utc>,
}

/// An image attached to an owner.
pub type EntityImage = EntityAttachment<Image>;
/// A video attached to an owner.
pub type EntityVideo = EntityAttachment<Video>;
/// A document attached to an owner.
pub type EntityDocument = EntityAttachment<Document>;

impl<F: MediaFile> EntityAttachment<F> {
    /// Link `file` to `owner`.
    pub fn new(owner: AttachmentOwner, file: F) -> Self {
        Self {
            id: LinkId::new(),
            file_id: Some(file.id()),
            file: Some(file),
            owner,
            version: 1,
            created_at: Utc::now(),
        }
    }

    /// The persisted form of this link.
    pub fn to_link(&self) -> AttachmentLink {
        AttachmentLink {
            id: self.id,
            kind: F::KIND,
            file_id: self.file_id,
            owner: self.owner,
            version: self.version,
            created_at: self.created_at,
        }
    }

    /// Rebuild a typed link from its row and the optionally loaded file.
    pub fn from_link(link: AttachmentLink, file: Option<StoredMedia>) -> AppResult<Self> {
        if link.kind != F::KIND {
            return Err(AppError::invariant(format!(
                "Link {} is a {} link, not {}",
                link.id,
                link.kind,
                F::KIND
            )));
        }
        let file = match file {
            Some(media) => {
                if Some(media.id()) != link.file_id {
                    return Err(AppError::invariant(format!(
                        "Link {} does not reference file {}",
                        link.id,
                        media.id()
                    )));
                }
                let kind = media.kind();
                Some(F::from_stored(media).ok_or_else(|| {
                    AppError::invariant(format!(
                        "Link {} expects a {} but the file is a {kind}",
                        link.id,
                        F::KIND
                    ))
                })?)
            }
            None => None,
        };
        Ok(Self {
            id: link.id,
            file_id: link.file_id,
            file,
            owner: link.owner,
            version: link.version,
            created_at: link.created_at,
        })
    }

    /// Whether this link points at the given file.
    pub fn references(&self, file_id: FileId) -> bool {
        self.file_id == Some(file_id)
    }
}
