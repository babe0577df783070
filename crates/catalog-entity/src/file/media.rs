//! Uniform handling of the three attachment variants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use catalog_core::error::AppError;
use catalog_core::types::FileId;

use super::document::Document;
use super::image::Image;
use super::model::FileRecord;
use super::video::Video;

/// Which attachment variant a file or link is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    /// An [`Image`].
    Image,
    /// A [`Video`].
    Video,
    /// A [`Document`].
    Document,
}

impl AttachmentKind {
    /// Every attachment kind.
    pub const ALL: [AttachmentKind; 3] = [Self::Image, Self::Video, Self::Document];

    /// Return the kind as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AttachmentKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::validation(format!("Unknown attachment kind '{s}'")))
    }
}

text_enum_sqlx!(AttachmentKind);

/// A file variant that can be attached to an owner.
pub trait MediaFile: Clone + Send + Sync + 'static {
    /// The variant tag.
    const KIND: AttachmentKind;

    /// Common metadata.
    fn record(&self) -> &FileRecord;

    /// Erase the variant.
    fn into_stored(self) -> StoredMedia;

    /// Recover the variant, if `media` is of this kind.
    fn from_stored(media: StoredMedia) -> Option<Self>;

    /// The file id.
    fn id(&self) -> FileId {
        self.record().id
    }
}

impl MediaFile for Image {
    const KIND: AttachmentKind = AttachmentKind::Image;

    fn record(&self) -> &FileRecord {
        &self.file
    }

    fn into_stored(self) -> StoredMedia {
        StoredMedia::Image(self)
    }

    fn from_stored(media: StoredMedia) -> Option<Self> {
        match media {
            StoredMedia::Image(image) => Some(image),
            _ => None,
        }
    }
}

impl MediaFile for Video {
    const KIND: AttachmentKind = AttachmentKind::Video;

    fn record(&self) -> &FileRecord {
        &self.file
    }

    fn into_stored(self) -> StoredMedia {
        StoredMedia::Video(self)
    }

    fn from_stored(media: StoredMedia) -> Option<Self> {
        match media {
            StoredMedia::Video(video) => Some(video),
            _ => None,
        }
    }
}

impl MediaFile for Document {
    const KIND: AttachmentKind = AttachmentKind::Document;

    fn record(&self) -> &FileRecord {
        &self.file
    }

    fn into_stored(self) -> StoredMedia {
        StoredMedia::Document(self)
    }

    fn from_stored(media: StoredMedia) -> Option<Self> {
        match media {
            StoredMedia::Document(document) => Some(document),
            _ => None,
        }
    }
}

/// A stored file of any variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoredMedia {
    /// An image.
    Image(Image),
    /// A video.
    Video(Video),
    /// A document.
    Document(Document),
}

impl StoredMedia {
    /// The variant tag.
    pub fn kind(&self) -> AttachmentKind {
        match self {
            Self::Image(_) => AttachmentKind::Image,
            Self::Video(_) => AttachmentKind::Video,
            Self::Document(_) => AttachmentKind::Document,
        }
    }

    /// Common metadata.
    pub fn record(&self) -> &FileRecord {
        match self {
            Self::Image(image) => &image.file,
            Self::Video(video) => &video.file,
            Self::Document(document) => &document.file,
        }
    }

    /// The file id.
    pub fn id(&self) -> FileId {
        self.record().id
    }
}
