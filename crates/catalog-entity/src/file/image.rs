//! Image attachments.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use catalog_core::error::AppError;

use super::model::FileRecord;

/// The role an image plays for its owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    /// Main picture; at most one per owner once the service policy applies.
    Cover,
    /// Small symbolic picture, e.g. a category icon.
    Icon,
    /// Wide header picture.
    Banner,
    /// Ordinary gallery picture.
    #[default]
    Gallery,
}

impl ImageType {
    /// Return the image type as a string for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cover => "cover",
            Self::Icon => "icon",
            Self::Banner => "banner",
            Self::Gallery => "gallery",
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ImageType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cover" => Ok(Self::Cover),
            "icon" => Ok(Self::Icon),
            "banner" => Ok(Self::Banner),
            "gallery" => Ok(Self::Gallery),
            other => Err(AppError::validation(format!("Unknown image type '{other}'"))),
        }
    }
}

text_enum_sqlx!(ImageType);

/// A stored image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Image {
    /// Common file metadata.
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub file: FileRecord,
    /// Whether the image is highlighted in listings.
    pub featured: bool,
    /// The image's role.
    pub image_type: ImageType,
}

impl Image {
    /// Wrap a file record as a gallery image.
    pub fn new(file: FileRecord) -> Self {
        Self {
            file,
            featured: false,
            image_type: ImageType::Gallery,
        }
    }

    /// Whether this image is a cover.
    pub fn is_cover(&self) -> bool {
        self.image_type == ImageType::Cover
    }
}
