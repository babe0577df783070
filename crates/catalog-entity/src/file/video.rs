//! Video attachments.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::model::FileRecord;

/// A stored video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Video {
    /// Common file metadata.
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub file: FileRecord,
    /// Short caption shown with the player.
    pub caption: Option<String>,
    /// Longer description.
    pub description: Option<String>,
}

impl Video {
    /// Wrap a file record as a video without caption.
    pub fn new(file: FileRecord) -> Self {
        Self {
            file,
            caption: None,
            description: None,
        }
    }
}
