//! Document attachments.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::model::FileRecord;

/// A stored document (brochure, contract, price list).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Document {
    /// Common file metadata.
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub file: FileRecord,
    /// Description of the document.
    pub description: Option<String>,
    /// Whether customers may download it.
    pub is_public: bool,
}

impl Document {
    /// Wrap a file record as a private document.
    pub fn new(file: FileRecord) -> Self {
        Self {
            file,
            description: None,
            is_public: false,
        }
    }
}
