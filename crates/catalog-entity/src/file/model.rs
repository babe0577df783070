//! Common file metadata shared by every attachment variant.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use catalog_core::types::FileId;

/// Metadata of a stored file. The bytes themselves live with the file
/// processor; this record only keeps what it handed back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct FileRecord {
    /// Unique file identifier.
    pub id: FileId,
    /// Optional human-facing title.
    pub display_name: Option<String>,
    /// Server-generated, collision-free storage name.
    pub file_name: String,
    /// MIME type, if known.
    pub content_type: Option<String>,
    /// Size in bytes.
    pub size_bytes: i64,
    /// Path relative to the storage root.
    pub relative_path: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When path or display metadata last changed.
    pub updated_at: DateTime<Utc>,
}

impl FileRecord {
    /// Build a record for a freshly uploaded file. The stored name is
    /// derived from `original_name` with a unique suffix.
    pub fn new(
        original_name: &str,
        content_type: Option<String>,
        size_bytes: u64,
        relative_path: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: FileId::new(),
            display_name: None,
            file_name: unique_file_name(original_name),
            content_type,
            size_bytes: i64::try_from(size_bytes).unwrap_or(i64::MAX),
            relative_path,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the storage-relative path.
    pub fn set_relative_path(&mut self, path: impl Into<String>) {
        self.relative_path = Some(path.into());
        self.updated_at = Utc::now();
    }

    /// Set the display name.
    pub fn set_display_name(&mut self, name: Option<String>) {
        self.display_name = name;
        self.updated_at = Utc::now();
    }

    /// Get the file extension (lowercase), if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
    }
}

/// Generate `{stem}_{token}{.ext}` from an uploaded name.
///
/// Directory components of the original name are discarded. The token is a
/// fresh UUID, so two uploads with the same original name never collide.
pub fn unique_file_name(original_name: &str) -> String {
    let base = Path::new(original_name.trim())
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    let path = Path::new(base);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("file");
    let token = Uuid::new_v4().simple();

    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_{token}.{ext}"),
        None => format!("{stem}_{token}"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_unique_name_keeps_stem_and_extension() {
        let name = unique_file_name("beach house.jpg");
        assert!(name.starts_with("beach house_"));
        assert!(name.ends_with(".jpg"));
        // stem + '_' + 32 hex chars + ".jpg"
        assert_eq!(name.len(), "beach house".len() + 1 + 32 + 4);
    }

    #[test]
    fn test_identical_names_never_collide() {
        let names: HashSet<String> = (0..500).map(|_| unique_file_name("cover.png")).collect();
        assert_eq!(names.len(), 500);
    }

    #[test]
    fn test_directory_components_are_dropped() {
        let name = unique_file_name("../../etc/passwd");
        assert!(name.starts_with("passwd_"));
        assert!(!name.contains('/'));
    }

    #[test]
    fn test_name_without_extension_or_stem() {
        assert!(!unique_file_name("README").contains('.'));
        assert!(unique_file_name("").starts_with("file_"));
    }

    #[test]
    fn test_record_extension_is_lowercase() {
        let record = FileRecord::new("Photo.JPG", Some("image/jpeg".into()), 10, None);
        assert_eq!(record.extension().as_deref(), Some("jpg"));
        assert_eq!(record.size_bytes, 10);
    }
}
