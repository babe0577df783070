//! File intake configuration.

use serde::{Deserialize, Serialize};

/// Settings for accepting uploaded attachment files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadsConfig {
    /// Root directory used by the local file processor.
    #[serde(default = "default_root")]
    pub root: String,
    /// Largest accepted payload in bytes.
    #[serde(default = "default_max_size")]
    pub max_size_bytes: u64,
    /// Accepted MIME types. Empty accepts everything.
    #[serde(default)]
    pub allowed_content_types: Vec<String>,
}

impl UploadsConfig {
    /// Whether the given MIME type may be stored.
    pub fn accepts_content_type(&self, content_type: Option<&str>) -> bool {
        if self.allowed_content_types.is_empty() {
            return true;
        }
        content_type.is_some_and(|ct| {
            self.allowed_content_types
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ct))
        })
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            max_size_bytes: default_max_size(),
            allowed_content_types: Vec::new(),
        }
    }
}

fn default_root() -> String {
    "data/uploads".to_string()
}

fn default_max_size() -> u64 {
    20 * 1024 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_allow_list_accepts_everything() {
        let config = UploadsConfig::default();
        assert!(config.accepts_content_type(None));
        assert!(config.accepts_content_type(Some("application/x-anything")));
    }

    #[test]
    fn test_allow_list_is_case_insensitive() {
        let config = UploadsConfig {
            allowed_content_types: vec!["image/png".into()],
            ..UploadsConfig::default()
        };
        assert!(config.accepts_content_type(Some("IMAGE/PNG")));
        assert!(!config.accepts_content_type(Some("image/gif")));
        assert!(!config.accepts_content_type(None));
    }
}
