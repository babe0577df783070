//! File descriptions accepted by attachment intake.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use catalog_core::config::UploadsConfig;
use catalog_core::error::AppError;
use catalog_core::result::AppResult;
use catalog_entity::{AttachmentKind, FileRecord, ImageType};

/// Which variant an upload becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum UploadKind {
    /// An image with the given role.
    Image {
        /// The image's role.
        #[serde(default)]
        image_type: ImageType,
    },
    /// A video.
    Video,
    /// A document.
    Document,
}

impl UploadKind {
    /// The attachment variant.
    pub fn attachment_kind(&self) -> AttachmentKind {
        match self {
            Self::Image { .. } => AttachmentKind::Image,
            Self::Video => AttachmentKind::Video,
            Self::Document => AttachmentKind::Document,
        }
    }
}

/// A file description as received from a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUpload {
    /// Original file name.
    pub file_name: String,
    /// MIME type, if known.
    pub content_type: Option<String>,
    /// Declared size in bytes.
    pub size_bytes: u64,
    /// File content, base64-encoded. Metadata-only uploads omit it.
    pub payload_base64: Option<String>,
    /// Optional human-facing title.
    pub display_name: Option<String>,
    /// Target variant.
    pub kind: UploadKind,
}

impl FileUpload {
    /// Check the upload against intake limits and decode its payload.
    ///
    /// Sizes are checked before anything is decoded, against both the
    /// declared size and the encoded length. A decoded payload must match
    /// the declared size.
    pub(crate) fn prepare(&self, limits: &UploadsConfig) -> AppResult<(FileRecord, Option<Bytes>)> {
        if self.file_name.trim().is_empty() {
            return Err(AppError::validation("File name cannot be empty"));
        }
        if !limits.accepts_content_type(self.content_type.as_deref()) {
            return Err(AppError::validation(format!(
                "Content type '{}' is not accepted",
                self.content_type.as_deref().unwrap_or("unknown")
            )));
        }
        if self.size_bytes > limits.max_size_bytes {
            return Err(oversized(limits));
        }

        let payload = match self.payload_base64.as_deref().map(str::trim) {
            Some(encoded) => {
                if encoded.len() as u64 > max_encoded_len(limits.max_size_bytes) {
                    return Err(oversized(limits));
                }
                let decoded = STANDARD.decode(encoded).map_err(|e| {
                    AppError::validation(format!("Payload is not valid base64: {e}"))
                })?;
                if decoded.len() as u64 != self.size_bytes {
                    return Err(AppError::validation(format!(
                        "Declared size {} does not match payload size {}",
                        self.size_bytes,
                        decoded.len()
                    )));
                }
                Some(Bytes::from(decoded))
            }
            None => None,
        };

        let mut record = FileRecord::new(
            &self.file_name,
            self.content_type.clone(),
            self.size_bytes,
            None,
        );
        record.set_display_name(
            self.display_name
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
        Ok((record, payload))
    }
}

/// Length of the padded base64 encoding of `max_bytes` bytes.
fn max_encoded_len(max_bytes: u64) -> u64 {
    max_bytes.div_ceil(3).saturating_mul(4)
}

fn oversized(limits: &UploadsConfig) -> AppError {
    AppError::validation(format!(
        "File exceeds maximum upload size of {} bytes",
        limits.max_size_bytes
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::error::ErrorKind;

    fn upload(payload: &[u8]) -> FileUpload {
        FileUpload {
            file_name: "photo.png".into(),
            content_type: Some("image/png".into()),
            size_bytes: payload.len() as u64,
            payload_base64: Some(STANDARD.encode(payload)),
            display_name: Some("  Lobby  ".into()),
            kind: UploadKind::Image {
                image_type: ImageType::Gallery,
            },
        }
    }

    #[test]
    fn test_prepare_decodes_payload() {
        let (record, payload) = upload(b"png!").prepare(&UploadsConfig::default()).unwrap();
        assert_eq!(payload.as_deref(), Some(&b"png!"[..]));
        assert_eq!(record.size_bytes, 4);
        assert_eq!(record.display_name.as_deref(), Some("Lobby"));
        assert!(record.file_name.starts_with("photo_"));
    }

    #[test]
    fn test_prepare_rejects_oversized() {
        let limits = UploadsConfig {
            max_size_bytes: 3,
            ..UploadsConfig::default()
        };
        let err = upload(b"png!").prepare(&limits).unwrap_err();
        assert!(err.is(ErrorKind::Validation));
    }

    #[test]
    fn test_prepare_rejects_payload_larger_than_limit() {
        let limits = UploadsConfig {
            max_size_bytes: 6,
            ..UploadsConfig::default()
        };
        let mut understated = upload(&[0u8; 64]);
        understated.size_bytes = 4;
        let err = understated.prepare(&limits).unwrap_err();
        assert!(err.is(ErrorKind::Validation));
        assert!(err.to_string().contains("maximum upload size"));

        // A payload right at the limit still decodes.
        let (_, payload) = upload(b"png!!!").prepare(&limits).unwrap();
        assert_eq!(payload.map(|p| p.len()), Some(6));
    }

    #[test]
    fn test_max_encoded_len_covers_padding() {
        assert_eq!(max_encoded_len(0), 0);
        assert_eq!(max_encoded_len(1), 4);
        assert_eq!(max_encoded_len(3), 4);
        assert_eq!(max_encoded_len(4), 8);
        assert_eq!(max_encoded_len(u64::MAX), u64::MAX);
    }

    #[test]
    fn test_prepare_rejects_disallowed_type() {
        let limits = UploadsConfig {
            allowed_content_types: vec!["application/pdf".into()],
            ..UploadsConfig::default()
        };
        let err = upload(b"png!").prepare(&limits).unwrap_err();
        assert!(err.is(ErrorKind::Validation));
    }

    #[test]
    fn test_prepare_rejects_size_mismatch() {
        let mut bad = upload(b"png!");
        bad.size_bytes = 10;
        assert!(bad.prepare(&UploadsConfig::default()).is_err());

        let mut garbage = upload(b"png!");
        garbage.payload_base64 = Some("***".into());
        assert!(garbage.prepare(&UploadsConfig::default()).is_err());
    }
}
