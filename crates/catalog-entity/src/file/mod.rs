//! Stored file records and their image, video and document variants.

pub mod document;
pub mod image;
pub mod media;
pub mod model;
pub mod video;

pub use document::Document;
pub use image::{Image, ImageType};
pub use media::{AttachmentKind, MediaFile, StoredMedia};
pub use model::{FileRecord, unique_file_name};
pub use video::Video;
