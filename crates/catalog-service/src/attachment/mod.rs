//! File attachments: collections, cover policy and upload intake.

pub mod processor;
pub mod service;
pub mod upload;

pub use processor::{FileProcessor, LocalFileProcessor};
pub use service::AttachmentService;
pub use upload::{FileUpload, UploadKind};
