//! # catalog-service
//!
//! Use cases over the catalog model: category trees and their entity
//! assignments, and the image/video/document collections attached to
//! categories and business entities.
//!
//! Services receive their stores as `Arc<dyn ...>` at construction time;
//! [`Catalog`] wires a complete set from configuration.

pub mod attachment;
pub mod catalog;
pub mod category;
pub mod context;

pub use attachment::{AttachmentService, FileProcessor, FileUpload, LocalFileProcessor, UploadKind};
pub use catalog::Catalog;
pub use category::{CategoryService, DeleteOutcome, TreeService};
pub use context::RequestContext;
