//! Links between stored files and the aggregates that own them.

pub mod collection;
pub mod link;
pub mod owner;

pub use collection::{FileCollection, FileOwner};
pub use link::{AttachmentLink, EntityAttachment, EntityDocument, EntityImage, EntityVideo};
pub use owner::AttachmentOwner;
