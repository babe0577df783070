//! # catalog-database
//!
//! Store traits for categories, category links and attachments, with a
//! PostgreSQL implementation on `sqlx` and an in-memory implementation for
//! tests and embedding.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryCatalogStore;
pub use repositories::{AttachmentRepository, CategoryLinkRepository, CategoryRepository};
pub use store::{AttachmentStore, CategoryLinkStore, CategoryStore};
