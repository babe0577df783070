//! Service wiring.

use std::sync::Arc;

use catalog_core::config::AppConfig;
use catalog_database::{
    AttachmentRepository, AttachmentStore, CategoryLinkRepository, CategoryLinkStore,
    CategoryRepository, CategoryStore, DatabasePool, MemoryCatalogStore,
};

use crate::attachment::{AttachmentService, FileProcessor};
use crate::category::{CategoryService, TreeService};

/// The full set of catalog services sharing one set of stores.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Category lifecycle and assignments.
    pub categories: Arc<CategoryService>,
    /// Tree rendering and navigation.
    pub trees: Arc<TreeService>,
    /// File collections and upload intake.
    pub attachments: Arc<AttachmentService>,
}

impl Catalog {
    /// Wire services over explicit stores.
    pub fn new(
        categories: Arc<dyn CategoryStore>,
        links: Arc<dyn CategoryLinkStore>,
        attachments: Arc<dyn AttachmentStore>,
        processor: Arc<dyn FileProcessor>,
        config: &AppConfig,
    ) -> Self {
        let attachments = Arc::new(AttachmentService::new(
            attachments,
            categories.clone(),
            processor,
            config.catalog.cover_policy,
            config.uploads.clone(),
        ));
        let trees = Arc::new(TreeService::new(categories.clone(), links.clone()));
        let categories = Arc::new(CategoryService::new(
            categories,
            links,
            attachments.clone(),
            config.catalog.clone(),
        ));
        Self {
            categories,
            trees,
            attachments,
        }
    }

    /// Services over PostgreSQL repositories.
    pub fn postgres(db: &DatabasePool, processor: Arc<dyn FileProcessor>, config: &AppConfig) -> Self {
        let pool = db.pool();
        Self::new(
            Arc::new(CategoryRepository::new(pool.clone())),
            Arc::new(CategoryLinkRepository::new(pool.clone())),
            Arc::new(AttachmentRepository::new(pool.clone())),
            processor,
            config,
        )
    }

    /// Services over one in-memory store.
    pub fn in_memory(
        store: MemoryCatalogStore,
        processor: Arc<dyn FileProcessor>,
        config: &AppConfig,
    ) -> Self {
        let store = Arc::new(store);
        Self::new(store.clone(), store.clone(), store, processor, config)
    }
}
