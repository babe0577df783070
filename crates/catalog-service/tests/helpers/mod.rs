//! Shared helpers for catalog service integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tempfile::TempDir;

use catalog_core::config::AppConfig;
use catalog_core::types::{CategoryId, EntityId};
use catalog_database::{CategoryStore, MemoryCatalogStore};
use catalog_entity::{AuditableEntity, Category, EntityKind, NewCategory};
use catalog_service::{Catalog, FileProcessor, LocalFileProcessor, RequestContext};

/// Services over a fresh in-memory store and a temporary upload root.
pub struct TestCatalog {
    /// The wired services.
    pub catalog: Catalog,
    /// The backing store, for direct assertions.
    pub store: MemoryCatalogStore,
    /// Context passed to every mutation.
    pub ctx: RequestContext,
    /// Root directory of stored uploads.
    pub uploads_root: PathBuf,
    _uploads: TempDir,
}

impl TestCatalog {
    /// Default configuration.
    pub async fn new() -> Self {
        Self::with_config(AppConfig::default()).await
    }

    /// Custom configuration; the upload root is always a temp dir.
    pub async fn with_config(config: AppConfig) -> Self {
        Self::build(config, |store, processor, config| {
            Catalog::in_memory(store, processor, config)
        })
        .await
    }

    /// Category rows go through the store built by `categories`; every
    /// other store is the shared in-memory one.
    pub async fn with_category_store(
        config: AppConfig,
        categories: impl FnOnce(MemoryCatalogStore) -> Arc<dyn CategoryStore>,
    ) -> Self {
        Self::build(config, |store, processor, config| {
            Catalog::new(
                categories(store.clone()),
                Arc::new(store.clone()),
                Arc::new(store),
                processor,
                config,
            )
        })
        .await
    }

    async fn build(
        mut config: AppConfig,
        wire: impl FnOnce(MemoryCatalogStore, Arc<dyn FileProcessor>, &AppConfig) -> Catalog,
    ) -> Self {
        let uploads = tempfile::tempdir().expect("Failed to create temp dir");
        config.uploads.root = uploads.path().display().to_string();
        let processor = LocalFileProcessor::new(uploads.path())
            .await
            .expect("Failed to init file processor");
        let processor: Arc<dyn FileProcessor> = Arc::new(processor);
        let store = MemoryCatalogStore::new();
        let catalog = wire(store.clone(), processor, &config);
        Self {
            catalog,
            store,
            ctx: RequestContext::new("tester"),
            uploads_root: uploads.path().to_path_buf(),
            _uploads: uploads,
        }
    }

    /// Create a category, failing the test on error.
    pub async fn create(
        &self,
        kind: EntityKind,
        name: &str,
        parent: Option<CategoryId>,
    ) -> Category {
        let mut new = NewCategory::new(kind, name);
        new.parent_id = parent;
        self.catalog
            .categories
            .create(&self.ctx, new)
            .await
            .expect("Failed to create category")
    }

    /// Current stored version of a category.
    pub async fn version(&self, id: CategoryId) -> i64 {
        self.catalog
            .categories
            .get(id)
            .await
            .expect("Category should exist")
            .version
    }
}

/// A lodging listing used as the categorized entity.
#[derive(Debug, Clone)]
pub struct Listing {
    pub id: EntityId,
    pub kind: EntityKind,
    pub created: DateTime<Utc>,
}

impl Listing {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            id: EntityId::new(),
            kind,
            created: Utc::now(),
        }
    }
}

impl AuditableEntity for Listing {
    fn entity_kind(&self) -> EntityKind {
        self.kind
    }

    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.created
    }
}
