//! Entity-to-category link repository implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use catalog_core::error::{AppError, ErrorKind};
use catalog_core::result::AppResult;
use catalog_core::types::CategoryId;
use catalog_entity::{CategoryLink, EntityKind, EntityRef};

use crate::store::CategoryLinkStore;

/// Unique constraint over `(entity_kind, entity_id, category_id)`.
const UNIQUE_LINK_CONSTRAINT: &str = "category_links_entity_category_key";

/// Repository for entity-to-category links.
#[derive(Debug, Clone)]
pub struct CategoryLinkRepository {
    pool: PgPool,
}

impl CategoryLinkRepository {
    /// Create a new category link repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryLinkStore for CategoryLinkRepository {
    async fn insert(&self, link: &CategoryLink) -> AppResult<CategoryLink> {
        sqlx::query_as::<_, CategoryLink>(
            "INSERT INTO category_links (id, entity_kind, entity_id, category_id, version, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING *",
        )
        .bind(link.id)
        .bind(link.entity_kind)
        .bind(link.entity_id)
        .bind(link.category_id)
        .bind(link.version)
        .bind(link.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some(UNIQUE_LINK_CONSTRAINT) =>
            {
                AppError::duplicate(format!(
                    "{} is already assigned to category {}",
                    link.entity(),
                    link.category_id
                ))
            }
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::not_found(format!("Category {} not found", link.category_id))
            }
            other => AppError::with_source(ErrorKind::Database, "Failed to create category link", other),
        })
    }

    async fn find(
        &self,
        entity: EntityRef,
        category_id: CategoryId,
    ) -> AppResult<Option<CategoryLink>> {
        sqlx::query_as::<_, CategoryLink>(
            "SELECT * FROM category_links \
             WHERE entity_kind = $1 AND entity_id = $2 AND category_id = $3",
        )
        .bind(entity.kind)
        .bind(entity.id)
        .bind(category_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find category link", e))
    }

    async fn delete(&self, entity: EntityRef, category_id: CategoryId) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM category_links \
             WHERE entity_kind = $1 AND entity_id = $2 AND category_id = $3",
        )
        .bind(entity.kind)
        .bind(entity.id)
        .bind(category_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to delete category link", e)
        })?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_by_category(&self, category_id: CategoryId) -> AppResult<Vec<CategoryLink>> {
        sqlx::query_as::<_, CategoryLink>(
            "SELECT * FROM category_links WHERE category_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list category members", e)
        })
    }

    async fn find_by_entity(&self, entity: EntityRef) -> AppResult<Vec<CategoryLink>> {
        sqlx::query_as::<_, CategoryLink>(
            "SELECT * FROM category_links WHERE entity_kind = $1 AND entity_id = $2 \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(entity.kind)
        .bind(entity.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list entity categories", e)
        })
    }

    async fn count_by_category(&self, category_id: CategoryId) -> AppResult<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM category_links WHERE category_id = $1")
                .bind(category_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count category members", e)
                })?;
        Ok(count as u64)
    }

    async fn counts_by_kind(&self, kind: EntityKind) -> AppResult<HashMap<CategoryId, u64>> {
        let rows: Vec<(CategoryId, i64)> = sqlx::query_as(
            "SELECT category_id, COUNT(*) FROM category_links \
             WHERE entity_kind = $1 GROUP BY category_id",
        )
        .bind(kind)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count category members", e)
        })?;
        Ok(rows
            .into_iter()
            .map(|(id, count)| (id, count as u64))
            .collect())
    }

    async fn delete_by_category(&self, category_id: CategoryId) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM category_links WHERE category_id = $1")
            .bind(category_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete category links", e)
            })?;
        Ok(result.rows_affected())
    }
}
