//! Category repository implementation.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use catalog_core::error::{AppError, ErrorKind};
use catalog_core::result::AppResult;
use catalog_core::types::{CategoryId, PageResponse};
use catalog_entity::{Category, CategoryQuery, EntityKind, ParentFilter};

use crate::store::CategoryStore;

use super::{like_pattern, write_error};

/// Repository for category rows and tree queries.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: PgPool,
}

impl CategoryRepository {
    /// Create a new category repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: CategoryId) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to check category", e)
            })
    }
}

/// Append the `WHERE` clause for a listing query.
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &CategoryQuery) {
    qb.push(" WHERE TRUE");
    if let Some(kind) = query.kind {
        qb.push(" AND kind = ").push_bind(kind);
    }
    match query.parent {
        ParentFilter::Any => {}
        ParentFilter::Root => {
            qb.push(" AND parent_id IS NULL");
        }
        ParentFilter::Of(parent_id) => {
            qb.push(" AND parent_id = ").push_bind(parent_id);
        }
    }
    if let Some(active) = query.active {
        qb.push(" AND active = ").push_bind(active);
    }
    if let Some(featured) = query.featured {
        qb.push(" AND featured = ").push_bind(featured);
    }
    if let Some(term) = query.search_term() {
        let pattern = like_pattern(term);
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR web_tags ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl CategoryStore for CategoryRepository {
    async fn find_by_id(&self, id: CategoryId) -> AppResult<Option<Category>> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find category", e))
    }

    async fn find_by_kind(&self, kind: EntityKind) -> AppResult<Vec<Category>> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE kind = $1")
            .bind(kind)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list categories", e)
            })
    }

    async fn find_children(&self, parent_id: CategoryId) -> AppResult<Vec<Category>> {
        sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE parent_id = $1 ORDER BY LOWER(name) ASC, id ASC",
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list sub-categories", e)
        })
    }

    async fn count_children(&self, parent_id: CategoryId) -> AppResult<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE parent_id = $1")
                .bind(parent_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count sub-categories", e)
                })?;
        Ok(count as u64)
    }

    async fn search(&self, query: &CategoryQuery) -> AppResult<PageResponse<Category>> {
        let order_by = query.order_by_sql()?;
        let page = &query.page;

        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM categories");
        push_filters(&mut count_qb, query);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count categories", e)
            })?;

        let mut list_qb = QueryBuilder::<Postgres>::new("SELECT * FROM categories");
        push_filters(&mut list_qb, query);
        list_qb
            .push(" ORDER BY ")
            .push(order_by)
            .push(" LIMIT ")
            .push_bind(page.limit() as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let categories = list_qb
            .build_query_as::<Category>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to search categories", e)
            })?;

        Ok(PageResponse::new(
            categories,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    async fn insert(&self, category: &Category) -> AppResult<Category> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, kind, name, description, active, featured, web_tags, \
             display_in_main_menu, display_as_slider_item, slogan, sub_slogan, parent_id, \
             version, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING *",
        )
        .bind(category.id)
        .bind(category.kind)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.active)
        .bind(category.featured)
        .bind(&category.web_tags)
        .bind(category.display_in_main_menu)
        .bind(category.display_as_slider_item)
        .bind(&category.slogan)
        .bind(&category.sub_slogan)
        .bind(category.parent_id)
        .bind(category.version)
        .bind(category.created_at)
        .bind(category.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error("Failed to create category", e))
    }

    async fn update(&self, category: &Category, expected_version: i64) -> AppResult<Category> {
        let updated = sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = $2, description = $3, active = $4, featured = $5, \
             web_tags = $6, display_in_main_menu = $7, display_as_slider_item = $8, \
             slogan = $9, sub_slogan = $10, parent_id = $11, version = $12, updated_at = $13 \
             WHERE id = $1 AND version = $14 \
             RETURNING *",
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.active)
        .bind(category.featured)
        .bind(&category.web_tags)
        .bind(category.display_in_main_menu)
        .bind(category.display_as_slider_item)
        .bind(&category.slogan)
        .bind(&category.sub_slogan)
        .bind(category.parent_id)
        .bind(category.version)
        .bind(category.updated_at)
        .bind(expected_version)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error("Failed to update category", e))?;

        match updated {
            Some(row) => Ok(row),
            None if self.exists(category.id).await? => Err(AppError::conflict(format!(
                "Category {} was modified concurrently (expected version {expected_version})",
                category.id
            ))),
            None => Err(AppError::not_found(format!(
                "Category {} not found",
                category.id
            ))),
        }
    }

    async fn reparent_children(
        &self,
        parent_id: CategoryId,
        new_parent: Option<CategoryId>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE categories SET parent_id = $2, version = version + 1, updated_at = NOW() \
             WHERE parent_id = $1",
        )
        .bind(parent_id)
        .bind(new_parent)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error("Failed to reparent sub-categories", e))?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: CategoryId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error("Failed to delete category", e))?;
        Ok(result.rows_affected() > 0)
    }
}
