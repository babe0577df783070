//! Attachment file and link repository implementation.
//!
//! Each attachment variant has its own file table and link table. The
//! variant decides which pair a query touches; table names never come from
//! user input.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use catalog_core::error::{AppError, ErrorKind};
use catalog_core::result::AppResult;
use catalog_core::types::{FileId, LinkId};
use catalog_entity::{
    AttachmentKind, AttachmentLink, AttachmentOwner, Document, Image, OwnerKind, StoredMedia,
    Video,
};

use crate::store::AttachmentStore;

use super::write_error;

/// Columns returned for every link query, tagged with the variant.
const LINK_COLUMNS: &str = "id, file_id, owner_kind, owner_id, version, created_at";

fn file_table(kind: AttachmentKind) -> &'static str {
    match kind {
        AttachmentKind::Image => "images",
        AttachmentKind::Video => "videos",
        AttachmentKind::Document => "documents",
    }
}

fn link_table(kind: AttachmentKind) -> &'static str {
    match kind {
        AttachmentKind::Image => "entity_images",
        AttachmentKind::Video => "entity_videos",
        AttachmentKind::Document => "entity_documents",
    }
}

/// Unique `(owner_kind, owner_id, file_id)` constraint of a link table.
fn owner_file_constraint(kind: AttachmentKind) -> String {
    format!("{}_owner_file_key", link_table(kind))
}

/// `'{kind}'::text AS kind, {LINK_COLUMNS}`
fn link_projection(kind: AttachmentKind) -> String {
    format!("'{}'::text AS kind, {LINK_COLUMNS}", kind.as_str())
}

#[derive(Debug, FromRow)]
struct LinkRow {
    id: LinkId,
    kind: AttachmentKind,
    file_id: Option<FileId>,
    owner_kind: OwnerKind,
    owner_id: Uuid,
    version: i64,
    created_at: DateTime<Utc>,
}

impl From<LinkRow> for AttachmentLink {
    fn from(row: LinkRow) -> Self {
        Self {
            id: row.id,
            kind: row.kind,
            file_id: row.file_id,
            owner: AttachmentOwner {
                kind: row.owner_kind,
                id: row.owner_id,
            },
            version: row.version,
            created_at: row.created_at,
        }
    }
}

/// Repository for attachment files and owner links.
#[derive(Debug, Clone)]
pub struct AttachmentRepository {
    pool: PgPool,
}

impl AttachmentRepository {
    /// Create a new attachment repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_image(&self, image: &Image) -> AppResult<Image> {
        let file = &image.file;
        sqlx::query_as::<_, Image>(
            "INSERT INTO images (id, display_name, file_name, content_type, size_bytes, \
             relative_path, featured, image_type, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
        )
        .bind(file.id)
        .bind(&file.display_name)
        .bind(&file.file_name)
        .bind(&file.content_type)
        .bind(file.size_bytes)
        .bind(&file.relative_path)
        .bind(image.featured)
        .bind(image.image_type)
        .bind(file.created_at)
        .bind(file.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error("Failed to create image", e))
    }

    async fn insert_video(&self, video: &Video) -> AppResult<Video> {
        let file = &video.file;
        sqlx::query_as::<_, Video>(
            "INSERT INTO videos (id, display_name, file_name, content_type, size_bytes, \
             relative_path, caption, description, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
        )
        .bind(file.id)
        .bind(&file.display_name)
        .bind(&file.file_name)
        .bind(&file.content_type)
        .bind(file.size_bytes)
        .bind(&file.relative_path)
        .bind(&video.caption)
        .bind(&video.description)
        .bind(file.created_at)
        .bind(file.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error("Failed to create video", e))
    }

    async fn insert_document(&self, document: &Document) -> AppResult<Document> {
        let file = &document.file;
        sqlx::query_as::<_, Document>(
            "INSERT INTO documents (id, display_name, file_name, content_type, size_bytes, \
             relative_path, description, is_public, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
        )
        .bind(file.id)
        .bind(&file.display_name)
        .bind(&file.file_name)
        .bind(&file.content_type)
        .bind(file.size_bytes)
        .bind(&file.relative_path)
        .bind(&document.description)
        .bind(document.is_public)
        .bind(file.created_at)
        .bind(file.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error("Failed to create document", e))
    }
}

#[async_trait]
impl AttachmentStore for AttachmentRepository {
    async fn insert_file(&self, media: &StoredMedia) -> AppResult<StoredMedia> {
        match media {
            StoredMedia::Image(image) => self.insert_image(image).await.map(StoredMedia::Image),
            StoredMedia::Video(video) => self.insert_video(video).await.map(StoredMedia::Video),
            StoredMedia::Document(document) => self
                .insert_document(document)
                .await
                .map(StoredMedia::Document),
        }
    }

    async fn find_file(&self, kind: AttachmentKind, id: FileId) -> AppResult<Option<StoredMedia>> {
        let sql = format!("SELECT * FROM {} WHERE id = $1", file_table(kind));
        let found = match kind {
            AttachmentKind::Image => sqlx::query_as::<_, Image>(&sql)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map(|row| row.map(StoredMedia::Image)),
            AttachmentKind::Video => sqlx::query_as::<_, Video>(&sql)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map(|row| row.map(StoredMedia::Video)),
            AttachmentKind::Document => sqlx::query_as::<_, Document>(&sql)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map(|row| row.map(StoredMedia::Document)),
        };
        found.map_err(|e| AppError::with_source(ErrorKind::Database, format!("Failed to find {kind}"), e))
    }

    async fn delete_file(&self, kind: AttachmentKind, id: FileId) -> AppResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", file_table(kind));
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(&format!("Failed to delete {kind} {id}"), e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_link(&self, link: &AttachmentLink) -> AppResult<AttachmentLink> {
        let sql = format!(
            "INSERT INTO {} ({LINK_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            link_table(link.kind),
            link_projection(link.kind)
        );
        sqlx::query_as::<_, LinkRow>(&sql)
            .bind(link.id)
            .bind(link.file_id)
            .bind(link.owner.kind)
            .bind(link.owner.id)
            .bind(link.version)
            .bind(link.created_at)
            .fetch_one(&self.pool)
            .await
            .map(AttachmentLink::from)
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                    AppError::not_found(format!("{} not found for link {}", link.kind, link.id))
                }
                sqlx::Error::Database(ref db_err)
                    if db_err.constraint() == Some(owner_file_constraint(link.kind).as_str()) =>
                {
                    AppError::duplicate(format!(
                        "{} is already attached to {}",
                        link.kind, link.owner
                    ))
                }
                other => AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to attach {}", link.kind),
                    other,
                ),
            })
    }

    async fn find_link(
        &self,
        kind: AttachmentKind,
        owner: AttachmentOwner,
        file_id: FileId,
    ) -> AppResult<Option<AttachmentLink>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE owner_kind = $1 AND owner_id = $2 AND file_id = $3",
            link_projection(kind),
            link_table(kind)
        );
        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(owner.kind)
            .bind(owner.id)
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, format!("Failed to find {kind} link"), e)
            })?;
        Ok(row.map(AttachmentLink::from))
    }

    async fn find_links(&self, owner: AttachmentOwner) -> AppResult<Vec<AttachmentLink>> {
        let selects: Vec<String> = AttachmentKind::ALL
            .into_iter()
            .map(|kind| {
                format!(
                    "SELECT {} FROM {} WHERE owner_kind = $1 AND owner_id = $2",
                    link_projection(kind),
                    link_table(kind)
                )
            })
            .collect();
        let sql = format!(
            "{} ORDER BY created_at ASC, id ASC",
            selects.join(" UNION ALL ")
        );
        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(owner.kind)
            .bind(owner.id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list attachments", e)
            })?;
        Ok(rows.into_iter().map(AttachmentLink::from).collect())
    }

    async fn delete_link(
        &self,
        kind: AttachmentKind,
        owner: AttachmentOwner,
        file_id: FileId,
    ) -> AppResult<Option<AttachmentLink>> {
        let table = link_table(kind);
        let sql = format!(
            "DELETE FROM {table} WHERE id = (\
                SELECT id FROM {table} \
                WHERE owner_kind = $1 AND owner_id = $2 AND file_id = $3 \
                ORDER BY created_at ASC LIMIT 1\
             ) RETURNING {}",
            link_projection(kind)
        );
        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(owner.kind)
            .bind(owner.id)
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, format!("Failed to detach {kind}"), e)
            })?;
        Ok(row.map(AttachmentLink::from))
    }

    async fn delete_links_for_owner(
        &self,
        owner: AttachmentOwner,
    ) -> AppResult<Vec<AttachmentLink>> {
        let mut removed = Vec::new();
        for kind in AttachmentKind::ALL {
            let sql = format!(
                "DELETE FROM {} WHERE owner_kind = $1 AND owner_id = $2 RETURNING {}",
                link_table(kind),
                link_projection(kind)
            );
            let rows = sqlx::query_as::<_, LinkRow>(&sql)
                .bind(owner.kind)
                .bind(owner.id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(
                        ErrorKind::Database,
                        format!("Failed to detach {kind} files"),
                        e,
                    )
                })?;
            removed.extend(rows.into_iter().map(AttachmentLink::from));
        }
        Ok(removed)
    }

    async fn count_file_references(&self, kind: AttachmentKind, file_id: FileId) -> AppResult<u64> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE file_id = $1",
            link_table(kind)
        );
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(file_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, format!("Failed to count {kind} links"), e)
            })?;
        Ok(count as u64)
    }
}
