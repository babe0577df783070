//! Attaching and detaching images, videos and documents.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use catalog_core::config::{CoverPolicy, UploadsConfig};
use catalog_core::error::AppError;
use catalog_core::result::AppResult;
use catalog_core::error::ErrorKind;
use catalog_core::types::{CategoryId, FileId};
use catalog_database::{AttachmentStore, CategoryStore};
use catalog_entity::{
    AttachmentKind, AttachmentLink, AttachmentOwner, Document, EntityAttachment, EntityDocument,
    EntityImage, EntityVideo, FileCollection, FileOwner, Image, ImageType, MediaFile, OwnerKind,
    StoredMedia, Video,
};

use crate::context::RequestContext;

use super::processor::FileProcessor;
use super::upload::{FileUpload, UploadKind};

/// Manages the file collections of categories and business entities.
///
/// A file row may be shared by several owners. Once its last link is
/// removed the row and its stored bytes are deleted. An owner links a given
/// file at most once; attaching it again returns the existing link.
///
/// Category owners must exist. Business entities live outside the catalog,
/// so their callers are responsible for passing real ids.
#[derive(Clone)]
pub struct AttachmentService {
    /// Attachment store.
    store: Arc<dyn AttachmentStore>,
    /// Category store, for owner checks.
    categories: Arc<dyn CategoryStore>,
    /// Byte storage.
    processor: Arc<dyn FileProcessor>,
    /// How a second cover image is handled.
    cover_policy: CoverPolicy,
    /// Intake limits.
    uploads: UploadsConfig,
}

impl std::fmt::Debug for AttachmentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachmentService")
            .field("cover_policy", &self.cover_policy)
            .finish()
    }
}

impl AttachmentService {
    /// Creates a new attachment service.
    pub fn new(
        store: Arc<dyn AttachmentStore>,
        categories: Arc<dyn CategoryStore>,
        processor: Arc<dyn FileProcessor>,
        cover_policy: CoverPolicy,
        uploads: UploadsConfig,
    ) -> Self {
        Self {
            store,
            categories,
            processor,
            cover_policy,
            uploads,
        }
    }

    /// Loads the complete file collection of an owner, with files.
    pub async fn collection(&self, owner: AttachmentOwner) -> AppResult<FileCollection> {
        let mut files = FileCollection::default();
        for link in self.store.find_links(owner).await? {
            let file = match link.file_id {
                Some(file_id) => self.store.find_file(link.kind, file_id).await?,
                None => None,
            };
            files.push_link(link, file)?;
        }
        Ok(files)
    }

    /// Replaces the in-memory collection of `owner` with the stored one.
    pub async fn load_into<O: FileOwner + Send>(&self, owner: &mut O) -> AppResult<()> {
        let files = self.collection(owner.attachment_owner()).await?;
        *owner.files_mut() = files;
        Ok(())
    }

    /// Attaches an image with the given role.
    ///
    /// A new cover either replaces the current one or is rejected with
    /// `Conflict`, depending on the configured cover policy.
    pub async fn add_image(
        &self,
        ctx: &RequestContext,
        owner: AttachmentOwner,
        mut image: Image,
        image_type: ImageType,
    ) -> AppResult<EntityImage> {
        self.ensure_owner(owner).await?;
        image.image_type = image_type;
        if let Some(StoredMedia::Image(existing)) =
            self.store.find_file(AttachmentKind::Image, image.id()).await?
        {
            if existing.image_type != image_type {
                return Err(AppError::conflict(format!(
                    "Image {} is already stored as {}",
                    image.id(),
                    existing.image_type
                )));
            }
        }
        if image.is_cover() {
            self.make_room_for_cover(ctx, owner, image.id()).await?;
        }
        self.attach(ctx, owner, image).await
    }

    /// Attaches a video.
    pub async fn add_video(
        &self,
        ctx: &RequestContext,
        owner: AttachmentOwner,
        video: Video,
    ) -> AppResult<EntityVideo> {
        self.ensure_owner(owner).await?;
        self.attach(ctx, owner, video).await
    }

    /// Attaches a document.
    pub async fn add_document(
        &self,
        ctx: &RequestContext,
        owner: AttachmentOwner,
        document: Document,
    ) -> AppResult<EntityDocument> {
        self.ensure_owner(owner).await?;
        self.attach(ctx, owner, document).await
    }

    /// Detaches an image. Returns `false` if it was not attached.
    pub async fn remove_image(
        &self,
        ctx: &RequestContext,
        owner: AttachmentOwner,
        file_id: FileId,
    ) -> AppResult<bool> {
        self.detach(ctx, AttachmentKind::Image, owner, file_id).await
    }

    /// Detaches a video. Returns `false` if it was not attached.
    pub async fn remove_video(
        &self,
        ctx: &RequestContext,
        owner: AttachmentOwner,
        file_id: FileId,
    ) -> AppResult<bool> {
        self.detach(ctx, AttachmentKind::Video, owner, file_id).await
    }

    /// Detaches a document. Returns `false` if it was not attached.
    pub async fn remove_document(
        &self,
        ctx: &RequestContext,
        owner: AttachmentOwner,
        file_id: FileId,
    ) -> AppResult<bool> {
        self.detach(ctx, AttachmentKind::Document, owner, file_id)
            .await
    }

    /// Detaches every file of an owner. Returns the number of removed links.
    pub async fn remove_all(&self, ctx: &RequestContext, owner: AttachmentOwner) -> AppResult<usize> {
        let removed = self.store.delete_links_for_owner(owner).await?;
        let files: HashSet<(AttachmentKind, FileId)> = removed
            .iter()
            .filter_map(|link| link.file_id.map(|id| (link.kind, id)))
            .collect();
        for (kind, file_id) in files {
            self.release_file(kind, file_id).await?;
        }
        if !removed.is_empty() {
            info!(
                request_id = %ctx.request_id,
                actor = %ctx.actor,
                owner = %owner,
                links = removed.len(),
                "Attachments removed"
            );
        }
        Ok(removed.len())
    }

    /// Validates an uploaded file, hands its bytes to the file processor
    /// and attaches the resulting file to `owner`.
    pub async fn intake(
        &self,
        ctx: &RequestContext,
        owner: AttachmentOwner,
        upload: FileUpload,
    ) -> AppResult<StoredMedia> {
        let (mut record, payload) = upload.prepare(&self.uploads)?;
        self.ensure_owner(owner).await?;
        if let Some(bytes) = payload {
            let relative_path = self.processor.store(&record, bytes).await?;
            record.set_relative_path(relative_path);
        }
        let stored_path = record.relative_path.clone();

        let attached = match upload.kind {
            UploadKind::Image { image_type } => self
                .add_image(ctx, owner, Image::new(record), image_type)
                .await
                .and_then(attached_file),
            UploadKind::Video => self
                .add_video(ctx, owner, Video::new(record))
                .await
                .and_then(attached_file),
            UploadKind::Document => self
                .add_document(ctx, owner, Document::new(record))
                .await
                .and_then(attached_file),
        };

        if attached.is_err() {
            if let Some(path) = stored_path.as_deref() {
                if let Err(e) = self.processor.discard(path).await {
                    warn!(path = %path, error = %e, "Failed to discard bytes of rejected upload");
                }
            }
        }
        attached
    }

    /// Fails with `NotFound` when a category owner does not exist.
    async fn ensure_owner(&self, owner: AttachmentOwner) -> AppResult<()> {
        if owner.kind != OwnerKind::Category {
            return Ok(());
        }
        let id = CategoryId::from_uuid(owner.id);
        match self.categories.find_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found(format!("Category {id} not found"))),
        }
    }

    /// Stores the file row if needed, then links it to `owner` unless the
    /// owner already links it.
    async fn attach<F: MediaFile>(
        &self,
        ctx: &RequestContext,
        owner: AttachmentOwner,
        file: F,
    ) -> AppResult<EntityAttachment<F>> {
        let file_id = file.id();
        let file = match self.store.find_file(F::KIND, file_id).await? {
            Some(existing) => F::from_stored(existing).ok_or_else(|| {
                AppError::internal(format!("Stored {} {file_id} has the wrong variant", F::KIND))
            })?,
            None => {
                let stored = self.store.insert_file(&file.clone().into_stored()).await?;
                F::from_stored(stored).unwrap_or(file)
            }
        };

        if let Some(link) = self.store.find_link(F::KIND, owner, file_id).await? {
            debug!(owner = %owner, kind = %F::KIND, file_id = %file_id, "File already attached");
            return existing_attachment(link, file);
        }

        let attachment = EntityAttachment::new(owner, file.clone());
        match self.store.insert_link(&attachment.to_link()).await {
            Ok(_) => {}
            Err(e) if e.is(ErrorKind::Duplicate) => {
                // Lost a race with a concurrent attach of the same file.
                return match self.store.find_link(F::KIND, owner, file_id).await? {
                    Some(link) => existing_attachment(link, file),
                    None => Err(e),
                };
            }
            Err(e) => return Err(e),
        }

        info!(
            request_id = %ctx.request_id,
            actor = %ctx.actor,
            owner = %owner,
            kind = %F::KIND,
            file_id = %file_id,
            "File attached"
        );
        Ok(attachment)
    }

    async fn detach(
        &self,
        ctx: &RequestContext,
        kind: AttachmentKind,
        owner: AttachmentOwner,
        file_id: FileId,
    ) -> AppResult<bool> {
        let Some(link) = self.store.delete_link(kind, owner, file_id).await? else {
            debug!(owner = %owner, kind = %kind, file_id = %file_id, "Nothing to detach");
            return Ok(false);
        };
        self.release_file(kind, file_id).await?;

        info!(
            request_id = %ctx.request_id,
            actor = %ctx.actor,
            owner = %owner,
            kind = %kind,
            file_id = %file_id,
            link_id = %link.id,
            "File detached"
        );
        Ok(true)
    }

    /// Applies the cover policy before a new cover is attached.
    async fn make_room_for_cover(
        &self,
        ctx: &RequestContext,
        owner: AttachmentOwner,
        incoming: FileId,
    ) -> AppResult<()> {
        let files = self.collection(owner).await?;
        let covers: Vec<FileId> = files
            .covers()
            .filter_map(|link| link.file_id)
            .filter(|id| *id != incoming)
            .collect();
        if covers.is_empty() {
            return Ok(());
        }

        match self.cover_policy {
            CoverPolicy::Reject => {
                warn!(owner = %owner, "Rejected second cover image");
                Err(AppError::conflict(format!(
                    "{owner} already has a cover image"
                )))
            }
            CoverPolicy::Replace => {
                for file_id in covers {
                    self.detach(ctx, AttachmentKind::Image, owner, file_id)
                        .await?;
                }
                Ok(())
            }
        }
    }

    /// Deletes a file row and its bytes once nothing links to it.
    async fn release_file(&self, kind: AttachmentKind, file_id: FileId) -> AppResult<()> {
        if self.store.count_file_references(kind, file_id).await? > 0 {
            return Ok(());
        }
        let Some(media) = self.store.find_file(kind, file_id).await? else {
            return Ok(());
        };
        self.store.delete_file(kind, file_id).await?;
        if let Some(path) = media.record().relative_path.as_deref() {
            self.processor.discard(path).await?;
        }
        debug!(kind = %kind, file_id = %file_id, "Orphaned file deleted");
        Ok(())
    }
}

/// A typed view of a link that was already stored.
fn existing_attachment<F: MediaFile>(
    link: AttachmentLink,
    file: F,
) -> AppResult<EntityAttachment<F>> {
    EntityAttachment::from_link(link, Some(file.into_stored()))
}

/// The file behind a freshly created link.
fn attached_file<F: MediaFile>(link: EntityAttachment<F>) -> AppResult<StoredMedia> {
    link.file
        .map(F::into_stored)
        .ok_or_else(|| AppError::internal(format!("Link {} has no file", link.id)))
}
