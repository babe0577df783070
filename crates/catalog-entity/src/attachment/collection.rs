//! The image, video and document collections of one owner.

use serde::{Deserialize, Serialize};

use catalog_core::result::AppResult;
use catalog_core::types::FileId;

use crate::file::{AttachmentKind, Document, Image, ImageType, StoredMedia, Video};

use super::link::{AttachmentLink, EntityDocument, EntityImage, EntityVideo};
use super::owner::AttachmentOwner;

/// Anything that owns a [`FileCollection`].
pub trait FileOwner {
    /// The owner reference every link in the collection points at.
    fn attachment_owner(&self) -> AttachmentOwner;

    /// The owner's attachments.
    fn files(&self) -> &FileCollection;

    /// Mutable access to the owner's attachments.
    fn files_mut(&mut self) -> &mut FileCollection;
}

/// Images, videos and documents attached to one owner.
///
/// The collections always exist, empty by default. The collection itself
/// permits several cover images; the attachment service applies the cover
/// policy before calling [`FileCollection::add_image`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCollection {
    /// Image links.
    #[serde(default)]
    pub images: Vec<EntityImage>,
    /// Video links.
    #[serde(default)]
    pub videos: Vec<EntityVideo>,
    /// Document links.
    #[serde(default)]
    pub documents: Vec<EntityDocument>,
}

impl FileCollection {
    /// Append an image link, tagging the image with `image_type`.
    pub fn add_image(
        &mut self,
        owner: AttachmentOwner,
        mut image: Image,
        image_type: ImageType,
    ) -> &EntityImage {
        image.image_type = image_type;
        self.images.push(EntityImage::new(owner, image));
        &self.images[self.images.len() - 1]
    }

    /// Append a video link.
    pub fn add_video(&mut self, owner: AttachmentOwner, video: Video) -> &EntityVideo {
        self.videos.push(EntityVideo::new(owner, video));
        &self.videos[self.videos.len() - 1]
    }

    /// Append a document link.
    pub fn add_document(&mut self, owner: AttachmentOwner, document: Document) -> &EntityDocument {
        self.documents.push(EntityDocument::new(owner, document));
        &self.documents[self.documents.len() - 1]
    }

    /// Remove the link to an image. Returns `None` if it was not attached.
    pub fn remove_image(&mut self, file_id: FileId) -> Option<EntityImage> {
        let pos = self.images.iter().position(|l| l.references(file_id))?;
        Some(self.images.remove(pos))
    }

    /// Remove the link to a video. Returns `None` if it was not attached.
    pub fn remove_video(&mut self, file_id: FileId) -> Option<EntityVideo> {
        let pos = self.videos.iter().position(|l| l.references(file_id))?;
        Some(self.videos.remove(pos))
    }

    /// Remove the link to a document. Returns `None` if it was not attached.
    pub fn remove_document(&mut self, file_id: FileId) -> Option<EntityDocument> {
        let pos = self.documents.iter().position(|l| l.references(file_id))?;
        Some(self.documents.remove(pos))
    }

    /// Image links whose image is a cover.
    pub fn covers(&self) -> impl Iterator<Item = &EntityImage> {
        self.images
            .iter()
            .filter(|l| l.file.as_ref().is_some_and(Image::is_cover))
    }

    /// The first cover image link, if any.
    pub fn cover_image(&self) -> Option<&EntityImage> {
        self.covers().next()
    }

    /// Documents customers may download.
    pub fn public_documents(&self) -> impl Iterator<Item = &EntityDocument> {
        self.documents
            .iter()
            .filter(|l| l.file.as_ref().is_some_and(|doc| doc.is_public))
    }

    /// Place a persisted link (and its file, when loaded) into the matching
    /// collection.
    pub fn push_link(&mut self, link: AttachmentLink, file: Option<StoredMedia>) -> AppResult<()> {
        match link.kind {
            AttachmentKind::Image => self.images.push(EntityImage::from_link(link, file)?),
            AttachmentKind::Video => self.videos.push(EntityVideo::from_link(link, file)?),
            AttachmentKind::Document => {
                self.documents.push(EntityDocument::from_link(link, file)?)
            }
        }
        Ok(())
    }

    /// Total number of links.
    pub fn len(&self) -> usize {
        self.images.len() + self.videos.len() + self.documents.len()
    }

    /// Whether no files are attached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every link in persisted form.
    pub fn links(&self) -> Vec<AttachmentLink> {
        self.images
            .iter()
            .map(EntityImage::to_link)
            .chain(self.videos.iter().map(EntityVideo::to_link))
            .chain(self.documents.iter().map(EntityDocument::to_link))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::FileRecord;
    use catalog_core::types::CategoryId;

    fn image(name: &str) -> Image {
        Image::new(FileRecord::new(name, Some("image/png".into()), 100, None))
    }

    #[test]
    fn test_new_collection_is_empty() {
        let files = FileCollection::default();
        assert!(files.is_empty());
        assert!(files.cover_image().is_none());
    }

    #[test]
    fn test_add_image_applies_type_and_owner() {
        let owner = AttachmentOwner::category(CategoryId::new());
        let mut files = FileCollection::default();
        let link = files.add_image(owner, image("icon.png"), ImageType::Icon);
        assert_eq!(link.owner, owner);
        assert_eq!(link.file.as_ref().unwrap().image_type, ImageType::Icon);
    }

    #[test]
    fn test_model_tolerates_several_covers() {
        let owner = AttachmentOwner::category(CategoryId::new());
        let mut files = FileCollection::default();
        files.add_image(owner, image("a.png"), ImageType::Cover);
        files.add_image(owner, image("b.png"), ImageType::Cover);
        assert_eq!(files.covers().count(), 2);
    }

    #[test]
    fn test_remove_image_missing_is_none() {
        let owner = AttachmentOwner::category(CategoryId::new());
        let mut files = FileCollection::default();
        let img = image("a.png");
        let id = img.file.id;
        files.add_image(owner, img, ImageType::Gallery);
        assert!(files.remove_image(FileId::new()).is_none());
        assert!(files.remove_image(id).is_some());
        assert!(files.is_empty());
    }

    #[test]
    fn test_push_link_routes_by_kind() {
        let owner = AttachmentOwner::category(CategoryId::new());
        let mut source = FileCollection::default();
        let doc = Document::new(FileRecord::new("terms.pdf", None, 9, None));
        source.add_document(owner, doc.clone());
        source.add_video(owner, Video::new(FileRecord::new("tour.mp4", None, 9, None)));

        let mut rebuilt = FileCollection::default();
        for link in source.links() {
            let file = if link.kind == AttachmentKind::Document {
                Some(StoredMedia::Document(doc.clone()))
            } else {
                None
            };
            rebuilt.push_link(link, file).unwrap();
        }
        assert_eq!(rebuilt.documents.len(), 1);
        assert_eq!(rebuilt.videos.len(), 1);
        assert!(rebuilt.videos[0].file.is_none());
        assert_eq!(rebuilt.documents[0].file.as_ref(), Some(&doc));
    }
}
