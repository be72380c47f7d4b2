//! The EPUB container and its package document.

mod epub;
mod integrate;
mod opf;
mod store;

pub use epub::{EpubPackage, CONTAINER_PATH, EPUB_MIMETYPE, MIMETYPE_PATH};
pub use integrate::integrate;
pub use opf::{ManifestItem, NCX_MEDIA_TYPE, XHTML_MEDIA_TYPE};
pub use store::{DocumentStore, PackageMetadata};
