use crate::utils::error::Result;

/// Book-level metadata read from the package document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    /// `dc:title`, empty when missing
    pub title: String,
    /// The identifier named by `unique-identifier`, empty when missing
    pub unique_identifier: String,
}

/// The host package as seen by a generation run.
///
/// Resource ids are manifest ids. Hrefs are relative to the package document,
/// exactly as they appear in the manifest.
pub trait DocumentStore {
    /// Fail with a structural error when the manifest or spine is missing
    fn ensure_structure(&self) -> Result<()>;

    /// Manifest ids of the spine entries in reading order
    fn spine_order(&self) -> Result<Vec<String>>;

    /// Manifest href of a resource
    fn href_for_id(&self, id: &str) -> Option<String>;

    fn read_document(&self, id: &str) -> Result<String>;

    /// Replace the content of an existing resource
    fn write_document(&mut self, id: &str, markup: &str) -> Result<()>;

    fn package_metadata(&self) -> PackageMetadata;

    /// Manifest id of the resource at `href`, if registered
    fn resource_id_for_path(&self, href: &str) -> Option<String>;

    /// Register and store a new resource. `id` is a preference; the id actually
    /// used (unique within the manifest) is returned.
    fn add_resource(&mut self, id: &str, href: &str, content: &str, media_type: &str) -> Result<String>;

    fn spine_contains(&self, id: &str) -> bool;

    /// Insert a spine entry before the `position`-th existing entry (appends past the end)
    fn insert_spine_entry(&mut self, position: usize, id: &str) -> Result<()>;
}
