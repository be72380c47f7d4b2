use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use log::{debug, info};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::markup::Document;
use crate::utils::error::{Result, TocError};
use crate::utils::fs::{create_directory, is_directory, list_files, read_bytes, write_bytes};
use crate::utils::path::parent_dir;

pub const CONTAINER_PATH: &str = "META-INF/container.xml";
pub const MIMETYPE_PATH: &str = "mimetype";
pub const EPUB_MIMETYPE: &str = "application/epub+zip";

/// An EPUB held in memory: every resource keyed by its path inside the container,
/// plus the parsed package document.
#[derive(Debug, Clone)]
pub struct EpubPackage {
    pub(super) resources: BTreeMap<String, Vec<u8>>,
    pub(super) opf_path: String,
    pub(super) opf: Document,
}

impl EpubPackage {
    /// Build a package from container paths and their contents
    pub fn from_resources(resources: BTreeMap<String, Vec<u8>>) -> Result<Self> {
        let opf_path = locate_package_document(&resources)?;
        let source = resources
            .get(&opf_path)
            .ok_or_else(|| TocError::Structure(format!("package document {} is missing", opf_path)))?;
        let opf = Document::parse(std::str::from_utf8(source).map_err(|e| {
            TocError::Markup(format!("{} is not valid UTF-8: {}", opf_path, e))
        })?)?;

        debug!("Package document: {} ({} resources)", opf_path, resources.len());

        Ok(Self {
            resources,
            opf_path,
            opf,
        })
    }

    /// Load an unpacked directory or a `.epub` archive
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let resources = if is_directory(path) {
            read_directory(path)?
        } else {
            read_archive(path)?
        };
        info!("Loaded {} ({} resources)", path.display(), resources.len());
        Self::from_resources(resources)
    }

    /// Write the package to `path`: an archive when it ends in `.epub`, a directory otherwise
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let is_archive = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("epub"))
            .unwrap_or(false);
        if is_archive {
            self.save_archive(path)
        } else {
            self.save_dir(path)
        }
    }

    pub fn save_dir<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        create_directory(dir)?;
        for (name, content) in &self.resources {
            write_bytes(dir.join(name), content)?;
        }
        info!("Wrote {} resources to {}", self.resources.len(), dir.display());
        Ok(())
    }

    /// Write an archive with `mimetype` as the first, uncompressed entry
    pub fn save_archive<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_directory(parent)?;
        }

        let mut zip = ZipWriter::new(File::create(path)?);
        let stored = FileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let mimetype = self
            .resources
            .get(MIMETYPE_PATH)
            .map(|m| m.as_slice())
            .unwrap_or(EPUB_MIMETYPE.as_bytes());
        zip.start_file(MIMETYPE_PATH, stored)?;
        zip.write_all(mimetype)?;

        for (name, content) in self.resources.iter().filter(|(name, _)| *name != MIMETYPE_PATH) {
            zip.start_file(name.as_str(), deflated)?;
            zip.write_all(content)?;
        }
        zip.finish()?;

        info!("Wrote {}", path.display());
        Ok(())
    }

    /// Container path of the package document
    pub fn opf_path(&self) -> &str {
        &self.opf_path
    }

    /// Directory that manifest hrefs are relative to
    pub fn opf_dir(&self) -> &str {
        parent_dir(&self.opf_path)
    }

    pub fn resource(&self, path: &str) -> Option<&[u8]> {
        self.resources.get(path).map(|r| r.as_slice())
    }

    pub fn resource_paths(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(|k| k.as_str())
    }

    /// Store the edited package document back into the resource map
    pub(super) fn commit_opf(&mut self) {
        self.resources
            .insert(self.opf_path.clone(), self.opf.to_markup().into_bytes());
    }
}

fn read_directory(dir: &Path) -> Result<BTreeMap<String, Vec<u8>>> {
    let mut resources = BTreeMap::new();
    for file in list_files(dir)? {
        let relative = file
            .strip_prefix(dir)
            .map_err(|e| TocError::Generic(format!("{}: {}", file.display(), e)))?;
        let name = relative.to_string_lossy().replace('\\', "/");
        resources.insert(name, read_bytes(&file)?);
    }
    Ok(resources)
}

fn read_archive(path: &Path) -> Result<BTreeMap<String, Vec<u8>>> {
    let mut archive = ZipArchive::new(File::open(path)?)?;
    let mut resources = BTreeMap::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let mut content = Vec::new();
        entry.read_to_end(&mut content)?;
        resources.insert(name, content);
    }
    Ok(resources)
}

/// `rootfile@full-path` from the container document, else the first `.opf` resource
fn locate_package_document(resources: &BTreeMap<String, Vec<u8>>) -> Result<String> {
    if let Some(container) = resources.get(CONTAINER_PATH) {
        let source = String::from_utf8(container.clone())?;
        let doc = Document::parse(&source)?;
        let full_path = doc
            .document_element()
            .and_then(|root| doc.find_descendant(root, "rootfile"))
            .and_then(|rootfile| doc.attr(rootfile, "full-path"))
            .map(|p| p.to_string());
        if let Some(path) = full_path.filter(|p| resources.contains_key(p)) {
            return Ok(path);
        }
    }

    resources
        .keys()
        .find(|name| name.to_ascii_lowercase().ends_with(".opf"))
        .cloned()
        .ok_or_else(|| TocError::Structure("no package document (.opf) found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::testing::sample_resources;

    #[test]
    fn test_locates_package_through_container() {
        let package = EpubPackage::from_resources(sample_resources(&[("c1", "<h1>One</h1>")])).unwrap();
        assert_eq!(package.opf_path(), "OEBPS/content.opf");
        assert_eq!(package.opf_dir(), "OEBPS");
    }

    #[test]
    fn test_falls_back_to_first_opf() {
        let mut resources = sample_resources(&[("c1", "<h1>One</h1>")]);
        resources.remove(CONTAINER_PATH);
        let package = EpubPackage::from_resources(resources).unwrap();
        assert_eq!(package.opf_path(), "OEBPS/content.opf");
    }

    #[test]
    fn test_missing_package_document() {
        let mut resources = BTreeMap::new();
        resources.insert("mimetype".to_string(), EPUB_MIMETYPE.as_bytes().to_vec());
        let err = EpubPackage::from_resources(resources).unwrap_err();
        assert!(matches!(err, TocError::Structure(_)));
    }

    #[test]
    fn test_directory_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let package = EpubPackage::from_resources(sample_resources(&[("c1", "<h1>One</h1>")])).unwrap();
        package.save(dir.path().join("book")).unwrap();

        let reopened = EpubPackage::open(dir.path().join("book")).unwrap();
        assert_eq!(reopened.opf_path(), "OEBPS/content.opf");
        assert_eq!(
            reopened.resource_paths().collect::<Vec<_>>(),
            package.resource_paths().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_archive_round_trip_puts_mimetype_first() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("book.epub");
        let package = EpubPackage::from_resources(sample_resources(&[("c1", "<h1>One</h1>")])).unwrap();
        package.save(&target).unwrap();

        let mut archive = ZipArchive::new(File::open(&target).unwrap()).unwrap();
        {
            let first = archive.by_index(0).unwrap();
            assert_eq!(first.name(), "mimetype");
            assert_eq!(first.compression(), CompressionMethod::Stored);
        }

        let reopened = EpubPackage::open(&target).unwrap();
        assert_eq!(
            reopened.resource("OEBPS/Text/c1.xhtml"),
            package.resource("OEBPS/Text/c1.xhtml")
        );
    }
}
