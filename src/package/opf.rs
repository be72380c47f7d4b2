//! Manifest, spine and metadata access on the package document.

use log::{debug, warn};

use crate::markup::{Document, NodeId};
use crate::package::epub::EpubPackage;
use crate::package::store::{DocumentStore, PackageMetadata};
use crate::utils::error::{Result, TocError};
use crate::utils::path::resolve_href;

pub const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";
pub const XHTML_MEDIA_TYPE: &str = "application/xhtml+xml";

/// One `<item>` of the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    pub href: String,
    pub media_type: String,
}

impl EpubPackage {
    fn package_element(&self) -> Result<NodeId> {
        self.opf
            .document_element()
            .ok_or_else(|| TocError::Structure(format!("{} has no root element", self.opf_path)))
    }

    fn section(&self, name: &str) -> Result<NodeId> {
        let package = self.package_element()?;
        self.opf
            .find_child(package, name)
            .ok_or_else(|| TocError::Structure(format!("{} has no <{}>", self.opf_path, name)))
    }

    fn item_node(&self, id: &str) -> Option<NodeId> {
        let manifest = self.section("manifest").ok()?;
        self.opf
            .find_children(manifest, "item")
            .into_iter()
            .find(|item| self.opf.attr(*item, "id") == Some(id))
    }

    fn itemrefs(&self) -> Vec<NodeId> {
        match self.section("spine") {
            Ok(spine) => self.opf.find_children(spine, "itemref"),
            Err(_) => Vec::new(),
        }
    }

    /// All manifest items in document order
    pub fn manifest_items(&self) -> Vec<ManifestItem> {
        let Ok(manifest) = self.section("manifest") else {
            return Vec::new();
        };
        self.opf
            .find_children(manifest, "item")
            .into_iter()
            .filter_map(|item| {
                Some(ManifestItem {
                    id: self.opf.attr(item, "id")?.to_string(),
                    href: self.opf.attr(item, "href")?.to_string(),
                    media_type: self.opf.attr(item, "media-type").unwrap_or_default().to_string(),
                })
            })
            .collect()
    }

    /// Container path of a manifest item
    fn resource_path(&self, id: &str) -> Result<String> {
        let href = self
            .href_for_id(id)
            .ok_or_else(|| TocError::Structure(format!("no manifest item with id '{}'", id)))?;
        Ok(resolve_href(self.opf_dir(), &href))
    }

    /// Manifest id not used yet, based on `preferred`
    fn unique_id(&self, preferred: &str) -> String {
        let taken: Vec<String> = self.manifest_items().into_iter().map(|i| i.id).collect();
        if !taken.iter().any(|id| id == preferred) {
            return preferred.to_string();
        }
        (1..)
            .map(|n| format!("{}-{}", preferred, n))
            .find(|candidate| !taken.contains(candidate))
            .unwrap_or_else(|| preferred.to_string())
    }

    /// Spine `toc` attribute, pointing at the navigation document
    pub fn navigation_id(&self) -> Option<String> {
        let spine = self.section("spine").ok()?;
        self.opf.attr(spine, "toc").map(|s| s.to_string())
    }
}

/// Name for a new child of `parent` using the same namespace prefix (`opf:item` under `opf:manifest`)
fn prefixed_name(doc: &Document, parent: NodeId, local: &str) -> String {
    match doc.qualified_name(parent).and_then(|name| name.split_once(':')) {
        Some((prefix, _)) => format!("{}:{}", prefix, local),
        None => local.to_string(),
    }
}

impl DocumentStore for EpubPackage {
    fn ensure_structure(&self) -> Result<()> {
        self.section("manifest")?;
        self.section("spine")?;
        Ok(())
    }

    fn spine_order(&self) -> Result<Vec<String>> {
        self.section("spine")?;
        Ok(self
            .itemrefs()
            .into_iter()
            .filter_map(|itemref| self.opf.attr(itemref, "idref").map(|s| s.to_string()))
            .collect())
    }

    fn href_for_id(&self, id: &str) -> Option<String> {
        let item = self.item_node(id)?;
        self.opf.attr(item, "href").map(|s| s.to_string())
    }

    fn read_document(&self, id: &str) -> Result<String> {
        let path = self.resource_path(id)?;
        let content = self
            .resources
            .get(&path)
            .ok_or_else(|| TocError::Structure(format!("manifest item '{}' points at missing {}", id, path)))?;
        Ok(String::from_utf8(content.clone())?)
    }

    fn write_document(&mut self, id: &str, markup: &str) -> Result<()> {
        let path = self.resource_path(id)?;
        debug!("Writing {}", path);
        self.resources.insert(path, markup.as_bytes().to_vec());
        Ok(())
    }

    fn package_metadata(&self) -> PackageMetadata {
        let Ok(metadata) = self.section("metadata") else {
            warn!("{} has no <metadata>", self.opf_path);
            return PackageMetadata::default();
        };

        let title = self
            .opf
            .find_child(metadata, "title")
            .map(|t| self.opf.text_content(t).trim().to_string())
            .unwrap_or_default();

        let identifiers = self.opf.find_children(metadata, "identifier");
        let unique_ref = self
            .package_element()
            .ok()
            .and_then(|package| self.opf.attr(package, "unique-identifier"));
        let identifier = unique_ref
            .and_then(|wanted| {
                identifiers
                    .iter()
                    .copied()
                    .find(|i| self.opf.attr(*i, "id") == Some(wanted))
            })
            .or_else(|| identifiers.first().copied());

        PackageMetadata {
            title,
            unique_identifier: identifier
                .map(|i| self.opf.text_content(i).trim().to_string())
                .unwrap_or_default(),
        }
    }

    fn resource_id_for_path(&self, href: &str) -> Option<String> {
        let wanted = resolve_href(self.opf_dir(), href);
        self.manifest_items()
            .into_iter()
            .find(|item| resolve_href(self.opf_dir(), &item.href) == wanted)
            .map(|item| item.id)
    }

    fn add_resource(&mut self, id: &str, href: &str, content: &str, media_type: &str) -> Result<String> {
        let manifest = self.section("manifest")?;
        let id = self.unique_id(id);

        let name = prefixed_name(&self.opf, manifest, "item");
        let item = self
            .opf
            .create_element(&name, &[("id", id.as_str()), ("href", href), ("media-type", media_type)]);
        self.opf.append_child(manifest, item);

        if media_type == NCX_MEDIA_TYPE && self.navigation_id().is_none() {
            let spine = self.section("spine")?;
            self.opf.set_attr(spine, "toc", &id);
        }
        self.commit_opf();

        let path = resolve_href(self.opf_dir(), href);
        debug!("Registered {} as '{}' ({})", path, id, media_type);
        self.resources.insert(path, content.as_bytes().to_vec());
        Ok(id)
    }

    fn spine_contains(&self, id: &str) -> bool {
        self.itemrefs()
            .into_iter()
            .any(|itemref| self.opf.attr(itemref, "idref") == Some(id))
    }

    fn insert_spine_entry(&mut self, position: usize, id: &str) -> Result<()> {
        let spine = self.section("spine")?;
        let index = match self.itemrefs().get(position) {
            Some(existing) => self
                .opf
                .children(spine)
                .iter()
                .position(|child| child == existing)
                .unwrap_or(0),
            None => self.opf.children(spine).len(),
        };

        let name = prefixed_name(&self.opf, spine, "itemref");
        let itemref = self.opf.create_element(&name, &[("idref", id)]);
        self.opf.insert_child(spine, index, itemref);
        self.commit_opf();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::testing::{sample_package, sample_resources, SAMPLE_OPF_PATH};

    #[test]
    fn test_metadata() {
        let package = sample_package(&[("c1", "<h1>One</h1>")]);
        let metadata = package.package_metadata();
        assert_eq!(metadata.title, "Sample Book");
        assert_eq!(metadata.unique_identifier, "urn:uuid:1234");
    }

    #[test]
    fn test_metadata_defaults_to_first_identifier() {
        let mut resources = sample_resources(&[("c1", "<h1>One</h1>")]);
        let opf = String::from_utf8(resources[SAMPLE_OPF_PATH].clone())
            .unwrap()
            .replace("unique-identifier=\"bookid\"", "");
        resources.insert(SAMPLE_OPF_PATH.to_string(), opf.into_bytes());
        let package = EpubPackage::from_resources(resources).unwrap();
        assert_eq!(package.package_metadata().unique_identifier, "isbn-0");
    }

    #[test]
    fn test_spine_and_documents() {
        let mut package = sample_package(&[("c1", "<h1>One</h1>"), ("c2", "<h1>Two</h1>")]);
        assert_eq!(package.spine_order().unwrap(), vec!["c1", "c2"]);
        assert_eq!(package.href_for_id("c2").as_deref(), Some("Text/c2.xhtml"));
        assert!(package.read_document("c1").unwrap().contains("<h1>One</h1>"));

        package.write_document("c1", "<html/>").unwrap();
        assert_eq!(package.resource("OEBPS/Text/c1.xhtml"), Some(&b"<html/>"[..]));
        assert!(package.read_document("missing").is_err());
    }

    #[test]
    fn test_add_resource_and_spine_entry() {
        let mut package = sample_package(&[("c1", "<h1>One</h1>")]);
        assert_eq!(package.resource_id_for_path("Text/c1.xhtml").as_deref(), Some("c1"));
        assert_eq!(package.resource_id_for_path("toc.html"), None);

        // Ids colliding with existing manifest entries get a suffix
        let id = package.add_resource("c1", "toc.html", "<html/>", XHTML_MEDIA_TYPE).unwrap();
        assert_eq!(id, "c1-1");
        assert_eq!(package.resource_id_for_path("toc.html").as_deref(), Some("c1-1"));
        assert_eq!(package.resource("OEBPS/toc.html"), Some(&b"<html/>"[..]));

        assert!(!package.spine_contains("c1-1"));
        package.insert_spine_entry(0, "c1-1").unwrap();
        assert_eq!(package.spine_order().unwrap(), vec!["c1-1", "c1"]);

        package.insert_spine_entry(99, "c1-1").unwrap();
        assert_eq!(package.spine_order().unwrap(), vec!["c1-1", "c1", "c1-1"]);
    }

    #[test]
    fn test_ncx_sets_spine_toc() {
        let mut package = sample_package(&[("c1", "<h1>One</h1>")]);
        assert_eq!(package.navigation_id(), None);
        let id = package.add_resource("ncx", "toc.ncx", "<ncx/>", NCX_MEDIA_TYPE).unwrap();
        assert_eq!(package.navigation_id(), Some(id));

        let opf = String::from_utf8(package.resource(SAMPLE_OPF_PATH).unwrap().to_vec()).unwrap();
        assert!(opf.contains(r#"<item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>"#));
    }

    #[test]
    fn test_prefixed_package_document() {
        let opf = r#"<?xml version="1.0"?>
<opf:package xmlns:opf="http://www.idpf.org/2007/opf" version="2.0">
  <opf:metadata/>
  <opf:manifest><opf:item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/></opf:manifest>
  <opf:spine><opf:itemref idref="c1"/></opf:spine>
</opf:package>"#;
        let mut resources = std::collections::BTreeMap::new();
        resources.insert("content.opf".to_string(), opf.as_bytes().to_vec());
        resources.insert("c1.xhtml".to_string(), b"<html/>".to_vec());
        let mut package = EpubPackage::from_resources(resources).unwrap();

        package.add_resource("toc", "toc.html", "<html/>", XHTML_MEDIA_TYPE).unwrap();
        package.insert_spine_entry(0, "toc").unwrap();
        let markup = String::from_utf8(package.resource("content.opf").unwrap().to_vec()).unwrap();
        assert!(markup.contains(r#"<opf:item id="toc" href="toc.html""#));
        assert!(markup.contains(r#"<opf:spine><opf:itemref idref="toc"/><opf:itemref idref="c1"/></opf:spine>"#));
        assert_eq!(package.package_metadata(), PackageMetadata::default());
    }

    #[test]
    fn test_missing_spine_is_structural() {
        let opf = r#"<package><metadata/><manifest/></package>"#;
        let mut resources = std::collections::BTreeMap::new();
        resources.insert("content.opf".to_string(), opf.as_bytes().to_vec());
        let package = EpubPackage::from_resources(resources).unwrap();
        assert!(matches!(package.ensure_structure(), Err(TocError::Structure(_))));
        assert!(package.spine_order().is_err());
    }
}
