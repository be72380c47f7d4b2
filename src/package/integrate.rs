use log::info;

use crate::package::opf::{NCX_MEDIA_TYPE, XHTML_MEDIA_TYPE};
use crate::package::store::DocumentStore;
use crate::toc::{NCX_HREF, TOC_ANCHOR, TOC_PAGE_HREF};
use crate::utils::error::Result;

const NCX_ID: &str = "ncx";

/// Register the navigation document and the TOC page, then put the TOC page
/// first in reading order. Safe to repeat: existing resources are overwritten
/// in place and the spine entry is added only once.
pub fn integrate<S: DocumentStore + ?Sized>(store: &mut S, ncx: &str, toc_page: &str) -> Result<()> {
    upsert(store, NCX_ID, NCX_HREF, ncx, NCX_MEDIA_TYPE)?;
    let toc_id = upsert(store, TOC_ANCHOR, TOC_PAGE_HREF, toc_page, XHTML_MEDIA_TYPE)?;

    if store.spine_contains(&toc_id) {
        info!("{} already in the spine", TOC_PAGE_HREF);
    } else {
        store.insert_spine_entry(0, &toc_id)?;
        info!("Inserted {} at the start of the spine", TOC_PAGE_HREF);
    }
    Ok(())
}

/// Overwrite the resource at `href` if registered, else register it. Returns its id.
fn upsert<S: DocumentStore + ?Sized>(
    store: &mut S,
    id: &str,
    href: &str,
    content: &str,
    media_type: &str,
) -> Result<String> {
    match store.resource_id_for_path(href) {
        Some(existing) => {
            store.write_document(&existing, content)?;
            info!("Updated {}", href);
            Ok(existing)
        }
        None => {
            let id = store.add_resource(id, href, content, media_type)?;
            info!("Added {} to the manifest as '{}'", href, id);
            Ok(id)
        }
    }
}
