//! One generation run: scan the spine, stamp anchors, emit and register the TOC artifacts.

mod report;

use std::collections::BTreeMap;
use std::time::Instant;

use log::{debug, error, info, warn};

use crate::config::Criteria;
use crate::markup::Document;
use crate::package::{integrate, DocumentStore};
use crate::toc::{
    build_nav_document, build_tree, render_toc_page, toc_entries, HeadingCollector, RuleMatcher,
    SpineDocument, TOC_PAGE_HREF,
};
use crate::utils::error::{Result, TocError};

pub use report::GenerationReport;

/// Run a complete generation pass over `store`.
///
/// Errors are reported, never raised. The pass is not transactional: a failure
/// after anchors were stamped leaves those documents modified in memory.
pub fn generate_toc<S: DocumentStore + ?Sized>(store: &mut S, criteria: &Criteria) -> GenerationReport {
    let start = Instant::now();
    let mut occurrences = 0;

    match run(store, criteria, &mut occurrences) {
        Ok(()) => {
            info!(
                "Generated table of contents with {} headings in {:.2?}",
                occurrences,
                start.elapsed()
            );
            GenerationReport::success(occurrences)
        }
        Err(e) => {
            error!("Table of contents generation failed: {}", e);
            GenerationReport::failure(e, occurrences)
        }
    }
}

fn run<S: DocumentStore + ?Sized>(store: &mut S, criteria: &Criteria, occurrences: &mut usize) -> Result<()> {
    let matcher = RuleMatcher::new(&criteria.rules)?;

    store.ensure_structure()?;
    let spine = store.spine_order()?;
    if spine.is_empty() {
        return Err(TocError::Structure("the spine is empty".to_string()));
    }
    let metadata = store.package_metadata();
    let toc_page_id = store.resource_id_for_path(TOC_PAGE_HREF);

    info!("Scanning {} spine documents", spine.len());

    let mut collector = HeadingCollector::new(&matcher, criteria);
    let mut documents: Vec<SpineDocument> = Vec::with_capacity(spine.len());
    for id in spine {
        if toc_page_id.as_deref() == Some(id.as_str()) {
            debug!("Skipping generated {}", TOC_PAGE_HREF);
            continue;
        }
        let Some(href) = store.href_for_id(&id) else {
            warn!("Spine entry '{}' has no manifest item", id);
            continue;
        };

        let markup = store.read_document(&id)?;
        let doc = Document::parse(&markup).map_err(|e| match e {
            TocError::Markup(msg) => TocError::Markup(format!("{}: {}", href, msg)),
            other => other,
        })?;

        let mut document = SpineDocument {
            id,
            href,
            doc,
            modified: false,
        };
        collector.scan(documents.len(), &mut document);
        *occurrences = collector.occurrences();
        documents.push(document);
    }

    let records = collector.finish();
    if records.is_empty() {
        info!("No headings matched; the package was left untouched");
        return Ok(());
    }

    for document in documents.iter().filter(|d| d.modified) {
        store.write_document(&document.id, &document.doc.to_markup())?;
    }

    let entries = toc_entries(&records);
    let tree = build_tree(&entries);
    let nav = build_nav_document(&tree, &metadata.title, &metadata.unique_identifier);
    let ncx = nav.to_xml()?;
    let page = render_toc_page(&tree, &criteria.style_by_level(), &nav.title);

    integrate(store, &ncx, &page)?;
    log_rules(criteria);
    Ok(())
}

/// Log the active rules grouped by level
fn log_rules(criteria: &Criteria) {
    let mut by_level: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    for rule in &criteria.rules {
        by_level.entry(rule.level).or_default().push(rule.summary());
    }
    for (level, rules) in by_level {
        info!("Level {} rules:\n\t{}", level, rules.join("\n\t"));
    }
}
