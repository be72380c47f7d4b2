use log::{debug, warn};

use crate::config::Criteria;
use crate::markup::Document;
use crate::toc::matcher::RuleMatcher;
use crate::toc::numbering::NumberingContext;
use crate::toc::types::{ElementRef, HeadingRecord};

/// A spine document loaded for scanning
#[derive(Debug, Clone)]
pub struct SpineDocument {
    /// Manifest id
    pub id: String,
    /// Href relative to the package document
    pub href: String,
    pub doc: Document,
    /// Set once an anchor has been stamped into the document
    pub modified: bool,
}

/// Walks spine documents in reading order, classifying and numbering headings as it finds them
pub struct HeadingCollector<'a> {
    matcher: &'a RuleMatcher,
    criteria: &'a Criteria,
    context: NumberingContext,
    records: Vec<HeadingRecord>,
    /// Anchor of the last level-1 heading seen so far
    current_top_level: Option<String>,
}

impl<'a> HeadingCollector<'a> {
    pub fn new(matcher: &'a RuleMatcher, criteria: &'a Criteria) -> Self {
        Self {
            matcher,
            criteria,
            context: NumberingContext::new(),
            records: Vec::new(),
            current_top_level: None,
        }
    }

    /// Headings numbered so far
    pub fn occurrences(&self) -> usize {
        self.records.len()
    }

    /// Scan one document. Documents must be fed in spine order.
    pub fn scan(&mut self, index: usize, document: &mut SpineDocument) {
        let candidates: Vec<_> = document
            .doc
            .elements()
            .into_iter()
            .filter(|id| {
                document
                    .doc
                    .tag_name(*id)
                    .map(|tag| self.criteria.scans_tag(tag))
                    .unwrap_or(false)
            })
            .collect();

        for node in candidates {
            let Some(classification) = self.matcher.classify(&document.doc, node) else {
                continue;
            };

            let element = ElementRef { document: index, node };
            let mut record = HeadingRecord::new(classification, &document.href, element);

            let parent = if record.level <= 1 {
                None
            } else {
                self.current_top_level.as_deref()
            };

            let Some(assignment) = self.context.assign(&record, parent) else {
                warn!(
                    "Skipping level {} heading '{}' in {}: no level 1 heading before it",
                    record.level, record.raw_text, document.href
                );
                continue;
            };

            debug!(
                "{} level {} '{}' -> #{} '{}'",
                document.href, record.level, record.raw_text, assignment.anchor_id, assignment.display_text
            );

            document.doc.set_attr(node, "id", &assignment.anchor_id);
            document.modified = true;

            if record.level <= 1 {
                self.current_top_level = Some(assignment.anchor_id.clone());
            }
            record.assign(assignment.anchor_id, assignment.display_text);
            self.records.push(record);
        }
    }

    /// Numbered headings in discovery order
    pub fn finish(self) -> Vec<HeadingRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults;

    fn spine_doc(id: &str, body: &str) -> SpineDocument {
        let markup = format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<html xmlns=\"http://www.w3.org/1999/xhtml\"><body>{}</body></html>",
            body
        );
        SpineDocument {
            id: id.to_string(),
            href: format!("Text/{}.xhtml", id),
            doc: Document::parse(&markup).unwrap(),
            modified: false,
        }
    }

    fn collect(docs: &mut [SpineDocument], criteria: &Criteria) -> Vec<HeadingRecord> {
        let matcher = RuleMatcher::new(&criteria.rules).unwrap();
        let mut collector = HeadingCollector::new(&matcher, criteria);
        for (idx, doc) in docs.iter_mut().enumerate() {
            collector.scan(idx, doc);
        }
        collector.finish()
    }

    fn anchors(records: &[HeadingRecord]) -> Vec<&str> {
        records.iter().filter_map(|r| r.anchor_id()).collect()
    }

    #[test]
    fn test_numbering_follows_spine_order() {
        let criteria = Criteria::default();
        let mut docs = vec![
            spine_doc("front", "<h1>Preface</h1>"),
            spine_doc(
                "c1",
                r#"<h1>Chapter 1: Introduction</h1>
<div class="calibre10"><span class="calibre9">Background</span></div>
<div class="calibre10"><span class="calibre9">Scope</span></div>"#,
            ),
            spine_doc(
                "c2",
                r#"<h1>Chapter 2: Methods</h1>
<div class="calibre10"><span class="calibre9">Setup</span></div>
<div class="calibre10"><span class="calibre16">Hardware</span></div>
<div class="calibre10"><span class="calibre9">Runs</span></div>"#,
            ),
            spine_doc("app", "<h1>Appendix A: Data</h1><h1>Index</h1>"),
        ];

        let records = collect(&mut docs, &criteria);
        assert_eq!(
            anchors(&records),
            vec!["fron-preface", "1", "1-1", "1-2", "2", "2-1", "2-s1", "2-2", "app-a", "back-index"]
        );
        assert_eq!(records[1].display_text(), Some("Lesson 1: Introduction"));
        assert_eq!(records[8].display_text(), Some("Appendix A: Data"));
        assert_eq!(records[2].source_document, "Text/c1.xhtml");
        assert!(docs.iter().all(|d| d.modified));
    }

    #[test]
    fn test_anchor_is_stamped_on_the_element() {
        let criteria = Criteria::default();
        let mut docs = vec![spine_doc("c1", r#"<h1 id="old">Chapter 1: Introduction</h1>"#)];
        let records = collect(&mut docs, &criteria);
        let node = records[0].element.node;
        assert_eq!(docs[0].doc.attr(node, "id"), Some("1"));
        assert!(docs[0].doc.to_markup().contains(r#"<h1 id="1">Chapter 1: Introduction</h1>"#));
    }

    #[test]
    fn test_orphan_sections_are_dropped() {
        let criteria = Criteria::default();
        let mut docs = vec![
            spine_doc("c0", r#"<div class="calibre10"><span class="calibre9">Lost</span></div>"#),
            spine_doc("c1", "<h1>Chapter 1</h1>"),
        ];
        let records = collect(&mut docs, &criteria);
        assert_eq!(anchors(&records), vec!["1"]);
        assert!(!docs[0].modified);
    }

    #[test]
    fn test_unscanned_tags_are_ignored() {
        let mut criteria = Criteria::default();
        criteria.tags = vec!["div".to_string(), "span".to_string()];
        let mut docs = vec![spine_doc("c1", "<h1>Chapter 1</h1>")];
        assert!(collect(&mut docs, &criteria).is_empty());
        assert!(!docs[0].modified);
    }

    #[test]
    fn test_deep_headings_count_against_the_chapter() {
        let mut criteria = Criteria::default();
        criteria.tags = vec![];
        let mut deep = defaults::default_rules().remove(2);
        deep.level = 4;
        deep.element = "h4".to_string();
        deep.text_pattern = ".*".to_string();
        criteria.rules.push(deep);

        let mut docs = vec![spine_doc(
            "c1",
            r#"<h1>Chapter 1</h1>
<div class="calibre10"><span class="calibre9">Two</span></div>
<div class="calibre10"><span class="calibre16">Three</span></div>
<h4>Four</h4>
<div class="calibre10"><span class="calibre9">Two again</span></div>
<h4>Four again</h4>"#,
        )];
        let records = collect(&mut docs, &criteria);
        assert_eq!(anchors(&records), vec!["1", "1-1", "1-s1", "1-ss1", "1-2", "1-ss2"]);
    }
}
