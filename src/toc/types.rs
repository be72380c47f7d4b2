use regex::Regex;

use crate::config::ZoneType;
use crate::markup::NodeId;

/// Href of the generated TOC page, relative to the package document
pub const TOC_PAGE_HREF: &str = "toc.html";
/// Href of the generated navigation document, relative to the package document
pub const NCX_HREF: &str = "toc.ncx";
/// Anchor of the heading on the TOC page itself
pub const TOC_ANCHOR: &str = "toc";
pub const TOC_TITLE: &str = "Table of Contents";

/// Result of a successful rule match on one element
#[derive(Debug, Clone)]
pub struct Classification {
    /// Index of the rule that matched
    pub rule_index: usize,
    pub level: usize,
    /// Trimmed text of the element (or of its single child)
    pub text: String,
    pub zone_type: ZoneType,
    pub display_template: String,
    /// The matching rule's compiled text pattern
    pub pattern: Regex,
}

/// Non-owning pointer to an element of a loaded spine document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementRef {
    /// Position of the document in the spine scan
    pub document: usize,
    pub node: NodeId,
}

/// A matched heading, numbered in discovery order
#[derive(Debug, Clone)]
pub struct HeadingRecord {
    pub level: usize,
    /// Href of the source document relative to the package document
    pub source_document: String,
    pub element: ElementRef,
    pub raw_text: String,
    pub zone_type: ZoneType,
    pub display_template: String,
    pub pattern: Regex,
    anchor_id: Option<String>,
    display_text: Option<String>,
}

impl HeadingRecord {
    pub fn new(classification: Classification, source_document: &str, element: ElementRef) -> Self {
        Self {
            level: classification.level,
            source_document: source_document.to_string(),
            element,
            raw_text: classification.text,
            zone_type: classification.zone_type,
            display_template: classification.display_template,
            pattern: classification.pattern,
            anchor_id: None,
            display_text: None,
        }
    }

    /// Record the numbering result. A record is numbered at most once.
    pub fn assign(&mut self, anchor_id: String, display_text: String) {
        debug_assert!(self.anchor_id.is_none(), "heading numbered twice");
        self.anchor_id = Some(anchor_id);
        self.display_text = Some(display_text);
    }

    pub fn anchor_id(&self) -> Option<&str> {
        self.anchor_id.as_deref()
    }

    pub fn display_text(&self) -> Option<&str> {
        self.display_text.as_deref()
    }
}

/// One flat TOC line: a numbered heading or the synthetic TOC page entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    /// 0 for the synthetic entry, heading level otherwise
    pub level: usize,
    pub text: String,
    pub source_document: String,
    pub anchor_id: String,
}

impl TocEntry {
    /// The entry pointing at the generated TOC page itself
    pub fn synthetic() -> Self {
        Self {
            level: 0,
            text: TOC_TITLE.to_string(),
            source_document: TOC_PAGE_HREF.to_string(),
            anchor_id: TOC_ANCHOR.to_string(),
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.level == 0
    }

    /// `document#anchor`
    pub fn src(&self) -> String {
        format!("{}#{}", self.source_document, self.anchor_id)
    }
}

/// A node of the nested table of contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocNode {
    pub level: usize,
    pub text: String,
    pub source_document: String,
    pub anchor_id: String,
    pub children: Vec<TocNode>,
}

impl TocNode {
    pub fn from_entry(entry: &TocEntry) -> Self {
        Self {
            level: entry.level,
            text: entry.text.clone(),
            source_document: entry.source_document.clone(),
            anchor_id: entry.anchor_id.clone(),
            children: Vec::new(),
        }
    }

    pub fn src(&self) -> String {
        format!("{}#{}", self.source_document, self.anchor_id)
    }
}

/// The folded table of contents.
///
/// `root` is the synthetic TOC page entry. It takes the first play order in
/// the navigation document and is never rendered on the TOC page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TocTree {
    pub root: Option<TocNode>,
    pub nodes: Vec<TocNode>,
}

impl TocTree {
    /// Deepest nesting of the content nodes (0 for an empty tree)
    pub fn max_depth(&self) -> usize {
        fn depth(nodes: &[TocNode]) -> usize {
            nodes
                .iter()
                .map(|n| 1 + depth(&n.children))
                .max()
                .unwrap_or(0)
        }
        depth(&self.nodes)
    }
}
