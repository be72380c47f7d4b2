//! Heading classification, numbering and TOC synthesis.

mod collector;
mod html;
mod matcher;
mod ncx;
mod numbering;
mod tree;
mod types;

pub use collector::{HeadingCollector, SpineDocument};
pub use html::{render_toc_fragment, render_toc_page};
pub use matcher::{attrs_match, attrs_match_with_mode, compile_text_pattern, RuleMatcher};
pub use ncx::{build_nav_document, NavDocument, NavPoint, NCX_NAMESPACE};
pub use numbering::{
    appendix_letter, decompose, int_to_roman, render_template, safe_id_from_text, Assignment,
    NumberingContext, SectionCounters,
};
pub use tree::{build_tree, toc_entries};
pub use types::*;
