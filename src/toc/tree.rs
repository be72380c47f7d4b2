use crate::toc::types::{HeadingRecord, TocEntry, TocNode, TocTree};

/// Flat TOC lines for the numbered headings, led by the synthetic TOC page entry
pub fn toc_entries(records: &[HeadingRecord]) -> Vec<TocEntry> {
    let mut entries = vec![TocEntry::synthetic()];
    entries.extend(records.iter().filter_map(|record| {
        let anchor_id = record.anchor_id().filter(|a| !a.is_empty())?;
        Some(TocEntry {
            level: record.level,
            text: record.display_text().unwrap_or(&record.raw_text).to_string(),
            source_document: record.source_document.clone(),
            anchor_id: anchor_id.to_string(),
        })
    }));
    entries
}

/// Fold flat entries into a tree, nesting by level.
///
/// The stack starts with a virtual root at depth 0; each open node sits at
/// depth = its stack position. An entry of level `n` closes every open node at
/// depth `n` or deeper and becomes a child of what remains on top, so a level
/// gap (1 followed by 3) nests under the open node.
pub fn build_tree(entries: &[TocEntry]) -> TocTree {
    let mut tree = TocTree::default();
    let mut stack: Vec<TocNode> = Vec::new();

    for entry in entries {
        if entry.is_synthetic() {
            tree.root = Some(TocNode::from_entry(entry));
            continue;
        }

        while stack.len() >= entry.level.max(1) {
            close_top(&mut stack, &mut tree.nodes);
        }
        stack.push(TocNode::from_entry(entry));
    }

    while !stack.is_empty() {
        close_top(&mut stack, &mut tree.nodes);
    }

    tree
}

/// Pop the innermost open node and attach it to its parent (or the forest)
fn close_top(stack: &mut Vec<TocNode>, roots: &mut Vec<TocNode>) {
    if let Some(completed) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.children.push(completed),
            None => roots.push(completed),
        }
    }
}
