use html_escape::{encode_double_quoted_attribute, encode_text};
use indexmap::IndexMap;

use crate::toc::types::{TocNode, TocTree, TOC_ANCHOR, TOC_TITLE};

const PAGE_STYLE: [&str; 4] = [
    "    body { font-family: serif; margin: 2em; }",
    "    ol { list-style-type: none; padding-left: 0; }",
    "    li { margin: 0.5em 0; }",
    "    a:hover { text-decoration: underline; }",
];

const STYLESHEETS: [&str; 2] = ["stylesheet.css", "page_styles.css"];

/// Render the content nodes of `tree` as nested `<ol>` lists, one line per tag.
///
/// `styles` maps nesting depth (1 for top-level nodes) to an attribute string
/// inlined on each link. The synthetic root is never rendered.
pub fn render_toc_fragment(tree: &TocTree, styles: &IndexMap<usize, String>) -> Vec<String> {
    render_list(&tree.nodes, 1, styles)
}

fn render_list(nodes: &[TocNode], depth: usize, styles: &IndexMap<usize, String>) -> Vec<String> {
    if nodes.is_empty() {
        return Vec::new();
    }

    let style = styles.get(&depth).map(|s| s.trim()).unwrap_or("");
    let mut lines = vec!["<ol>".to_string()];
    for node in nodes {
        lines.push(format!("  <li>{}", render_link(node, style)));
        lines.extend(
            render_list(&node.children, depth + 1, styles)
                .into_iter()
                .map(|line| format!("  {}", line)),
        );
        lines.push("  </li>".to_string());
    }
    lines.push("</ol>".to_string());
    lines
}

fn render_link(node: &TocNode, style: &str) -> String {
    let href = encode_double_quoted_attribute(&node.src()).into_owned();
    let text = encode_text(&node.text);
    if style.is_empty() {
        format!("<a href=\"{}\">{}</a>", href, text)
    } else {
        format!("<a href=\"{}\" {}>{}</a>", href, style, text)
    }
}

/// The complete TOC page for `tree`
pub fn render_toc_page(tree: &TocTree, styles: &IndexMap<usize, String>, book_title: &str) -> String {
    let heading_style = styles.get(&1).map(|s| s.trim()).unwrap_or("");

    let mut lines = vec![
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>".to_string(),
        "<!DOCTYPE html>".to_string(),
        "<html xmlns=\"http://www.w3.org/1999/xhtml\" lang=\"en\">".to_string(),
        "<head>".to_string(),
        "  <meta charset=\"utf-8\"/>".to_string(),
        format!("  <title>{} - {}</title>", encode_text(book_title), TOC_TITLE),
        "  <style>".to_string(),
    ];
    lines.extend(PAGE_STYLE.iter().map(|s| s.to_string()));
    lines.push("  </style>".to_string());
    lines.extend(
        STYLESHEETS
            .iter()
            .map(|href| format!("  <link href=\"{}\" rel=\"stylesheet\" type=\"text/css\"/>", href)),
    );
    lines.push("</head>".to_string());
    lines.push("<body>".to_string());
    if heading_style.is_empty() {
        lines.push(format!("<h1 id=\"{}\">{}</h1>", TOC_ANCHOR, TOC_TITLE));
    } else {
        lines.push(format!("<h1 id=\"{}\" {}>{}</h1>", TOC_ANCHOR, heading_style, TOC_TITLE));
    }
    lines.extend(render_toc_fragment(tree, styles));
    lines.push("</body>".to_string());
    lines.push("</html>".to_string());

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::Document;
    use crate::toc::tree::build_tree;
    use crate::toc::types::TocEntry;

    fn tree(items: &[(usize, &str, &str)]) -> TocTree {
        let mut entries = vec![TocEntry::synthetic()];
        entries.extend(items.iter().map(|(level, anchor, text)| TocEntry {
            level: *level,
            text: text.to_string(),
            source_document: "Text/ch.xhtml".to_string(),
            anchor_id: anchor.to_string(),
        }));
        build_tree(&entries)
    }

    fn calibre_styles() -> IndexMap<usize, String> {
        let mut styles = IndexMap::new();
        styles.insert(1, "class=\"calibre13\"".to_string());
        styles.insert(2, "class=\"calibre12\"".to_string());
        styles
    }

    #[test]
    fn test_fragment_layout() {
        let tree = tree(&[(1, "1", "Lesson 1: Intro"), (2, "1-1", "Background"), (1, "2", "Lesson 2")]);
        let lines = render_toc_fragment(&tree, &calibre_styles());
        assert_eq!(
            lines,
            vec![
                "<ol>",
                "  <li><a href=\"Text/ch.xhtml#1\" class=\"calibre13\">Lesson 1: Intro</a>",
                "  <ol>",
                "    <li><a href=\"Text/ch.xhtml#1-1\" class=\"calibre12\">Background</a>",
                "    </li>",
                "  </ol>",
                "  </li>",
                "  <li><a href=\"Text/ch.xhtml#2\" class=\"calibre13\">Lesson 2</a>",
                "  </li>",
                "</ol>",
            ]
        );
    }

    #[test]
    fn test_missing_style_leaves_bare_link() {
        let tree = tree(&[(1, "1", "One"), (2, "1-1", "Two"), (3, "1-s1", "Three")]);
        let lines = render_toc_fragment(&tree, &calibre_styles());
        assert!(lines.contains(&"      <li><a href=\"Text/ch.xhtml#1-s1\">Three</a>".to_string()));
    }

    #[test]
    fn test_text_is_escaped() {
        let tree = tree(&[(1, "1", "Cats & <Dogs>")]);
        let lines = render_toc_fragment(&tree, &IndexMap::new());
        assert_eq!(lines[1], "  <li><a href=\"Text/ch.xhtml#1\">Cats &amp; &lt;Dogs&gt;</a>");
    }

    #[test]
    fn test_synthetic_root_is_not_rendered() {
        let tree = tree(&[(1, "1", "One")]);
        let page = render_toc_page(&tree, &calibre_styles(), "Book");
        assert!(!page.contains("href=\"toc.html#toc\""));
        assert!(render_toc_fragment(&TocTree::default(), &calibre_styles()).is_empty());
    }

    #[test]
    fn test_page_is_well_formed() {
        let tree = tree(&[(1, "1", "One"), (2, "1-1", "Two")]);
        let page = render_toc_page(&tree, &calibre_styles(), "Tom & Jerry");
        assert!(page.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE html>"));
        assert!(page.contains("<title>Tom &amp; Jerry - Table of Contents</title>"));
        assert!(page.contains("<h1 id=\"toc\" class=\"calibre13\">Table of Contents</h1>"));

        let doc = Document::parse(&page).unwrap();
        let anchors: Vec<_> = doc
            .elements()
            .into_iter()
            .filter(|id| doc.tag_name(*id) == Some("a"))
            .map(|id| doc.attr(id, "href").unwrap_or_default().to_string())
            .collect();
        assert_eq!(anchors, vec!["Text/ch.xhtml#1", "Text/ch.xhtml#1-1"]);
    }
}
