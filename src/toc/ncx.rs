//! NCX navigation document built from the folded TOC tree.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::toc::types::{TocNode, TocTree};
use crate::utils::error::Result;

pub const NCX_NAMESPACE: &str = "http://www.daisy.org/z3986/2005/ncx/";
pub const NCX_VERSION: &str = "2005-1";
pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_UID: &str = "unknown";

/// One entry of the navigation map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavPoint {
    pub id: String,
    pub play_order: usize,
    pub label: String,
    pub src: String,
    pub level: usize,
    pub children: Vec<NavPoint>,
}

/// The navigation document before serialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavDocument {
    pub uid: String,
    pub depth: usize,
    pub title: String,
    pub nav_map: Vec<NavPoint>,
}

/// Build the navigation document. The synthetic root (when present) is the first
/// top-level point with play order 1; content nodes follow in pre-order.
pub fn build_nav_document(tree: &TocTree, title: &str, uid: &str) -> NavDocument {
    let mut nav_map = Vec::new();
    let mut next_order = 1;

    if let Some(root) = &tree.root {
        let (point, next) = nav_point(root, &[], next_order);
        nav_map.push(point);
        next_order = next;
    }

    let (points, _) = nav_points(&tree.nodes, next_order);
    nav_map.extend(points);

    NavDocument {
        uid: non_empty_or(uid, DEFAULT_UID),
        depth: tree.max_depth().max(1),
        title: non_empty_or(title, DEFAULT_TITLE),
        nav_map,
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Number `nodes` in pre-order starting at `next_order`; returns the points and the next free order
fn nav_points(nodes: &[TocNode], mut next_order: usize) -> (Vec<NavPoint>, usize) {
    let mut points = Vec::with_capacity(nodes.len());
    for node in nodes {
        let (point, next) = nav_point(node, &node.children, next_order);
        points.push(point);
        next_order = next;
    }
    (points, next_order)
}

fn nav_point(node: &TocNode, children: &[TocNode], play_order: usize) -> (NavPoint, usize) {
    let (children, next_order) = nav_points(children, play_order + 1);
    let point = NavPoint {
        id: format!("navPoint-{}", play_order),
        play_order,
        label: node.text.clone(),
        src: node.src(),
        level: node.level,
        children,
    };
    (point, next_order)
}

impl NavDocument {
    /// All points in play order
    pub fn flatten(&self) -> Vec<&NavPoint> {
        fn walk<'a>(points: &'a [NavPoint], out: &mut Vec<&'a NavPoint>) {
            for point in points {
                out.push(point);
                walk(&point.children, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.nav_map, &mut out);
        out
    }

    /// Serialize as an NCX document
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        writer.write_event(Event::Start(
            BytesStart::new("ncx").with_attributes([("xmlns", NCX_NAMESPACE), ("version", NCX_VERSION)]),
        ))?;

        writer.write_event(Event::Start(BytesStart::new("head")))?;
        let depth = self.depth.to_string();
        for (name, content) in [("dtb:uid", self.uid.as_str()), ("dtb:depth", depth.as_str())] {
            writer.write_event(Event::Empty(
                BytesStart::new("meta").with_attributes([("name", name), ("content", content)]),
            ))?;
        }
        writer.write_event(Event::End(BytesEnd::new("head")))?;

        writer.write_event(Event::Start(BytesStart::new("docTitle")))?;
        write_text_element(&mut writer, "text", &self.title)?;
        writer.write_event(Event::End(BytesEnd::new("docTitle")))?;

        writer.write_event(Event::Start(BytesStart::new("navMap")))?;
        for point in &self.nav_map {
            write_nav_point(&mut writer, point)?;
        }
        writer.write_event(Event::End(BytesEnd::new("navMap")))?;

        writer.write_event(Event::End(BytesEnd::new("ncx")))?;

        Ok(String::from_utf8(writer.into_inner())?)
    }
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn write_nav_point(writer: &mut Writer<Vec<u8>>, point: &NavPoint) -> Result<()> {
    let play_order = point.play_order.to_string();
    writer.write_event(Event::Start(
        BytesStart::new("navPoint").with_attributes([("id", point.id.as_str()), ("playOrder", play_order.as_str())]),
    ))?;

    writer.write_event(Event::Start(BytesStart::new("navLabel")))?;
    write_text_element(writer, "text", &point.label)?;
    writer.write_event(Event::End(BytesEnd::new("navLabel")))?;

    writer.write_event(Event::Empty(
        BytesStart::new("content").with_attributes([("src", point.src.as_str())]),
    ))?;

    for child in &point.children {
        write_nav_point(writer, child)?;
    }

    writer.write_event(Event::End(BytesEnd::new("navPoint")))?;
    Ok(())
}
