use quick_xml::events::Event;
use quick_xml::Reader;

use crate::utils::error::{Result, TocError};

/// Handle to a node inside a [`Document`] arena.
///
/// Handles are only meaningful for the document that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// An element with its attributes in source order
#[derive(Debug, Clone)]
pub struct Element {
    /// Qualified name as written (`h1`, `dc:title`, ...)
    pub name: String,
    /// Attribute values with entities decoded
    pub attrs: Vec<(String, String)>,
    /// Source text of the start tag, kept until the element is modified
    raw_start: Option<String>,
    /// `<tag/>` in the source, or a created element without children
    self_closing: bool,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Virtual container for the top-level nodes
    Document,
    Element(Element),
    /// Raw (still escaped) character data
    Text(String),
    /// Raw `<![CDATA[...]]>` section
    CData(String),
    /// Declarations, doctype, comments and processing instructions, verbatim
    Other(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An XML/XHTML document held as an arena tree.
///
/// Untouched nodes serialize back to their exact source text, so the only
/// differences after a round trip are the edits made through this API.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

const DOCUMENT: NodeId = NodeId(0);

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Parse markup into a document tree
    pub fn parse(source: &str) -> Result<Self> {
        let mut doc = Document::new();
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text(false);

        let mut open: Vec<NodeId> = vec![DOCUMENT];

        loop {
            let start = reader.buffer_position() as usize;
            let event = reader.read_event().map_err(|e| {
                TocError::Markup(format!(
                    "parse error at byte {}: {}",
                    reader.buffer_position(),
                    e
                ))
            })?;
            let end = reader.buffer_position() as usize;
            let raw = &source[start..end];
            let parent = *open.last().unwrap_or(&DOCUMENT);

            match event {
                Event::Start(e) => {
                    let element = Element {
                        name: String::from_utf8(e.name().as_ref().to_vec())?,
                        attrs: decode_attributes(&e)?,
                        raw_start: Some(raw.to_string()),
                        self_closing: false,
                    };
                    let id = doc.push(NodeKind::Element(element), parent);
                    open.push(id);
                }
                Event::Empty(e) => {
                    let element = Element {
                        name: String::from_utf8(e.name().as_ref().to_vec())?,
                        attrs: decode_attributes(&e)?,
                        raw_start: Some(raw.to_string()),
                        self_closing: true,
                    };
                    doc.push(NodeKind::Element(element), parent);
                }
                Event::End(_) => {
                    if open.len() <= 1 {
                        return Err(TocError::Markup(format!(
                            "unexpected closing tag {} at byte {}",
                            raw, start
                        )));
                    }
                    open.pop();
                }
                Event::Text(_) => {
                    doc.push(NodeKind::Text(raw.to_string()), parent);
                }
                Event::CData(_) => {
                    doc.push(NodeKind::CData(raw.to_string()), parent);
                }
                Event::Eof => break,
                _ => {
                    doc.push(NodeKind::Other(raw.to_string()), parent);
                }
            }
        }

        if open.len() > 1 {
            let name = open
                .last()
                .and_then(|id| doc.qualified_name(*id))
                .unwrap_or_default()
                .to_string();
            return Err(TocError::Markup(format!("unclosed element <{}>", name)));
        }

        Ok(doc)
    }

    fn push(&mut self, kind: NodeKind, parent: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// The outermost element (`html`, `package`, ...)
    pub fn document_element(&self) -> Option<NodeId> {
        self.nodes[DOCUMENT.0]
            .children
            .iter()
            .copied()
            .find(|id| self.is_element(*id))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Element(_))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Every element of the document in document (pre-)order
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendants(DOCUMENT)
            .into_iter()
            .filter(|id| self.is_element(*id))
            .collect()
    }

    /// All nodes below `id` in pre-order, `id` itself excluded
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Qualified tag name as written in the source
    pub fn qualified_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.name.as_str())
    }

    /// Tag name without namespace prefix
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.qualified_name(id).map(local_name)
    }

    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        self.element(id).map(|el| el.attrs.as_slice()).unwrap_or(&[])
    }

    /// Decoded attribute value
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set (or overwrite) an attribute. The start tag is re-rendered on output.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(id) {
            match el.attrs.iter_mut().find(|(k, _)| k == name) {
                Some((_, v)) => *v = value.to_string(),
                None => el.attrs.push((name.to_string(), value.to_string())),
            }
            el.raw_start = None;
        }
    }

    /// Concatenated character data below `id`, entities decoded
    pub fn text_content(&self, id: NodeId) -> String {
        let mut text = String::new();
        for node in std::iter::once(id).chain(self.descendants(id)) {
            match &self.nodes[node.0].kind {
                NodeKind::Text(raw) => text.push_str(&html_escape::decode_html_entities(raw)),
                NodeKind::CData(raw) => text.push_str(cdata_inner(raw)),
                _ => {}
            }
        }
        text
    }

    /// Whether the node is character data made only of whitespace
    pub fn is_blank_text(&self, id: NodeId) -> bool {
        match &self.nodes[id.0].kind {
            NodeKind::Text(raw) => html_escape::decode_html_entities(raw).trim().is_empty(),
            _ => false,
        }
    }

    /// First child element with the given local name
    pub fn find_child(&self, id: NodeId, local: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|c| self.tag_name(*c) == Some(local))
    }

    /// All child elements with the given local name
    pub fn find_children(&self, id: NodeId, local: &str) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.tag_name(*c) == Some(local))
            .collect()
    }

    /// First descendant element with the given local name
    pub fn find_descendant(&self, id: NodeId, local: &str) -> Option<NodeId> {
        self.descendants(id)
            .into_iter()
            .find(|c| self.tag_name(*c) == Some(local))
    }

    /// Create a detached element; attach it with [`Document::append_child`]
    pub fn create_element(&mut self, name: &str, attrs: &[(&str, &str)]) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind: NodeKind::Element(Element {
                name: name.to_string(),
                attrs: attrs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                raw_start: None,
                self_closing: true,
            }),
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let len = self.children(parent).len();
        self.insert_child(parent, len, child);
    }

    /// Insert `child` at `index` among the children of `parent` (clamped)
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if let Some(old) = self.nodes[child.0].parent {
            self.nodes[old.0].children.retain(|c| *c != child);
        }
        self.nodes[child.0].parent = Some(parent);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        if let NodeKind::Element(el) = &mut self.nodes[parent.0].kind {
            if el.self_closing {
                el.self_closing = false;
                el.raw_start = None;
            }
        }
    }

    /// Serialize the whole document
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        for child in self.children(DOCUMENT) {
            self.write_node(*child, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].kind {
            NodeKind::Document => {}
            NodeKind::Text(raw) | NodeKind::CData(raw) | NodeKind::Other(raw) => out.push_str(raw),
            NodeKind::Element(el) => {
                let children = self.children(id);
                match &el.raw_start {
                    Some(raw) => out.push_str(raw),
                    None => {
                        out.push('<');
                        out.push_str(&el.name);
                        for (key, value) in &el.attrs {
                            out.push_str(&format!(
                                " {}=\"{}\"",
                                key,
                                html_escape::encode_double_quoted_attribute(value)
                            ));
                        }
                        if el.self_closing && children.is_empty() {
                            out.push_str("/>");
                        } else {
                            out.push('>');
                        }
                    }
                }
                if el.self_closing && children.is_empty() {
                    return;
                }
                for child in children {
                    self.write_node(*child, out);
                }
                out.push_str(&format!("</{}>", el.name));
            }
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip a namespace prefix from a qualified name
pub fn local_name(name: &str) -> &str {
    match name.rfind(':') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

fn cdata_inner(raw: &str) -> &str {
    raw.strip_prefix("<![CDATA[")
        .and_then(|s| s.strip_suffix("]]>"))
        .unwrap_or(raw)
}

fn decode_attributes(start: &quick_xml::events::BytesStart) -> Result<Vec<(String, String)>> {
    let mut attrs = Vec::new();
    for attr in start.attributes().with_checks(false) {
        let attr = attr.map_err(|e| TocError::Markup(format!("bad attribute: {}", e)))?;
        let key = String::from_utf8(attr.key.as_ref().to_vec())?;
        let raw_value = String::from_utf8(attr.value.to_vec())?;
        let value = html_escape::decode_html_entities(&raw_value).into_owned();
        attrs.push((key, value));
    }
    Ok(attrs)
}
