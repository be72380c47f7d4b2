//! Minimal XML/XHTML tree used to locate headings, stamp anchors and edit the OPF.

mod dom;

pub use dom::{local_name, Document, Element, NodeId, NodeKind};
