//! XHTML serialization of DOM subtrees.
//!
//! Each section is serialized exactly once, before link rewriting; the later
//! textual passes (link repair, admonition reshaping) never re-parse the
//! markup, so whitespace and attribute order survive untouched.

use std::fmt::Write;

use super::{Dom, NodeData, NodeId};

/// Serialize a node and its descendants to XHTML markup.
///
/// The root element itself is included. Doctypes are dropped; the package
/// assembler wraps every section in its own document shell.
pub fn serialize_subtree(dom: &Dom, root: NodeId) -> String {
    let mut out = String::new();
    write_node(dom, root, &mut out);
    out
}

fn write_node(dom: &Dom, id: NodeId, out: &mut String) {
    let Some(node) = dom.get(id) else { return };
    match &node.data {
        NodeData::Document => {
            for child in dom.children(id) {
                write_node(dom, child, out);
            }
        }
        NodeData::Doctype(_) => {}
        NodeData::Comment(text) => {
            let _ = write!(out, "<!--{}-->", text);
        }
        NodeData::Text(text) => out.push_str(&escape_text(text)),
        NodeData::Element { name, attrs, .. } => {
            let tag = name.local.as_ref();
            out.push('<');
            out.push_str(tag);
            for attr in attrs {
                let _ = write!(
                    out,
                    " {}=\"{}\"",
                    attr.name.local.as_ref(),
                    escape_attr(&attr.value)
                );
            }
            if is_void(tag) {
                out.push_str("/>");
            } else {
                out.push('>');
                for child in dom.children(id) {
                    write_node(dom, child, out);
                }
                let _ = write!(out, "</{}>", tag);
            }
        }
    }
}

/// Elements serialized self-closing in XHTML.
fn is_void(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Escape character data.
pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape an attribute value.
pub fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
