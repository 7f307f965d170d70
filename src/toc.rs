//! Table-of-contents mirroring.
//!
//! The source book carries its TOC as a nested `<ul><li>` tree; every list
//! item's first hyperlink names the section anchor it points at. This pass
//! mirrors that list into a [`NavEntry`] tree and assigns each *top-level*
//! item a sequential output file. Sub-entries live inside their parent's
//! file, so they share its name and are registered in the identifier map
//! later, when the splitter scans the section's subtree.

use crate::dom::{Dom, NodeId};
use crate::error::{Error, Result};
use crate::links::IdentifierMap;

/// One node of the navigation tree.
///
/// Built once during the TOC pass and read-only afterward. `output_file`
/// values are assigned by a single counter over top-level entries; children
/// inherit their parent's file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    /// Anchor id in the source document (marker prefix intact).
    pub original_id: String,
    /// Per-section output file this entry points into.
    pub output_file: String,
    /// Link text, verbatim (may be empty).
    pub title: String,
    pub children: Vec<NavEntry>,
}

/// Format the output file name for the n-th top-level section (1-based).
pub fn section_file_name(index: usize) -> String {
    format!("section_{index:02}.xhtml")
}

/// Build the navigation tree from the TOC root element.
///
/// `toc_root` is the element carrying the TOC (its direct `<ul>` child holds
/// the top-level items). Registers every top-level entry's anchor in `map` as
/// it is assigned a file.
pub fn build_toc(dom: &Dom, toc_root: NodeId, map: &mut IdentifierMap) -> Result<Vec<NavEntry>> {
    let Some(list) = dom.first_child_element(toc_root, "ul") else {
        return Err(Error::MalformedToc(
            "table of contents has no list".to_string(),
        ));
    };

    let mut entries = Vec::new();
    let mut counter = 0usize;
    for item in dom.children(list) {
        if dom.element_name(item).is_none_or(|n| n.as_ref() != "li") {
            continue;
        }
        counter += 1;
        let output_file = section_file_name(counter);
        let entry = build_entry(dom, item, &output_file)?;
        map.register(&entry.original_id, &output_file);
        entries.push(entry);
    }

    Ok(entries)
}

/// Build one entry (and its subtree) from a `<li>`. Children are attached
/// bottom-up via the return value; nothing is mutated in place.
fn build_entry(dom: &Dom, item: NodeId, output_file: &str) -> Result<NavEntry> {
    let Some(link) = dom.first_child_element(item, "a") else {
        // A missing link would silently drop a whole section from the book.
        return Err(Error::MalformedToc(
            "list item has no hyperlink child".to_string(),
        ));
    };

    let href = dom.attr(link, "href").unwrap_or_default();
    let original_id = href.strip_prefix('#').unwrap_or(href).to_string();
    let title = dom.text_content(link);

    let mut children = Vec::new();
    if let Some(sublist) = dom.first_child_element(item, "ul") {
        for child in dom.children(sublist) {
            if dom.element_name(child).is_some_and(|n| n.as_ref() == "li") {
                children.push(build_entry(dom, child, output_file)?);
            }
        }
    }

    Ok(NavEntry {
        original_id,
        output_file: output_file.to_string(),
        title,
        children,
    })
}
