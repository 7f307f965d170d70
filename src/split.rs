//! Section splitting.
//!
//! Each top-level TOC entry addresses a heading inside the body; the source
//! renderer's convention is that the heading's *parent* element is the actual
//! sectioning container. The splitter cuts one [`SectionDocument`] per entry
//! out of the parsed book, in TOC order, and completes the identifier map by
//! scanning every id inside each section. Ids are renamed in the DOM at the
//! same time, so the markup each file ends up with is self-consistent.

use crate::dom::{Dom, NodeId, serialize_subtree};
use crate::error::{Error, Result};
use crate::links::{IdentifierMap, normalize_id};
use crate::toc::NavEntry;

/// The extracted subtree for one top-level TOC entry.
#[derive(Debug)]
pub struct SectionDocument {
    pub output_file: String,
    pub title: String,
    /// Root of the section's subtree in the book DOM.
    pub root: NodeId,
    /// Serialized markup; produced lazily, after id renaming.
    pub markup: String,
}

/// Cut one section per top-level entry and finish the identifier map.
///
/// Must run to completion before any link rewriting: a link in an early
/// section may target an id that only gets registered while scanning a later
/// one.
pub fn split_sections(
    dom: &mut Dom,
    entries: &[NavEntry],
    map: &mut IdentifierMap,
) -> Result<Vec<SectionDocument>> {
    let mut sections = Vec::with_capacity(entries.len());

    for entry in entries {
        let root = locate_section_root(dom, &entry.original_id)?;
        register_subtree_ids(dom, root, &entry.output_file, map);
        sections.push(SectionDocument {
            output_file: entry.output_file.clone(),
            title: entry.title.clone(),
            root,
            markup: String::new(),
        });
        log::info!("section {} <- #{}", entry.output_file, entry.original_id);
    }

    // Serialize only after every section has been scanned and renamed.
    for section in &mut sections {
        section.markup = serialize_subtree(dom, section.root);
    }

    Ok(sections)
}

/// Resolve a TOC anchor to its sectioning container (the anchor's parent).
fn locate_section_root(dom: &Dom, original_id: &str) -> Result<NodeId> {
    if dom.id_is_duplicated(original_id) {
        return Err(Error::SectionAnchorDuplicated(original_id.to_string()));
    }
    let anchor = dom
        .element_by_id(original_id)
        .ok_or_else(|| Error::SectionAnchorMissing(original_id.to_string()))?;
    dom.parent(anchor)
        .ok_or_else(|| Error::SectionAnchorMissing(original_id.to_string()))
}

/// Register every id under `root` and rename it to its normalized form.
fn register_subtree_ids(dom: &mut Dom, root: NodeId, output_file: &str, map: &mut IdentifierMap) {
    let carried: Vec<(NodeId, String)> = dom
        .descendants(root)
        .into_iter()
        .filter_map(|id| dom.element_id(id).map(|v| (id, v.to_string())))
        .collect();

    for (node, original) in carried {
        map.register(&original, output_file);
        let normalized = normalize_id(&original);
        if normalized != original {
            dom.set_attr(node, "id", normalized);
        }
    }
}
