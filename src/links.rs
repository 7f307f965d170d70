//! Cross-reference identifier map and link repair.
//!
//! Splitting one monolithic document into per-section files breaks every
//! fragment link whose target ends up in a different file. The
//! [`IdentifierMap`] records, for every id in the original document, which
//! output file it landed in and what it is called there; [`rewrite_links`]
//! then patches serialized markup against the completed map.
//!
//! The map is filled in two waves: the TOC pass registers each top-level
//! section's own anchor, and the splitter registers every id found inside a
//! section's subtree. Only after both waves is rewriting sound — a link in
//! section N may point forward into section M > N.

use std::collections::HashMap;

/// Marker the source renderer prefixes onto machine-generated anchors.
///
/// Some target formats reject it as the first character of an identifier, so
/// it is stripped from every id that reaches the output.
pub const ID_MARKER: char = '_';

/// Strip at most one leading [`ID_MARKER`] from an id.
///
/// This is the only place an id's text is altered; display text is never
/// touched.
pub fn normalize_id(id: &str) -> &str {
    id.strip_prefix(ID_MARKER).unwrap_or(id)
}

/// Where an original id lives after the split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedId {
    /// Output file the element ended up in.
    pub file: String,
    /// The element's id inside that file (normalized).
    pub local: String,
}

/// Map from original in-document id to its post-split location.
#[derive(Debug, Default)]
pub struct IdentifierMap {
    entries: HashMap<String, ResolvedId>,
}

impl IdentifierMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an original id as living in `file` under its normalized name.
    pub fn register(&mut self, original: &str, file: &str) {
        log::debug!("id {original} -> {file}#{}", normalize_id(original));
        self.entries.insert(
            original.to_string(),
            ResolvedId {
                file: file.to_string(),
                local: normalize_id(original).to_string(),
            },
        );
    }

    pub fn resolve(&self, original: &str) -> Option<&ResolvedId> {
        self.entries.get(original)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ResolvedId)> {
        self.entries.iter()
    }
}

/// Rewrite every mapped fragment link in serialized markup.
///
/// Each ` href="#<id>"` whose id is a key of the map becomes
/// ` href="<file>#<local>"`. This is exact textual substitution over the
/// serialized form — the markup is never re-parsed, so unrelated content
/// keeps its formatting byte for byte. Fragments absent from the map are left
/// alone (external anchors or ids that were never collected).
pub fn rewrite_links(markup: &str, map: &IdentifierMap) -> String {
    let mut result = markup.to_string();
    for (original, resolved) in map.iter() {
        let needle = format!(" href=\"#{original}\"");
        if result.contains(&needle) {
            let replacement = format!(" href=\"{}#{}\"", resolved.file, resolved.local);
            result = result.replace(&needle, &replacement);
        }
    }

    for fragment in unresolved_fragments(&result) {
        log::warn!("unresolved internal link: #{fragment}");
    }

    result
}

/// Fragment targets still present after rewriting.
fn unresolved_fragments(markup: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut rest = markup;
    while let Some(pos) = rest.find(" href=\"#") {
        let tail = &rest[pos + 8..];
        match tail.find('"') {
            Some(end) => {
                found.push(&tail[..end]);
                rest = &tail[end..];
            }
            None => break,
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn map_with(entries: &[(&str, &str)]) -> IdentifierMap {
        let mut map = IdentifierMap::new();
        for (original, file) in entries {
            map.register(original, file);
        }
        map
    }

    #[test]
    fn normalize_strips_one_marker() {
        assert_eq!(normalize_id("_ch01"), "ch01");
        assert_eq!(normalize_id("ch01"), "ch01");
        assert_eq!(normalize_id(""), "");
    }

    #[test]
    fn register_normalizes_local_id() {
        let map = map_with(&[("_ch01", "section_01.xhtml")]);
        let resolved = map.resolve("_ch01").unwrap();
        assert_eq!(resolved.file, "section_01.xhtml");
        assert_eq!(resolved.local, "ch01");
    }

    #[test]
    fn rewrites_mapped_fragment() {
        let map = map_with(&[("_ch01", "section_01.xhtml")]);
        let markup = r##"<p>See <a href="#_ch01">chapter one</a>.</p>"##;
        assert_eq!(
            rewrite_links(markup, &map),
            r#"<p>See <a href="section_01.xhtml#ch01">chapter one</a>.</p>"#
        );
    }

    #[test]
    fn unmapped_fragment_is_untouched() {
        let map = map_with(&[("_ch01", "section_01.xhtml")]);
        let markup = r##"<a href="#elsewhere">?</a>"##;
        assert_eq!(rewrite_links(markup, &map), markup);
    }

    #[test]
    fn partial_id_does_not_match() {
        let map = map_with(&[("_ch", "section_01.xhtml")]);
        let markup = r##"<a href="#_ch01">not this one</a>"##;
        assert_eq!(rewrite_links(markup, &map), markup);
    }

    #[test]
    fn rewrites_all_occurrences() {
        let map = map_with(&[("_x", "section_02.xhtml")]);
        let markup = r##"<a href="#_x">a</a><a href="#_x">b</a>"##;
        let result = rewrite_links(markup, &map);
        assert_eq!(result.matches("section_02.xhtml#x").count(), 2);
        assert!(!result.contains("#_x"));
    }

    #[test]
    fn finds_unresolved_fragments() {
        let unresolved = unresolved_fragments(r##"<a href="#gone">x</a><a href="ok.xhtml#y">y</a>"##);
        assert_eq!(unresolved, vec!["gone"]);
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(id in "_?[a-z][a-z0-9-]{0,20}(_[a-z0-9]{1,8}){0,3}") {
            let once = normalize_id(&id);
            prop_assert_eq!(normalize_id(once), once);
            prop_assert!(!once.starts_with(ID_MARKER));
        }

        #[test]
        fn prop_unmapped_markup_is_byte_identical(
            id in "[a-z][a-z0-9_-]{0,16}",
            text in "[A-Za-z0-9 ]{0,24}"
        ) {
            let map = IdentifierMap::new();
            let markup = format!(r##"<a href="#{id}">{text}</a>"##);
            prop_assert_eq!(rewrite_links(&markup, &map), markup);
        }

        #[test]
        fn prop_mapped_fragment_always_resolves(
            id in "_?[a-z][a-z0-9-]{0,16}",
            file_no in 1u32..99
        ) {
            let file = format!("section_{file_no:02}.xhtml");
            let mut map = IdentifierMap::new();
            map.register(&id, &file);

            let markup = format!(r##"<p><a href="#{id}">link</a></p>"##);
            let rewritten = rewrite_links(&markup, &map);

            let expected = format!(r##"<p><a href="{file}#{}">link</a></p>"##, normalize_id(&id));
            prop_assert_eq!(rewritten, expected);
        }
    }
}
