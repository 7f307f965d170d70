//! Admonition block reshaping.
//!
//! The source renderer lays out note/warning callouts as nested tables, a
//! legacy convention that renders poorly in e-reader software. This pass
//! replaces each recognized block with a semantic `<aside>` carrying the
//! admonition kind, leaving the inner body untouched. It is a pure text
//! transform over serialized markup; anything that doesn't match the
//! expected shape passes through unchanged — this is cosmetic only.

use std::fmt::Write;

const BLOCK_OPEN: &str = "<div class=\"admonitionblock ";
const CONTENT_OPEN: &str = "<td class=\"content\">";
const CONTENT_CLOSE: &str = "</td>";
const TABLE_CLOSE: &str = "</table>";
const DIV_CLOSE: &str = "</div>";

/// Reshape every recognizable admonition block in the markup.
pub fn reshape_admonitions(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;

    while let Some(start) = rest.find(BLOCK_OPEN) {
        out.push_str(&rest[..start]);
        let block = &rest[start..];
        match reshape_one(block) {
            Some((replacement, consumed)) => {
                out.push_str(&replacement);
                rest = &block[consumed..];
            }
            None => {
                // Unrecognized shape: emit the opening verbatim and move on.
                out.push_str(BLOCK_OPEN);
                rest = &block[BLOCK_OPEN.len()..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Try to reshape the admonition block starting at the beginning of `block`.
/// Returns the replacement and the number of input bytes it covers.
fn reshape_one(block: &str) -> Option<(String, usize)> {
    let kind_start = BLOCK_OPEN.len();
    let kind_len = block[kind_start..].find('"')?;
    let kind = &block[kind_start..kind_start + kind_len];
    if kind.is_empty() || kind.contains('<') {
        return None;
    }

    let content_at = kind_start + kind_len + block[kind_start + kind_len..].find(CONTENT_OPEN)?;
    let body_start = content_at + CONTENT_OPEN.len();
    let body_len = block[body_start..].find(CONTENT_CLOSE)?;
    let body = &block[body_start..body_start + body_len];

    // The block must end with "</table>", whitespace, "</div>". Skip over
    // intermediate table closings that aren't followed by the div close.
    let mut search_from = body_start + body_len + CONTENT_CLOSE.len();
    loop {
        let table_at = search_from + block[search_from..].find(TABLE_CLOSE)?;
        let after_table = table_at + TABLE_CLOSE.len();
        let trailing = &block[after_table..];
        let ws_len = trailing.len() - trailing.trim_start().len();
        if trailing[ws_len..].starts_with(DIV_CLOSE) {
            let consumed = after_table + ws_len + DIV_CLOSE.len();
            let mut replacement = String::new();
            let _ = write!(
                replacement,
                "<aside class=\"admonition {kind}\" title=\"{kind}\" epub:type=\"note\">\
                 <div class=\"content\">{body}</div></aside>"
            );
            return Some((replacement, consumed));
        }
        search_from = after_table;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_block(kind: &str, body: &str) -> String {
        format!(
            r#"<div class="admonitionblock {kind}">
<table>
<tr>
<td class="icon"><i class="fa icon-{kind}" title="{kind}"></i></td>
<td class="content">{body}</td>
</tr>
</table>
</div>"#
        )
    }

    #[test]
    fn warning_block_is_reshaped() {
        let input = table_block("warning", "Do not do this");
        let output = reshape_admonitions(&input);

        assert_eq!(
            output,
            r#"<aside class="admonition warning" title="warning" epub:type="note"><div class="content">Do not do this</div></aside>"#
        );
        assert!(!output.contains("<table>"));
    }

    #[test]
    fn body_markup_is_kept_verbatim() {
        let input = table_block("note", "<p>Keep <em>this</em> &amp; that</p>");
        let output = reshape_admonitions(&input);
        assert!(output.contains("<p>Keep <em>this</em> &amp; that</p>"));
    }

    #[test]
    fn surrounding_content_is_untouched() {
        let input = format!(
            "<p>before</p>{}<p>after</p>",
            table_block("tip", "Try it")
        );
        let output = reshape_admonitions(&input);
        assert!(output.starts_with("<p>before</p><aside"));
        assert!(output.ends_with("</aside><p>after</p>"));
    }

    #[test]
    fn multiple_blocks_are_all_reshaped() {
        let input = format!(
            "{}{}",
            table_block("note", "first"),
            table_block("warning", "second")
        );
        let output = reshape_admonitions(&input);
        assert_eq!(output.matches("<aside").count(), 2);
        assert!(output.contains(r#"class="admonition note""#));
        assert!(output.contains(r#"class="admonition warning""#));
    }

    #[test]
    fn missing_content_cell_is_left_unchanged() {
        let input = r#"<div class="admonitionblock warning">
<table><tr><td class="icon">!</td></tr></table>
</div>"#;
        assert_eq!(reshape_admonitions(input), input);
    }

    #[test]
    fn non_admonition_markup_is_left_unchanged() {
        let input = r#"<div class="paragraph"><p>plain</p></div>"#;
        assert_eq!(reshape_admonitions(input), input);
    }
}
