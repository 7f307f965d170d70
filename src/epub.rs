//! EPUB package assembly.
//!
//! Serializes a [`Package`] into a standard EPUB container: stored mimetype
//! first, then container.xml, the OPF package document (metadata, manifest,
//! spine, guide), an NCX for EPUB 2 readers, an EPUB 3 nav document mirroring
//! the navigation tree, a generated cover page, and every collected resource.
//! All XML is assembled as text with explicit escaping.

use std::fmt::Write as _;
use std::io::{Seek, Write};
use std::path::Path;

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::book::{Package, StyleLink};
use crate::error::Result;
use crate::toc::NavEntry;

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

pub const NAV_FILE: &str = "nav.xhtml";
pub const COVER_FILE: &str = "cover.xhtml";

/// Write a [`Package`] to an EPUB file on disk.
pub fn write_package_to_path<P: AsRef<Path>>(pkg: &Package, path: P) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_package(pkg, file)
}

/// Write a [`Package`] to any [`Write`] + [`Seek`] destination.
pub fn write_package<W: Write + Seek>(pkg: &Package, writer: W) -> Result<()> {
    let mut zip = ZipWriter::new(writer);

    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let deflated =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    // The mimetype must be the first entry and uncompressed.
    zip.start_file("mimetype", stored)?;
    zip.write_all(b"application/epub+zip")?;

    zip.start_file("META-INF/container.xml", deflated)?;
    zip.write_all(CONTAINER_XML.as_bytes())?;

    // Generate the identifier once so OPF and NCX agree.
    let identifier = if pkg.metadata.identifier.is_empty() {
        format!("urn:uuid:{}", uuid_v4())
    } else {
        pkg.metadata.identifier.clone()
    };

    zip.start_file("OEBPS/content.opf", deflated)?;
    zip.write_all(generate_opf(pkg, &identifier).as_bytes())?;

    zip.start_file("OEBPS/toc.ncx", deflated)?;
    zip.write_all(generate_ncx(pkg, &identifier).as_bytes())?;

    zip.start_file(&format!("OEBPS/{NAV_FILE}"), deflated)?;
    zip.write_all(generate_nav_document(pkg).as_bytes())?;

    if pkg.metadata.cover_image.is_some() {
        zip.start_file(&format!("OEBPS/{COVER_FILE}"), deflated)?;
        zip.write_all(generate_cover_page(pkg).as_bytes())?;
    }

    for (href, resource) in &pkg.resources {
        zip.start_file(&format!("OEBPS/{href}"), deflated)?;
        zip.write_all(&resource.data)?;
    }

    zip.finish()?;
    Ok(())
}

// ============================================================================
// OPF package document
// ============================================================================

fn generate_opf(pkg: &Package, identifier: &str) -> String {
    let mut opf = String::new();

    opf.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="BookId">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
"#,
    );

    let _ = writeln!(
        opf,
        "    <dc:identifier id=\"BookId\">{}</dc:identifier>",
        escape_xml(identifier)
    );
    let _ = writeln!(
        opf,
        "    <dc:title>{}</dc:title>",
        escape_xml(&pkg.metadata.title)
    );

    let language = if pkg.metadata.language.is_empty() {
        "en"
    } else {
        &pkg.metadata.language
    };
    let _ = writeln!(opf, "    <dc:language>{}</dc:language>", language);

    for author in &pkg.metadata.authors {
        let _ = writeln!(
            opf,
            "    <dc:creator id=\"{}\">{}</dc:creator>",
            escape_xml(&author.id),
            escape_xml(&author.name)
        );
        let _ = writeln!(
            opf,
            "    <meta refines=\"#{}\" property=\"role\" scheme=\"marc:relators\">aut</meta>",
            escape_xml(&author.id)
        );
    }

    for subject in &pkg.metadata.subjects {
        let _ = writeln!(opf, "    <dc:subject>{}</dc:subject>", escape_xml(subject));
    }

    if pkg.metadata.cover_image.is_some() {
        opf.push_str("    <meta name=\"cover\" content=\"cover-image\"/>\n");
    }

    opf.push_str("  </metadata>\n  <manifest>\n");

    opf.push_str(
        "    <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n",
    );
    let _ = writeln!(
        opf,
        "    <item id=\"nav\" href=\"{NAV_FILE}\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>"
    );
    if pkg.metadata.cover_image.is_some() {
        let _ = writeln!(
            opf,
            "    <item id=\"cover\" href=\"{COVER_FILE}\" media-type=\"application/xhtml+xml\"/>"
        );
    }

    for (href, resource) in &pkg.resources {
        let _ = writeln!(
            opf,
            "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"/>",
            manifest_id(pkg, href),
            escape_xml(href),
            escape_xml(&resource.media_type)
        );
    }

    opf.push_str("  </manifest>\n  <spine toc=\"ncx\">\n");

    for href in &pkg.spine {
        let _ = writeln!(opf, "    <itemref idref=\"{}\"/>", manifest_id(pkg, href));
    }

    opf.push_str("  </spine>\n");

    if !pkg.guide.is_empty() {
        opf.push_str("  <guide>\n");
        for entry in &pkg.guide {
            let _ = writeln!(
                opf,
                "    <reference type=\"{}\" title=\"{}\" href=\"{}\"/>",
                escape_xml(&entry.kind),
                escape_xml(&entry.title),
                escape_xml(&entry.href)
            );
        }
        opf.push_str("  </guide>\n");
    }

    opf.push_str("</package>\n");
    opf
}

/// Manifest id for a package href.
fn manifest_id(pkg: &Package, href: &str) -> String {
    if pkg.metadata.cover_image.as_deref() == Some(href) {
        return "cover-image".to_string();
    }
    match href {
        NAV_FILE => "nav".to_string(),
        COVER_FILE => "cover".to_string(),
        _ => href_to_id(href),
    }
}

fn href_to_id(href: &str) -> String {
    href.replace(['/', '.', ' ', '-'], "_")
}

// ============================================================================
// NCX (EPUB 2 navigation)
// ============================================================================

fn generate_ncx(pkg: &Package, identifier: &str) -> String {
    let mut ncx = String::new();

    ncx.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content=""#,
    );
    ncx.push_str(&escape_xml(identifier));
    let _ = write!(
        ncx,
        r#""/>
    <meta name="dtb:depth" content="{}"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
    <text>"#,
        nav_depth(&pkg.nav)
    );
    ncx.push_str(&escape_xml(&pkg.metadata.title));
    ncx.push_str(
        r#"</text>
  </docTitle>
  <navMap>
"#,
    );

    let mut play_order = 1;
    for entry in &pkg.nav {
        write_nav_point(&mut ncx, entry, &mut play_order, 2);
    }

    ncx.push_str("  </navMap>\n</ncx>\n");
    ncx
}

fn write_nav_point(ncx: &mut String, entry: &NavEntry, play_order: &mut usize, indent: usize) {
    let indent_str = "  ".repeat(indent);

    let _ = writeln!(
        ncx,
        "{indent_str}<navPoint id=\"navpoint-{play_order}\" playOrder=\"{play_order}\">"
    );
    let _ = writeln!(
        ncx,
        "{indent_str}  <navLabel>\n{indent_str}    <text>{}</text>\n{indent_str}  </navLabel>",
        escape_xml(&entry.title)
    );
    let _ = writeln!(
        ncx,
        "{indent_str}  <content src=\"{}\"/>",
        escape_xml(&entry.output_file)
    );

    *play_order += 1;

    for child in &entry.children {
        write_nav_point(ncx, child, play_order, indent + 1);
    }

    let _ = writeln!(ncx, "{indent_str}</navPoint>");
}

fn nav_depth(entries: &[NavEntry]) -> usize {
    entries
        .iter()
        .map(|e| 1 + nav_depth(&e.children))
        .max()
        .unwrap_or(0)
        .max(1)
}

// ============================================================================
// Nav document (EPUB 3) and cover page
// ============================================================================

fn generate_nav_document(pkg: &Package) -> String {
    let mut body = String::from("<nav epub:type=\"toc\" id=\"toc\">\n  <ol>\n");
    for entry in &pkg.nav {
        write_nav_item(&mut body, entry, 2);
    }
    body.push_str("  </ol>\n</nav>");

    xhtml_document(&pkg.metadata.title, &pkg.stylesheets, &body)
}

fn write_nav_item(out: &mut String, entry: &NavEntry, indent: usize) {
    let indent_str = "  ".repeat(indent);
    let _ = writeln!(
        out,
        "{indent_str}<li><a href=\"{}\">{}</a>",
        escape_xml(&entry.output_file),
        escape_xml(&entry.title)
    );
    if !entry.children.is_empty() {
        let _ = writeln!(out, "{indent_str}<ol>");
        for child in &entry.children {
            write_nav_item(out, child, indent + 1);
        }
        let _ = writeln!(out, "{indent_str}</ol>");
    }
    let _ = writeln!(out, "{indent_str}</li>");
}

fn generate_cover_page(pkg: &Package) -> String {
    let src = pkg.metadata.cover_image.as_deref().unwrap_or_default();
    let body = format!(
        "<div epub:type=\"cover\" id=\"cover\">\n  <img src=\"{}\" alt=\"cover\"/>\n</div>",
        escape_xml(src)
    );
    xhtml_document(&pkg.metadata.title, &pkg.stylesheets, &body)
}

/// Wrap body markup in a complete XHTML document shell.
///
/// Every produced page (sections included) goes through this: EPUB 3 doctype,
/// the `epub:` namespace for semantic annotations, and the given stylesheet
/// links in the head.
pub fn xhtml_document(title: &str, stylesheets: &[StyleLink], body: &str) -> String {
    let mut doc = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head>
  <meta http-equiv="Content-Type" content="application/xhtml+xml; charset=utf-8"/>
  <title>"#,
    );
    doc.push_str(&escape_xml(title));
    doc.push_str("</title>\n");

    for link in stylesheets {
        match &link.media {
            Some(media) => {
                let _ = writeln!(
                    doc,
                    "  <link rel=\"stylesheet\" type=\"text/css\" href=\"{}\" media=\"{}\"/>",
                    escape_xml(&link.href),
                    escape_xml(media)
                );
            }
            None => {
                let _ = writeln!(
                    doc,
                    "  <link rel=\"stylesheet\" type=\"text/css\" href=\"{}\"/>",
                    escape_xml(&link.href)
                );
            }
        }
    }

    doc.push_str("</head>\n<body>\n");
    doc.push_str(body);
    doc.push_str("\n</body>\n</html>\n");
    doc
}

pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Generate a simple UUID v4 (random enough for a package identifier).
fn uuid_v4() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);

    let mut state = seed;
    let mut bytes = [0u8; 16];
    for byte in &mut bytes {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        *byte = (state >> 33) as u8;
    }

    // Set version (4) and variant (2)
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let mut out = String::with_capacity(36);
    for (i, b) in bytes.iter().enumerate() {
        if matches!(i, 4 | 6 | 8 | 10) {
            out.push('-');
        }
        let _ = write!(out, "{b:02x}");
    }
    out
}
