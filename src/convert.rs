//! Conversion pipeline.
//!
//! One sequential batch job: parse the book once, mirror the TOC, split the
//! body into per-section documents, complete the identifier map, rewrite
//! cross-file links over the serialized markup, reshape admonitions, collect
//! assets, and hand the assembled package to the EPUB writer. Any structural
//! failure aborts before the output file is created.

use std::path::PathBuf;

use crate::admonition::reshape_admonitions;
use crate::assets::{collect_dir, collect_images, guess_media_type, read_asset};
use crate::book::{Author, GuideEntry, Metadata, Package, StyleLink};
use crate::config::BookConfig;
use crate::dom::Dom;
use crate::epub::{self, COVER_FILE, NAV_FILE};
use crate::error::{Error, Result};
use crate::links::{IdentifierMap, rewrite_links};
use crate::split::split_sections;
use crate::toc::build_toc;

/// Id of the element carrying the book's table of contents.
const TOC_ID: &str = "toc";
/// Package path the cover image is stored under.
const COVER_IMAGE_HREF: &str = "images/cover.png";

/// Convert the configured book and write the EPUB. Returns the output path.
pub fn convert_book(config: &BookConfig) -> Result<PathBuf> {
    let html = String::from_utf8(read_asset(&config.input_path())?)?;
    let package = build_package(config, &html)?;

    let output = config.output_path();
    epub::write_package_to_path(&package, &output)?;
    log::info!("wrote {} ({} sections)", output.display(), package.nav.len());
    Ok(output)
}

/// Run the whole pipeline over already-loaded HTML, producing the package.
pub fn build_package(config: &BookConfig, html: &str) -> Result<Package> {
    let mut dom = Dom::parse(html);

    let toc_root = dom
        .element_by_id(TOC_ID)
        .ok_or_else(|| Error::MissingElement(TOC_ID.to_string()))?;

    // Pass 1: mirror the TOC, assigning output files to top-level entries.
    let mut map = IdentifierMap::new();
    let nav = build_toc(&dom, toc_root, &mut map)?;

    // Pass 2: cut sections and finish the map. Rewriting must wait until the
    // map is globally complete — links cross section boundaries both ways.
    let mut sections = split_sections(&mut dom, &nav, &mut map)?;

    let stylesheets = vec![
        StyleLink::new("styles/epub3.css"),
        StyleLink::new("styles/epub3-css3-only.css").with_media("(min-device-width: 0px)"),
    ];

    let mut package = Package::new();
    package.metadata = Metadata {
        title: config.title.clone(),
        authors: config.authors.iter().map(Author::new).collect(),
        language: config.language.clone(),
        identifier: String::new(),
        subjects: config.subjects.clone(),
        cover_image: Some(COVER_IMAGE_HREF.to_string()),
    };
    package.stylesheets = stylesheets.clone();
    package.nav = nav;

    // Pass 3: textual fixups over the serialized markup, then wrap each
    // section into its own document.
    for section in &mut sections {
        let body = rewrite_links(&section.markup, &map);
        let body = reshape_admonitions(&body);
        section.markup = epub::xhtml_document(&section.title, &stylesheets, &body);
    }

    // Images referenced by each section, deduplicated by package path.
    for section in &sections {
        for asset in collect_images(&dom, section.root, &config.root_dir)? {
            if package.get_resource(&asset.href).is_none() {
                package.add_resource(asset.href, asset.data, asset.media_type);
            }
        }
    }

    // Cover image and static assets.
    let cover_data = read_asset(&config.cover_path())?;
    package.add_resource(
        COVER_IMAGE_HREF,
        cover_data,
        guess_media_type(COVER_IMAGE_HREF),
    );
    for asset in collect_dir(
        &config.fonts_dir,
        "fonts",
        "application/x-font-truetype",
    )? {
        package.add_resource(asset.href, asset.data, asset.media_type);
    }
    for asset in collect_dir(&config.styles_dir, "styles", "text/css")? {
        package.add_resource(asset.href, asset.data, asset.media_type);
    }

    // Reading order: cover, nav, then sections in TOC order.
    package.spine.push(COVER_FILE.to_string());
    package.spine.push(NAV_FILE.to_string());
    for section in &sections {
        package.spine.push(section.output_file.clone());
    }

    if let Some(first) = sections.first() {
        package.guide.push(GuideEntry {
            kind: "text".to_string(),
            title: first
                .output_file
                .trim_end_matches(".xhtml")
                .to_string(),
            href: first.output_file.clone(),
        });
    }
    package.guide.push(GuideEntry {
        kind: "cover".to_string(),
        title: "cover".to_string(),
        href: COVER_FILE.to_string(),
    });

    for section in sections {
        package.add_resource(section.output_file, section.markup.into_bytes(), "application/xhtml+xml");
    }

    Ok(package)
}
