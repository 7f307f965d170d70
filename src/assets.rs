//! Asset collection.
//!
//! Pure copying: images referenced by sections, static font and stylesheet
//! directories, and the cover image are read once and handed to the package
//! as-is. A file that cannot be found is fatal — a dangling reference would
//! silently corrupt the output package.

use std::fs;
use std::io;
use std::path::Path;

use crate::dom::{Dom, NodeId};
use crate::error::{Error, Result};

/// One file destined for the output package.
#[derive(Debug, Clone)]
pub struct CollectedAsset {
    /// Path inside the package (matches the reference in the markup).
    pub href: String,
    pub data: Vec<u8>,
    pub media_type: String,
}

/// Collect every image referenced by `<img src>` under a section root.
///
/// Paths are taken relative to the book's source directory, exactly as they
/// appear in the markup — the package keeps the same layout so the
/// references stay valid without rewriting.
pub fn collect_images(dom: &Dom, root: NodeId, source_dir: &Path) -> Result<Vec<CollectedAsset>> {
    let mut assets = Vec::new();
    for node in dom.descendants(root) {
        if dom.element_name(node).is_none_or(|n| n.as_ref() != "img") {
            continue;
        }
        let Some(src) = dom.attr(node, "src") else {
            continue;
        };
        let data = read_asset(&source_dir.join(src))?;
        assets.push(CollectedAsset {
            href: src.to_string(),
            data,
            media_type: guess_media_type(src).to_string(),
        });
    }
    Ok(assets)
}

/// Collect every file of a static asset directory under `prefix/` in the
/// package, in stable name order.
pub fn collect_dir(dir: &Path, prefix: &str, media_type: &str) -> Result<Vec<CollectedAsset>> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map_err(|e| not_found_to_missing(e, dir))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();

    let mut assets = Vec::with_capacity(names.len());
    for name in names {
        let data = read_asset(&dir.join(&name))?;
        assets.push(CollectedAsset {
            href: format!("{prefix}/{name}"),
            data,
            media_type: media_type.to_string(),
        });
    }
    Ok(assets)
}

/// Read a single asset file.
pub fn read_asset(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| not_found_to_missing(e, path))
}

fn not_found_to_missing(e: io::Error, path: &Path) -> Error {
    if e.kind() == io::ErrorKind::NotFound {
        Error::MissingAsset(path.to_path_buf())
    } else {
        Error::Io(e)
    }
}

/// Guess a media type from a file extension.
pub fn guess_media_type(path: &str) -> &'static str {
    let ext = path.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "css" => "text/css",
        "ttf" => "application/x-font-truetype",
        "otf" => "application/vnd.ms-opentype",
        "woff" => "application/font-woff",
        "xhtml" | "html" | "htm" => "application/xhtml+xml",
        _ => "application/octet-stream",
    }
}
