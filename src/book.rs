//! In-memory representation of the output package.
//!
//! Everything the assembler needs to write one EPUB: metadata, the navigation
//! tree, reading order, guide references, stylesheet links for generated
//! pages, and every resource keyed by its package-internal path. Resources
//! live in a BTreeMap so the manifest comes out in a deterministic order.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::toc::NavEntry;

/// The assembled book, ready for serialization.
#[derive(Debug, Default)]
pub struct Package {
    pub metadata: Metadata,
    /// Package-internal hrefs in reading order.
    pub spine: Vec<String>,
    /// Hierarchical navigation tree.
    pub nav: Vec<NavEntry>,
    pub guide: Vec<GuideEntry>,
    /// Stylesheet links attached to generated pages (nav, cover).
    pub stylesheets: Vec<StyleLink>,
    pub resources: BTreeMap<String, Resource>,
}

/// Descriptive metadata (Dublin Core).
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub title: String,
    pub authors: Vec<Author>,
    pub language: String,
    pub identifier: String,
    pub subjects: Vec<String>,
    /// Package href of the cover image, if any.
    pub cover_image: Option<String>,
}

/// A creator with a unique in-package identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub id: String,
}

impl Author {
    /// Create an author with a fresh unique id (`a` + 7 hex digits).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: format!("a{:07x}", next_uid() & 0xfff_ffff),
        }
    }
}

/// A legacy guide reference.
#[derive(Debug, Clone)]
pub struct GuideEntry {
    pub kind: String,
    pub title: String,
    pub href: String,
}

/// A stylesheet link, optionally gated by a media query.
#[derive(Debug, Clone)]
pub struct StyleLink {
    pub href: String,
    pub media: Option<String>,
}

impl StyleLink {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            media: None,
        }
    }

    pub fn with_media(mut self, media: impl Into<String>) -> Self {
        self.media = Some(media.into());
        self
    }
}

/// A resource (content document, image, CSS, font, etc.)
#[derive(Debug, Clone)]
pub struct Resource {
    pub data: Vec<u8>,
    pub media_type: String,
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource to the package.
    pub fn add_resource(
        &mut self,
        href: impl Into<String>,
        data: Vec<u8>,
        media_type: impl Into<String>,
    ) {
        self.resources.insert(
            href.into(),
            Resource {
                data,
                media_type: media_type.into(),
            },
        );
    }

    pub fn get_resource(&self, href: &str) -> Option<&Resource> {
        self.resources.get(href)
    }
}

impl Metadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_author(mut self, name: impl Into<String>) -> Self {
        self.authors.push(Author::new(name));
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subjects.push(subject.into());
        self
    }
}

/// Process-unique counter mixed with a time seed; author ids only need to be
/// distinct within one package.
fn next_uid() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    (seed ^ (n.wrapping_mul(0x9e3779b97f4a7c15))).wrapping_mul(6364136223846793005)
}
