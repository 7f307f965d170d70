//! # bookbinder
//!
//! Converts a single pre-rendered HTML book (an Asciidoctor-style static
//! export with an embedded table of contents) into an EPUB archive.
//!
//! The pipeline parses the book once, then runs a fixed sequence of passes:
//!
//! 1. Mirror the TOC's nested list into a navigation tree, assigning each
//!    top-level entry a sequential per-section output file.
//! 2. Split the body into one document per top-level entry and collect every
//!    id into a global identifier map, normalizing machine-generated anchors.
//! 3. Rewrite cross-file fragment links over the serialized markup and
//!    reshape legacy table-based admonition callouts.
//! 4. Collect referenced images, static fonts/styles, and the cover.
//! 5. Assemble and write the EPUB container.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bookbinder::{BookConfig, convert_book};
//!
//! let config = BookConfig::default();
//! let output = convert_book(&config).unwrap();
//! println!("wrote {}", output.display());
//! ```

pub mod admonition;
pub mod assets;
pub mod book;
pub mod config;
pub mod convert;
pub mod dom;
pub mod epub;
pub mod error;
pub mod links;
pub mod split;
pub mod toc;

pub use book::{Author, GuideEntry, Metadata, Package, Resource, StyleLink};
pub use config::BookConfig;
pub use convert::{build_package, convert_book};
pub use error::{Error, Result};
pub use links::{IdentifierMap, ResolvedId, normalize_id};
pub use split::SectionDocument;
pub use toc::NavEntry;
