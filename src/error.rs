//! Error types for bookbinder operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while converting a book.
///
/// Structural input errors and missing assets are fatal: the conversion
/// aborts before any output is written. Unresolvable internal links and
/// unrecognized admonition shapes are handled inline and never reach here.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("invalid book manifest: {0}")]
    Config(#[from] serde_json::Error),

    #[error("missing required element: {0}")]
    MissingElement(String),

    #[error("malformed table of contents: {0}")]
    MalformedToc(String),

    #[error("section anchor \"{0}\" not found in document")]
    SectionAnchorMissing(String),

    #[error("section anchor \"{0}\" matches more than one element")]
    SectionAnchorDuplicated(String),

    #[error("missing asset: {0}")]
    MissingAsset(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
