//! Startup configuration.
//!
//! Source directory, input file, title, authors, subjects and asset
//! locations, loadable from a JSON manifest and overridable by the CLI.
//! The defaults describe the book the tool was built for.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;

/// Book conversion settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BookConfig {
    /// Book title (also the default output file stem).
    pub title: String,
    /// Declared language code.
    pub language: String,
    /// Author names, in credit order.
    pub authors: Vec<String>,
    /// Subject tags.
    pub subjects: Vec<String>,
    /// Directory containing the rendered book.
    pub root_dir: PathBuf,
    /// The HTML file to convert, relative to `root_dir`.
    pub input_file: String,
    /// Cover image, relative to `root_dir`.
    pub cover: PathBuf,
    /// Directory of font files to embed.
    pub fonts_dir: PathBuf,
    /// Directory of stylesheets to embed.
    pub styles_dir: PathBuf,
    /// Output EPUB path; defaults to `<title>.epub`.
    pub output: Option<PathBuf>,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            title: "Pro Git".to_string(),
            language: "ru".to_string(),
            authors: vec!["Scott Chacon".to_string(), "Ben Straub".to_string()],
            subjects: vec!["Программирование".to_string(), "Git".to_string()],
            root_dir: PathBuf::from("."),
            input_file: "progit.html".to_string(),
            cover: PathBuf::from("book/cover.png"),
            fonts_dir: PathBuf::from("data/fonts"),
            styles_dir: PathBuf::from("data/styles"),
            output: None,
        }
    }
}

impl BookConfig {
    /// Load a configuration from a JSON manifest.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// The resolved output path.
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.epub", self.title)))
    }

    /// Absolute path of the input HTML file.
    pub fn input_path(&self) -> PathBuf {
        self.root_dir.join(&self.input_file)
    }

    /// Absolute path of the cover image.
    pub fn cover_path(&self) -> PathBuf {
        self.root_dir.join(&self.cover)
    }
}
