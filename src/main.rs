//! bookbinder - pre-rendered HTML book to EPUB converter

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use bookbinder::BookConfig;

#[derive(Parser)]
#[command(name = "bookbinder")]
#[command(version, about = "Convert a pre-rendered HTML book into an EPUB archive", long_about = None)]
#[command(after_help = "EXAMPLES:
    bookbinder --root ./progit2-ru-master             Convert with built-in defaults
    bookbinder -c book.json -o out.epub               Convert per JSON manifest
    bookbinder --root . --input book.html --title T   Override individual settings")]
struct Cli {
    /// JSON manifest describing the book (title, authors, directories)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory containing the rendered book
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// HTML file to convert, relative to the root directory
    #[arg(long, value_name = "FILE")]
    input: Option<String>,

    /// Output EPUB path
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Book title
    #[arg(long)]
    title: Option<String>,

    /// Author name (repeatable)
    #[arg(long = "author", value_name = "NAME")]
    authors: Vec<String>,

    /// Subject tag (repeatable)
    #[arg(long = "subject", value_name = "TAG")]
    subjects: Vec<String>,

    /// Declared language code
    #[arg(long, value_name = "CODE")]
    language: Option<String>,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> bookbinder::Result<()> {
    let mut config = match &cli.config {
        Some(path) => BookConfig::load(path)?,
        None => BookConfig::default(),
    };

    if let Some(root) = cli.root {
        config.root_dir = root;
    }
    if let Some(input) = cli.input {
        config.input_file = input;
    }
    if let Some(output) = cli.output {
        config.output = Some(output);
    }
    if let Some(title) = cli.title {
        config.title = title;
    }
    if !cli.authors.is_empty() {
        config.authors = cli.authors;
    }
    if !cli.subjects.is_empty() {
        config.subjects = cli.subjects;
    }
    if let Some(language) = cli.language {
        config.language = language;
    }

    bookbinder::convert_book(&config)?;
    Ok(())
}
