use clap::Parser;
use docingest::IngestOptions;
use std::path::PathBuf;

/// Extract metadata, sections and text from EPUB, PDF and DOCX files
#[derive(Parser, Debug)]
#[command(name = "docingest", version, about)]
pub struct Cli {
    /// Path to the input document
    pub input: PathBuf,

    /// Write the JSON result envelope to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the full JSON result envelope instead of a summary
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Do not look for an EPUB cover image
    #[arg(long, default_value_t = false)]
    pub no_cover: bool,

    /// Read metadata only; skip chapters, pages and paragraphs
    #[arg(long, default_value_t = false)]
    pub metadata_only: bool,

    /// Maximum number of EPUB chapters to read
    #[arg(long)]
    pub max_chapters: Option<usize>,

    /// Maximum number of PDF pages to read
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Skip section detection for PDF and DOCX
    #[arg(long, default_value_t = false)]
    pub no_sections: bool,

    /// Leave the DOCX HTML rendering out of the result
    #[arg(long, default_value_t = false)]
    pub no_html: bool,

    /// Reading speed used for the time estimate
    #[arg(long)]
    pub wpm: Option<usize>,

    /// Write the EPUB cover image to this path
    #[arg(long)]
    pub cover_out: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    /// Layer the flags over `base` (normally the environment-derived options).
    pub fn apply(&self, mut options: IngestOptions) -> IngestOptions {
        if self.no_cover {
            options.epub.extract_cover = false;
        }
        if self.metadata_only {
            options.epub.extract_content = false;
            options.pdf.extract_content = false;
            options.docx.extract_content = false;
        }
        if let Some(max) = self.max_chapters {
            options.epub.max_chapters = max;
        }
        if let Some(max) = self.max_pages {
            options.pdf.max_pages = max;
        }
        if self.no_sections {
            options.pdf.detect_sections = false;
            options.docx.detect_sections = false;
        }
        if self.no_html {
            options.docx.include_html = false;
        }
        if let Some(wpm) = self.wpm {
            options.words_per_minute = wpm;
        }
        options
    }
}
