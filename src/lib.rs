//! # pdfsplit
//!
//! Split PDF documents into per-section Markdown using the bookmark outline.
//!
//! The outline decides where sections begin and end, down to a vertical
//! position within a page, so two sections sharing a page each receive only
//! their own text. Aligned text is recovered as Markdown tables.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfsplit::{split_file, SplitOptions};
//!
//! fn main() -> pdfsplit::Result<()> {
//!     let run = split_file("datasheet.pdf", SplitOptions::default())?;
//!     for section in &run.sections {
//!         std::fs::write(&section.file_name, &section.markdown)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Outline-driven sections**: page and y-coordinate boundaries from bookmarks
//! - **Shared pages**: fragments are partitioned between adjacent sections
//! - **Tables**: aligned text grids become Markdown pipe tables
//! - **Split levels**: merge deep sections into their parent's file
//! - **Parallel processing**: Uses Rayon to extract sections concurrently

pub mod detect;
pub mod error;
pub mod model;
pub mod parser;
pub mod render;
pub mod split;

// Re-export commonly used types
pub use detect::{is_pdf, sniff_bytes, sniff_path, PdfHeader};
pub use error::{Error, Result};
pub use model::{
    BBox, Bookmark, ContentBlock, PageLocation, ProseBlock, SectionDocument, SectionGroup,
    SectionScope, SectionSpec, TableBlock, TextFragment,
};
pub use parser::{ExtractOptions, LopdfBackend, PdfBackend, TableDetectorConfig};
pub use render::{MarkdownRenderer, RenderOptions};
pub use split::{
    ExtractionRun, OutlinePolicy, RenderedSection, SectionFailure, SectionSelection, SplitOptions,
    SplitRun, SplitSession, Splitter,
};

use std::path::Path;

/// List the sections of a PDF file.
///
/// # Example
///
/// ```no_run
/// use pdfsplit::list_sections;
///
/// for spec in list_sections("manual.pdf").unwrap() {
///     println!("{}", spec);
/// }
/// ```
pub fn list_sections<P: AsRef<Path>>(path: P) -> Result<Vec<SectionSpec>> {
    let session = Splitter::new().open(path)?;
    Ok(session.sections().to_vec())
}

/// Split a PDF file into Markdown, one entry per section.
pub fn split_file<P: AsRef<Path>>(path: P, options: SplitOptions) -> Result<SplitRun> {
    let session = Splitter::with_options(options).open(path)?;
    Ok(session.render_selected(&SectionSelection::All))
}

/// Split a PDF held in memory.
///
/// # Example
///
/// ```no_run
/// use pdfsplit::{split_bytes, SplitOptions};
///
/// let data = std::fs::read("manual.pdf").unwrap();
/// let run = split_bytes(&data, SplitOptions::new().with_split_level(1)).unwrap();
/// println!("{} files", run.sections.len());
/// ```
pub fn split_bytes(data: &[u8], options: SplitOptions) -> Result<SplitRun> {
    let session = Splitter::with_options(options).from_bytes(data)?;
    Ok(session.render_selected(&SectionSelection::All))
}

/// Render a single section (zero-based index) of a PDF file to Markdown.
pub fn section_to_markdown<P: AsRef<Path>>(path: P, index: usize) -> Result<String> {
    let session = Splitter::new().open(path)?;
    session.render_section(index)
}
