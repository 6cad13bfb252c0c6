//! Rendering module for converting extracted sections to Markdown.

mod filename;
mod markdown;
mod normalize;
mod options;

pub use filename::{sanitize_title, FileNamer};
pub use markdown::{table_to_markdown, to_markdown, MarkdownRenderer};
pub use normalize::normalize;
pub use options::RenderOptions;
