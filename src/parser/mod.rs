//! PDF parsing module.

mod backend;
mod extractor;
mod indexer;
mod memory;
mod options;
mod outline;
mod prose;
mod table_detector;

pub use backend::{ContentOp, LopdfBackend, PdfBackend, PdfValue};
pub use extractor::{page_window, SectionExtractor};
pub use indexer::{PageCache, PageTextIndexer};
pub use memory::{MemoryBackend, MemoryPage};
pub use options::{ExtractOptions, DEFAULT_MARGIN};
pub use outline::{max_level, merge_by_level, OutlineResolver};
pub use prose::{group_into_lines, ParagraphBuilder, ProseLine};
pub use table_detector::{TableDetector, TableDetectorConfig};
