//! Document model types shared by the parser and the renderer.
//!
//! Everything here is plain data: page geometry, positioned text, the
//! resolved outline and the extracted section content.

mod fragment;
mod geometry;
mod outline;
mod section;
mod table;

pub use fragment::{PageText, TextFragment};
pub use geometry::{BBox, PageBox, PageLocation};
pub use outline::{Bookmark, OutlineNode, SectionGroup, SectionRange, SectionScope, SectionSpec};
pub use section::{ContentBlock, ProseBlock, SectionDocument};
pub use table::TableBlock;
