//! In-memory [`PdfBackend`] for documents that were parsed elsewhere.
//!
//! Pages are described directly as content operations, so callers that
//! already hold positioned text (or tests) can drive the whole pipeline
//! without a PDF file.

use super::backend::{ContentOp, PdfBackend, PdfValue};
use crate::error::Result;
use crate::model::{Bookmark, PageBox};

/// Ratio of ascent to font size used when placing text by its top edge.
const ASCENT_RATIO: f32 = 0.8;

/// One page of a [`MemoryBackend`].
#[derive(Debug, Clone)]
pub struct MemoryPage {
    pub page_box: PageBox,
    pub operations: Vec<ContentOp>,
}

impl MemoryPage {
    /// An empty page of the given size.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            page_box: PageBox::new(0.0, 0.0, width, height),
            operations: Vec::new(),
        }
    }

    /// Show `text` with its top edge at top-down offset `top`.
    pub fn text(mut self, x: f32, top: f32, size: f32, text: &str) -> Self {
        let baseline = self.page_box.top - top - ASCENT_RATIO * size;
        self.operations.extend([
            ContentOp::new("BT", vec![]),
            ContentOp::new("Tf", vec![PdfValue::Name(b"F1".to_vec()), PdfValue::Real(size)]),
            ContentOp::new(
                "Tm",
                vec![
                    PdfValue::Integer(1),
                    PdfValue::Integer(0),
                    PdfValue::Integer(0),
                    PdfValue::Integer(1),
                    PdfValue::Real(x),
                    PdfValue::Real(baseline),
                ],
            ),
            ContentOp::new("Tj", vec![PdfValue::Text(text.to_string())]),
            ContentOp::new("ET", vec![]),
        ]);
        self
    }

    /// Append raw operations.
    pub fn ops(mut self, ops: impl IntoIterator<Item = ContentOp>) -> Self {
        self.operations.extend(ops);
        self
    }
}

/// A document held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    pages: Vec<MemoryPage>,
    bookmarks: Vec<Bookmark>,
    title: Option<String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: MemoryPage) -> Self {
        self.pages.push(page);
        self
    }

    pub fn with_bookmark(mut self, bookmark: Bookmark) -> Self {
        self.bookmarks.push(bookmark);
        self
    }

    pub fn with_bookmarks(mut self, bookmarks: impl IntoIterator<Item = Bookmark>) -> Self {
        self.bookmarks.extend(bookmarks);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl PdfBackend for MemoryBackend {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_box(&self, page_index: usize) -> Result<PageBox> {
        self.check_page(page_index)?;
        Ok(self.pages[page_index].page_box)
    }

    fn page_operations(&self, page_index: usize) -> Result<Vec<ContentOp>> {
        self.check_page(page_index)?;
        Ok(self.pages[page_index].operations.clone())
    }

    fn bookmarks(&self) -> Result<Vec<Bookmark>> {
        Ok(self.bookmarks.clone())
    }

    fn title(&self) -> Option<String> {
        self.title.clone()
    }
}
