//! Section extraction.
//!
//! A section's content is the set of fragments whose vertical center falls
//! inside the section's half-open `[start, end)` span, taken page by page.
//! Fragments are sliced by that window *before* table detection, so two
//! sections sharing a page never see each other's text.

use std::ops::Range;

use super::backend::PdfBackend;
use super::indexer::{PageCache, PageTextIndexer};
use super::options::ExtractOptions;
use super::prose::{group_into_lines, ParagraphBuilder, ProseLine};
use super::table_detector::TableDetector;
use crate::error::{Error, Result};
use crate::model::{
    ContentBlock, PageText, SectionDocument, SectionRange, SectionScope, SectionSpec, TableBlock,
    TextFragment,
};

const ALL: Range<f32> = f32::NEG_INFINITY..f32::INFINITY;

/// Extracts [`SectionDocument`]s from a document, sharing indexed pages
/// through a [`PageCache`].
pub struct SectionExtractor<'a, B: PdfBackend + ?Sized> {
    backend: &'a B,
    cache: &'a PageCache,
    options: &'a ExtractOptions,
    indexer: PageTextIndexer,
    detector: TableDetector,
}

impl<'a, B: PdfBackend + ?Sized> SectionExtractor<'a, B> {
    pub fn new(backend: &'a B, cache: &'a PageCache, options: &'a ExtractOptions) -> Self {
        Self {
            backend,
            cache,
            options,
            indexer: PageTextIndexer::new(),
            detector: TableDetector::with_config(options.table.clone()),
        }
    }

    /// Extract a section using the configured scope.
    pub fn extract(&self, spec: &SectionSpec) -> Result<SectionDocument> {
        self.extract_with_scope(spec, self.options.scope)
    }

    /// Extract a section using an explicit scope.
    pub fn extract_with_scope(&self, spec: &SectionSpec, scope: SectionScope) -> Result<SectionDocument> {
        let range = spec.range(scope);
        let page_count = self.backend.page_count();
        for page in [range.start.page_index, range.end.page_index] {
            if page >= page_count {
                return Err(Error::PageRange {
                    page: page + 1,
                    page_count,
                });
            }
        }

        let mut doc = SectionDocument::new(spec.clone());
        if range.is_empty() {
            log::debug!("Section '{}' is empty ({})", spec.title, range.start);
            return Ok(doc);
        }

        for page_index in range.start.page_index..=range.end.page_index {
            let window = page_window(&range, page_index);
            if window.start >= window.end {
                continue;
            }
            let page = self
                .cache
                .get_or_index(self.backend, &self.indexer, page_index)?;
            doc.blocks.extend(self.extract_page(&page, window));
        }

        log::debug!(
            "Extracted '{}': {} blocks ({} tables)",
            spec.title,
            doc.blocks.len(),
            doc.tables().count()
        );
        Ok(doc)
    }

    /// Fragments of a page that belong to the window, minus header and
    /// footer bands.
    pub fn slice_page(&self, page: &PageText, window: Range<f32>) -> Vec<TextFragment> {
        let header = self.options.header_margin;
        let footer = self.options.footer_margin;
        page.fragments_between(window.start, window.end)
            .filter(|f| {
                let cy = f.center_y();
                !(header > 0.0 && cy < header) && !(footer > 0.0 && cy > page.height - footer)
            })
            .cloned()
            .collect()
    }

    fn extract_page(&self, page: &PageText, window: Range<f32>) -> Vec<ContentBlock> {
        let fragments = self.slice_page(page, window);
        if fragments.is_empty() {
            return Vec::new();
        }

        let (tables, remaining) = self.detector.detect(fragments, ALL);
        let lines = group_into_lines(remaining, self.options.table.row_tolerance);
        merge_reading_order(lines, tables, self.options.paragraph_gap_factor)
    }
}

/// The `[lo, hi)` window of vertical centers a range covers on one page.
pub fn page_window(range: &SectionRange, page_index: usize) -> Range<f32> {
    let lo = if page_index == range.start.page_index {
        range.start.y
    } else {
        f32::NEG_INFINITY
    };
    let hi = if page_index == range.end.page_index && !range.closed {
        range.end.y
    } else {
        f32::INFINITY
    };
    lo..hi
}

enum Item {
    Line(ProseLine),
    Table(TableBlock),
}

impl Item {
    fn sort_key(&self) -> (f32, usize) {
        match self {
            Item::Line(l) => (l.bbox.y0, l.order.saturating_add(1)),
            Item::Table(t) => (t.bbox.y0, 0),
        }
    }
}

/// Interleave lines and tables top to bottom, folding lines into paragraphs.
fn merge_reading_order(lines: Vec<ProseLine>, tables: Vec<TableBlock>, gap_factor: f32) -> Vec<ContentBlock> {
    let mut items: Vec<Item> = lines
        .into_iter()
        .map(Item::Line)
        .chain(tables.into_iter().map(Item::Table))
        .collect();
    items.sort_by(|a, b| {
        let (ay, ao) = a.sort_key();
        let (by, bo) = b.sort_key();
        ay.total_cmp(&by).then(ao.cmp(&bo))
    });

    let mut blocks = Vec::new();
    let mut paragraph = ParagraphBuilder::new(gap_factor);
    for item in items {
        match item {
            Item::Line(line) => {
                if let Some(done) = paragraph.push(line) {
                    blocks.push(ContentBlock::Prose(done));
                }
            }
            Item::Table(table) => {
                if let Some(done) = paragraph.finish() {
                    blocks.push(ContentBlock::Prose(done));
                }
                blocks.push(ContentBlock::Table(table));
            }
        }
    }
    if let Some(done) = paragraph.finish() {
        blocks.push(ContentBlock::Prose(done));
    }
    blocks
}
