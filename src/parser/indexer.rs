//! Page text indexing.
//!
//! Interprets a page's content stream just far enough to place every shown
//! string on the page: graphics state (`q`/`Q`/`cm`), text objects and the
//! text positioning and showing operators. Each shown string becomes one
//! [`TextFragment`] in top-down page coordinates.

use std::sync::{Arc, OnceLock};

use unicode_normalization::UnicodeNormalization;

use super::backend::{ContentOp, PdfBackend, PdfValue};
use crate::error::{Error, Result};
use crate::model::{BBox, PageBox, PageText, TextFragment};

/// TJ adjustment (thousandths of text space) treated as a word space.
const TJ_SPACE_THRESHOLD: f32 = 200.0;
/// Average glyph advance as a fraction of the font size.
const GLYPH_WIDTH_RATIO: f32 = 0.5;
const ASCENT_RATIO: f32 = 0.8;
const DESCENT_RATIO: f32 = 0.2;
const DEFAULT_FONT_SIZE: f32 = 12.0;
/// Leading used by `T*` when the stream never set `TL`.
const FALLBACK_LEADING_RATIO: f32 = 1.2;

/// Affine transform `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn translation(tx: f32, ty: f32) -> Self {
        Matrix {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    fn from_operands(operands: &[PdfValue]) -> Option<Self> {
        let n: Vec<f32> = operands.iter().filter_map(PdfValue::as_number).collect();
        if n.len() < 6 {
            return None;
        }
        Some(Matrix {
            a: n[0],
            b: n[1],
            c: n[2],
            d: n[3],
            e: n[4],
            f: n[5],
        })
    }

    /// `self × other`: apply `self` first, then `other`.
    fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.a + y * self.c + self.e,
            x * self.b + y * self.d + self.f,
        )
    }

    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

/// Text state parameters that survive across text objects.
#[derive(Debug, Clone)]
struct TextState {
    tm: Matrix,
    tlm: Matrix,
    font_size: f32,
    leading: Option<f32>,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scaling: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
            font_size: DEFAULT_FONT_SIZE,
            leading: None,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 1.0,
        }
    }
}

impl TextState {
    fn move_line(&mut self, tx: f32, ty: f32) {
        self.tlm = Matrix::translation(tx, ty).then(&self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        let leading = self
            .leading
            .unwrap_or(self.font_size * FALLBACK_LEADING_RATIO);
        self.move_line(0.0, -leading);
    }

    /// Horizontal advance of a string in unscaled text space.
    fn string_advance(&self, text: &str) -> f32 {
        text.chars()
            .map(|c| {
                let word = if c == ' ' { self.word_spacing } else { 0.0 };
                (GLYPH_WIDTH_RATIO * self.font_size + self.char_spacing + word)
                    * self.horizontal_scaling
            })
            .sum()
    }

    fn adjustment_advance(&self, thousandths: f32) -> f32 {
        -thousandths / 1000.0 * self.font_size * self.horizontal_scaling
    }
}

/// Extracts positioned text fragments from one page.
#[derive(Debug, Clone, Default)]
pub struct PageTextIndexer;

impl PageTextIndexer {
    pub fn new() -> Self {
        Self
    }

    /// Index a page of a document.
    pub fn index<B: PdfBackend + ?Sized>(&self, backend: &B, page_index: usize) -> Result<PageText> {
        backend.check_page(page_index)?;
        let page_box = backend.page_box(page_index)?;
        let ops = backend.page_operations(page_index)?;
        let page = self.index_operations(page_index, page_box, &ops);
        log::debug!(
            "Indexed page {}: {} operations, {} fragments",
            page_index + 1,
            ops.len(),
            page.fragments.len()
        );
        Ok(page)
    }

    /// Index already decoded content operations.
    pub fn index_operations(&self, page_index: usize, page_box: PageBox, ops: &[ContentOp]) -> PageText {
        let mut page = PageText::new(page_index, page_box.width(), page_box.height());
        let mut ctm = Matrix::IDENTITY;
        let mut saved: Vec<Matrix> = Vec::new();
        let mut ts = TextState::default();
        let mut in_text = false;

        for op in ops {
            let num = |i: usize| op.operands.get(i).and_then(PdfValue::as_number);

            match op.operator.as_str() {
                "q" => saved.push(ctm),
                "Q" => {
                    if let Some(m) = saved.pop() {
                        ctm = m;
                    }
                }
                "cm" => {
                    if let Some(m) = Matrix::from_operands(&op.operands) {
                        ctm = m.then(&ctm);
                    }
                }
                "BT" => {
                    in_text = true;
                    ts.tm = Matrix::IDENTITY;
                    ts.tlm = Matrix::IDENTITY;
                }
                "ET" => in_text = false,
                "Tf" => {
                    if let Some(size) = num(1) {
                        ts.font_size = size;
                    }
                }
                "TL" => ts.leading = num(0),
                "Tc" => ts.char_spacing = num(0).unwrap_or(0.0),
                "Tw" => ts.word_spacing = num(0).unwrap_or(0.0),
                "Tz" => ts.horizontal_scaling = num(0).unwrap_or(100.0) / 100.0,
                "Td" => ts.move_line(num(0).unwrap_or(0.0), num(1).unwrap_or(0.0)),
                "TD" => {
                    let ty = num(1).unwrap_or(0.0);
                    ts.leading = Some(-ty);
                    ts.move_line(num(0).unwrap_or(0.0), ty);
                }
                "Tm" => {
                    if let Some(m) = Matrix::from_operands(&op.operands) {
                        ts.tm = m;
                        ts.tlm = m;
                    }
                }
                "T*" => ts.next_line(),
                "Tj" if in_text => {
                    if let Some(PdfValue::Text(text)) = op.operands.first() {
                        let advance = ts.string_advance(text);
                        self.show(&mut page, &mut ts, &ctm, &page_box, text.clone(), advance);
                    }
                }
                "'" if in_text => {
                    ts.next_line();
                    if let Some(PdfValue::Text(text)) = op.operands.first() {
                        let advance = ts.string_advance(text);
                        self.show(&mut page, &mut ts, &ctm, &page_box, text.clone(), advance);
                    }
                }
                "\"" if in_text => {
                    ts.word_spacing = num(0).unwrap_or(ts.word_spacing);
                    ts.char_spacing = num(1).unwrap_or(ts.char_spacing);
                    ts.next_line();
                    if let Some(PdfValue::Text(text)) = op.operands.get(2) {
                        let advance = ts.string_advance(text);
                        self.show(&mut page, &mut ts, &ctm, &page_box, text.clone(), advance);
                    }
                }
                "TJ" if in_text => {
                    if let Some(PdfValue::Array(items)) = op.operands.first() {
                        let (text, advance) = combine_tj(&ts, items);
                        self.show(&mut page, &mut ts, &ctm, &page_box, text, advance);
                    }
                }
                _ => {}
            }
        }

        page
    }

    /// Place a shown string and advance the text matrix past it.
    fn show(
        &self,
        page: &mut PageText,
        ts: &mut TextState,
        ctm: &Matrix,
        page_box: &PageBox,
        text: String,
        advance: f32,
    ) {
        let trm = ts.tm.then(ctm);
        ts.tm = Matrix::translation(advance, 0.0).then(&ts.tm);

        if text.trim().is_empty() {
            return;
        }

        let ascent = ASCENT_RATIO * ts.font_size;
        let descent = -DESCENT_RATIO * ts.font_size;
        let corners = [
            trm.apply(0.0, descent),
            trm.apply(advance.max(0.0), descent),
            trm.apply(0.0, ascent),
            trm.apply(advance.max(0.0), ascent),
        ];
        let (mut x0, mut y0, mut x1, mut y1) = (f32::MAX, f32::MAX, f32::MIN, f32::MIN);
        for (x, y) in corners {
            let (px, py) = (page_box.to_page_x(x), page_box.to_page_y(y));
            x0 = x0.min(px);
            x1 = x1.max(px);
            y0 = y0.min(py);
            y1 = y1.max(py);
        }

        let order = page.fragments.len();
        page.fragments.push(TextFragment::new(
            text.nfc().collect::<String>(),
            BBox::new(x0, y0, x1, y1),
            page.page_index,
            order,
            ts.font_size * trm.vertical_scale(),
        ));
    }
}

/// Concatenate the strings of a TJ array, turning large adjustments into
/// word spaces, and return the text with its total advance.
fn combine_tj(ts: &TextState, items: &[PdfValue]) -> (String, f32) {
    let mut combined = String::new();
    let mut advance = 0.0;

    for item in items {
        match item {
            PdfValue::Text(s) => {
                advance += ts.string_advance(s);
                combined.push_str(s);
            }
            other => {
                let Some(n) = other.as_number() else {
                    continue;
                };
                advance += ts.adjustment_advance(n);
                let wants_space = -n > TJ_SPACE_THRESHOLD
                    && !combined.is_empty()
                    && !combined.ends_with(' ')
                    && !combined.ends_with('\u{00A0}');
                if wants_space && !combined.chars().last().is_some_and(is_spaceless_script_char) {
                    combined.push(' ');
                }
            }
        }
    }

    (combined, advance)
}

/// Check if character is from a script that doesn't use word spaces.
///
/// Chinese and Japanese don't use spaces between words, but Korean does.
pub(crate) fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and extensions
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x20000..=0x2EBEF).contains(&code)
        // Hiragana, Katakana
        || (0x3040..=0x30FF).contains(&code)
        // CJK Symbols and Punctuation
        || (0x3000..=0x303F).contains(&code)
}

/// Write-once, read-many store of indexed pages.
///
/// Each page slot is filled at most once; afterwards readers share the same
/// `Arc<PageText>` without locking. A failed indexing attempt leaves the slot
/// empty so a later caller may retry.
#[derive(Debug)]
pub struct PageCache {
    slots: Vec<OnceLock<Arc<PageText>>>,
}

impl PageCache {
    pub fn new(page_count: usize) -> Self {
        Self {
            slots: (0..page_count).map(|_| OnceLock::new()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The cached page, if it has been indexed.
    pub fn get(&self, page_index: usize) -> Option<Arc<PageText>> {
        self.slots.get(page_index)?.get().cloned()
    }

    /// Number of pages indexed so far.
    pub fn indexed_pages(&self) -> usize {
        self.slots.iter().filter(|s| s.get().is_some()).count()
    }

    /// Return the page's fragments, indexing it on first use.
    pub fn get_or_index<B: PdfBackend + ?Sized>(
        &self,
        backend: &B,
        indexer: &PageTextIndexer,
        page_index: usize,
    ) -> Result<Arc<PageText>> {
        let slot = self.slots.get(page_index).ok_or(Error::PageRange {
            page: page_index + 1,
            page_count: self.slots.len(),
        })?;

        if let Some(page) = slot.get() {
            return Ok(Arc::clone(page));
        }

        // Two threads may index the same page concurrently; only the first
        // result is published.
        let page = indexer.index(backend, page_index)?;
        Ok(Arc::clone(slot.get_or_init(|| Arc::new(page))))
    }
}
