//! Prose assembly: fragments into lines, lines into paragraphs.

use crate::model::{BBox, ProseBlock, TextFragment};

use super::indexer::is_spaceless_script_char;

/// Fragments whose centers differ by less than this fraction of the font
/// size share a line.
const LINE_TOLERANCE_FACTOR: f32 = 0.4;
/// Font size change that always starts a new paragraph.
const FONT_SIZE_BREAK: f32 = 1.0;

/// A visual line of prose.
#[derive(Debug, Clone)]
pub struct ProseLine {
    /// Fragments sorted left to right.
    pub fragments: Vec<TextFragment>,
    pub bbox: BBox,
    /// Dominant font size, weighted by text length.
    pub font_size: f32,
    /// Smallest native order among the fragments.
    pub order: usize,
}

impl ProseLine {
    fn from_fragments(mut fragments: Vec<TextFragment>) -> Self {
        fragments.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));

        let bbox = fragments
            .iter()
            .skip(1)
            .fold(fragments[0].bbox, |acc, f| acc.union(&f.bbox));
        let total_chars: usize = fragments.iter().map(|f| f.text.chars().count()).sum();
        let font_size = if total_chars > 0 {
            fragments
                .iter()
                .map(|f| f.font_size * f.text.chars().count() as f32)
                .sum::<f32>()
                / total_chars as f32
        } else {
            fragments[0].font_size
        };
        let order = fragments.iter().map(|f| f.order).min().unwrap_or(0);

        Self {
            fragments,
            bbox,
            font_size,
            order,
        }
    }

    pub fn page_index(&self) -> usize {
        self.fragments[0].page_index
    }

    /// Combined text with spaces inserted at visible gaps.
    ///
    /// No space is inserted between two characters of a spaceless script.
    pub fn text(&self) -> String {
        let mut result = String::new();

        for (i, frag) in self.fragments.iter().enumerate() {
            if i > 0 {
                let prev = &self.fragments[i - 1];
                let gap = frag.bbox.x0 - prev.bbox.x1;

                let chars = frag.text.chars().count();
                let avg_char_width = if chars > 0 && frag.bbox.width() > 0.0 {
                    frag.bbox.width() / chars as f32
                } else {
                    frag.font_size * 0.5
                };

                let spaceless = prev.text.chars().last().is_some_and(is_spaceless_script_char)
                    && frag.text.chars().next().is_some_and(is_spaceless_script_char);
                let has_space = prev.text.ends_with([' ', '\u{00A0}'])
                    || frag.text.starts_with([' ', '\u{00A0}']);

                if gap > avg_char_width * 0.2 && !spaceless && !has_space {
                    result.push(' ');
                }
            }
            result.push_str(&frag.text);
        }

        result.trim().to_string()
    }
}

/// Group fragments into lines by vertical center, top to bottom.
///
/// `min_tolerance` is the smallest center distance accepted within a line;
/// larger fonts get proportionally more slack.
pub fn group_into_lines(mut fragments: Vec<TextFragment>, min_tolerance: f32) -> Vec<ProseLine> {
    fragments.sort_by(|a, b| {
        a.center_y()
            .total_cmp(&b.center_y())
            .then(a.order.cmp(&b.order))
    });

    let mut lines = Vec::new();
    let mut current: Vec<TextFragment> = Vec::new();
    let mut anchor: Option<(f32, f32)> = None;

    for frag in fragments {
        let cy = frag.center_y();
        match anchor {
            Some((y, tolerance)) if cy - y <= tolerance => current.push(frag),
            _ => {
                if !current.is_empty() {
                    lines.push(ProseLine::from_fragments(std::mem::take(&mut current)));
                }
                anchor = Some((cy, (frag.font_size * LINE_TOLERANCE_FACTOR).max(min_tolerance)));
                current.push(frag);
            }
        }
    }
    if !current.is_empty() {
        lines.push(ProseLine::from_fragments(current));
    }

    lines
}

/// Accumulates consecutive lines into paragraphs.
#[derive(Debug)]
pub struct ParagraphBuilder {
    gap_factor: f32,
    lines: Vec<ProseLine>,
}

impl ParagraphBuilder {
    pub fn new(gap_factor: f32) -> Self {
        Self {
            gap_factor,
            lines: Vec::new(),
        }
    }

    /// Add a line, returning the previous paragraph if this line starts a
    /// new one.
    pub fn push(&mut self, line: ProseLine) -> Option<ProseBlock> {
        let finished = match self.lines.last() {
            Some(prev) if self.should_break(prev, &line) => self.finish(),
            _ => None,
        };
        self.lines.push(line);
        finished
    }

    /// Close the current paragraph.
    pub fn finish(&mut self) -> Option<ProseBlock> {
        if self.lines.is_empty() {
            return None;
        }
        let lines = std::mem::take(&mut self.lines);
        let page_index = lines[0].page_index();
        let bbox = lines
            .iter()
            .skip(1)
            .fold(lines[0].bbox, |acc, l| acc.union(&l.bbox));
        let texts: Vec<String> = lines
            .iter()
            .map(ProseLine::text)
            .filter(|t| !t.is_empty())
            .collect();

        (!texts.is_empty()).then(|| ProseBlock::new(page_index, bbox, texts))
    }

    fn should_break(&self, prev: &ProseLine, line: &ProseLine) -> bool {
        let pitch = line.bbox.y0 - prev.bbox.y0;
        if pitch > self.gap_factor * prev.font_size.max(line.font_size) {
            return true;
        }
        (prev.font_size - line.font_size).abs() > FONT_SIZE_BREAK
    }
}
