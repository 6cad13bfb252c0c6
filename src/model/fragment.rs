//! Positioned text fragments.

use super::BBox;
use serde::{Deserialize, Serialize};

/// A run of text emitted by one text-showing operator, with its position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    pub bbox: BBox,
    /// Zero-based page index.
    pub page_index: usize,
    /// Position in the page's content stream; breaks ties between fragments
    /// at the same vertical offset.
    pub order: usize,
    /// Effective font size in points.
    pub font_size: f32,
}

impl TextFragment {
    pub fn new(
        text: impl Into<String>,
        bbox: BBox,
        page_index: usize,
        order: usize,
        font_size: f32,
    ) -> Self {
        Self {
            text: text.into(),
            bbox,
            page_index,
            order,
            font_size,
        }
    }

    pub fn center_x(&self) -> f32 {
        self.bbox.center_x()
    }

    /// Vertical center; section membership is decided on this value.
    pub fn center_y(&self) -> f32 {
        self.bbox.center_y()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// All fragments of one page, in content-stream order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageText {
    pub page_index: usize,
    /// Page width in points.
    pub width: f32,
    /// Page height in points.
    pub height: f32,
    pub fragments: Vec<TextFragment>,
}

impl PageText {
    pub fn new(page_index: usize, width: f32, height: f32) -> Self {
        Self {
            page_index,
            width,
            height,
            fragments: Vec::new(),
        }
    }

    /// Fragments whose vertical center lies in `[lo, hi)`.
    pub fn fragments_between(&self, lo: f32, hi: f32) -> impl Iterator<Item = &TextFragment> {
        self.fragments.iter().filter(move |f| {
            let cy = f.center_y();
            cy >= lo && cy < hi
        })
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(text: &str, y0: f32, order: usize) -> TextFragment {
        TextFragment::new(text, BBox::new(0.0, y0, 50.0, y0 + 10.0), 0, order, 10.0)
    }

    #[test]
    fn test_fragments_between_uses_center() {
        let mut page = PageText::new(0, 612.0, 792.0);
        page.fragments.push(frag("above", 90.0, 0)); // center 95
        page.fragments.push(frag("straddle", 96.0, 1)); // center 101
        page.fragments.push(frag("below", 200.0, 2)); // center 205

        let texts: Vec<&str> = page
            .fragments_between(100.0, 205.0)
            .map(|f| f.text.as_str())
            .collect();
        assert_eq!(texts, vec!["straddle"]);
    }

    #[test]
    fn test_blank_fragment() {
        assert!(frag("  ", 0.0, 0).is_blank());
        assert!(!frag(" a ", 0.0, 0).is_blank());
    }
}
