//! Page geometry.
//!
//! All coordinates handed out by the library are in points, measured from the
//! top-left corner of the page box with `y` growing downward. PDF user space
//! (origin bottom-left) is converted once, in the indexer and the outline
//! resolver, through [`PageBox`].

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Axis-aligned bounding box in top-down page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    /// Create a box, normalizing the corner order.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.y0 + self.y1) / 2.0
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Whether the horizontal extents overlap, allowing `tolerance` points of slack.
    pub fn x_overlaps(&self, other: &BBox, tolerance: f32) -> bool {
        self.x0 <= other.x1 + tolerance && other.x0 <= self.x1 + tolerance
    }
}

/// The visible page rectangle in PDF user space (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageBox {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

impl PageBox {
    pub fn new(left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self {
            left: left.min(right),
            bottom: bottom.min(top),
            right: left.max(right),
            top: bottom.max(top),
        }
    }

    /// US Letter, the fallback when a page declares no usable box.
    pub fn letter() -> Self {
        Self::new(0.0, 0.0, 612.0, 792.0)
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    /// Convert a user-space x to a page offset from the left edge.
    pub fn to_page_x(&self, x: f32) -> f32 {
        x - self.left
    }

    /// Convert a user-space y to a top-down offset from the top edge.
    pub fn to_page_y(&self, y: f32) -> f32 {
        self.top - y
    }
}

impl Default for PageBox {
    fn default() -> Self {
        Self::letter()
    }
}

/// A point in the document's reading order: a page plus a vertical offset.
///
/// Locations order lexicographically by `(page_index, y)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageLocation {
    /// Zero-based page index.
    pub page_index: usize,
    /// Top-down vertical offset in points.
    pub y: f32,
}

impl PageLocation {
    pub fn new(page_index: usize, y: f32) -> Self {
        Self { page_index, y }
    }

    /// Top of the given page.
    pub fn page_top(page_index: usize) -> Self {
        Self::new(page_index, 0.0)
    }
}

impl PartialEq for PageLocation {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PageLocation {}

impl PartialOrd for PageLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PageLocation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.page_index
            .cmp(&other.page_index)
            .then_with(|| self.y.total_cmp(&other.y))
    }
}

impl std::fmt::Display for PageLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "p.{}@{:.1}", self.page_index + 1, self.y)
    }
}
