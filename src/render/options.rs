//! Rendering options and configuration.

use serde::{Deserialize, Serialize};

/// Options for rendering a section to Markdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Maximum heading level (1-6)
    pub max_heading_level: u8,

    /// Remove prose lines that consist only of a page number
    pub strip_page_numbers: bool,

    /// Remove the first prose line when it repeats the section title
    pub drop_duplicate_title: bool,

    /// Escape special Markdown characters in prose
    pub escape_special_chars: bool,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum heading level.
    pub fn with_max_heading(mut self, level: u8) -> Self {
        self.max_heading_level = level.clamp(1, 6);
        self
    }

    /// Enable or disable page number stripping.
    pub fn with_page_number_stripping(mut self, strip: bool) -> Self {
        self.strip_page_numbers = strip;
        self
    }

    /// Enable or disable duplicate title removal.
    pub fn with_duplicate_title_removal(mut self, drop: bool) -> Self {
        self.drop_duplicate_title = drop;
        self
    }

    /// Enable or disable Markdown escaping of prose.
    pub fn with_escaping(mut self, escape: bool) -> Self {
        self.escape_special_chars = escape;
        self
    }

    /// Heading level for an outline depth, capped at `max_heading_level`.
    pub fn heading_level(&self, depth: usize) -> usize {
        (depth + 1).min(self.max_heading_level.clamp(1, 6) as usize)
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_heading_level: 6,
            strip_page_numbers: true,
            drop_duplicate_title: true,
            escape_special_chars: false,
        }
    }
}
