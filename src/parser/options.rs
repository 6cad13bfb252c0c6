//! Extraction options and configuration.

use serde::{Deserialize, Serialize};

use super::table_detector::TableDetectorConfig;
use crate::model::SectionScope;

/// Margin used by [`ExtractOptions::strip_margins`], in points.
pub const DEFAULT_MARGIN: f32 = 50.0;

/// Options controlling how a section's content is extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Which span of the outline a section covers
    pub scope: SectionScope,

    /// Drop fragments centered within this distance of the page top (0 = off)
    pub header_margin: f32,

    /// Drop fragments centered within this distance of the page bottom (0 = off)
    pub footer_margin: f32,

    /// Line pitch, as a multiple of the font size, that starts a new paragraph
    pub paragraph_gap_factor: f32,

    /// Table detection tolerances
    pub table: TableDetectorConfig,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the section scope.
    pub fn with_scope(mut self, scope: SectionScope) -> Self {
        self.scope = scope;
        self
    }

    /// Extract each section together with its subsections.
    pub fn subtree(mut self) -> Self {
        self.scope = SectionScope::Subtree;
        self
    }

    /// Set header and footer margins in points.
    pub fn with_margins(mut self, header: f32, footer: f32) -> Self {
        self.header_margin = header.max(0.0);
        self.footer_margin = footer.max(0.0);
        self
    }

    /// Drop running headers and footers using the default margins.
    pub fn strip_margins(self) -> Self {
        self.with_margins(DEFAULT_MARGIN, DEFAULT_MARGIN)
    }

    /// Set the paragraph gap factor.
    pub fn with_paragraph_gap_factor(mut self, factor: f32) -> Self {
        self.paragraph_gap_factor = factor;
        self
    }

    /// Set the table detector configuration.
    pub fn with_table_config(mut self, table: TableDetectorConfig) -> Self {
        self.table = table;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            scope: SectionScope::OwnContent,
            header_margin: 0.0,
            footer_margin: 0.0,
            paragraph_gap_factor: 1.5,
            table: TableDetectorConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_options_builder() {
        let options = ExtractOptions::new()
            .subtree()
            .strip_margins()
            .with_paragraph_gap_factor(2.0);

        assert_eq!(options.scope, SectionScope::Subtree);
        assert_eq!(options.header_margin, 50.0);
        assert_eq!(options.footer_margin, 50.0);
        assert_eq!(options.paragraph_gap_factor, 2.0);
    }

    #[test]
    fn test_default_options() {
        let options = ExtractOptions::default();
        assert_eq!(options.scope, SectionScope::OwnContent);
        assert_eq!(options.header_margin, 0.0);
        assert_eq!(options.table.min_rows, 3);
    }

    #[test]
    fn test_negative_margins_clamped() {
        let options = ExtractOptions::new().with_margins(-5.0, 12.0);
        assert_eq!(options.header_margin, 0.0);
        assert_eq!(options.footer_margin, 12.0);
    }

    #[test]
    fn test_deserialize_partial() {
        let options: ExtractOptions =
            serde_json::from_str(r#"{"scope": "subtree", "table": {"row_tolerance": 5.0}}"#)
                .unwrap();
        assert_eq!(options.scope, SectionScope::Subtree);
        assert_eq!(options.table.row_tolerance, 5.0);
        assert_eq!(options.table.min_rows, 3);
        assert_eq!(options.paragraph_gap_factor, 1.5);
    }
}
