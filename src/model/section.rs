//! Extracted section content.

use super::{BBox, SectionSpec, TableBlock};
use serde::{Deserialize, Serialize};

/// A paragraph of running text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProseBlock {
    pub page_index: usize,
    pub bbox: BBox,
    /// Text of each visual line, top to bottom.
    pub lines: Vec<String>,
}

impl ProseBlock {
    pub fn new(page_index: usize, bbox: BBox, lines: Vec<String>) -> Self {
        Self {
            page_index,
            bbox,
            lines,
        }
    }

    /// Lines joined with newlines.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }
}

/// One block of section content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Prose(ProseBlock),
    Table(TableBlock),
}

impl ContentBlock {
    pub fn page_index(&self) -> usize {
        match self {
            ContentBlock::Prose(p) => p.page_index,
            ContentBlock::Table(t) => t.page_index,
        }
    }

    pub fn bbox(&self) -> BBox {
        match self {
            ContentBlock::Prose(p) => p.bbox,
            ContentBlock::Table(t) => t.bbox,
        }
    }

    pub fn as_table(&self) -> Option<&TableBlock> {
        match self {
            ContentBlock::Table(t) => Some(t),
            ContentBlock::Prose(_) => None,
        }
    }

    pub fn as_prose(&self) -> Option<&ProseBlock> {
        match self {
            ContentBlock::Prose(p) => Some(p),
            ContentBlock::Table(_) => None,
        }
    }
}

/// The content of one section, in reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDocument {
    pub spec: SectionSpec,
    pub blocks: Vec<ContentBlock>,
}

impl SectionDocument {
    pub fn new(spec: SectionSpec) -> Self {
        Self {
            spec,
            blocks: Vec::new(),
        }
    }

    pub fn push(&mut self, block: ContentBlock) {
        self.blocks.push(block);
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableBlock> {
        self.blocks.iter().filter_map(ContentBlock::as_table)
    }

    pub fn prose(&self) -> impl Iterator<Item = &ProseBlock> {
        self.blocks.iter().filter_map(ContentBlock::as_prose)
    }

    /// Plain text of all blocks, separated by blank lines.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(|block| match block {
                ContentBlock::Prose(p) => p.text(),
                ContentBlock::Table(t) => t.plain_text(),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
