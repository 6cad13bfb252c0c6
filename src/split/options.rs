//! Split options and configuration files.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::SectionScope;
use crate::parser::ExtractOptions;
use crate::render::RenderOptions;

/// What to do when a document has no usable outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlinePolicy {
    /// Fail with [`crate::Error::MalformedOutline`]
    #[default]
    Fail,
    /// Treat the whole document as a single section
    WholeDocument,
}

/// Options for a split run.
///
/// Loadable from JSON; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitOptions {
    /// Extraction options
    pub extract: ExtractOptions,

    /// Rendering options
    pub render: RenderOptions,

    /// Extract sections on a rayon worker pool
    pub parallel: bool,

    /// Behaviour for documents without bookmarks
    pub outline_policy: OutlinePolicy,

    /// Merge sections deeper than this 1-based level into their parent file
    pub split_level: Option<usize>,

    /// Prefix file names with the section number
    pub numbered_files: bool,
}

impl SplitOptions {
    /// Create new split options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse options from a JSON string.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Set extraction options.
    pub fn with_extract(mut self, extract: ExtractOptions) -> Self {
        self.extract = extract;
        self
    }

    /// Set rendering options.
    pub fn with_render(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }

    /// Set the section scope.
    pub fn with_scope(mut self, scope: SectionScope) -> Self {
        self.extract.scope = scope;
        self
    }

    /// Enable or disable parallel extraction.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Extract sections one at a time.
    pub fn sequential(self) -> Self {
        self.with_parallel(false)
    }

    /// Set the outline policy.
    pub fn with_outline_policy(mut self, policy: OutlinePolicy) -> Self {
        self.outline_policy = policy;
        self
    }

    /// Fall back to a single whole-document section.
    pub fn whole_document_fallback(self) -> Self {
        self.with_outline_policy(OutlinePolicy::WholeDocument)
    }

    /// Set the split level (1-based).
    pub fn with_split_level(mut self, level: usize) -> Self {
        self.split_level = Some(level.max(1));
        self
    }

    /// Enable or disable numbered file names.
    pub fn with_numbered_files(mut self, numbered: bool) -> Self {
        self.numbered_files = numbered;
        self
    }
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            extract: ExtractOptions::default(),
            render: RenderOptions::default(),
            parallel: true,
            outline_policy: OutlinePolicy::Fail,
            split_level: None,
            numbered_files: true,
        }
    }
}
