//! Results of extraction and split runs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{SectionDocument, SectionSpec};

/// A section that could not be produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionFailure {
    /// Section index, when the failure concerns an existing section
    pub index: Option<usize>,
    pub title: String,
    pub reason: String,
    /// Document-level error (I/O, parse) rather than a problem with this section
    pub fatal: bool,
}

impl SectionFailure {
    pub fn new(spec: &SectionSpec, error: &Error) -> Self {
        Self {
            index: Some(spec.index),
            title: spec.title.clone(),
            reason: error.to_string(),
            fatal: error.is_fatal(),
        }
    }

    /// A rendered file that could not be written.
    pub fn unwritten(section: &RenderedSection, path: &Path, error: &Error) -> Self {
        Self {
            index: Some(section.index),
            title: section.title.clone(),
            reason: format!("cannot write {}: {}", path.display(), error),
            fatal: false,
        }
    }

    /// A selection entry that matched no section.
    pub fn unmatched(error: &Error) -> Self {
        let title = match error {
            Error::SectionNotFound(what) => what.clone(),
            _ => String::new(),
        };
        Self {
            index: None,
            title,
            reason: error.to_string(),
            fatal: false,
        }
    }
}

/// Extracted sections plus the ones that failed, in section order.
#[derive(Debug, Clone, Default)]
pub struct ExtractionRun {
    pub documents: Vec<SectionDocument>,
    pub failures: Vec<SectionFailure>,
}

impl ExtractionRun {
    /// Whether every selected section was extracted.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One Markdown file's worth of output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedSection {
    /// Index of the group's parent section
    pub index: usize,
    pub title: String,
    pub depth: usize,
    /// Sections merged into this file, the parent included
    pub members: usize,
    pub file_name: String,
    pub table_count: usize,
    #[serde(skip)]
    pub markdown: String,
}

/// The outcome of rendering a selection.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SplitRun {
    pub source: Option<String>,
    pub page_count: usize,
    pub section_count: usize,
    pub whole_document: bool,
    pub sections: Vec<RenderedSection>,
    pub failures: Vec<SectionFailure>,
}

impl SplitRun {
    /// Whether every selected section was rendered.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total number of tables across all files.
    pub fn table_count(&self) -> usize {
        self.sections.iter().map(|s| s.table_count).sum()
    }

    /// Write every rendered section into `dir`, creating it if needed.
    ///
    /// A file that cannot be written moves its section from `sections` to
    /// `failures`; the remaining files are still written. Returns the paths
    /// written.
    pub fn write_to<P: AsRef<Path>>(&mut self, dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let mut written = Vec::with_capacity(self.sections.len());
        let mut kept = Vec::with_capacity(self.sections.len());
        for section in std::mem::take(&mut self.sections) {
            let path = dir.join(&section.file_name);
            match fs::write(&path, &section.markdown) {
                Ok(()) => {
                    written.push(path);
                    kept.push(section);
                }
                Err(e) => {
                    let failure = SectionFailure::unwritten(&section, &path, &Error::Io(e));
                    log::warn!("Section '{}' failed: {}", failure.title, failure.reason);
                    self.failures.push(failure);
                }
            }
        }
        self.sections = kept;
        Ok(written)
    }
}
