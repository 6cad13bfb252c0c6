//! Output file naming.

use std::collections::HashSet;

use crate::model::SectionSpec;

const MAX_STEM_CHARS: usize = 50;

/// Make a title usable as a file name stem.
///
/// Characters that are invalid on common file systems are removed, spaces
/// become underscores and runs of underscores collapse. The result is at
/// most 50 characters; an empty result becomes `"untitled"`.
pub fn sanitize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.chars() {
        match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => {}
            c if c.is_whitespace() || c == '_' => {
                if !out.ends_with('_') {
                    out.push('_');
                }
            }
            c if c.is_control() => {}
            c => out.push(c),
        }
    }

    let stem: String = out.trim_matches('_').chars().take(MAX_STEM_CHARS).collect();
    let stem = stem.trim_end_matches('_');
    if stem.is_empty() {
        "untitled".to_string()
    } else {
        stem.to_string()
    }
}

/// Assigns unique Markdown file names within one run.
#[derive(Debug, Clone)]
pub struct FileNamer {
    numbered: bool,
    used: HashSet<String>,
}

impl FileNamer {
    pub fn new(numbered: bool) -> Self {
        Self {
            numbered,
            used: HashSet::new(),
        }
    }

    /// File name for a section; `sequence` is its 1-based output position.
    pub fn name_for(&mut self, spec: &SectionSpec, sequence: usize) -> String {
        let stem = if self.numbered {
            format!("{:03}_{}", sequence, sanitize_title(&spec.title))
        } else {
            sanitize_title(&spec.title)
        };

        let mut candidate = format!("{}.md", stem);
        let mut n = 2;
        // Case-insensitive file systems treat "A.md" and "a.md" as one file.
        while !self.used.insert(candidate.to_lowercase()) {
            candidate = format!("{}_{}.md", stem, n);
            n += 1;
        }
        candidate
    }
}

impl Default for FileNamer {
    fn default() -> Self {
        Self::new(true)
    }
}
