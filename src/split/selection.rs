//! Section selection.

use std::collections::BTreeSet;
use std::ops::Range;

use crate::error::{Error, Result};
use crate::model::SectionSpec;

/// Which sections a run should produce.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SectionSelection {
    /// Every section
    #[default]
    All,
    /// Zero-based section indices
    Indices(Vec<usize>),
    /// Zero-based half-open index ranges, as parsed from `"1,3,5-7"`
    Ranges(Vec<Range<usize>>),
    /// Section titles, matched case-insensitively
    Titles(Vec<String>),
}

impl SectionSelection {
    /// Parse a list of 1-based section numbers and ranges, e.g. `"1,3,5-7"`.
    ///
    /// `"all"` and the empty string select everything.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() || text.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }

        let mut ranges = Vec::new();
        for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.split_once('-') {
                Some((a, b)) => {
                    let start = parse_number(a)?;
                    let end = parse_number(b)?;
                    if start > end {
                        return Err(Error::Config(format!("invalid section range '{}'", part)));
                    }
                    ranges.push(start - 1..end);
                }
                None => {
                    let n = parse_number(part)?;
                    ranges.push(n - 1..n);
                }
            }
        }
        Ok(Self::Ranges(ranges))
    }

    /// Select sections by title.
    pub fn titles<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Titles(titles.into_iter().map(Into::into).collect())
    }

    /// Resolve against a section list.
    ///
    /// Returns the selected indices in document order without duplicates,
    /// and one [`Error::SectionNotFound`] per entry that matched nothing.
    pub fn resolve(&self, specs: &[SectionSpec]) -> (Vec<usize>, Vec<Error>) {
        let mut selected = BTreeSet::new();
        let mut missing = Vec::new();

        match self {
            Self::All => selected.extend(0..specs.len()),
            Self::Indices(indices) => {
                for &i in indices {
                    if i < specs.len() {
                        selected.insert(i);
                    } else {
                        missing.push(Error::SectionNotFound(format!("#{}", i + 1)));
                    }
                }
            }
            Self::Ranges(ranges) => {
                let len = specs.len();
                for range in ranges {
                    selected.extend(range.start.min(len)..range.end.min(len));
                    if range.end > len {
                        let first = range.start.max(len) + 1;
                        let what = if first == range.end {
                            format!("#{}", first)
                        } else {
                            format!("#{}-{}", first, range.end)
                        };
                        missing.push(Error::SectionNotFound(what));
                    }
                }
            }
            Self::Titles(titles) => {
                for title in titles {
                    let wanted = fold(title);
                    let mut matched = false;
                    for spec in specs.iter().filter(|s| fold(&s.title) == wanted) {
                        selected.insert(spec.index);
                        matched = true;
                    }
                    if !matched {
                        missing.push(Error::SectionNotFound(title.clone()));
                    }
                }
            }
        }

        (selected.into_iter().collect(), missing)
    }
}

fn parse_number(text: &str) -> Result<usize> {
    match text.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::Config(format!(
            "invalid section number '{}' (numbers start at 1)",
            text.trim()
        ))),
    }
}

fn fold(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
