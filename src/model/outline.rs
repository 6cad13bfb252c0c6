//! Outline and section types.

use super::PageLocation;
use serde::{Deserialize, Serialize};

/// A raw bookmark as read from the document outline.
///
/// `depth` is zero-based (top-level bookmarks have depth 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub title: String,
    pub depth: usize,
    /// Destination page, or `None` if the destination could not be resolved.
    pub page_index: Option<usize>,
    /// Top-down vertical offset of the destination, if the destination
    /// carries one.
    pub y: Option<f32>,
}

impl Bookmark {
    pub fn new(title: impl Into<String>, depth: usize, page_index: usize, y: Option<f32>) -> Self {
        Self {
            title: title.into(),
            depth,
            page_index: Some(page_index),
            y,
        }
    }

    /// A bookmark whose destination could not be resolved.
    pub fn unresolved(title: impl Into<String>, depth: usize) -> Self {
        Self {
            title: title.into(),
            depth,
            page_index: None,
            y: None,
        }
    }
}

/// A bookmark with a resolved start location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineNode {
    pub title: String,
    pub depth: usize,
    pub start: PageLocation,
}

/// Which part of the document a section covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionScope {
    /// From the bookmark to the next bookmark of any depth. Sections never
    /// overlap.
    #[default]
    OwnContent,
    /// From the bookmark to the next bookmark of equal or shallower depth,
    /// so a parent includes its children.
    Subtree,
}

/// A half-open span of the document `[start, end)`.
///
/// When `closed` is set the span runs to the end of the last page and `end`
/// is only informative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionRange {
    pub start: PageLocation,
    pub end: PageLocation,
    pub closed: bool,
}

impl SectionRange {
    pub fn is_empty(&self) -> bool {
        !self.closed && self.start >= self.end
    }
}

/// A section to be extracted: one outline node with its computed extent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSpec {
    /// Position in document (outline) order.
    pub index: usize,
    pub title: String,
    /// Zero-based depth; the Markdown heading level is `depth + 1`.
    pub depth: usize,
    pub start: PageLocation,
    /// Start of the next node with equal or shallower depth.
    pub end: PageLocation,
    /// Start of the next node of any depth.
    pub content_end: PageLocation,
    /// No later node at equal or shallower depth: `end` is the document end.
    pub closes_document: bool,
    /// This is the last node: `content_end` is the document end.
    pub last: bool,
}

impl SectionSpec {
    /// One-based heading level.
    pub fn level(&self) -> usize {
        self.depth + 1
    }

    /// The span covered under the given scope.
    pub fn range(&self, scope: SectionScope) -> SectionRange {
        match scope {
            SectionScope::Subtree => SectionRange {
                start: self.start,
                end: self.end,
                closed: self.closes_document,
            },
            SectionScope::OwnContent => SectionRange {
                start: self.start,
                end: self.content_end,
                closed: self.last,
            },
        }
    }

    /// First and last page (zero-based) of the subtree span.
    pub fn page_span(&self, page_count: usize) -> (usize, usize) {
        let last = if self.closes_document {
            page_count.saturating_sub(1)
        } else {
            self.end.page_index
        };
        (self.start.page_index, last.max(self.start.page_index))
    }
}

impl std::fmt::Display for SectionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{} (p.{})",
            "  ".repeat(self.depth),
            self.title,
            self.start.page_index + 1
        )
    }
}

/// A section at the split level together with the deeper sections folded
/// into it. Produced when splitting at a fixed outline level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionGroup {
    pub parent: SectionSpec,
    pub children: Vec<SectionSpec>,
}

impl SectionGroup {
    pub fn single(parent: SectionSpec) -> Self {
        Self {
            parent,
            children: Vec::new(),
        }
    }

    /// Parent followed by children, in document order.
    pub fn members(&self) -> impl Iterator<Item = &SectionSpec> {
        std::iter::once(&self.parent).chain(self.children.iter())
    }

    pub fn len(&self) -> usize {
        1 + self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(start: PageLocation, end: PageLocation, content_end: PageLocation) -> SectionSpec {
        SectionSpec {
            index: 0,
            title: "Intro".into(),
            depth: 1,
            start,
            end,
            content_end,
            closes_document: false,
            last: false,
        }
    }

    #[test]
    fn test_range_by_scope() {
        let s = spec(
            PageLocation::new(0, 100.0),
            PageLocation::new(3, 0.0),
            PageLocation::new(1, 50.0),
        );
        assert_eq!(s.range(SectionScope::Subtree).end, PageLocation::new(3, 0.0));
        assert_eq!(
            s.range(SectionScope::OwnContent).end,
            PageLocation::new(1, 50.0)
        );
        assert_eq!(s.level(), 2);
        assert_eq!(s.page_span(10), (0, 3));
    }

    #[test]
    fn test_empty_range() {
        let at = PageLocation::new(2, 40.0);
        let s = spec(at, at, at);
        assert!(s.range(SectionScope::Subtree).is_empty());

        let mut closed = s.clone();
        closed.closes_document = true;
        assert!(!closed.range(SectionScope::Subtree).is_empty());
        assert_eq!(closed.page_span(5), (2, 4));
    }

    #[test]
    fn test_display_indents_by_depth() {
        let s = spec(
            PageLocation::new(4, 0.0),
            PageLocation::new(5, 0.0),
            PageLocation::new(5, 0.0),
        );
        assert_eq!(s.to_string(), "  Intro (p.5)");
    }

    #[test]
    fn test_group_members_order() {
        let parent = spec(
            PageLocation::new(0, 0.0),
            PageLocation::new(2, 0.0),
            PageLocation::new(1, 0.0),
        );
        let mut child = parent.clone();
        child.index = 1;
        child.title = "Child".into();
        let group = SectionGroup {
            parent,
            children: vec![child],
        };
        let titles: Vec<&str> = group.members().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Intro", "Child"]);
        assert_eq!(group.len(), 2);
    }
}
