//! Outline resolution: bookmark tree to section specs.

use super::backend::PdfBackend;
use crate::error::{Error, Result};
use crate::model::{Bookmark, OutlineNode, PageLocation, SectionGroup, SectionSpec};

/// Turns a document's bookmarks into an ordered list of [`SectionSpec`]s.
pub struct OutlineResolver;

impl OutlineResolver {
    /// Resolve the outline of a document.
    ///
    /// Fails with [`Error::MalformedOutline`] when the document has no
    /// bookmarks or none of them points at a page.
    pub fn resolve<B: PdfBackend + ?Sized>(backend: &B) -> Result<Vec<SectionSpec>> {
        let bookmarks = backend.bookmarks()?;
        let heights = page_heights(backend)?;
        let specs = Self::from_bookmarks(&bookmarks, &heights)?;
        log::info!(
            "Resolved {} sections from {} bookmarks over {} pages",
            specs.len(),
            bookmarks.len(),
            heights.len()
        );
        Ok(specs)
    }

    /// Resolve pre-order bookmarks against known page heights.
    pub fn from_bookmarks(bookmarks: &[Bookmark], page_heights: &[f32]) -> Result<Vec<SectionSpec>> {
        if page_heights.is_empty() {
            return Err(Error::MalformedOutline("document has no pages".into()));
        }
        if bookmarks.is_empty() {
            return Err(Error::MalformedOutline("document has no bookmarks".into()));
        }

        let nodes = flatten(bookmarks, page_heights);
        if nodes.is_empty() {
            return Err(Error::MalformedOutline(
                "no bookmark resolves to a page".into(),
            ));
        }

        Ok(build_specs(&nodes, document_end(page_heights)))
    }

    /// A single section covering the whole document.
    pub fn whole_document<B: PdfBackend + ?Sized>(backend: &B, title: &str) -> Result<Vec<SectionSpec>> {
        let heights = page_heights(backend)?;
        if heights.is_empty() {
            return Err(Error::MalformedOutline("document has no pages".into()));
        }
        let node = OutlineNode {
            title: normalize_title(title),
            depth: 0,
            start: PageLocation::page_top(0),
        };
        Ok(build_specs(&[node], document_end(&heights)))
    }
}

fn page_heights<B: PdfBackend + ?Sized>(backend: &B) -> Result<Vec<f32>> {
    (0..backend.page_count())
        .map(|p| backend.page_box(p).map(|b| b.height()))
        .collect()
}

fn document_end(page_heights: &[f32]) -> PageLocation {
    let last = page_heights.len() - 1;
    PageLocation::new(last, page_heights[last])
}

/// Collapse whitespace runs and trim.
fn normalize_title(title: &str) -> String {
    title.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve bookmark targets, dropping unresolvable ones.
///
/// Descendants of a dropped bookmark move up one level per dropped ancestor.
fn flatten(bookmarks: &[Bookmark], page_heights: &[f32]) -> Vec<OutlineNode> {
    let mut nodes = Vec::with_capacity(bookmarks.len());
    let mut dropped: Vec<usize> = Vec::new();

    for bookmark in bookmarks {
        while dropped.last().is_some_and(|&d| bookmark.depth <= d) {
            dropped.pop();
        }

        let page = match bookmark.page_index {
            Some(p) if p < page_heights.len() => p,
            other => {
                log::warn!(
                    "Skipping bookmark '{}': destination {:?} is not a page of the document",
                    bookmark.title,
                    other.map(|p| p + 1)
                );
                dropped.push(bookmark.depth);
                continue;
            }
        };

        let height = page_heights[page];
        let y = match bookmark.y {
            Some(y) if y.is_finite() => y.clamp(0.0, height),
            _ => 0.0,
        };

        nodes.push(OutlineNode {
            title: normalize_title(&bookmark.title),
            depth: bookmark.depth.saturating_sub(dropped.len()),
            start: PageLocation::new(page, y),
        });
    }

    nodes
}

fn build_specs(nodes: &[OutlineNode], doc_end: PageLocation) -> Vec<SectionSpec> {
    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let clamp = |loc: PageLocation| {
                if loc < node.start {
                    log::warn!(
                        "Bookmark after '{}' points backwards ({} < {}); section truncated",
                        node.title,
                        loc,
                        node.start
                    );
                    node.start
                } else {
                    loc
                }
            };

            let next_shallow = nodes[i + 1..].iter().find(|n| n.depth <= node.depth);
            let (end, closes_document) = match next_shallow {
                Some(n) => (clamp(n.start), false),
                None => (doc_end, true),
            };

            let (content_end, last) = match nodes.get(i + 1) {
                Some(n) if closes_document => (clamp(n.start), false),
                Some(n) => (clamp(n.start).min(end), false),
                None => (doc_end, true),
            };

            SectionSpec {
                index: i,
                title: node.title.clone(),
                depth: node.depth,
                start: node.start,
                end,
                content_end,
                closes_document,
                last,
            }
        })
        .collect()
}

/// Deepest one-based level in the outline, 0 when empty.
pub fn max_level(specs: &[SectionSpec]) -> usize {
    specs.iter().map(SectionSpec::level).max().unwrap_or(0)
}

/// Group sections for splitting at a fixed outline level.
///
/// With `Some(level)` every section at that level or shallower starts a new
/// group and deeper sections join the preceding group. `None` keeps every
/// section on its own.
pub fn merge_by_level(specs: &[SectionSpec], split_level: Option<usize>) -> Vec<SectionGroup> {
    let Some(level) = split_level else {
        return specs.iter().cloned().map(SectionGroup::single).collect();
    };

    let mut groups: Vec<SectionGroup> = Vec::new();
    for spec in specs {
        match groups.last_mut() {
            Some(group) if spec.level() > level => group.children.push(spec.clone()),
            _ => groups.push(SectionGroup::single(spec.clone())),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SectionScope;
    use crate::parser::memory::{MemoryBackend, MemoryPage};

    const HEIGHTS: [f32; 3] = [800.0, 800.0, 800.0];

    fn bm(title: &str, depth: usize, page: usize, y: f32) -> Bookmark {
        Bookmark::new(title, depth, page, Some(y))
    }

    fn titles(groups: &[SectionGroup]) -> Vec<(&str, usize)> {
        groups
            .iter()
            .map(|g| (g.parent.title.as_str(), g.children.len()))
            .collect()
    }

    #[test]
    fn test_two_top_level_sections() {
        let specs = OutlineResolver::from_bookmarks(
            &[bm("A", 0, 0, 100.0), bm("B", 0, 1, 50.0)],
            &[800.0, 800.0],
        )
        .unwrap();

        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].start, PageLocation::new(0, 100.0));
        assert_eq!(specs[0].end, PageLocation::new(1, 50.0));
        assert!(!specs[0].closes_document);
        assert_eq!(specs[1].start, PageLocation::new(1, 50.0));
        assert_eq!(specs[1].end, PageLocation::new(1, 800.0));
        assert!(specs[1].closes_document);
        assert!(specs[1].last);
    }

    #[test]
    fn test_end_skips_deeper_nodes() {
        let specs = OutlineResolver::from_bookmarks(
            &[
                bm("1", 0, 0, 0.0),
                bm("1.1", 1, 0, 300.0),
                bm("1.1.1", 2, 1, 0.0),
                bm("1.2", 1, 1, 400.0),
                bm("2", 0, 2, 0.0),
            ],
            &HEIGHTS,
        )
        .unwrap();

        // Parent runs until its next sibling, past its children.
        assert_eq!(specs[0].end, PageLocation::new(2, 0.0));
        assert_eq!(specs[0].content_end, PageLocation::new(0, 300.0));
        // 1.1 ends at its sibling 1.2, not at its child 1.1.1.
        assert_eq!(specs[1].end, PageLocation::new(1, 400.0));
        assert_eq!(specs[1].content_end, PageLocation::new(1, 0.0));
        // The deepest node ends at its parent's sibling.
        assert_eq!(specs[2].end, PageLocation::new(1, 400.0));
        // 1.2 is bounded by the next top-level node.
        assert_eq!(specs[3].end, PageLocation::new(2, 0.0));
        assert!(specs[4].closes_document);
    }

    #[test]
    fn test_content_ranges_partition_document() {
        let specs = OutlineResolver::from_bookmarks(
            &[
                bm("1", 0, 0, 10.0),
                bm("1.1", 1, 0, 300.0),
                bm("1.1.1", 2, 1, 0.0),
                bm("2", 0, 1, 500.0),
                bm("2.1", 1, 2, 100.0),
            ],
            &HEIGHTS,
        )
        .unwrap();

        for pair in specs.windows(2) {
            let a = pair[0].range(SectionScope::OwnContent);
            let b = pair[1].range(SectionScope::OwnContent);
            assert_eq!(a.end, b.start, "gap or overlap after '{}'", pair[0].title);
            assert!(!a.closed);
        }
        let last = specs.last().unwrap().range(SectionScope::OwnContent);
        assert!(last.closed);
        assert_eq!(last.end, PageLocation::new(2, 800.0));

        for spec in &specs {
            assert!(spec.start <= spec.content_end);
            assert!(spec.content_end <= spec.end);
        }
    }

    #[test]
    fn test_identical_locations_are_zero_length() {
        let specs = OutlineResolver::from_bookmarks(
            &[bm("First", 0, 0, 200.0), bm("Second", 0, 0, 200.0)],
            &[800.0],
        )
        .unwrap();

        assert_eq!(specs.len(), 2);
        assert!(specs[0].range(SectionScope::Subtree).is_empty());
        assert!(!specs[1].range(SectionScope::Subtree).is_empty());
        assert!(specs[1].closes_document);
    }

    #[test]
    fn test_no_bookmarks_is_malformed() {
        let err = OutlineResolver::from_bookmarks(&[], &[800.0]).unwrap_err();
        assert!(matches!(err, Error::MalformedOutline(_)));

        let err =
            OutlineResolver::from_bookmarks(&[Bookmark::unresolved("Ghost", 0)], &[800.0]).unwrap_err();
        assert!(matches!(err, Error::MalformedOutline(_)));
    }

    #[test]
    fn test_unresolved_bookmark_children_move_up() {
        let specs = OutlineResolver::from_bookmarks(
            &[
                bm("Intro", 0, 0, 0.0),
                Bookmark::unresolved("Broken", 0),
                bm("Child", 1, 1, 0.0),
                bm("Grandchild", 2, 1, 200.0),
                bm("Next", 0, 2, 0.0),
            ],
            &HEIGHTS,
        )
        .unwrap();

        let shape: Vec<(&str, usize)> = specs.iter().map(|s| (s.title.as_str(), s.depth)).collect();
        assert_eq!(
            shape,
            vec![("Intro", 0), ("Child", 0), ("Grandchild", 1), ("Next", 0)]
        );
        assert_eq!(specs[0].end, PageLocation::new(1, 0.0));
    }

    #[test]
    fn test_out_of_range_page_and_missing_y() {
        let specs = OutlineResolver::from_bookmarks(
            &[
                Bookmark::new("Top", 0, 0, None),
                bm("Too far", 0, 9, 0.0),
                bm("Below page", 0, 1, 2000.0),
            ],
            &[800.0, 600.0],
        )
        .unwrap();

        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].start, PageLocation::new(0, 0.0));
        assert_eq!(specs[1].start, PageLocation::new(1, 600.0));
    }

    #[test]
    fn test_backwards_bookmark_is_clamped() {
        let specs = OutlineResolver::from_bookmarks(
            &[bm("Late", 0, 2, 0.0), bm("Early", 0, 0, 0.0)],
            &HEIGHTS,
        )
        .unwrap();
        assert_eq!(specs[0].end, specs[0].start);
        assert!(specs[0].range(SectionScope::Subtree).is_empty());
    }

    #[test]
    fn test_titles_are_normalized() {
        let specs =
            OutlineResolver::from_bookmarks(&[bm("  3.1\tRegister   Map \n", 0, 0, 0.0)], &[800.0])
                .unwrap();
        assert_eq!(specs[0].title, "3.1 Register Map");
    }

    #[test]
    fn test_resolve_from_backend_and_whole_document() {
        let backend = MemoryBackend::new()
            .with_page(MemoryPage::new(600.0, 800.0))
            .with_page(MemoryPage::new(600.0, 700.0))
            .with_bookmark(bm("Only", 0, 0, 40.0));

        let specs = OutlineResolver::resolve(&backend).unwrap();
        assert_eq!(specs[0].end, PageLocation::new(1, 700.0));

        let whole = OutlineResolver::whole_document(&backend, " Manual ").unwrap();
        assert_eq!(whole.len(), 1);
        assert_eq!(whole[0].title, "Manual");
        assert_eq!(whole[0].start, PageLocation::new(0, 0.0));
        assert!(whole[0].closes_document);
    }

    fn sample_specs() -> Vec<SectionSpec> {
        OutlineResolver::from_bookmarks(
            &[
                bm("Chapter 1", 0, 0, 0.0),
                bm("Section 1.1", 1, 0, 100.0),
                bm("Subsection 1.1.1", 2, 0, 200.0),
                bm("Subsection 1.1.2", 2, 0, 300.0),
                bm("Section 1.2", 1, 1, 0.0),
                bm("Chapter 2", 0, 2, 0.0),
                bm("Section 2.1", 1, 2, 100.0),
            ],
            &HEIGHTS,
        )
        .unwrap()
    }

    #[test]
    fn test_max_level() {
        assert_eq!(max_level(&sample_specs()), 3);
        assert_eq!(max_level(&[]), 0);
    }

    #[test]
    fn test_merge_level_1() {
        let groups = merge_by_level(&sample_specs(), Some(1));
        assert_eq!(titles(&groups), vec![("Chapter 1", 4), ("Chapter 2", 1)]);
    }

    #[test]
    fn test_merge_level_2() {
        let groups = merge_by_level(&sample_specs(), Some(2));
        assert_eq!(
            titles(&groups),
            vec![
                ("Chapter 1", 0),
                ("Section 1.1", 2),
                ("Section 1.2", 0),
                ("Chapter 2", 0),
                ("Section 2.1", 0),
            ]
        );
    }

    #[test]
    fn test_merge_all_levels() {
        let specs = sample_specs();
        assert_eq!(merge_by_level(&specs, None).len(), 7);
        assert_eq!(merge_by_level(&specs, Some(3)).len(), 7);
        assert_eq!(merge_by_level(&specs, Some(10)).len(), 7);
        assert!(merge_by_level(&[], Some(1)).is_empty());
    }
}
