//! Table detection using text position analysis.
//!
//! Tables are recovered purely from geometry: fragments are clustered into
//! rows by vertical center, consecutive rows whose fragments line up in x
//! form candidate regions, and the union of the region's fragment x-ranges
//! becomes the column grid every row is snapped to.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::model::{BBox, TableBlock, TextFragment};

/// Table detector configuration. All distances are in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableDetectorConfig {
    /// Maximum distance between vertical centers of fragments in one row.
    pub row_tolerance: f32,
    /// Slack allowed when comparing or merging x-ranges.
    pub column_tolerance: f32,
    /// Minimum number of aligned rows promoted to a table.
    pub min_rows: usize,
    /// Minimum number of columns in a table (and fragments in a table row).
    pub min_columns: usize,
    /// Minimum number of fragment pairs that must line up between rows.
    pub min_aligned_columns: usize,
    /// Reject regions whose first column is mostly list markers.
    pub reject_list_patterns: bool,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            row_tolerance: 3.0,
            column_tolerance: 4.0,
            min_rows: 3,
            min_columns: 2,
            min_aligned_columns: 2,
            reject_list_patterns: true,
        }
    }
}

/// A row of fragments: indices into the detector input, sorted by x.
#[derive(Debug, Clone)]
struct RowData {
    members: Vec<usize>,
}

/// Column grid: merged x-ranges, left to right.
type Grid = Vec<(f32, f32)>;

/// Detects tables in a list of text fragments.
#[derive(Debug, Clone, Default)]
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    /// Create a new table detector with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new table detector with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TableDetectorConfig {
        &self.config
    }

    /// Detect tables among the fragments whose vertical center lies in `y_range`.
    ///
    /// Returns the tables top to bottom and every fragment that was not
    /// absorbed into a table, in input order. Fragments outside the range are
    /// always returned unchanged. Detection never fails: when no consistent
    /// grid is found all fragments come back as remaining.
    pub fn detect(
        &self,
        fragments: Vec<TextFragment>,
        y_range: Range<f32>,
    ) -> (Vec<TableBlock>, Vec<TextFragment>) {
        let candidates: Vec<usize> = (0..fragments.len())
            .filter(|&i| y_range.contains(&fragments[i].center_y()))
            .collect();
        log::debug!(
            "TableDetector: {} of {} fragments in range",
            candidates.len(),
            fragments.len()
        );

        let min_fragments = self.config.min_rows * self.config.min_columns;
        if candidates.len() < min_fragments.max(1) {
            log::debug!(
                "TableDetector: not enough fragments ({} < {})",
                candidates.len(),
                min_fragments
            );
            return (vec![], fragments);
        }

        let rows = self.group_into_rows(&fragments, &candidates);
        if rows.len() < self.config.min_rows {
            log::debug!(
                "TableDetector: not enough rows ({} < {})",
                rows.len(),
                self.config.min_rows
            );
            return (vec![], fragments);
        }

        let mut used = vec![false; fragments.len()];
        let mut tables = Vec::new();

        for run in self.aligned_runs(&fragments, &rows) {
            for (region, grid) in self.carve(&fragments, &rows, run) {
                let region_rows = &rows[region];
                for row in region_rows {
                    for &i in &row.members {
                        used[i] = true;
                    }
                }
                let table = self.build_table(&fragments, region_rows, &grid);
                log::debug!(
                    "TableDetector: table {}x{} at y={:.1}",
                    table.row_count(),
                    table.column_count(),
                    table.bbox.y0
                );
                tables.push(table);
            }
        }

        if tables.is_empty() {
            log::debug!("TableDetector: no table regions found");
            return (vec![], fragments);
        }

        tables.sort_by(|a, b| a.bbox.y0.total_cmp(&b.bbox.y0));
        let remaining = fragments
            .into_iter()
            .zip(used)
            .filter(|(_, used)| !used)
            .map(|(f, _)| f)
            .collect();

        (tables, remaining)
    }

    /// Group candidate fragments into rows by vertical center.
    fn group_into_rows(&self, fragments: &[TextFragment], candidates: &[usize]) -> Vec<RowData> {
        let mut sorted = candidates.to_vec();
        sorted.sort_by(|&a, &b| {
            fragments[a]
                .center_y()
                .total_cmp(&fragments[b].center_y())
                .then(fragments[a].bbox.x0.total_cmp(&fragments[b].bbox.x0))
        });

        let mut rows: Vec<RowData> = Vec::new();
        let mut current: Vec<usize> = Vec::new();
        let mut anchor: Option<f32> = None;

        for i in sorted {
            let cy = fragments[i].center_y();
            match anchor {
                Some(y) if cy - y <= self.config.row_tolerance => current.push(i),
                _ => {
                    if !current.is_empty() {
                        rows.push(make_row(fragments, std::mem::take(&mut current)));
                    }
                    anchor = Some(cy);
                    current.push(i);
                }
            }
        }
        if !current.is_empty() {
            rows.push(make_row(fragments, current));
        }

        rows
    }

    /// Whether two rows share enough one-to-one x-aligned fragments.
    fn rows_aligned(&self, fragments: &[TextFragment], a: &RowData, b: &RowData) -> bool {
        if a.members.len() < self.config.min_columns || b.members.len() < self.config.min_columns {
            return false;
        }

        let tol = self.config.column_tolerance;
        let (mut i, mut j, mut matched) = (0, 0, 0);
        while i < a.members.len() && j < b.members.len() {
            let fa = &fragments[a.members[i]].bbox;
            let fb = &fragments[b.members[j]].bbox;
            if fa.x_overlaps(fb, tol) {
                matched += 1;
                i += 1;
                j += 1;
            } else if fa.x1 + tol < fb.x0 {
                i += 1;
            } else {
                j += 1;
            }
        }

        matched >= self.config.min_aligned_columns
    }

    /// Maximal runs of consecutive aligned rows, at least `min_rows` long.
    fn aligned_runs(&self, fragments: &[TextFragment], rows: &[RowData]) -> Vec<Range<usize>> {
        let mut runs = Vec::new();
        let mut start = 0;
        for i in 1..=rows.len() {
            let linked = i < rows.len() && self.rows_aligned(fragments, &rows[i - 1], &rows[i]);
            if !linked {
                if i - start >= self.config.min_rows {
                    runs.push(start..i);
                }
                start = i;
            }
        }
        runs
    }

    /// Find the longest acceptable sub-region of a run (topmost on ties),
    /// then search the rows above and below it the same way.
    fn carve(&self, fragments: &[TextFragment], rows: &[RowData], run: Range<usize>) -> Vec<(Range<usize>, Grid)> {
        let len = run.end - run.start;
        if len < self.config.min_rows {
            return Vec::new();
        }

        for size in (self.config.min_rows..=len).rev() {
            for start in run.start..=run.end - size {
                let window = start..start + size;
                if let Some(grid) = self.accept(fragments, &rows[window.clone()]) {
                    let mut found = self.carve(fragments, rows, run.start..window.start);
                    let below = self.carve(fragments, rows, window.end..run.end);
                    found.push((window, grid));
                    found.extend(below);
                    return found;
                }
            }
        }

        log::debug!(
            "TableDetector: rows {}..{} aligned but no consistent grid",
            run.start,
            run.end
        );
        Vec::new()
    }

    /// Column grid for a region, or `None` if the region is not a table.
    fn accept(&self, fragments: &[TextFragment], rows: &[RowData]) -> Option<Grid> {
        let grid = self.column_grid(fragments, rows);
        if grid.len() < self.config.min_columns {
            return None;
        }
        if self.config.reject_list_patterns && is_list_pattern(fragments, rows, grid.len()) {
            log::debug!("TableDetector: skipping region, detected as list pattern");
            return None;
        }
        Some(grid)
    }

    /// Union of all fragment x-ranges in the rows, merged within tolerance.
    fn column_grid(&self, fragments: &[TextFragment], rows: &[RowData]) -> Grid {
        let mut ranges: Vec<(f32, f32)> = rows
            .iter()
            .flat_map(|r| r.members.iter())
            .map(|&i| (fragments[i].bbox.x0, fragments[i].bbox.x1))
            .collect();
        ranges.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut grid: Grid = Vec::new();
        for (x0, x1) in ranges {
            match grid.last_mut() {
                Some(last) if x0 <= last.1 + self.config.column_tolerance => {
                    last.1 = last.1.max(x1);
                }
                _ => grid.push((x0, x1)),
            }
        }
        grid
    }

    fn build_table(&self, fragments: &[TextFragment], rows: &[RowData], grid: &Grid) -> TableBlock {
        let mut bbox: Option<BBox> = None;
        let mut cells: Vec<Vec<String>> = Vec::with_capacity(rows.len());

        for row in rows {
            let mut texts: Vec<Vec<&str>> = vec![Vec::new(); grid.len()];
            for &i in &row.members {
                let frag = &fragments[i];
                bbox = Some(bbox.map_or(frag.bbox, |b| b.union(&frag.bbox)));
                let text = frag.text.trim();
                if !text.is_empty() {
                    texts[column_for(grid, frag.center_x())].push(text);
                }
            }
            cells.push(texts.into_iter().map(|t| t.join(" ")).collect());
        }

        let page_index = rows
            .first()
            .and_then(|r| r.members.first())
            .map(|&i| fragments[i].page_index)
            .unwrap_or(0);
        TableBlock::new(page_index, bbox.unwrap_or_default(), cells)
    }
}

fn make_row(fragments: &[TextFragment], mut members: Vec<usize>) -> RowData {
    members.sort_by(|&a, &b| fragments[a].bbox.x0.total_cmp(&fragments[b].bbox.x0));
    RowData { members }
}

/// Column containing `x`, or the nearest one.
fn column_for(grid: &Grid, x: f32) -> usize {
    if let Some(i) = grid.iter().position(|&(l, r)| x >= l && x <= r) {
        return i;
    }
    let distance = |&(l, r): &(f32, f32)| if x < l { l - x } else { x - r };
    grid.iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| distance(a).total_cmp(&distance(b)))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Check if aligned rows are really a list ("1. Item", "- Item").
///
/// When a PDF has a numbered list, the marker and the text often become
/// separate fragments at different x positions, which looks like a
/// two-column table.
fn is_list_pattern(fragments: &[TextFragment], rows: &[RowData], columns: usize) -> bool {
    if columns < 2 || rows.is_empty() {
        return false;
    }

    let mut bullet_count = 0;
    let mut number_count = 0;
    for row in rows {
        let Some(&first) = row.members.first() else {
            continue;
        };
        let text = fragments[first].text.trim();
        if is_bullet_marker(text) {
            bullet_count += 1;
        } else if is_number_marker(text) {
            number_count += 1;
        }
    }

    let bullet_ratio = bullet_count as f32 / rows.len() as f32;
    let total_ratio = (bullet_count + number_count) as f32 / rows.len() as f32;
    log::debug!(
        "TableDetector: list markers: bullets={}, numbers={}, rows={}",
        bullet_count,
        number_count,
        rows.len()
    );

    // Bullet markers are almost never real table data
    if bullet_ratio >= 0.5 {
        return true;
    }

    // Numbered first columns are common in real tables, so only reject
    // the two-column shape
    columns == 2 && total_ratio >= 0.5
}

/// Check if text is a bullet marker.
fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "\u{2013}"
            | "\u{2014}"
            | "\u{2022}"
            | "\u{00b7}"
            | "*"
            | "\u{25cb}"
            | "\u{25aa}"
            | "\u{25e6}"
            | "\u{25b8}"
            | "\u{25ba}"
            | "\u{25a0}"
            | "\u{25cf}"
            | "\u{203b}"
            | "\u{25a1}"
            | "\u{25c6}"
            | "\u{25b6}"
            | "\u{27a4}"
    )
}

/// Check if text is a number-style list marker (1., 2), a., etc.).
fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }

    if let Some(pos) = cleaned.find(|c: char| !c.is_ascii_digit()) {
        let (prefix, suffix) = cleaned.split_at(pos);
        if !prefix.is_empty() && (suffix == "." || suffix == ")") {
            return true;
        }
    }

    if cleaned.parse::<u32>().is_ok() {
        return true;
    }

    let mut chars = cleaned.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(c), Some('.' | ')'), None) if c.is_alphabetic()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: Range<f32> = f32::NEG_INFINITY..f32::INFINITY;

    fn frag(text: &str, x: f32, top: f32) -> TextFragment {
        let width = text.chars().count() as f32 * 6.0;
        TextFragment::new(text, BBox::new(x, top, x + width, top + 10.0), 0, 0, 10.0)
    }

    fn numbered(mut frags: Vec<TextFragment>) -> Vec<TextFragment> {
        for (i, f) in frags.iter_mut().enumerate() {
            f.order = i;
        }
        frags
    }

    #[test]
    fn test_detect_simple_table() {
        let detector = TableDetector::new();
        let frags = numbered(vec![
            frag("Name", 10.0, 100.0),
            frag("Age", 60.0, 100.0),
            frag("Alice", 10.0, 115.0),
            frag("30", 60.0, 115.0),
            frag("Bob", 10.0, 130.0),
            frag("25", 60.0, 130.0),
        ]);

        let (tables, remaining) = detector.detect(frags, ALL);
        assert_eq!(tables.len(), 1);
        assert!(remaining.is_empty());
        assert_eq!(
            tables[0].rows,
            vec![
                vec!["Name", "Age"],
                vec!["Alice", "30"],
                vec!["Bob", "25"],
            ]
        );
        assert_eq!(tables[0].bbox.y0, 100.0);
        assert_eq!(tables[0].bbox.y1, 140.0);
    }

    #[test]
    fn test_grid_with_empty_column_keeps_shape() {
        let detector = TableDetector::new();
        let mut frags = Vec::new();
        for (r, top) in [100.0, 115.0, 130.0].into_iter().enumerate() {
            frags.push(frag(&format!("A{}", r), 10.0, top));
            frags.push(frag(&format!("B{}", r), 60.0, top));
            frags.push(frag(" ", 110.0, top));
            frags.push(frag(&format!("D{}", r), 160.0, top));
        }

        let (tables, remaining) = detector.detect(frags, ALL);
        assert_eq!(tables.len(), 1);
        assert!(remaining.is_empty());
        assert_eq!(tables[0].row_count(), 3);
        assert_eq!(tables[0].column_count(), 4);
        assert!(tables[0].is_column_empty(2));
        assert_eq!(tables[0].rows[1], vec!["A1", "B1", "", "D1"]);
    }

    #[test]
    fn test_short_aligned_runs_stay_prose() {
        let detector = TableDetector::new();

        let one_row = vec![frag("Left", 10.0, 100.0), frag("Right", 200.0, 100.0)];
        let (tables, remaining) = detector.detect(one_row, ALL);
        assert!(tables.is_empty());
        assert_eq!(remaining.len(), 2);

        let two_rows = vec![
            frag("Left", 10.0, 100.0),
            frag("Right", 200.0, 100.0),
            frag("Foo", 10.0, 115.0),
            frag("Bar", 200.0, 115.0),
        ];
        let (tables, remaining) = detector.detect(two_rows, ALL);
        assert!(tables.is_empty());
        assert_eq!(remaining.len(), 4);
    }

    #[test]
    fn test_no_table_single_column() {
        let detector = TableDetector::new();
        let frags = vec![
            frag("Line 1", 10.0, 100.0),
            frag("Line 2", 10.0, 115.0),
            frag("Line 3", 10.0, 130.0),
        ];
        let (tables, remaining) = detector.detect(frags, ALL);
        assert!(tables.is_empty());
        assert_eq!(remaining.len(), 3);
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let detector = TableDetector::new();
        let frags = vec![
            frag("Field", 10.0, 100.0),
            frag("Bits", 80.0, 100.0),
            frag("Access", 150.0, 100.0),
            frag("EN", 10.0, 115.0),
            frag("0", 80.0, 115.0),
            frag("RW", 150.0, 115.0),
            frag("MODE", 10.0, 130.0),
            frag("2:1", 80.0, 130.0),
        ];
        let (tables, _) = detector.detect(frags, ALL);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows[2], vec!["MODE", "2:1", ""]);
    }

    #[test]
    fn test_fragments_in_one_cell_are_joined() {
        let detector = TableDetector::new();
        let frags = vec![
            frag("Reset", 10.0, 100.0),
            frag("value", 40.0, 100.0),
            frag("Hex", 120.0, 100.0),
            frag("A", 10.0, 115.0),
            frag("0x00", 120.0, 115.0),
            frag("B", 10.0, 130.0),
            frag("0xFF", 120.0, 130.0),
        ];
        let (tables, remaining) = detector.detect(frags, ALL);
        assert!(remaining.is_empty());
        assert_eq!(tables[0].rows[0], vec!["Reset value", "Hex"]);
    }

    #[test]
    fn test_out_of_range_fragments_untouched() {
        let detector = TableDetector::new();
        let frags = numbered(vec![
            frag("intro", 10.0, 20.0),
            frag("Name", 10.0, 100.0),
            frag("Age", 60.0, 100.0),
            frag("Alice", 10.0, 115.0),
            frag("30", 60.0, 115.0),
            frag("Bob", 10.0, 130.0),
            frag("25", 60.0, 130.0),
            frag("Carol", 10.0, 145.0),
            frag("41", 60.0, 145.0),
        ]);

        // The last row's center (150) falls outside the range.
        let (tables, remaining) = detector.detect(frags, 50.0..150.0);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].row_count(), 3);
        let left: Vec<&str> = remaining.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(left, vec!["intro", "Carol", "41"]);
    }

    #[test]
    fn test_bridging_prose_row_is_carved_off() {
        let detector = TableDetector::new();
        let frags = numbered(vec![
            // A prose line whose first fragment spans both columns.
            frag("The registers are", 10.0, 85.0),
            frag("listed here", 116.0, 85.0),
            frag("Name", 10.0, 100.0),
            frag("Offset", 110.0, 100.0),
            frag("CTRL", 10.0, 115.0),
            frag("0x00", 110.0, 115.0),
            frag("STAT", 10.0, 130.0),
            frag("0x04", 110.0, 130.0),
        ]);

        let (tables, remaining) = detector.detect(frags, ALL);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows[0], vec!["Name", "Offset"]);
        let left: Vec<&str> = remaining.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(left, vec!["The registers are", "listed here"]);
    }

    #[test]
    fn test_numbered_list_not_detected_as_table() {
        let detector = TableDetector::new();
        let frags = vec![
            frag("1.", 50.0, 100.0),
            frag("Device settings", 80.0, 100.0),
            frag("2.", 50.0, 130.0),
            frag("Object management", 80.0, 130.0),
            frag("3.", 50.0, 160.0),
            frag("Policy and routing", 80.0, 160.0),
            frag("4.", 50.0, 190.0),
            frag("VPN", 80.0, 190.0),
        ];
        let (tables, remaining) = detector.detect(frags, ALL);
        assert!(tables.is_empty(), "Numbered list should not be detected as a table");
        assert_eq!(remaining.len(), 8);
    }

    #[test]
    fn test_bullet_list_not_detected_as_table() {
        let detector = TableDetector::new();
        let frags = vec![
            frag("-", 50.0, 100.0),
            frag("Management", 80.0, 100.0),
            frag("-", 50.0, 130.0),
            frag("Interface/Service Option", 80.0, 130.0),
            frag("-", 50.0, 160.0),
            frag("Firmware", 80.0, 160.0),
        ];
        let (tables, remaining) = detector.detect(frags, ALL);
        assert!(tables.is_empty(), "Bullet list should not be detected as a table");
        assert_eq!(remaining.len(), 6);
    }

    #[test]
    fn test_numbered_first_column_table_kept() {
        let detector = TableDetector::new();
        let frags = vec![
            frag("1", 10.0, 100.0),
            frag("CTRL", 60.0, 100.0),
            frag("RW", 140.0, 100.0),
            frag("2", 10.0, 115.0),
            frag("STAT", 60.0, 115.0),
            frag("RO", 140.0, 115.0),
            frag("3", 10.0, 130.0),
            frag("DATA", 60.0, 130.0),
            frag("RW", 140.0, 130.0),
        ];
        let (tables, _) = detector.detect(frags, ALL);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].column_count(), 3);
    }

    #[test]
    fn test_list_markers() {
        for marker in ["1.", "12.", "1)", "1 .", "3", "a.", "B)"] {
            assert!(is_number_marker(marker), "{marker}");
        }
        for marker in ["-", "\u{2022}", "*", "\u{2013}"] {
            assert!(is_bullet_marker(marker), "{marker}");
        }
        for text in ["Name", "Hello World", "Alice", "", "A1"] {
            assert!(!is_number_marker(text) && !is_bullet_marker(text), "{text}");
        }
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: TableDetectorConfig = serde_json::from_str(r#"{"min_rows": 4}"#).unwrap();
        assert_eq!(config.min_rows, 4);
        assert_eq!(config.row_tolerance, 3.0);
        assert!(config.reject_list_patterns);
    }
}
