//! Table normalization.

use crate::model::TableBlock;

/// Drop every column whose cells are empty in all rows.
///
/// Row count and the order of the surviving columns are preserved. A table
/// whose columns are all empty comes back with zero columns.
pub fn normalize(table: &TableBlock) -> TableBlock {
    let keep: Vec<usize> = (0..table.column_count())
        .filter(|&i| !table.is_column_empty(i))
        .collect();

    if keep.len() == table.column_count() {
        return table.clone();
    }

    log::debug!(
        "Dropping {} empty column(s) from table on page {}",
        table.column_count() - keep.len(),
        table.page_index + 1
    );

    let rows = table
        .rows
        .iter()
        .map(|row| {
            keep.iter()
                .map(|&i| row.get(i).map(|c| c.trim().to_string()).unwrap_or_default())
                .collect()
        })
        .collect();

    TableBlock {
        page_index: table.page_index,
        bbox: table.bbox,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BBox;

    fn table(rows: &[&[&str]]) -> TableBlock {
        TableBlock::new(
            0,
            BBox::new(0.0, 0.0, 100.0, 50.0),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_drops_empty_column() {
        let t = table(&[&["A", "", "C"], &["1", " ", "3"], &["4", "", "6"]]);
        let n = normalize(&t);
        assert_eq!(n.row_count(), 3);
        assert_eq!(n.column_count(), 2);
        assert_eq!(n.rows[0], vec!["A", "C"]);
        assert_eq!(n.rows[2], vec!["4", "6"]);
    }

    #[test]
    fn test_partially_filled_column_is_kept() {
        let t = table(&[&["A", ""], &["1", "x"]]);
        assert_eq!(normalize(&t), t);
    }

    #[test]
    fn test_all_empty_table_has_zero_columns() {
        let t = table(&[&["", " "], &["", ""]]);
        let n = normalize(&t);
        assert_eq!(n.column_count(), 0);
        assert_eq!(n.row_count(), 2);
    }

    #[test]
    fn test_idempotent() {
        let t = table(&[&["", "B", "", "D"], &["", "2", "", ""], &["", "", "", "x"]]);
        let once = normalize(&t);
        assert_eq!(normalize(&once), once);
    }
}
