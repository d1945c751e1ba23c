use std::collections::HashMap;

use super::error::Result;
use super::frame::DataFrame;
use super::subset::RowSelector;

// ---------------------------------------------------------------------------
// Row fingerprints and occurrence groups
// ---------------------------------------------------------------------------

/// Which rows a dedup pass keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupView {
    /// Rows that occur exactly once.
    Unique,
    /// Every occurrence of every repeated row.
    RemoveUnique,
    /// The first occurrence of every row (distinct rows).
    RemoveDuplicated,
    /// The first occurrence of every repeated row.
    Duplicated,
}

/// All row indices sharing one fingerprint, in ascending order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowGroup {
    appears: Vec<usize>,
}

impl RowGroup {
    pub fn appears(&self) -> &[usize] {
        &self.appears
    }

    pub fn is_unique(&self) -> bool {
        self.appears.len() == 1
    }

    pub fn first(&self) -> usize {
        self.appears[0]
    }
}

impl DataFrame {
    /// Concatenated cell checksums of one row.
    ///
    /// Columns are visited in lexical name order (the `BTreeMap` order), so the
    /// byte layout is the same for every row of the frame.
    /// `row` must be below `n_rows`.
    pub(crate) fn row_fingerprint(&self, row: usize) -> Vec<u8> {
        let mut fp = Vec::with_capacity(self.columns.len() * 16);
        for col in self.columns.values() {
            fp.extend_from_slice(&col.cells()[row].checksum());
        }
        fp
    }

    /// Rows grouped by equal fingerprint, ordered by first occurrence.
    pub fn row_groups(&self) -> Vec<RowGroup> {
        let mut slot_of: HashMap<Vec<u8>, usize> = HashMap::new();
        let mut groups: Vec<RowGroup> = Vec::new();
        for row in 0..self.n_rows {
            let fp = self.row_fingerprint(row);
            match slot_of.get(&fp) {
                Some(&slot) => groups[slot].appears.push(row),
                None => {
                    slot_of.insert(fp, groups.len());
                    groups.push(RowGroup { appears: vec![row] });
                }
            }
        }
        groups
    }

    /// Row indices kept by `view`, ascending.
    pub fn dedup_indices(&self, view: DedupView) -> Vec<usize> {
        let groups = self.row_groups();
        let mut rows: Vec<usize> = match view {
            DedupView::Unique => groups
                .iter()
                .filter(|g| g.is_unique())
                .map(RowGroup::first)
                .collect(),
            DedupView::RemoveUnique => groups
                .iter()
                .filter(|g| !g.is_unique())
                .flat_map(|g| g.appears.iter().copied())
                .collect(),
            DedupView::RemoveDuplicated => groups.iter().map(RowGroup::first).collect(),
            DedupView::Duplicated => groups
                .iter()
                .filter(|g| !g.is_unique())
                .map(RowGroup::first)
                .collect(),
        };
        rows.sort_unstable();
        log::debug!(
            "{view:?}: {} of {} rows in {} groups",
            rows.len(),
            self.n_rows,
            groups.len()
        );
        rows
    }

    /// The rows kept by `view`. Fails with an empty subset when nothing is kept.
    pub fn dedup(&self, view: DedupView) -> Result<DataFrame> {
        let rows = self.dedup_indices(view);
        self.subset_rows(&RowSelector::from(rows))
    }

    pub fn unique(&self) -> Result<DataFrame> {
        self.dedup(DedupView::Unique)
    }

    pub fn remove_unique(&self) -> Result<DataFrame> {
        self.dedup(DedupView::RemoveUnique)
    }

    pub fn remove_duplicated(&self) -> Result<DataFrame> {
        self.dedup(DedupView::RemoveDuplicated)
    }

    pub fn duplicated(&self) -> Result<DataFrame> {
        self.dedup(DedupView::Duplicated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::cell::{Cell, CellType};
    use crate::data::column::Column;
    use crate::data::error::FrameError;
    use pretty_assertions::assert_eq;

    fn frame(ids: &[Option<i64>], tags: &[&str]) -> DataFrame {
        DataFrame::new(vec![
            Column::new("id", CellType::Int, ids.iter().map(|&i| Cell::from(i)).collect()).unwrap(),
            Column::new("tag", CellType::String, tags.iter().map(|&t| Cell::from(t)).collect())
                .unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn no_duplicates_means_all_unique() {
        let df = frame(&[Some(10), Some(20), Some(30)], &["a", "b", "a"]);
        assert_eq!(df.dedup_indices(DedupView::Unique), vec![0, 1, 2]);
        assert_eq!(df.unique().unwrap().n_rows(), 3);
        assert_eq!(df.remove_duplicated().unwrap(), df);
        assert_eq!(df.duplicated().unwrap_err(), FrameError::EmptySubset);
    }

    #[test]
    fn views_over_repeated_rows() {
        let df = frame(
            &[Some(1), Some(2), Some(1), None, Some(1), None],
            &["x", "y", "x", "z", "x", "z"],
        );
        assert_eq!(df.dedup_indices(DedupView::Unique), vec![1]);
        assert_eq!(df.dedup_indices(DedupView::RemoveUnique), vec![0, 2, 3, 4, 5]);
        assert_eq!(df.dedup_indices(DedupView::RemoveDuplicated), vec![0, 1, 3]);
        assert_eq!(df.dedup_indices(DedupView::Duplicated), vec![0, 3]);

        let groups = df.row_groups();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].appears(), &[0, 2, 4]);
        assert!(groups[1].is_unique());
        assert_eq!(groups[2].first(), 3);

        let distinct = df.remove_duplicated().unwrap();
        assert_eq!(distinct.n_rows(), 3);
        assert_eq!(distinct.get_cell("id", 2).unwrap().0, &Cell::Int(None));
    }

    #[test]
    fn unique_and_remove_unique_partition_rows() {
        let df = frame(&[Some(1), Some(1), Some(2), Some(3)], &["a", "a", "a", "b"]);
        let mut all = df.dedup_indices(DedupView::Unique);
        all.extend(df.dedup_indices(DedupView::RemoveUnique));
        all.sort_unstable();
        assert_eq!(all, vec![0, 1, 2, 3]);
    }

    #[test]
    fn na_of_different_types_do_not_collide() {
        let df = DataFrame::new(vec![
            Column::new("a", CellType::Int, vec![Cell::Int(None), Cell::Int(None)]).unwrap(),
            Column::new("b", CellType::Float, vec![Cell::Float(None), Cell::Float(None)]).unwrap(),
        ])
        .unwrap();
        assert_ne!(
            df.column("a").unwrap().cells()[0].checksum(),
            df.column("b").unwrap().cells()[0].checksum()
        );
        assert_eq!(df.row_fingerprint(0), df.row_fingerprint(1));
        assert_eq!(df.row_groups().len(), 1);
    }
}
