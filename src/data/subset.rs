use std::collections::{BTreeMap, BTreeSet};

use super::cell::Cell;
use super::condition::Conditions;
use super::error::{FrameError, Result};
use super::frame::DataFrame;

// ---------------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------------

/// Which columns to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelector {
    /// Column names; unknown names are ignored.
    Names(Vec<String>),
    /// Column positions; positions with no column are ignored.
    Positions(Vec<usize>),
    /// Half-open position range `[from, to)`.
    Range { from: usize, to: usize },
}

/// Which rows to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowSelector {
    /// Half-open row range `[from, to)`.
    Range { from: isize, to: isize },
    /// Explicit row indices, in output order. A negative index yields a row of
    /// NA cells.
    Indices(Vec<isize>),
}

impl From<Vec<&str>> for ColumnSelector {
    fn from(names: Vec<&str>) -> Self {
        ColumnSelector::Names(names.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<usize>> for RowSelector {
    fn from(rows: Vec<usize>) -> Self {
        RowSelector::Indices(rows.into_iter().map(|r| r as isize).collect())
    }
}

// ---------------------------------------------------------------------------
// Column and row subsetting
// ---------------------------------------------------------------------------

impl DataFrame {
    /// Columns then rows.
    pub fn subset(&self, columns: &ColumnSelector, rows: &RowSelector) -> Result<DataFrame> {
        self.subset_columns(columns)?.subset_rows(rows)
    }

    /// Keep only the selected columns, in their original relative order, with
    /// positions renumbered from zero.
    pub fn subset_columns(&self, selector: &ColumnSelector) -> Result<DataFrame> {
        let names: Vec<String> = match selector {
            ColumnSelector::Names(names) => names.clone(),
            ColumnSelector::Positions(positions) => {
                let wanted: BTreeSet<usize> = positions.iter().copied().collect();
                self.col_index
                    .iter()
                    .filter(|(_, pos)| wanted.contains(*pos))
                    .map(|(name, _)| name.clone())
                    .collect()
            }
            ColumnSelector::Range { from, to } => {
                let names = self
                    .col_index
                    .iter()
                    .filter(|(_, pos)| (*from..*to).contains(*pos))
                    .map(|(name, _)| name.clone())
                    .collect();
                return self.subset_columns(&ColumnSelector::Names(names));
            }
        };

        let keep: BTreeSet<&str> = names
            .iter()
            .map(String::as_str)
            .filter(|n| self.columns.contains_key(*n))
            .collect();
        if keep.is_empty() {
            return Err(FrameError::EmptySubset);
        }

        let mut kept: Vec<(usize, &str)> = keep.iter().map(|n| (self.col_index[*n], *n)).collect();
        kept.sort_by_key(|(pos, _)| *pos);

        let mut columns = BTreeMap::new();
        let mut col_index = BTreeMap::new();
        for (new_pos, (_, name)) in kept.into_iter().enumerate() {
            columns.insert(name.to_string(), self.columns[name].clone());
            col_index.insert(name.to_string(), new_pos);
        }
        Ok(DataFrame {
            columns,
            col_index,
            n_rows: self.n_rows,
        })
    }

    /// Every column except `name`.
    pub fn drop_column(&self, name: &str) -> Result<DataFrame> {
        if !self.columns.contains_key(name) {
            return Err(FrameError::ColumnNotFound(name.to_string()));
        }
        let rest = self
            .columns
            .keys()
            .filter(|k| k.as_str() != name)
            .cloned()
            .collect();
        self.subset_columns(&ColumnSelector::Names(rest))
    }

    /// Keep only the selected rows.
    pub fn subset_rows(&self, selector: &RowSelector) -> Result<DataFrame> {
        let rows: Vec<Option<usize>> = match selector {
            RowSelector::Range { from, to } => {
                let (from, to) = (*from, *to);
                if from > to {
                    return Err(FrameError::BadRange { from, to });
                }
                if from == to {
                    return Err(FrameError::EmptySubset);
                }
                if from < 0 {
                    return Err(self.out_of_range(from));
                }
                if to as usize > self.n_rows {
                    return Err(self.out_of_range(to));
                }
                (from as usize..to as usize).map(Some).collect()
            }
            RowSelector::Indices(indices) => {
                if indices.is_empty() {
                    return Err(FrameError::EmptySubset);
                }
                let past_end = indices
                    .iter()
                    .find(|&&i| i >= 0 && i as usize >= self.n_rows);
                if let Some(&bad) = past_end {
                    return Err(self.out_of_range(bad));
                }
                indices
                    .iter()
                    .map(|&i| usize::try_from(i).ok())
                    .collect()
            }
        };
        Ok(self.take_rows(&rows))
    }

    /// Rows where `predicate` holds for the cell of column `name`.
    ///
    /// Fails with [`FrameError::EmptySubset`] when no row matches.
    pub fn filter_rows<F>(&self, name: &str, predicate: F) -> Result<DataFrame>
    where
        F: Fn(&Cell) -> bool,
    {
        let col = self
            .columns
            .get(name)
            .ok_or_else(|| FrameError::ColumnNotFound(name.to_string()))?;
        let rows: Vec<isize> = col
            .cells()
            .iter()
            .enumerate()
            .filter(|(_, cell)| predicate(*cell))
            .map(|(i, _)| i as isize)
            .collect();
        self.subset_rows(&RowSelector::Indices(rows))
    }

    /// Rows where every column's condition holds. No conditions means a full copy.
    pub fn condition_rows(&self, conditions: &Conditions) -> Result<DataFrame> {
        if conditions.is_empty() {
            return Ok(self.clone());
        }

        let mut checks = Vec::with_capacity(conditions.len());
        for (name, cond) in conditions {
            let col = self
                .columns
                .get(name)
                .ok_or_else(|| FrameError::ColumnNotFound(name.clone()))?;
            checks.push((col, cond));
        }

        let rows: Vec<isize> = (0..self.n_rows)
            .filter(|&i| {
                checks
                    .iter()
                    .all(|(col, cond)| cond.compare(&col.cells()[i], col.cell_type()))
            })
            .map(|i| i as isize)
            .collect();
        log::debug!(
            "{} of {} rows match {} conditions",
            rows.len(),
            self.n_rows,
            checks.len()
        );
        self.subset_rows(&RowSelector::Indices(rows))
    }

    /// A new frame built from validated row picks; `None` is an NA row.
    pub(crate) fn take_rows(&self, rows: &[Option<usize>]) -> DataFrame {
        let columns = self
            .columns
            .iter()
            .map(|(name, col)| (name.clone(), col.take(rows)))
            .collect();
        DataFrame {
            columns,
            col_index: self.col_index.clone(),
            n_rows: rows.len(),
        }
    }

    fn out_of_range(&self, index: isize) -> FrameError {
        FrameError::OutOfRange {
            index,
            len: self.n_rows,
        }
    }
}
