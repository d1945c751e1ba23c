use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use super::cell::{Cell, CellType};
use super::column::Column;
use super::error::{FrameError, Result};

// ---------------------------------------------------------------------------
// ColumnTypes – target types for the coercion pass
// ---------------------------------------------------------------------------

/// Types to parse loaded string columns into.
///
/// Deserializes from either a JSON array (positional) or a JSON object (by name).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ColumnTypes {
    /// One type per column position; positions past the end are left as-is.
    Positional(Vec<CellType>),
    /// Column name → type; unmentioned columns are left as-is.
    Named(BTreeMap<String, CellType>),
}

// ---------------------------------------------------------------------------
// DataFrame – equal-length named columns
// ---------------------------------------------------------------------------

/// A collection of named columns sharing one row count.
///
/// Columns are keyed by name in a `BTreeMap`, so iterating `columns` visits them
/// in lexical name order. `col_index` keeps the user-facing position of each
/// column; both maps always cover the same key set.
///
/// `Clone` is a deep copy: no cell storage is shared between the two frames.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    pub(crate) columns: BTreeMap<String, Column>,
    pub(crate) col_index: BTreeMap<String, usize>,
    pub(crate) n_rows: usize,
}

impl DataFrame {
    /// Build a frame from column literals, positioned in the given order.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let Some(first) = columns.first() else {
            return Err(FrameError::EmptyFrame);
        };
        let n_rows = first.len();

        let mut df = DataFrame {
            columns: BTreeMap::new(),
            col_index: BTreeMap::new(),
            n_rows,
        };
        for (pos, col) in columns.into_iter().enumerate() {
            if col.len() != n_rows {
                return Err(FrameError::DimensionMismatch {
                    expected: n_rows,
                    found: col.len(),
                });
            }
            if df.columns.contains_key(col.name()) {
                return Err(FrameError::DuplicateColumn(col.name().to_string()));
            }
            df.col_index.insert(col.name().to_string(), pos);
            df.columns.insert(col.name().to_string(), col);
        }
        Ok(df)
    }

    /// Load a rectangular string matrix whose first row holds the column names.
    ///
    /// Empty names get a `V<n>` placeholder that doesn't collide with any other
    /// name; duplicated non-empty names are rejected. Every column is loaded as
    /// [`CellType::String`].
    pub fn from_records<S: AsRef<str>>(records: &[Vec<S>]) -> Result<Self> {
        let Some((header, rows)) = records.split_first() else {
            return Err(FrameError::EmptyFrame);
        };
        if rows.is_empty() {
            return Err(FrameError::EmptyFrame);
        }

        let names = unique_names(header)?;
        for (i, row) in rows.iter().enumerate() {
            if row.len() != names.len() {
                return Err(FrameError::RaggedRecords {
                    row: i + 1,
                    expected: names.len(),
                    found: row.len(),
                });
            }
        }

        let columns = names
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let values: Vec<&str> = rows.iter().map(|r| r[j].as_ref()).collect();
                Column::from_strings(name.as_str(), &values)
            })
            .collect();
        log::debug!("loaded {} rows x {} columns", rows.len(), names.len());
        DataFrame::new(columns)
    }

    /// Load typed rows under `header`, with the same naming rules as
    /// [`DataFrame::from_records`].
    ///
    /// Each column takes the type of its first non-NA cell, widened to `Float`
    /// when `Int` and `Float` values are mixed. A column of NA only keeps the
    /// variant of its first cell. Other cells are converted with [`Cell::coerce`],
    /// so a value that can't be read as the column type fails the whole load.
    pub fn from_rows<S: AsRef<str>>(header: &[S], rows: &[Vec<Cell>]) -> Result<Self> {
        if rows.is_empty() {
            return Err(FrameError::EmptyFrame);
        }
        let names = unique_names(header)?;
        for (i, row) in rows.iter().enumerate() {
            if row.len() != names.len() {
                return Err(FrameError::RaggedRecords {
                    row: i + 1,
                    expected: names.len(),
                    found: row.len(),
                });
            }
        }

        let columns = names
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let cells: Vec<&Cell> = rows.iter().map(|r| &r[j]).collect();
                let cell_type = infer_type(&cells);
                let cells = cells
                    .into_iter()
                    .map(|c| c.coerce(cell_type))
                    .collect::<Result<Vec<_>>>()?;
                Column::new(name.as_str(), cell_type, cells)
            })
            .collect::<Result<Vec<_>>>()?;
        log::debug!("loaded {} typed rows x {} columns", rows.len(), names.len());
        DataFrame::new(columns)
    }

    /// Load a string matrix and run the coercion pass on the result.
    pub fn load_and_parse<S: AsRef<str>>(records: &[Vec<S>], types: &ColumnTypes) -> Result<Self> {
        DataFrame::from_records(records)?.parse(types)
    }

    /// A copy of this frame with the requested columns parsed into new types.
    ///
    /// The first column that fails to convert aborts the pass; `self` is never
    /// modified.
    pub fn parse(&self, types: &ColumnTypes) -> Result<Self> {
        let mut targets: Vec<(String, CellType)> = Vec::new();
        match types {
            ColumnTypes::Positional(list) => {
                for (name, pos) in &self.col_index {
                    if let Some(ty) = list.get(*pos) {
                        targets.push((name.clone(), *ty));
                    }
                }
            }
            ColumnTypes::Named(map) => {
                for (name, ty) in map {
                    if !self.columns.contains_key(name) {
                        return Err(FrameError::ColumnNotFound(name.clone()));
                    }
                    targets.push((name.clone(), *ty));
                }
            }
        }

        let mut out = self.clone();
        for (name, ty) in targets {
            let parsed = self.columns[&name].parse_column(ty)?;
            log::debug!("parsed column {name} as {ty}");
            out.columns.insert(name, parsed);
        }
        Ok(out)
    }

    /// Header row followed by one rendered row per table row, in position order.
    pub fn save_records(&self) -> Vec<Vec<String>> {
        let cols = self.ordered_columns();
        let mut records = Vec::with_capacity(self.n_rows + 1);
        records.push(cols.iter().map(|c| c.name().to_string()).collect());
        for i in 0..self.n_rows {
            records.push(cols.iter().map(|c| c.cells()[i].to_string()).collect());
        }
        records
    }

    /// Column names in position order.
    pub fn names(&self) -> Vec<String> {
        self.ordered_columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    /// `(rows, columns)`.
    pub fn dim(&self) -> (usize, usize) {
        (self.n_rows, self.columns.len())
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Position of the named column.
    pub fn col_index(&self, name: &str) -> Result<usize> {
        self.col_index
            .get(name)
            .copied()
            .ok_or_else(|| FrameError::ColumnNotFound(name.to_string()))
    }

    /// The cell at `row` of column `name`, with the column's declared type.
    pub fn get_cell(&self, name: &str, row: usize) -> Result<(&Cell, CellType)> {
        let col = self
            .columns
            .get(name)
            .ok_or_else(|| FrameError::ColumnNotFound(name.to_string()))?;
        let cell = col.get(row).ok_or(FrameError::OutOfRange {
            index: row as isize,
            len: self.n_rows,
        })?;
        Ok((cell, col.cell_type()))
    }

    /// Rename columns by position: `names[p]` becomes the name of the column at
    /// position `p`. Columns past the end of `names` keep their name.
    ///
    /// Cell data is untouched. A resulting duplicate name fails and leaves the
    /// frame as it was.
    pub fn set_names<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        let mut new_index = BTreeMap::new();
        let mut renames = Vec::with_capacity(self.col_index.len());
        for (old, &pos) in &self.col_index {
            let new = names.get(pos).map_or(old.as_str(), |n| n.as_ref());
            if new_index.insert(new.to_string(), pos).is_some() {
                return Err(FrameError::DuplicateColumn(new.to_string()));
            }
            renames.push((old.clone(), new.to_string()));
        }

        let mut columns = BTreeMap::new();
        for (old, new) in renames {
            if let Some(mut col) = self.columns.remove(&old) {
                col.rename(new.clone());
                columns.insert(new, col);
            }
        }
        self.columns = columns;
        self.col_index = new_index;
        Ok(())
    }

    /// Columns sorted by position.
    pub(crate) fn ordered_columns(&self) -> Vec<&Column> {
        let mut cols: Vec<(usize, &Column)> = self
            .columns
            .iter()
            .map(|(name, col)| (self.col_index[name], col))
            .collect();
        cols.sort_by_key(|(pos, _)| *pos);
        cols.into_iter().map(|(_, c)| c).collect()
    }
}

/// Fill empty header names with `V<n>` placeholders and reject duplicates.
fn unique_names<S: AsRef<str>>(header: &[S]) -> Result<Vec<String>> {
    let mut seen = BTreeSet::new();
    for name in header.iter().map(AsRef::as_ref).filter(|n| !n.is_empty()) {
        if !seen.insert(name.to_string()) {
            return Err(FrameError::DuplicateColumn(name.to_string()));
        }
    }

    let mut counter = 0;
    let mut names = Vec::with_capacity(header.len());
    for name in header.iter().map(AsRef::as_ref) {
        if !name.is_empty() {
            names.push(name.to_string());
            continue;
        }
        loop {
            let candidate = format!("V{counter}");
            counter += 1;
            if seen.insert(candidate.clone()) {
                names.push(candidate);
                break;
            }
        }
    }
    Ok(names)
}

/// Type of the first non-NA cell; `Int` widens to `Float` if any float is present.
fn infer_type(cells: &[&Cell]) -> CellType {
    let first_value = cells.iter().find(|c| !c.is_na()).map(|c| c.cell_type());
    match first_value {
        Some(CellType::Int) if cells.iter().any(|c| matches!(c, Cell::Float(Some(_)))) => {
            CellType::Float
        }
        Some(ty) => ty,
        None => cells.first().map_or(CellType::String, |c| c.cell_type()),
    }
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// Stack the rows of `b` under the rows of `a`.
///
/// Both frames must have the same column names at the same positions with the
/// same declared types.
pub fn rbind(a: &DataFrame, b: &DataFrame) -> Result<DataFrame> {
    if a.col_index != b.col_index {
        return Err(FrameError::MismatchedColumns);
    }

    let mut columns = BTreeMap::new();
    for (name, col) in &a.columns {
        columns.insert(name.clone(), col.append(&b.columns[name])?);
    }
    Ok(DataFrame {
        columns,
        col_index: a.col_index.clone(),
        n_rows: a.n_rows + b.n_rows,
    })
}

/// Place the columns of `b` after the columns of `a`.
pub fn cbind(a: &DataFrame, b: &DataFrame) -> Result<DataFrame> {
    if a.n_rows != b.n_rows {
        return Err(FrameError::DimensionMismatch {
            expected: a.n_rows,
            found: b.n_rows,
        });
    }
    if let Some(name) = b.columns.keys().find(|k| a.columns.contains_key(*k)) {
        return Err(FrameError::DuplicateColumn(name.clone()));
    }

    let mut out = a.clone();
    let offset = a.col_index.len();
    for (name, col) in &b.columns {
        out.columns.insert(name.clone(), col.clone());
        out.col_index.insert(name.clone(), b.col_index[name] + offset);
    }
    Ok(out)
}
