use super::cell::{Cell, CellType};
use super::error::{FrameError, Result};

// ---------------------------------------------------------------------------
// Column – a named, homogeneously typed sequence of cells
// ---------------------------------------------------------------------------

/// An ordered sequence of cells sharing one declared [`CellType`].
///
/// Cells are only ever replaced as a whole column so the width cache and the
/// single-type invariant stay consistent.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    cell_type: CellType,
    cells: Vec<Cell>,
    /// Widest rendered value (header included), used by display only.
    num_chars: usize,
}

impl Column {
    /// Build a column, checking every cell against the declared type.
    pub fn new(name: impl Into<String>, cell_type: CellType, cells: Vec<Cell>) -> Result<Self> {
        let name = name.into();
        if let Some(bad) = cells.iter().find(|c| c.cell_type() != cell_type) {
            return Err(FrameError::MixedTypes {
                column: name,
                expected: cell_type,
                found: bad.cell_type(),
            });
        }
        let mut col = Column {
            name,
            cell_type,
            cells,
            num_chars: 0,
        };
        col.recount_num_chars();
        Ok(col)
    }

    /// Build a column whose type is taken from its first cell.
    pub fn from_cells(name: impl Into<String>, cells: Vec<Cell>) -> Result<Self> {
        let name = name.into();
        let Some(first) = cells.first() else {
            return Err(FrameError::UnknownType(format!("empty column {name}")));
        };
        let cell_type = first.cell_type();
        Column::new(name, cell_type, cells)
    }

    /// A string column holding the raw values as they were loaded.
    pub fn from_strings<S: AsRef<str>>(name: impl Into<String>, values: &[S]) -> Self {
        let cells = values
            .iter()
            .map(|v| Cell::String(Some(v.as_ref().to_string())))
            .collect();
        let mut col = Column {
            name: name.into(),
            cell_type: CellType::String,
            cells,
            num_chars: 0,
        };
        col.recount_num_chars();
        col
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&Cell> {
        self.cells.get(row)
    }

    pub fn num_chars(&self) -> usize {
        self.num_chars
    }

    /// The cell used to synthesise a missing row.
    pub fn empty(&self) -> Cell {
        Cell::na(self.cell_type)
    }

    /// Re-read every value as `target`, rendering through the display form.
    ///
    /// NA stays NA. The first value that can't be converted aborts the whole
    /// column and `self` is left untouched.
    pub fn parse_column(&self, target: CellType) -> Result<Column> {
        let cells = self
            .cells
            .iter()
            .map(|c| {
                if c.is_na() {
                    Ok(Cell::na(target))
                } else {
                    Cell::parse(&c.to_string(), target)
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Column::new(self.name.clone(), target, cells)
    }

    /// A new column holding the cells at `rows`; `None` selects the NA sentinel.
    pub(crate) fn take(&self, rows: &[Option<usize>]) -> Column {
        let cells = rows
            .iter()
            .map(|r| match r {
                Some(i) => self.cells[*i].clone(),
                None => self.empty(),
            })
            .collect();
        self.with_cells(cells)
    }

    /// Same name and type, different cells. Callers guarantee the cell types.
    pub(crate) fn with_cells(&self, cells: Vec<Cell>) -> Column {
        debug_assert!(cells.iter().all(|c| c.cell_type() == self.cell_type));
        let mut col = Column {
            name: self.name.clone(),
            cell_type: self.cell_type,
            cells,
            num_chars: 0,
        };
        col.recount_num_chars();
        col
    }

    /// This column followed by the cells of `other`.
    pub(crate) fn append(&self, other: &Column) -> Result<Column> {
        if other.cell_type != self.cell_type {
            return Err(FrameError::MismatchedTypes {
                column: self.name.clone(),
                left: self.cell_type,
                right: other.cell_type,
            });
        }
        let mut cells = Vec::with_capacity(self.len() + other.len());
        cells.extend_from_slice(&self.cells);
        cells.extend_from_slice(&other.cells);
        Ok(self.with_cells(cells))
    }

    pub(crate) fn rename(&mut self, name: String) {
        self.name = name;
        self.recount_num_chars();
    }

    fn recount_num_chars(&mut self) {
        self.num_chars = self
            .cells
            .iter()
            .map(|c| c.to_string().chars().count())
            .chain(std::iter::once(self.name.chars().count()))
            .max()
            .unwrap_or(0);
    }
}
