use thiserror::Error;

use super::cell::CellType;

// ---------------------------------------------------------------------------
// FrameError – every recoverable failure of the core
// ---------------------------------------------------------------------------

/// Errors returned by data frame operations.
///
/// A failed call never leaves its receiver partially modified.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    #[error("can't create an empty data frame")]
    EmptyFrame,

    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("dimension mismatch: expected {expected} rows, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("empty subset")]
    EmptySubset,

    #[error("bad subset: start {from} greater than end {to}")]
    BadRange { from: isize, to: isize },

    #[error("subset out of range: index {index} with {len} available")]
    OutOfRange { index: isize, len: usize },

    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("type check failed: {0}")]
    TypeMismatch(String),

    #[error("mismatching column names")]
    MismatchedColumns,

    #[error("mismatching column types for {column}: {left} vs {right}")]
    MismatchedTypes {
        column: String,
        left: CellType,
        right: CellType,
    },

    #[error("column {column} declared as {expected} holds a {found} cell")]
    MixedTypes {
        column: String,
        expected: CellType,
        found: CellType,
    },

    #[error("unknown column type: {0}")]
    UnknownType(String),

    #[error("can't convert {value:?} to {target}")]
    Coercion { value: String, target: CellType },

    #[error("invalid operation: {0}")]
    InvalidOperator(String),

    #[error("record {row} has {found} fields, header has {expected}")]
    RaggedRecords {
        row: usize,
        expected: usize,
        found: usize,
    },
}

pub type Result<T, E = FrameError> = std::result::Result<T, E>;
