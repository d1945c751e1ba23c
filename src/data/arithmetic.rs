use std::fmt;

use super::cell::{truncate_to_int, Cell, CellType};
use super::column::Column;
use super::error::{FrameError, Result};
use super::frame::DataFrame;

// ---------------------------------------------------------------------------
// Elementwise column arithmetic
// ---------------------------------------------------------------------------

/// A binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    /// `None` on overflow or division by zero.
    fn ints(self, a: i64, b: i64) -> Option<i64> {
        match self {
            ArithOp::Add => a.checked_add(b),
            ArithOp::Sub => a.checked_sub(b),
            ArithOp::Mul => a.checked_mul(b),
            ArithOp::Div => a.checked_div(b),
        }
    }

    fn floats(self, a: f64, b: f64) -> f64 {
        match self {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
            ArithOp::Div => a / b,
        }
    }

    /// Float arithmetic stored back into an integer cell, truncating. `None`
    /// when the result is not finite or outside the `i64` range.
    fn truncated(self, a: f64, b: f64) -> Option<i64> {
        truncate_to_int(self.floats(a, b))
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sym = match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        };
        f.write_str(sym)
    }
}

impl DataFrame {
    /// Replace column `a` with `a <op> b`, row by row.
    ///
    /// The left column keeps its type: `Int <op> Int` is integer arithmetic,
    /// `Float <op> Int|Float` is float arithmetic, and `Int <op> Float` is float
    /// arithmetic truncated back to `Int`. NA on either side gives NA, as do
    /// integer overflow, integer division by zero and a non-finite result stored
    /// into an `Int` column. Any other pairing is a [`FrameError::TypeMismatch`].
    ///
    /// The frame is updated in place; on error it is left untouched.
    pub fn apply_column(&mut self, op: ArithOp, a: &str, b: &str) -> Result<()> {
        let ca = self.lookup(a)?;
        let cb = self.lookup(b)?;

        let pairs = ca.cells().iter().zip(cb.cells());
        let cells: Vec<Cell> = match (ca.cell_type(), cb.cell_type()) {
            (CellType::Int, CellType::Int) => pairs
                .map(|(x, y)| -> Result<Cell> {
                    let v = x.to_int()?.zip(y.to_int()?);
                    Ok(Cell::Int(v.and_then(|(x, y)| op.ints(x, y))))
                })
                .collect::<Result<_>>()?,
            (CellType::Float, CellType::Int | CellType::Float) => pairs
                .map(|(x, y)| -> Result<Cell> {
                    let v = x.to_float()?.zip(y.to_float()?);
                    Ok(Cell::Float(v.map(|(x, y)| op.floats(x, y))))
                })
                .collect::<Result<_>>()?,
            (CellType::Int, CellType::Float) => pairs
                .map(|(x, y)| -> Result<Cell> {
                    let v = x.to_float()?.zip(y.to_float()?);
                    Ok(Cell::Int(v.and_then(|(x, y)| op.truncated(x, y))))
                })
                .collect::<Result<_>>()?,
            (ta, tb) => {
                return Err(FrameError::TypeMismatch(format!("{ta} {op} {tb}")));
            }
        };

        let updated = ca.with_cells(cells);
        log::debug!("{a} {op}= {b} over {} rows", updated.len());
        self.columns.insert(a.to_string(), updated);
        Ok(())
    }

    /// Replace column `a` with `a <op> value`. `Int` columns truncate the float
    /// result back to `Int`; only `Int` and `Float` columns are accepted.
    pub fn apply_value(&mut self, op: ArithOp, a: &str, value: f64) -> Result<()> {
        let ca = self.lookup(a)?;
        let cells: Vec<Cell> = match ca.cell_type() {
            CellType::Int => ca
                .cells()
                .iter()
                .map(|x| -> Result<Cell> {
                    Ok(Cell::Int(x.to_float()?.and_then(|x| op.truncated(x, value))))
                })
                .collect::<Result<_>>()?,
            CellType::Float => ca
                .cells()
                .iter()
                .map(|x| -> Result<Cell> {
                    Ok(Cell::Float(x.to_float()?.map(|x| op.floats(x, value))))
                })
                .collect::<Result<_>>()?,
            ty => return Err(FrameError::TypeMismatch(format!("{ty} {op} float"))),
        };

        let updated = ca.with_cells(cells);
        self.columns.insert(a.to_string(), updated);
        Ok(())
    }

    /// `a /= b`, see [`DataFrame::apply_column`].
    pub fn div_column(&mut self, a: &str, b: &str) -> Result<()> {
        self.apply_column(ArithOp::Div, a, b)
    }

    /// `a /= value`, see [`DataFrame::apply_value`].
    pub fn div_value(&mut self, a: &str, value: f64) -> Result<()> {
        self.apply_value(ArithOp::Div, a, value)
    }

    fn lookup(&self, name: &str) -> Result<&Column> {
        self.columns
            .get(name)
            .ok_or_else(|| FrameError::ColumnNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new(
                "i",
                CellType::Int,
                vec![Cell::from(7_i64), Cell::Int(None), Cell::from(9_i64)],
            )
            .unwrap(),
            Column::new(
                "f",
                CellType::Float,
                vec![Cell::from(2.0), Cell::from(4.0), Cell::Float(None)],
            )
            .unwrap(),
            Column::new(
                "s",
                CellType::String,
                vec![Cell::from("a"), Cell::from("b"), Cell::from("c")],
            )
            .unwrap(),
            Column::new(
                "z",
                CellType::Int,
                vec![Cell::from(0_i64), Cell::from(1_i64), Cell::from(2_i64)],
            )
            .unwrap(),
        ])
        .unwrap()
    }

    fn cells(df: &DataFrame, name: &str) -> Vec<Cell> {
        df.column(name).unwrap().cells().to_vec()
    }

    #[test]
    fn self_division_is_one_with_na_propagation() {
        let mut df = frame();
        df.div_column("i", "i").unwrap();
        assert_eq!(cells(&df, "i"), vec![Cell::from(1_i64), Cell::Int(None), Cell::from(1_i64)]);
        df.div_column("f", "f").unwrap();
        assert_eq!(cells(&df, "f"), vec![Cell::from(1.0), Cell::from(1.0), Cell::Float(None)]);
    }

    #[test]
    fn int_by_float_truncates() {
        let mut df = frame();
        df.div_column("i", "f").unwrap();
        assert_eq!(cells(&df, "i"), vec![Cell::from(3_i64), Cell::Int(None), Cell::Int(None)]);
        assert_eq!(df.column("i").unwrap().cell_type(), CellType::Int);
    }

    #[test]
    fn float_by_int_stays_float() {
        let mut df = frame();
        df.div_column("f", "i").unwrap();
        assert_eq!(
            cells(&df, "f"),
            vec![Cell::from(2.0 / 7.0), Cell::Float(None), Cell::Float(None)]
        );
    }

    #[test]
    fn integer_division_by_zero_is_na() {
        let mut df = frame();
        df.div_column("i", "z").unwrap();
        assert_eq!(cells(&df, "i"), vec![Cell::Int(None), Cell::Int(None), Cell::from(4_i64)]);
    }

    #[test]
    fn int_results_out_of_range_are_na() {
        let mut df = DataFrame::new(vec![
            Column::new("i", CellType::Int, vec![Cell::from(5_i64), Cell::from(-5_i64)]).unwrap(),
            Column::new("f", CellType::Float, vec![Cell::from(1e-300), Cell::from(0.5)]).unwrap(),
        ])
        .unwrap();
        df.div_column("i", "f").unwrap();
        assert_eq!(cells(&df, "i"), vec![Cell::Int(None), Cell::from(-10_i64)]);

        let mut df = frame();
        df.div_value("i", 1e-300).unwrap();
        assert_eq!(cells(&df, "i"), vec![Cell::Int(None), Cell::Int(None), Cell::Int(None)]);

        let mut df = frame();
        df.apply_value(ArithOp::Mul, "i", -1e19).unwrap();
        assert_eq!(cells(&df, "i")[0], Cell::Int(None));
    }

    #[test]
    fn type_mismatch_leaves_frame_untouched() {
        let mut df = frame();
        let before = df.clone();
        assert!(matches!(df.div_column("s", "i"), Err(FrameError::TypeMismatch(_))));
        assert!(matches!(df.div_column("i", "s"), Err(FrameError::TypeMismatch(_))));
        assert!(matches!(df.div_value("s", 2.0), Err(FrameError::TypeMismatch(_))));
        assert!(matches!(df.div_column("i", "nope"), Err(FrameError::ColumnNotFound(_))));
        assert_eq!(df, before);
    }

    #[test]
    fn scalar_division() {
        let mut df = frame();
        df.div_value("i", 2.0).unwrap();
        df.div_value("f", 2.0).unwrap();
        assert_eq!(cells(&df, "i"), vec![Cell::from(3_i64), Cell::Int(None), Cell::from(4_i64)]);
        assert_eq!(cells(&df, "f"), vec![Cell::from(1.0), Cell::from(2.0), Cell::Float(None)]);
    }

    #[test]
    fn other_operators_follow_the_same_dispatch() {
        let mut df = frame();
        df.apply_column(ArithOp::Add, "i", "z").unwrap();
        assert_eq!(cells(&df, "i"), vec![Cell::from(7_i64), Cell::Int(None), Cell::from(11_i64)]);
        df.apply_value(ArithOp::Mul, "f", 1.5).unwrap();
        assert_eq!(cells(&df, "f"), vec![Cell::from(3.0), Cell::from(6.0), Cell::Float(None)]);
    }
}
