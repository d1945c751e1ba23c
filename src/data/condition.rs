use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use super::cell::{Cell, CellType};
use super::error::{FrameError, Result};

/// Tolerance for float equality.
const FLOAT_EPSILON: f64 = 1e-4;

fn expression_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*([^\s><!=]+)\s*([><!=]={0,1})\s*(.+)\s*$")
            .expect("condition grammar is a valid regex")
    })
}

// ---------------------------------------------------------------------------
// Condition – a threshold predicate over a single column
// ---------------------------------------------------------------------------

/// A parsed threshold test. Each leaf carries the literal it compares against.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `==`
    Eq(String),
    /// `>`
    Gt(String),
    /// `<`
    Lt(String),
    /// `<=`, evaluated as `Lt || Eq`.
    Ngt(String),
    /// `>=`, evaluated as `Gt || Eq`.
    Nlt(String),
    /// Every inner condition must hold.
    All(Vec<Condition>),
}

/// Conditions keyed by the column they apply to.
pub type Conditions = BTreeMap<String, Condition>;

impl Condition {
    /// Parse expressions of the form `<column> <op> <literal>`.
    ///
    /// Several expressions on the same column are combined into [`Condition::All`].
    /// Expressions that don't match the grammar are skipped. An operator other
    /// than `<`, `>`, `<=`, `>=` or `==` is an [`FrameError::InvalidOperator`].
    pub fn parse_all<S: AsRef<str>>(exprs: &[S]) -> Result<Conditions> {
        let mut grouped: BTreeMap<String, Vec<Condition>> = BTreeMap::new();
        for expr in exprs.iter().map(AsRef::as_ref) {
            let Some(caps) = expression_regex().captures(expr) else {
                log::warn!("skipping malformed condition {expr:?}");
                continue;
            };
            let literal = caps[3].trim_end().to_string();
            let cond = match &caps[2] {
                "<" => Condition::Lt(literal),
                ">" => Condition::Gt(literal),
                "<=" => Condition::Ngt(literal),
                ">=" => Condition::Nlt(literal),
                "==" => Condition::Eq(literal),
                op => return Err(FrameError::InvalidOperator(op.to_string())),
            };
            grouped.entry(caps[1].to_string()).or_default().push(cond);
        }

        Ok(grouped
            .into_iter()
            .map(|(col, mut conds)| {
                let cond = if conds.len() == 1 {
                    conds.remove(0)
                } else {
                    Condition::All(conds)
                };
                (col, cond)
            })
            .collect())
    }

    /// Evaluate against `cell`, interpreted as `cell_type`. NA never matches.
    pub fn compare(&self, cell: &Cell, cell_type: CellType) -> bool {
        if cell.is_na() {
            return false;
        }
        match self {
            Condition::Eq(lit) => eq(lit, cell, cell_type),
            Condition::Gt(lit) => ordered(lit, cell, cell_type, Ordering::Greater),
            Condition::Lt(lit) => ordered(lit, cell, cell_type, Ordering::Less),
            Condition::Ngt(lit) => {
                ordered(lit, cell, cell_type, Ordering::Less) || eq(lit, cell, cell_type)
            }
            Condition::Nlt(lit) => {
                ordered(lit, cell, cell_type, Ordering::Greater) || eq(lit, cell, cell_type)
            }
            Condition::All(conds) => conds.iter().all(|c| c.compare(cell, cell_type)),
        }
    }
}

fn eq(lit: &str, cell: &Cell, cell_type: CellType) -> bool {
    match cell_type {
        CellType::String => cell.to_string() == lit,
        CellType::Int => match (lit.trim().parse::<i64>(), cell.to_int()) {
            (Ok(l), Ok(Some(v))) => v == l,
            _ => false,
        },
        CellType::Float => match (lit.trim().parse::<f64>(), cell.to_float()) {
            (Ok(l), Ok(Some(v))) => (v - l).abs() < FLOAT_EPSILON,
            _ => false,
        },
        CellType::Bool => match cell.to_bool() {
            Ok(Some(true)) => lit == "true",
            Ok(Some(false)) => lit == "false",
            _ => false,
        },
    }
}

/// `cell <op> literal` where `want` is the ordering the cell must have.
fn ordered(lit: &str, cell: &Cell, cell_type: CellType, want: Ordering) -> bool {
    match cell_type {
        CellType::String => cell.to_string().as_str().cmp(lit) == want,
        CellType::Int => match (lit.trim().parse::<i64>(), cell.to_int()) {
            (Ok(l), Ok(Some(v))) => v.cmp(&l) == want,
            _ => false,
        },
        CellType::Float => match (lit.trim().parse::<f64>(), cell.to_float()) {
            (Ok(l), Ok(Some(v))) => v.partial_cmp(&l) == Some(want),
            _ => false,
        },
        CellType::Bool => false,
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Eq(lit) => write!(f, "== {lit}"),
            Condition::Gt(lit) => write!(f, "> {lit}"),
            Condition::Lt(lit) => write!(f, "< {lit}"),
            Condition::Ngt(lit) => write!(f, "<= {lit}"),
            Condition::Nlt(lit) => write!(f, ">= {lit}"),
            Condition::All(conds) => {
                f.write_str("{")?;
                for (i, c) in conds.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("}")
            }
        }
    }
}
