use std::fmt;
use std::str::FromStr;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use super::error::{FrameError, Result};

// ---------------------------------------------------------------------------
// CellType – the declared type tag of a cell or column
// ---------------------------------------------------------------------------

/// The four value variants a cell can hold.
///
/// Deserializes from the same tags [`FromStr`] accepts, in any letter case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum CellType {
    Int,
    Float,
    String,
    Bool,
}

impl CellType {
    /// Tag mixed into every checksum so equal payloads of different types differ.
    fn tag(self) -> u8 {
        match self {
            CellType::Int => 1,
            CellType::Float => 2,
            CellType::String => 3,
            CellType::Bool => 4,
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CellType::Int => "int",
            CellType::Float => "float",
            CellType::String => "string",
            CellType::Bool => "bool",
        };
        f.write_str(name)
    }
}

impl FromStr for CellType {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" | "i64" => Ok(CellType::Int),
            "float" | "f64" | "double" => Ok(CellType::Float),
            "string" | "str" => Ok(CellType::String),
            "bool" | "boolean" => Ok(CellType::Bool),
            _ => Err(FrameError::UnknownType(s.to_string())),
        }
    }
}

impl TryFrom<String> for CellType {
    type Error = FrameError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Truncate toward zero, `None` when the result doesn't fit in an `i64`.
pub(crate) fn truncate_to_int(v: f64) -> Option<i64> {
    // `i64::MAX as f64` rounds up to 2^63, which is already out of range.
    (v.is_finite() && v >= i64::MIN as f64 && v < i64::MAX as f64).then(|| v.trunc() as i64)
}

// ---------------------------------------------------------------------------
// Cell – a single typed value, `None` payload is NA
// ---------------------------------------------------------------------------

/// A typed scalar. Every variant can be NA, represented by a `None` payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Int(Option<i64>),
    Float(Option<f64>),
    String(Option<String>),
    Bool(Option<bool>),
}

impl Cell {
    /// The NA value of the given type.
    pub fn na(cell_type: CellType) -> Self {
        match cell_type {
            CellType::Int => Cell::Int(None),
            CellType::Float => Cell::Float(None),
            CellType::String => Cell::String(None),
            CellType::Bool => Cell::Bool(None),
        }
    }

    /// Parse a raw string into a cell of `target` type.
    ///
    /// The empty string is NA for every target. Anything else that can't be read
    /// as `target` is a [`FrameError::Coercion`].
    pub fn parse(raw: &str, target: CellType) -> Result<Self> {
        if raw.is_empty() {
            return Ok(Cell::na(target));
        }
        let coercion = || FrameError::Coercion {
            value: raw.to_string(),
            target,
        };
        match target {
            CellType::String => Ok(Cell::String(Some(raw.to_string()))),
            CellType::Int => raw
                .trim()
                .parse::<i64>()
                .map(|i| Cell::Int(Some(i)))
                .map_err(|_| coercion()),
            CellType::Float => raw
                .trim()
                .parse::<f64>()
                .map(|f| Cell::Float(Some(f)))
                .map_err(|_| coercion()),
            CellType::Bool => parse_bool(raw.trim())
                .map(|b| Cell::Bool(Some(b)))
                .ok_or_else(coercion),
        }
    }

    pub fn cell_type(&self) -> CellType {
        match self {
            Cell::Int(_) => CellType::Int,
            Cell::Float(_) => CellType::Float,
            Cell::String(_) => CellType::String,
            Cell::Bool(_) => CellType::Bool,
        }
    }

    pub fn is_na(&self) -> bool {
        match self {
            Cell::Int(v) => v.is_none(),
            Cell::Float(v) => v.is_none(),
            Cell::String(v) => v.is_none(),
            Cell::Bool(v) => v.is_none(),
        }
    }

    /// An NA copy of this cell, keeping its variant.
    pub fn to_na(&self) -> Self {
        Cell::na(self.cell_type())
    }

    /// Integer view of the cell. `Ok(None)` for NA.
    pub fn to_int(&self) -> Result<Option<i64>> {
        match self {
            Cell::Int(v) => Ok(*v),
            Cell::Float(None) | Cell::String(None) | Cell::Bool(None) => Ok(None),
            Cell::Float(Some(f)) => truncate_to_int(*f)
                .map(Some)
                .ok_or_else(|| self.coercion(CellType::Int)),
            Cell::Bool(Some(b)) => Ok(Some(i64::from(*b))),
            Cell::String(Some(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| self.coercion(CellType::Int)),
        }
    }

    /// Floating point view of the cell. `Ok(None)` for NA.
    pub fn to_float(&self) -> Result<Option<f64>> {
        match self {
            Cell::Float(v) => Ok(*v),
            Cell::Int(v) => Ok(v.map(|i| i as f64)),
            Cell::Bool(v) => Ok(v.map(|b| if b { 1.0 } else { 0.0 })),
            Cell::String(None) => Ok(None),
            Cell::String(Some(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| self.coercion(CellType::Float)),
        }
    }

    /// Boolean view of the cell. `Ok(None)` for NA.
    ///
    /// Integers convert only from `0` and `1`; floats never convert.
    pub fn to_bool(&self) -> Result<Option<bool>> {
        match self {
            Cell::Bool(v) => Ok(*v),
            Cell::Int(None) | Cell::Float(None) | Cell::String(None) => Ok(None),
            Cell::Int(Some(0)) => Ok(Some(false)),
            Cell::Int(Some(1)) => Ok(Some(true)),
            Cell::String(Some(s)) => parse_bool(s.trim())
                .map(Some)
                .ok_or_else(|| self.coercion(CellType::Bool)),
            Cell::Int(Some(_)) | Cell::Float(Some(_)) => Err(self.coercion(CellType::Bool)),
        }
    }

    /// This cell as `target`: NA stays NA, equal types are copied and anything
    /// else is re-read through its display form with [`Cell::parse`].
    pub fn coerce(&self, target: CellType) -> Result<Cell> {
        if self.is_na() {
            Ok(Cell::na(target))
        } else if self.cell_type() == target {
            Ok(self.clone())
        } else {
            Cell::parse(&self.to_string(), target)
        }
    }

    /// Fixed-size content digest covering the type tag, NA state and value.
    pub fn checksum(&self) -> [u8; 16] {
        let mut hasher = Md5::new();
        hasher.update([self.cell_type().tag(), u8::from(self.is_na())]);
        match self {
            Cell::Int(Some(i)) => hasher.update(i.to_le_bytes()),
            Cell::Float(Some(f)) => hasher.update(f.to_bits().to_le_bytes()),
            Cell::String(Some(s)) => hasher.update(s.as_bytes()),
            Cell::Bool(Some(b)) => hasher.update([u8::from(*b)]),
            _ => {}
        }
        hasher.finalize().into()
    }

    fn coercion(&self, target: CellType) -> FrameError {
        FrameError::Coercion {
            value: self.to_string(),
            target,
        }
    }
}

/// Accepts the usual spellings: `1 t T TRUE true True` and their false twins.
fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Int(Some(i)) => write!(f, "{i}"),
            Cell::Float(Some(v)) => write!(f, "{v}"),
            Cell::String(Some(s)) => write!(f, "{s}"),
            Cell::Bool(Some(b)) => write!(f, "{b}"),
            _ => f.write_str("NA"),
        }
    }
}

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Cell {
                fn from(v: $ty) -> Self {
                    Cell::$variant(Some(v.into()))
                }
            }

            impl From<Option<$ty>> for Cell {
                fn from(v: Option<$ty>) -> Self {
                    Cell::$variant(v.map(Into::into))
                }
            }
        )*
    };
}

impl_from_value!(i64 => Int, f64 => Float, bool => Bool, String => String, &str => String);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_string_parses_to_na_for_every_type() {
        for ty in [CellType::Int, CellType::Float, CellType::String, CellType::Bool] {
            let cell = Cell::parse("", ty).unwrap();
            assert!(cell.is_na());
            assert_eq!(cell.cell_type(), ty);
        }
    }

    #[test]
    fn unparsable_string_is_a_coercion_error() {
        let err = Cell::parse("abc", CellType::Int).unwrap_err();
        assert_eq!(
            err,
            FrameError::Coercion {
                value: "abc".to_string(),
                target: CellType::Int
            }
        );
        assert!(Cell::parse("yes", CellType::Bool).is_err());
        assert_eq!(Cell::parse("2.5", CellType::Float).unwrap(), Cell::from(2.5));
        assert_eq!(Cell::parse("T", CellType::Bool).unwrap(), Cell::from(true));
    }

    #[test]
    fn na_renders_as_token() {
        assert_eq!(Cell::Float(None).to_string(), "NA");
        assert_eq!(Cell::from(3_i64).to_string(), "3");
        assert_eq!(Cell::from("x").to_na(), Cell::String(None));
    }

    #[test]
    fn conversions_fail_locally() {
        assert_eq!(Cell::from("12").to_int().unwrap(), Some(12));
        assert_eq!(Cell::from(2.9).to_int().unwrap(), Some(2));
        assert_eq!(Cell::from(true).to_float().unwrap(), Some(1.0));
        assert_eq!(Cell::Int(None).to_float().unwrap(), None);
        assert!(Cell::from("twelve").to_int().is_err());
        assert!(Cell::from(0.5).to_bool().is_err());
        assert_eq!(Cell::from(0_i64).to_bool().unwrap(), Some(false));
    }

    #[test]
    fn float_to_int_outside_range_is_a_coercion_error() {
        assert!(matches!(Cell::from(1e20).to_int(), Err(FrameError::Coercion { .. })));
        assert!(matches!(Cell::from(-1e19).to_int(), Err(FrameError::Coercion { .. })));
        assert!(Cell::from(f64::NAN).to_int().is_err());
        assert_eq!(Cell::from(-2.7).to_int().unwrap(), Some(-2));
        assert_eq!(truncate_to_int(1e18), Some(1_000_000_000_000_000_000));
        assert_eq!(truncate_to_int(i64::MAX as f64), None);
    }

    #[test]
    fn coerce_keeps_na_and_rereads_values() {
        assert_eq!(Cell::String(None).coerce(CellType::Int).unwrap(), Cell::Int(None));
        assert_eq!(Cell::from(3_i64).coerce(CellType::Float).unwrap(), Cell::from(3.0));
        assert_eq!(Cell::from(true).coerce(CellType::String).unwrap(), Cell::from("true"));
        assert!(Cell::from(2.5).coerce(CellType::Int).is_err());
    }

    #[test]
    fn checksum_separates_types_and_na() {
        assert_ne!(Cell::Int(None).checksum(), Cell::Float(None).checksum());
        assert_ne!(Cell::from(1_i64).checksum(), Cell::from("1").checksum());
        assert_ne!(Cell::from("NA").checksum(), Cell::String(None).checksum());
        assert_eq!(Cell::from(7_i64).checksum(), Cell::from(7_i64).checksum());
    }

    #[test]
    fn type_tags_parse_and_deserialize() {
        assert_eq!("Integer".parse::<CellType>().unwrap(), CellType::Int);
        assert!(matches!("date".parse::<CellType>(), Err(FrameError::UnknownType(_))));
        let ty: CellType = serde_json::from_str("\"boolean\"").unwrap();
        assert_eq!(ty, CellType::Bool);
        let ty: CellType = serde_json::from_str("\"Int\"").unwrap();
        assert_eq!(ty, CellType::Int);
        assert!(serde_json::from_str::<CellType>("\"date\"").is_err());
        assert_eq!(serde_json::to_string(&CellType::Float).unwrap(), "\"float\"");
    }
}
