//! In-memory data frames of named, typed columns with NA support.
//!
//! ```
//! use rusty_frame::{CellType, ColumnTypes, Condition, DataFrame};
//!
//! let records = vec![
//!     vec!["age", "name"],
//!     vec!["10", "a"],
//!     vec!["20", "b"],
//!     vec!["30", "a"],
//! ];
//! let types = ColumnTypes::Positional(vec![CellType::Int]);
//! let df = DataFrame::load_and_parse(&records, &types).unwrap();
//!
//! let conditions = Condition::parse_all(&["age > 15"]).unwrap();
//! let older = df.condition_rows(&conditions).unwrap();
//! assert_eq!(older.n_rows(), 2);
//! ```

pub mod data;

pub use data::arithmetic::ArithOp;
pub use data::cell::{Cell, CellType};
pub use data::column::Column;
pub use data::condition::{Condition, Conditions};
pub use data::dedup::{DedupView, RowGroup};
pub use data::error::{FrameError, Result};
pub use data::frame::{cbind, rbind, ColumnTypes, DataFrame};
pub use data::subset::{ColumnSelector, RowSelector};
