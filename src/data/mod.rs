//! Data layer: typed cells, columns, frames and the operations over them.
//!
//! Architecture:
//! ```text
//!  .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → string matrix → DataFrame
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ DataFrame  │  BTreeMap<name, Column>, position index, row count
//!   └───────────┘
//!        │
//!        ├── condition   threshold expressions → per-column predicates
//!        ├── subset      column/row selection, predicate and condition filters
//!        ├── dedup       row fingerprints → unique / duplicated views
//!        └── arithmetic  type-coerced column arithmetic, in place
//! ```

pub mod arithmetic;
pub mod cell;
pub mod column;
pub mod condition;
pub mod dedup;
pub mod error;
pub mod frame;
pub mod loader;
pub mod subset;
