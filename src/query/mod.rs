//! Statement construction: comparator shortcuts and single-table SELECTs.
//!
//! Layout:
//! - `comparator.rs`: shortcut token -> SQL comparison operator
//! - `builder.rs`: `QuerySpec` rendering and prepared `Statement`s

pub mod builder;
pub mod comparator;

pub use builder::{QuerySpec, SqlValue, Statement, escape_literal};
pub use comparator::{Comparator, resolve_comparator};
