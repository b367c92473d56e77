//! Contracts with the host storage engine's read path.

pub mod filter;

pub use filter::{filter_column_family, gc_before, CellFilter, NamesFilter, QueryFilter, Slice, SliceFilter};
