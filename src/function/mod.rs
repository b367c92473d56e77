//! Query-function hook points.
//!
//! A function runs after the index has produced candidate rows. It can ask
//! the host to skip fetching rows, turn the result limit off, and rewrite
//! the fetched rows.

pub mod aggregate;

pub use aggregate::{AggregateOptions, Aggregate};

use crate::error::Result;
use crate::index::RowIndex;
use crate::types::row::Row;

pub trait Function: Send + Sync {
    fn name(&self) -> &str;

    /// True when the answer comes from index hits alone.
    fn can_bypass_row_fetch(&self) -> bool;

    /// True when the host should apply the query limit to the rows.
    fn should_limit(&self) -> bool;

    fn process(&self, rows: Vec<Row>, index: &RowIndex) -> Result<Vec<Row>>;
}

/// Plain search: rows pass through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOp;

impl Function for NoOp {
    fn name(&self) -> &str {
        "no-op"
    }

    fn can_bypass_row_fetch(&self) -> bool {
        false
    }

    fn should_limit(&self) -> bool {
        true
    }

    fn process(&self, rows: Vec<Row>, _index: &RowIndex) -> Result<Vec<Row>> {
        Ok(rows)
    }
}
