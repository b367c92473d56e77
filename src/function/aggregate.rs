//! Aggregate request options.
//!
//! The aggregation engine itself lives in the query layer. What it needs
//! from the core is a stable slot per referenced field and the rows
//! materialized into tuples against those slots.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::index::{RowIndex, Tuple};
use crate::types::row::Row;

/// One aggregate, e.g. `{"type":"sum","field":"score","alias":"total"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AggregateOptions {
    pub aggregates: Vec<Aggregate>,
    pub distinct: bool,
    pub group_by: Vec<String>,
    pub chunk_size: Option<usize>,
    pub imports: Vec<String>,
    pub no_script: bool,
}

impl AggregateOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Referenced fields, lowercase: group-by fields first, then aggregate
    /// inputs, each once.
    pub fn fields(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let names = self
            .group_by
            .iter()
            .chain(self.aggregates.iter().filter_map(|a| a.field.as_ref()));
        for name in names {
            let name = name.to_lowercase();
            if !out.contains(&name) {
                out.push(name);
            }
        }
        out
    }

    /// Slot per referenced field, in `fields()` order.
    pub fn positions(&self) -> HashMap<String, usize> {
        self.fields()
            .into_iter()
            .enumerate()
            .map(|(slot, name)| (name, slot))
            .collect()
    }

    /// Materialize `rows` into tuples sized to `fields()`.
    pub fn tuples(&self, rows: &[Row], index: &RowIndex) -> Result<Vec<Tuple>> {
        let positions = self.positions();
        rows.iter()
            .map(|row| {
                let mut tuple = Tuple::new(positions.len());
                index.load(row, &positions, &mut tuple)?;
                Ok(tuple)
            })
            .collect()
    }
}

// ── Tests ──────────────────────────────────────────────────────────
