//! Stored row → typed tuple for the query-function layer.
//!
//! Same traversal as the projector, but every decodable column counts, not
//! only indexed ones: values land in the caller's slots by field name.

use std::collections::HashMap;

use crate::error::Result;
use crate::index::plan::IndexPlan;
use crate::index::projector::{anchor_cell, decode_cell, key_values};
use crate::types::row::Row;
use crate::types::value::Value;

/// Slot-indexed values owned by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tuple {
    slots: Vec<Option<Value>>,
}

impl Tuple {
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![None; size],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&Value> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Write a slot, growing the tuple if needed.
    pub fn set(&mut self, slot: usize, value: Value) {
        if slot >= self.slots.len() {
            self.slots.resize(slot + 1, None);
        }
        self.slots[slot] = Some(value);
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }

    pub fn slots(&self) -> &[Option<Value>] {
        &self.slots
    }

    pub fn into_slots(self) -> Vec<Option<Value>> {
        self.slots
    }
}

/// Fill `tuple` from `row`.
///
/// `positions` maps field names (matched case-insensitively) to slots; map
/// entries are addressed as `column.<key>`. Fields without a position are
/// skipped. Collection columns write every element to the same slot, so the
/// last element in comparator order wins. A cell that fails to decode leaves
/// its slot untouched.
pub fn materialize(
    plan: &IndexPlan,
    row: &Row,
    positions: &HashMap<String, usize>,
    tuple: &mut Tuple,
) -> Result<()> {
    let positions: HashMap<String, usize> = positions
        .iter()
        .map(|(name, slot)| (name.to_lowercase(), *slot))
        .collect();

    if let Some(cell) = anchor_cell(plan, row) {
        for (name, value) in key_values(plan, &row.key, &cell.name)? {
            if let Some(&slot) = positions.get(&name.to_lowercase()) {
                tuple.set(slot, value);
            }
        }
    }
    for cell in row.cf.sorted_cells().iter().filter(|c| c.is_live()) {
        match decode_cell(plan, cell) {
            Ok(Some(cv)) => {
                if let Some(&slot) = positions.get(&cv.field.to_lowercase()) {
                    tuple.set(slot, cv.value);
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Leaving slot unset for undecodable cell"),
        }
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::index::resolver::resolve_json;
    use crate::types::row::{Cell, ColumnFamily};
    use crate::types::schema::ColumnFamilySchema;
    use crate::types::validator::Validator;

    fn v(s: &str) -> Validator {
        s.parse().unwrap()
    }

    fn plan() -> IndexPlan {
        let schema = Arc::new(
            ColumnFamilySchema::builder("ks", "readings")
                .partition_key("sensor", v("text"))
                .partition_key("day", v("int"))
                .clustering_key("at", v("bigint"))
                .regular("value", v("double"))
                .regular("labels", v("map<text, text>"))
                .regular("raw", v("int"))
                .build(),
        );
        resolve_json(r#"{"fields":{"value":{}}}"#, schema, "magic").unwrap()
    }

    fn positions(names: &[&str]) -> HashMap<String, usize> {
        names.iter().enumerate().map(|(i, n)| (n.to_string(), i)).collect()
    }

    fn row(plan: &IndexPlan) -> Row {
        let codec = plan.key_codec();
        let at = 99i64.to_be_bytes();
        let mut cf = ColumnFamily::new(plan.schema());
        cf.add(Cell::live(codec.cell_name(&[at.as_slice()], "value", None).unwrap(), 1.25f64.to_be_bytes().to_vec(), 1));
        cf.add(Cell::live(codec.cell_name(&[at.as_slice()], "labels", Some(b"unit".as_slice())).unwrap(), b"celsius".to_vec(), 1));
        cf.add(Cell::live(codec.cell_name(&[at.as_slice()], "raw", None).unwrap(), vec![0xde, 0xad], 1));
        let day = 3i32.to_be_bytes();
        let key = codec.partition_key(&[b"s1".as_slice(), day.as_slice()]).unwrap();
        Row::new(key, cf)
    }

    #[test]
    fn test_fills_key_and_value_slots() {
        let plan = plan();
        let mut tuple = Tuple::new(5);
        materialize(&plan, &row(&plan), &positions(&["SENSOR", "day", "at", "value", "labels.unit"]), &mut tuple)
            .unwrap();

        assert_eq!(tuple.get(0), Some(&Value::Text("s1".into())));
        assert_eq!(tuple.get(1), Some(&Value::Int(3)));
        assert_eq!(tuple.get(2), Some(&Value::BigInt(99)));
        assert_eq!(tuple.get(3), Some(&Value::Double(1.25)));
        assert_eq!(tuple.get(4), Some(&Value::Text("celsius".into())));
    }

    #[test]
    fn test_unmatched_and_corrupt_cells_leave_slots_unset() {
        let plan = plan();
        let mut tuple = Tuple::new(2);
        materialize(&plan, &row(&plan), &positions(&["raw", "missing"]), &mut tuple).unwrap();
        assert_eq!(tuple.get(0), None);
        assert_eq!(tuple.get(1), None);
    }

    #[test]
    fn test_tuple_grows_on_demand() {
        let mut tuple = Tuple::default();
        tuple.set(3, Value::Int(1));
        assert_eq!(tuple.len(), 4);
        assert_eq!(tuple.get(3), Some(&Value::Int(1)));
        tuple.clear();
        assert_eq!(tuple.get(3), None);
        assert_eq!(tuple.into_slots().len(), 4);
    }
}
