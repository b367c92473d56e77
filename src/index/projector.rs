//! Host row → index document.
//!
//! Cells are visited in comparator order. The first cell with a well-formed
//! name fixes the logical row: its clustering prefix gives the primary key
//! and the key fields are emitted before any data field. Collection cells become one field per
//! element; map entries are addressed as `column.<key>`.

use crate::codec::CompositeBuilder;
use crate::error::{IndexError, Result};
use crate::index::document::Document;
use crate::index::plan::IndexPlan;
use crate::types::row::{Cell, Row};
use crate::types::validator::Validator;
use crate::types::value::Value;

/// A data cell decoded against the plan's validators.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CellValue {
    /// Plan key (lowercase column name).
    pub column: String,
    /// Field name: the column name, or `column.<key>` for a map entry.
    pub field: String,
    pub value: Value,
    pub collection: bool,
}

/// Decode one cell. `Ok(None)` for cells of columns the table does not
/// declare, such as the row marker.
pub(crate) fn decode_cell(plan: &IndexPlan, cell: &Cell) -> Result<Option<CellValue>> {
    let codec = plan.key_codec();
    let actual = codec.column_name(&cell.name)?;
    let Some(validator) = plan.validator(&actual) else {
        return Ok(None);
    };

    let (field, value) = match validator {
        Validator::Map(..) => {
            let key = validator.name_comparator().decode(element_key(plan, validator, cell)?)?;
            let value = validator.value_comparator().decode(&cell.value)?;
            (format!("{}.{}", actual, key), value)
        }
        Validator::Set(_) => {
            let element = element_key(plan, validator, cell)?;
            (actual.clone(), validator.name_comparator().decode(element)?)
        }
        Validator::List(_) => (actual.clone(), validator.value_comparator().decode(&cell.value)?),
        Validator::Native(_) | Validator::Composite(_) => (actual.clone(), validator.decode(&cell.value)?),
    };
    Ok(Some(CellValue {
        column: actual.to_lowercase(),
        field,
        value,
        collection: validator.is_collection(),
    }))
}

fn element_key<'a>(plan: &IndexPlan, validator: &Validator, cell: &'a Cell) -> Result<&'a [u8]> {
    plan.key_codec()
        .element_key(&cell.name)?
        .ok_or_else(|| IndexError::decoding(validator, "collection cell without element key"))
}

/// Decoded partition and clustering key columns of the row owning
/// `cell_name`, in key order. Components that fail to decode are logged and
/// left out.
pub(crate) fn key_values(plan: &IndexPlan, row_key: &[u8], cell_name: &[u8]) -> Result<Vec<(String, Value)>> {
    let codec = plan.key_codec();
    let schema = plan.schema();
    let partition = codec.partition_key_components(row_key)?;
    let clustering = codec.clustering_prefix(cell_name)?;

    let sources = schema
        .partition_key_columns()
        .iter()
        .map(|c| (c, partition.get(c.component_index.unwrap_or(0))))
        .chain(
            schema
                .clustering_key_columns()
                .iter()
                .map(|c| (c, clustering.get(c.component_index.unwrap_or(0)))),
        );

    let mut out = Vec::new();
    for (column, bytes) in sources {
        let Some(bytes) = bytes else {
            continue;
        };
        match column.validator.decode(bytes) {
            Ok(value) => out.push((column.name.clone(), value)),
            Err(e) => tracing::warn!(
                column = column.name.as_str(),
                error = %e,
                "Skipping undecodable key component"
            ),
        }
    }
    Ok(out)
}

/// First cell whose name carries a well-formed clustering prefix. Cells
/// before it are logged and skipped.
pub(crate) fn anchor_cell<'a>(plan: &IndexPlan, row: &'a Row) -> Option<&'a Cell> {
    row.cf.sorted_cells().iter().find(|cell| {
        match plan.key_codec().clustering_prefix(&cell.name) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Cell name does not split into a clustering prefix");
                false
            }
        }
    })
}

/// Primary key of the row: `[row_key, clustering prefix…]` taken from the
/// anchor cell, or just the row key when no cell has a usable name.
fn primary_key(plan: &IndexPlan, row: &Row, anchor: Option<&Cell>) -> Result<Vec<u8>> {
    match anchor {
        Some(cell) => plan.key_codec().primary_key(&row.key, &cell.name),
        None => {
            let mut builder = CompositeBuilder::new();
            builder.add(&row.key);
            builder.build()
        }
    }
}

/// Project `row` into a document following `plan`.
///
/// Columns without an indexed or doc-values descriptor are not emitted.
/// Tombstones are skipped. A cell that fails to decode is logged and
/// skipped; the rest of the row is still projected.
pub fn project(plan: &IndexPlan, row: &Row) -> Result<Document> {
    let anchor = anchor_cell(plan, row);
    let mut doc = Document::new(row.key.clone(), primary_key(plan, row, anchor)?);

    if let Some(cell) = anchor {
        for (name, value) in key_values(plan, &row.key, &cell.name)? {
            emit(plan, &mut doc, &name.to_lowercase(), &name, &value, false);
        }
    }
    for cell in row.cf.sorted_cells().iter().filter(|c| c.is_live()) {
        match decode_cell(plan, cell) {
            Ok(Some(cv)) => emit(plan, &mut doc, &cv.column, &cv.field, &cv.value, cv.collection),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Skipping cell that failed to decode"),
        }
    }
    Ok(doc)
}

fn emit(plan: &IndexPlan, doc: &mut Document, column: &str, field: &str, value: &Value, collection: bool) {
    let (indexed, doc_values) = if collection {
        (
            plan.collection_field_type(column).map(|c| c.value_type()),
            plan.collection_field_doc_value_type(column),
        )
    } else {
        (plan.field_type(column), plan.field_doc_value_type(column))
    };
    if indexed.is_none() && doc_values.is_none() {
        return;
    }
    if let Err(e) = doc.emit(field, value, indexed, doc_values) {
        tracing::warn!(field, error = %e, "Skipping value that does not fit its field");
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::index::document::FieldValue;
    use crate::index::resolver::resolve_json;
    use crate::types::row::ColumnFamily;
    use crate::types::schema::ColumnFamilySchema;

    fn v(s: &str) -> Validator {
        s.parse().unwrap()
    }

    fn schema() -> Arc<ColumnFamilySchema> {
        Arc::new(
            ColumnFamilySchema::builder("ks", "events")
                .partition_key("user", v("text"))
                .clustering_key("event_time", v("int"))
                .regular("event_type", v("text"))
                .regular("count", v("bigint"))
                .regular("tags", v("set<text>"))
                .regular("attrs", v("map<text, int>"))
                .regular("scores", v("list<double>"))
                .build(),
        )
    }

    fn row(plan: &IndexPlan, cells: Vec<Cell>) -> Row {
        let mut cf = ColumnFamily::new(plan.schema());
        for cell in cells {
            cf.add(cell);
        }
        Row::new(b"alice".to_vec(), cf)
    }

    fn name(plan: &IndexPlan, column: &str, element: Option<&[u8]>) -> Vec<u8> {
        plan.key_codec().cell_name(&[7i32.to_be_bytes().as_slice()], column, element).unwrap()
    }

    fn list_index(n: u8) -> Vec<u8> {
        let mut b = [0u8; 16];
        b[6] = 0x10;
        b[8] = 0x80;
        b[15] = n;
        b.to_vec()
    }

    #[test]
    fn test_projects_scalars_and_keys() {
        let plan = resolve_json(
            r#"{"fields":{"user":{},"event_time":{},"event_type":{},"count":{}}}"#,
            schema(),
            "magic",
        )
        .unwrap();
        let r = row(
            &plan,
            vec![
                Cell::live(name(&plan, "event_type", None), b"login".to_vec(), 1),
                Cell::live(name(&plan, "count", None), 3i64.to_be_bytes().to_vec(), 1),
            ],
        );
        let doc = project(&plan, &r).unwrap();

        let names: Vec<&str> = doc.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names[..2], ["user", "event_time"]);
        assert_eq!(doc.get("event_time").next().unwrap().value, FieldValue::Int(7));
        assert_eq!(doc.get("count").next().unwrap().value, FieldValue::Long(3));
        assert_eq!(doc.get("event_type").next().unwrap().value, FieldValue::Text("login".into()));

        let (row_key, prefix) = plan.key_codec().row_key_and_builder(&doc.primary_key).unwrap();
        assert_eq!(row_key, b"alice");
        assert_eq!(prefix.components(), &[7i32.to_be_bytes().to_vec()]);
    }

    #[test]
    fn test_collections() {
        let plan = resolve_json(r#"{"fields":{"tags":{},"attrs":{},"scores":{}}}"#, schema(), "magic").unwrap();
        let r = row(
            &plan,
            vec![
                Cell::live(name(&plan, "tags", Some(b"a".as_slice())), Vec::new(), 1),
                Cell::live(name(&plan, "tags", Some(b"b".as_slice())), Vec::new(), 1),
                Cell::live(name(&plan, "attrs", Some(b"size".as_slice())), 42i32.to_be_bytes().to_vec(), 1),
                Cell::live(name(&plan, "scores", Some(list_index(1).as_slice())), 0.5f64.to_be_bytes().to_vec(), 1),
            ],
        );
        let doc = project(&plan, &r).unwrap();

        let tags: Vec<&FieldValue> = doc.get("tags").map(|f| &f.value).collect();
        assert_eq!(tags, vec![&FieldValue::Text("a".into()), &FieldValue::Text("b".into())]);
        assert_eq!(doc.get("attrs.size").next().unwrap().value, FieldValue::Int(42));
        assert_eq!(doc.get("scores").next().unwrap().value, FieldValue::Double(0.5));
        assert!(doc.get("attrs").next().is_none());
    }

    #[test]
    fn test_unindexed_columns_and_tombstones_skipped() {
        let plan = resolve_json(r#"{"fields":{"event_type":{}}}"#, schema(), "magic").unwrap();
        let r = row(
            &plan,
            vec![
                Cell::live(name(&plan, "count", None), 3i64.to_be_bytes().to_vec(), 1),
                Cell::tombstone(name(&plan, "event_type", None), 2, 100),
            ],
        );
        let doc = project(&plan, &r).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_corrupt_cell_does_not_hide_the_row() {
        let plan = resolve_json(r#"{"fields":{"event_type":{},"count":{}}}"#, schema(), "magic").unwrap();
        let r = row(
            &plan,
            vec![
                Cell::live(name(&plan, "count", None), vec![1, 2, 3], 1),
                Cell::live(name(&plan, "event_type", None), b"ok".to_vec(), 1),
            ],
        );
        let doc = project(&plan, &r).unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.fields[0].name, "event_type");
    }

    #[test]
    fn test_row_marker_ignored() {
        let plan = resolve_json(r#"{"fields":{"event_type":{}}}"#, schema(), "magic").unwrap();
        let r = row(&plan, vec![Cell::live(name(&plan, "", None), Vec::new(), 1)]);
        assert!(project(&plan, &r).unwrap().is_empty());
    }

    #[test]
    fn test_empty_row() {
        let plan = resolve_json(r#"{"fields":{"user":{}}}"#, schema(), "magic").unwrap();
        let doc = project(&plan, &row(&plan, Vec::new())).unwrap();
        assert!(doc.is_empty());
        assert_eq!(doc.row_key, b"alice");
    }

    #[test]
    fn test_malformed_first_cell_does_not_hide_the_row() {
        let plan = resolve_json(r#"{"fields":{"event_time":{},"event_type":{}}}"#, schema(), "magic").unwrap();
        // A truncated composite sorts first and cannot be split.
        let r = row(
            &plan,
            vec![
                Cell::live(vec![0x00], b"junk".to_vec(), 1),
                Cell::live(name(&plan, "event_type", None), b"login".to_vec(), 1),
            ],
        );
        let doc = project(&plan, &r).unwrap();

        assert_eq!(doc.get("event_time").next().unwrap().value, FieldValue::Int(7));
        assert_eq!(doc.get("event_type").next().unwrap().value, FieldValue::Text("login".into()));
        let (row_key, prefix) = plan.key_codec().row_key_and_builder(&doc.primary_key).unwrap();
        assert_eq!(row_key, b"alice");
        assert_eq!(prefix.components(), &[7i32.to_be_bytes().to_vec()]);
    }
}
