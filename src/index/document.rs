//! Document shape handed to the search backend.
//!
//! A projected row becomes one `Document`: the primary key the backend hands
//! back on a hit, and a flat list of fields. Each emitted value produces one
//! `IndexableField` per descriptor, so a `striped = also` column shows up
//! twice (indexed, then doc-values).

use crate::analysis::PerFieldAnalyzerWrapper;
use crate::error::{IndexError, Result};
use crate::index::field_type::{FieldType, NumericType};
use crate::types::value::Value;

/// Backend-level field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl FieldValue {
    /// Convert a host value for a field described by `field_type`.
    ///
    /// Numeric descriptors take the numeric primitive; everything else is
    /// indexed as its canonical string.
    pub fn from_value(value: &Value, field_type: &FieldType) -> Result<Self> {
        let mismatch = || {
            IndexError::decoding(
                format!("{:?}", field_type.numeric_type),
                format!("value {} does not fit the field", value),
            )
        };
        let converted = match field_type.numeric_type {
            Some(NumericType::Int) => {
                let v = value.as_i64().ok_or_else(mismatch)?;
                FieldValue::Int(i32::try_from(v).map_err(|_| mismatch())?)
            }
            Some(NumericType::Long) => FieldValue::Long(value.as_i64().ok_or_else(mismatch)?),
            Some(NumericType::Float) => match value {
                Value::Float(v) => FieldValue::Float(*v),
                other => FieldValue::Float(other.as_f64().ok_or_else(mismatch)? as f32),
            },
            Some(NumericType::Double) => FieldValue::Double(value.as_f64().ok_or_else(mismatch)?),
            None => FieldValue::Text(value.to_string()),
        };
        Ok(converted)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Long(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Double(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexableField {
    pub name: String,
    pub value: FieldValue,
    pub field_type: FieldType,
}

impl IndexableField {
    pub fn is_doc_values(&self) -> bool {
        self.field_type.is_doc_values()
    }

    /// Terms the inverted index would record for this field.
    ///
    /// Doc-values and non-indexed fields record none. Tokenized text goes
    /// through the field's analyzer; other values are a single term.
    pub fn terms(&self, analyzer: &PerFieldAnalyzerWrapper) -> Vec<String> {
        if !self.field_type.indexed || self.is_doc_values() {
            return Vec::new();
        }
        match &self.value {
            FieldValue::Text(text) if self.field_type.tokenized => analyzer
                .tokens(&self.name, text)
                .into_iter()
                .map(|t| t.term)
                .collect(),
            other => vec![other.to_string()],
        }
    }
}

/// One projected row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// Composite `[row_key, clustering prefix…]`.
    pub primary_key: Vec<u8>,
    pub row_key: Vec<u8>,
    pub fields: Vec<IndexableField>,
}

impl Document {
    pub fn new(row_key: Vec<u8>, primary_key: Vec<u8>) -> Self {
        Self {
            primary_key,
            row_key,
            fields: Vec::new(),
        }
    }

    /// Add `value` under `name` once per present descriptor.
    ///
    /// Conversion happens before anything is pushed, so a failure leaves the
    /// document unchanged.
    pub fn emit(
        &mut self,
        name: &str,
        value: &Value,
        indexed: Option<&FieldType>,
        doc_values: Option<&FieldType>,
    ) -> Result<usize> {
        let mut pending = Vec::with_capacity(2);
        for field_type in [indexed, doc_values].into_iter().flatten() {
            pending.push(IndexableField {
                name: name.to_string(),
                value: FieldValue::from_value(value, field_type)?,
                field_type: *field_type,
            });
        }
        let emitted = pending.len();
        self.fields.extend(pending);
        Ok(emitted)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Fields named `name` (case-insensitive), in emission order.
    pub fn get<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a IndexableField> + 'a {
        self.fields
            .iter()
            .filter(move |f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn indexed_fields(&self) -> impl Iterator<Item = &IndexableField> {
        self.fields.iter().filter(|f| !f.is_doc_values())
    }

    pub fn doc_value_fields(&self) -> impl Iterator<Item = &IndexableField> {
        self.fields.iter().filter(|f| f.is_doc_values())
    }
}

// ── Tests ──────────────────────────────────────────────────────────
