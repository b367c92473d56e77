//! Field descriptors handed to the search backend.
//!
//! A `FieldType` carries the inverted-index flags copied from the mapping,
//! the numeric primitive derived from the column validator, and, for
//! doc-values siblings, the doc-values kind.

use serde::{Deserialize, Serialize};

use crate::mapping::properties::{IndexOptions, Properties, PropertyType};
use crate::types::validator::{NativeType, Validator};

/// Numeric primitive backing a trie-encoded numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumericType {
    Int,
    Long,
    Float,
    Double,
}

/// Per-document column storage kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocValuesType {
    Numeric,
    SortedNumeric,
    Sorted,
    SortedSet,
}

/// Numeric query configuration for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericConfig {
    pub precision_step: u32,
    pub numeric_type: NumericType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldType {
    pub kind: PropertyType,
    pub indexed: bool,
    pub tokenized: bool,
    pub stored: bool,
    pub store_term_vectors: bool,
    pub store_term_vector_offsets: bool,
    pub store_term_vector_positions: bool,
    pub store_term_vector_payloads: bool,
    pub omit_norms: bool,
    pub index_options: IndexOptions,
    pub numeric_type: Option<NumericType>,
    /// Only set together with `numeric_type`.
    pub numeric_precision_step: Option<u32>,
    /// Set on doc-values siblings only.
    pub doc_values: Option<DocValuesType>,
}

impl FieldType {
    pub fn is_numeric(&self) -> bool {
        self.numeric_type.is_some()
    }

    pub fn is_doc_values(&self) -> bool {
        self.doc_values.is_some()
    }
}

/// Numeric primitive for a validator, if it has one.
pub fn numeric_type_of(validator: &Validator) -> Option<NumericType> {
    match validator.as_native()? {
        NativeType::Int => Some(NumericType::Int),
        NativeType::BigInt | NativeType::Counter | NativeType::VarInt | NativeType::Timestamp => {
            Some(NumericType::Long)
        }
        NativeType::Float => Some(NumericType::Float),
        NativeType::Double | NativeType::Decimal => Some(NumericType::Double),
        _ => None,
    }
}

/// Build the indexed-field descriptor for resolved `properties`.
///
/// `properties.field_type` must already be resolved; an unresolved type
/// reads as `text`.
pub fn field_type(properties: &Properties, validator: &Validator) -> FieldType {
    let numeric_type = numeric_type_of(validator);
    FieldType {
        kind: properties.field_type.unwrap_or(PropertyType::Text),
        indexed: properties.indexed,
        tokenized: properties.tokenized,
        stored: properties.stored,
        store_term_vectors: properties.store_term_vectors,
        store_term_vector_offsets: properties.store_term_vector_offsets,
        store_term_vector_positions: properties.store_term_vector_positions,
        store_term_vector_payloads: properties.store_term_vector_payloads,
        omit_norms: properties.omit_norms,
        index_options: properties.index_options,
        numeric_type,
        numeric_precision_step: numeric_type.map(|_| properties.numeric_precision_step),
        doc_values: None,
    }
}

/// Doc-values sibling of an indexed descriptor. Collection columns hold many
/// values per document and get the multi-valued kinds.
pub fn doc_value_type_from(field_type: &FieldType, multi_valued: bool) -> FieldType {
    let doc_values = match (field_type.is_numeric(), multi_valued) {
        (true, false) => DocValuesType::Numeric,
        (true, true) => DocValuesType::SortedNumeric,
        (false, false) => DocValuesType::Sorted,
        (false, true) => DocValuesType::SortedSet,
    };
    FieldType {
        indexed: false,
        tokenized: false,
        stored: false,
        store_term_vectors: false,
        store_term_vector_offsets: false,
        store_term_vector_positions: false,
        store_term_vector_payloads: false,
        doc_values: Some(doc_values),
        ..*field_type
    }
}

/// Numeric query configuration for a numeric descriptor.
pub fn numeric_config(field_type: &FieldType) -> Option<NumericConfig> {
    Some(NumericConfig {
        precision_step: field_type.numeric_precision_step?,
        numeric_type: field_type.numeric_type?,
    })
}

// ── Tests ──────────────────────────────────────────────────────────
