//! Resolved indexing plan.
//!
//! Built once per index generation by the resolver and shared immutably
//! (behind `Arc`) by the projector and materializer. Every name-keyed map is
//! keyed by the lowercase column name.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::analysis::PerFieldAnalyzerWrapper;
use crate::codec::KeyCodec;
use crate::index::field_type::{FieldType, NumericConfig};
use crate::mapping::{Properties, PropertyType};
use crate::types::schema::ColumnFamilySchema;
use crate::types::validator::Validator;

/// Descriptors of an indexed collection column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionFieldType {
    /// List or set element.
    Element(FieldType),
    /// Map key and value.
    Entry { key: FieldType, value: FieldType },
}

impl CollectionFieldType {
    /// Descriptor of the value emitted per element.
    pub fn value_type(&self) -> &FieldType {
        match self {
            CollectionFieldType::Element(ft) => ft,
            CollectionFieldType::Entry { value, .. } => value,
        }
    }

    pub fn key_type(&self) -> Option<&FieldType> {
        match self {
            CollectionFieldType::Element(_) => None,
            CollectionFieldType::Entry { key, .. } => Some(key),
        }
    }

    /// Number of descriptors: 1 for list/set, 2 for map.
    pub fn arity(&self) -> usize {
        match self {
            CollectionFieldType::Element(_) => 1,
            CollectionFieldType::Entry { .. } => 2,
        }
    }
}

#[derive(Debug)]
pub struct IndexPlan {
    pub(crate) schema: Arc<ColumnFamilySchema>,
    pub(crate) key_codec: KeyCodec,
    pub(crate) mapping: Properties,
    pub(crate) default_field: String,
    pub(crate) indexed_column_names: BTreeSet<String>,
    pub(crate) partition_keys_indexed: BTreeMap<usize, String>,
    pub(crate) clustering_keys_indexed: BTreeMap<usize, String>,
    pub(crate) validators: BTreeMap<String, Validator>,
    pub(crate) field_types: BTreeMap<String, FieldType>,
    pub(crate) field_doc_value_types: BTreeMap<String, FieldType>,
    pub(crate) collection_field_types: BTreeMap<String, CollectionFieldType>,
    pub(crate) collection_field_doc_value_types: BTreeMap<String, FieldType>,
    pub(crate) numeric_field_options: BTreeMap<String, NumericConfig>,
    pub(crate) types: BTreeMap<String, PropertyType>,
    pub(crate) nested_fields: BTreeSet<String>,
    pub(crate) per_field_analyzers: BTreeMap<String, String>,
    pub(crate) analyzer: PerFieldAnalyzerWrapper,
}

fn key(name: &str) -> String {
    name.to_lowercase()
}

impl IndexPlan {
    pub fn schema(&self) -> &ColumnFamilySchema {
        &self.schema
    }

    pub fn key_codec(&self) -> &KeyCodec {
        &self.key_codec
    }

    /// Mapping after resolution: inferred types filled in, map columns given
    /// `_key`/`_value` children, object children hoisted to the top level.
    pub fn mapping(&self) -> &Properties {
        &self.mapping
    }

    /// Column the index is declared on.
    pub fn default_field(&self) -> &str {
        &self.default_field
    }

    pub fn indexed_column_names(&self) -> &BTreeSet<String> {
        &self.indexed_column_names
    }

    pub fn is_indexed(&self, column: &str) -> bool {
        self.indexed_column_names.contains(&key(column))
    }

    /// Indexed partition key columns by component index.
    pub fn partition_keys_indexed(&self) -> &BTreeMap<usize, String> {
        &self.partition_keys_indexed
    }

    /// Indexed clustering key columns by position in the primary key
    /// (`component_index + 1`; position 0 is the row key).
    pub fn clustering_keys_indexed(&self) -> &BTreeMap<usize, String> {
        &self.clustering_keys_indexed
    }

    pub fn validators(&self) -> &BTreeMap<String, Validator> {
        &self.validators
    }

    pub fn validator(&self, column: &str) -> Option<&Validator> {
        self.validators.get(&key(column))
    }

    pub fn field_types(&self) -> &BTreeMap<String, FieldType> {
        &self.field_types
    }

    pub fn field_type(&self, column: &str) -> Option<&FieldType> {
        self.field_types.get(&key(column))
    }

    pub fn field_doc_value_types(&self) -> &BTreeMap<String, FieldType> {
        &self.field_doc_value_types
    }

    pub fn field_doc_value_type(&self, column: &str) -> Option<&FieldType> {
        self.field_doc_value_types.get(&key(column))
    }

    pub fn collection_field_types(&self) -> &BTreeMap<String, CollectionFieldType> {
        &self.collection_field_types
    }

    pub fn collection_field_type(&self, column: &str) -> Option<&CollectionFieldType> {
        self.collection_field_types.get(&key(column))
    }

    pub fn collection_field_doc_value_types(&self) -> &BTreeMap<String, FieldType> {
        &self.collection_field_doc_value_types
    }

    pub fn collection_field_doc_value_type(&self, column: &str) -> Option<&FieldType> {
        self.collection_field_doc_value_types.get(&key(column))
    }

    pub fn numeric_field_options(&self) -> &BTreeMap<String, NumericConfig> {
        &self.numeric_field_options
    }

    pub fn numeric_config(&self, field: &str) -> Option<&NumericConfig> {
        self.numeric_field_options.get(&key(field))
    }

    /// Abstract type per column; collections report their element/value type.
    pub fn types(&self) -> &BTreeMap<String, PropertyType> {
        &self.types
    }

    pub fn type_of(&self, column: &str) -> Option<PropertyType> {
        self.types.get(&key(column)).copied()
    }

    /// Collection columns, whose fields are addressed as sub-fields.
    pub fn nested_fields(&self) -> &BTreeSet<String> {
        &self.nested_fields
    }

    pub fn is_nested(&self, column: &str) -> bool {
        self.nested_fields.contains(&key(column))
    }

    pub fn per_field_analyzers(&self) -> &BTreeMap<String, String> {
        &self.per_field_analyzers
    }

    pub fn analyzer(&self) -> &PerFieldAnalyzerWrapper {
        &self.analyzer
    }
}
