//! Mapping + schema → `IndexPlan`.
//!
//! Resolution order matters: partition keys, then clustering keys, then the
//! remaining mapped names against regular/static columns, then validators for
//! everything else. The caller's mapping is never mutated; inferred types and
//! hoisted object fields land in a fresh field map owned by the plan.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::analysis::PerFieldAnalyzerWrapper;
use crate::codec::KeyCodec;
use crate::error::{IndexError, Result};
use crate::index::field_type::{
    doc_value_type_from, field_type, numeric_config, FieldType, NumericConfig,
};
use crate::index::plan::{CollectionFieldType, IndexPlan};
use crate::mapping::properties::{Properties, PropertyType, MAP_KEY_FIELD, MAP_VALUE_FIELD};
use crate::mapping::type_mapper;
use crate::types::schema::ColumnFamilySchema;
use crate::types::validator::Validator;

/// Parse `json` and resolve it.
pub fn resolve_json(
    json: &str,
    schema: Arc<ColumnFamilySchema>,
    column_name: &str,
) -> Result<IndexPlan> {
    let mapping = Properties::from_json(json)?;
    resolve(&mapping, schema, column_name)
}

/// Build the plan for an index declared on `column_name`.
pub fn resolve(
    mapping: &Properties,
    schema: Arc<ColumnFamilySchema>,
    column_name: &str,
) -> Result<IndexPlan> {
    let mut fields: BTreeMap<String, Properties> = mapping
        .fields
        .iter()
        .map(|(name, props)| (name.to_lowercase(), props.clone()))
        .collect();
    let indexed_column_names: BTreeSet<String> = fields.keys().cloned().collect();
    let mut added: BTreeSet<String> = BTreeSet::new();
    let mut r = Resolution::default();

    for column in schema.partition_key_columns() {
        let name = column.name.to_lowercase();
        r.validators.insert(name.clone(), column.validator.clone());
        if let Some(props) = fields.remove(&name) {
            let idx = column.component_index.unwrap_or(0);
            tracing::debug!(column = column.name.as_str(), component = idx, "Indexing partition key column");
            r.partition_keys_indexed.insert(idx, column.name.clone());
            let resolved = r.add_field_type(&name, &column.validator, props)?;
            fields.insert(name.clone(), resolved);
            added.insert(name);
        }
    }

    for column in schema.clustering_key_columns() {
        let name = column.name.to_lowercase();
        r.validators.insert(name.clone(), column.validator.clone());
        if let Some(props) = fields.remove(&name) {
            let idx = column.component_index.unwrap_or(0) + 1;
            tracing::debug!(column = column.name.as_str(), position = idx, "Indexing clustering key column");
            r.clustering_keys_indexed.insert(idx, column.name.clone());
            let resolved = r.add_field_type(&name, &column.validator, props)?;
            fields.insert(name.clone(), resolved);
            added.insert(name);
        }
    }

    for name in indexed_column_names.iter().filter(|n| !added.contains(*n)) {
        let column = schema
            .regular_or_static_column(name)
            .ok_or_else(|| IndexError::UnknownColumn(name.clone()))?;
        r.validators.insert(name.clone(), column.validator.clone());
        let props = fields.remove(name).unwrap_or_default();
        let resolved = r.add_field_type(name, &column.validator, props)?;
        if resolved.field_type == Some(PropertyType::Object) {
            for (child, child_props) in &resolved.fields {
                fields
                    .entry(child.to_lowercase())
                    .or_insert_with(|| child_props.clone());
            }
        }
        fields.insert(name.clone(), resolved);
    }

    for column in schema.regular_and_static_columns() {
        r.validators
            .entry(column.name.to_lowercase())
            .or_insert_with(|| column.validator.clone());
    }

    r.numeric_field_options.extend(mapping.dynamic_numeric_config());

    let resolved_mapping = Properties {
        fields,
        ..mapping.clone()
    };
    let per_field_analyzers = resolved_mapping.per_field_analyzers();
    let analyzer = PerFieldAnalyzerWrapper::new(mapping.analyzer_name(), &per_field_analyzers)?;

    let mut types = BTreeMap::new();
    let mut nested_fields = BTreeSet::new();
    for (name, validator) in &r.validators {
        if validator.is_collection() {
            nested_fields.insert(name.clone());
        }
        types.insert(name.clone(), type_mapper::from_validator(validator));
    }

    tracing::debug!(
        table = schema.name.as_str(),
        indexed = indexed_column_names.len(),
        "Resolved index plan"
    );

    Ok(IndexPlan {
        key_codec: KeyCodec::new(&schema),
        schema,
        mapping: resolved_mapping,
        default_field: column_name.to_string(),
        indexed_column_names,
        partition_keys_indexed: r.partition_keys_indexed,
        clustering_keys_indexed: r.clustering_keys_indexed,
        validators: r.validators,
        field_types: r.field_types,
        field_doc_value_types: r.field_doc_value_types,
        collection_field_types: r.collection_field_types,
        collection_field_doc_value_types: r.collection_field_doc_value_types,
        numeric_field_options: r.numeric_field_options,
        types,
        nested_fields,
        per_field_analyzers,
        analyzer,
    })
}

/// Maps filled while walking the schema.
#[derive(Default)]
struct Resolution {
    partition_keys_indexed: BTreeMap<usize, String>,
    clustering_keys_indexed: BTreeMap<usize, String>,
    validators: BTreeMap<String, Validator>,
    field_types: BTreeMap<String, FieldType>,
    field_doc_value_types: BTreeMap<String, FieldType>,
    collection_field_types: BTreeMap<String, CollectionFieldType>,
    collection_field_doc_value_types: BTreeMap<String, FieldType>,
    numeric_field_options: BTreeMap<String, NumericConfig>,
}

impl Resolution {
    /// Register descriptors for one indexed column and return its resolved
    /// properties.
    fn add_field_type(
        &mut self,
        column: &str,
        validator: &Validator,
        mut props: Properties,
    ) -> Result<Properties> {
        match validator {
            Validator::Map(..) => {
                if props.field_type.is_none() {
                    props.field_type = Some(PropertyType::Map);
                }
                let key_validator = validator.name_comparator();
                let value_validator = validator.value_comparator();

                let mut key_props = props
                    .fields
                    .remove(MAP_KEY_FIELD)
                    .unwrap_or_else(|| child_of(&props));
                let mut value_props = props
                    .fields
                    .remove(MAP_VALUE_FIELD)
                    .unwrap_or_else(|| child_of(&props));
                element_type(column, key_validator, &mut key_props)?;
                element_type(column, value_validator, &mut value_props)?;

                let key = field_type(&key_props, key_validator);
                let value = field_type(&value_props, value_validator);
                if value_props.striped.emits_indexed() {
                    self.collection_field_types
                        .insert(column.to_string(), CollectionFieldType::Entry { key, value });
                }
                if value_props.striped.emits_doc_values() {
                    self.collection_field_doc_value_types
                        .insert(column.to_string(), doc_value_type_from(&value, true));
                }
                props.fields.insert(MAP_KEY_FIELD.to_string(), key_props);
                props.fields.insert(MAP_VALUE_FIELD.to_string(), value_props);
            }
            Validator::Set(_) | Validator::List(_) => {
                let element = match validator {
                    Validator::Set(_) => validator.name_comparator(),
                    _ => validator.value_comparator(),
                };
                element_type(column, element, &mut props)?;
                let ft = field_type(&props, element);
                if props.striped.emits_indexed() {
                    self.collection_field_types
                        .insert(column.to_string(), CollectionFieldType::Element(ft));
                }
                if props.striped.emits_doc_values() {
                    self.collection_field_doc_value_types
                        .insert(column.to_string(), doc_value_type_from(&ft, true));
                }
            }
            Validator::Native(_) | Validator::Composite(_) => {
                type_mapper::set_from_validator(&mut props, validator);
                let ft = field_type(&props, validator);
                if props.striped.emits_indexed() {
                    self.field_types.insert(column.to_string(), ft);
                }
                if props.striped.emits_doc_values() {
                    self.field_doc_value_types
                        .insert(column.to_string(), doc_value_type_from(&ft, false));
                }
                if let Some(config) = numeric_config(&ft) {
                    self.numeric_field_options.insert(column.to_string(), config);
                }
            }
        }
        Ok(props)
    }
}

/// Default `_key`/`_value` properties: inherit the parent's analyzer.
fn child_of(parent: &Properties) -> Properties {
    Properties {
        analyzer: parent.analyzer.clone(),
        ..Properties::default()
    }
}

/// Infer a collection element's type. Nested collections have no tag of
/// their own and need an explicit user type.
fn element_type(column: &str, element: &Validator, props: &mut Properties) -> Result<()> {
    if element.as_native().is_none() && props.field_type.is_none() {
        return Err(IndexError::UnsupportedValidator {
            column: column.to_string(),
            validator: element.to_string(),
        });
    }
    type_mapper::set_from_validator(props, element);
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────
