//! Column-family schema as seen by the index.
//!
//! Mirrors the host's table metadata: ordered partition and clustering key
//! columns, regular and static columns, the composite comparator describing
//! cell-name layout, and GC grace.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::validator::{NativeType, Validator};

/// Default GC grace: 10 days.
pub const DEFAULT_GC_GRACE_SECONDS: i32 = 864_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    PartitionKey,
    ClusteringKey,
    Regular,
    Static,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub kind: ColumnKind,
    /// Position inside the composite key. `None` for the sole component of a
    /// non-composite partition key, and for regular/static columns.
    pub component_index: Option<usize>,
    pub validator: Validator,
}

impl ColumnDefinition {
    pub fn is_primary_key(&self) -> bool {
        matches!(self.kind, ColumnKind::PartitionKey | ColumnKind::ClusteringKey)
    }
}

#[derive(Debug, Clone)]
pub struct ColumnFamilySchema {
    pub keyspace: String,
    pub name: String,
    partition_keys: Vec<ColumnDefinition>,
    clustering_keys: Vec<ColumnDefinition>,
    regular_and_static: Vec<ColumnDefinition>,
    comparator: Arc<Validator>,
    key_validator: Validator,
    has_collections: bool,
    gc_grace_seconds: i32,
}

impl ColumnFamilySchema {
    pub fn builder(keyspace: &str, name: &str) -> SchemaBuilder {
        SchemaBuilder {
            keyspace: keyspace.to_string(),
            name: name.to_string(),
            partition_keys: Vec::new(),
            clustering_keys: Vec::new(),
            regular_and_static: Vec::new(),
            gc_grace_seconds: DEFAULT_GC_GRACE_SECONDS,
        }
    }

    pub fn partition_key_columns(&self) -> &[ColumnDefinition] {
        &self.partition_keys
    }

    pub fn clustering_key_columns(&self) -> &[ColumnDefinition] {
        &self.clustering_keys
    }

    pub fn regular_and_static_columns(&self) -> &[ColumnDefinition] {
        &self.regular_and_static
    }

    pub fn regular_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.regular_and_static
            .iter()
            .filter(|c| c.kind == ColumnKind::Regular)
    }

    pub fn static_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.regular_and_static
            .iter()
            .filter(|c| c.kind == ColumnKind::Static)
    }

    /// All columns in key order followed by regular/static columns.
    pub fn all_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.partition_keys
            .iter()
            .chain(self.clustering_keys.iter())
            .chain(self.regular_and_static.iter())
    }

    /// Case-insensitive lookup among regular and static columns.
    pub fn regular_or_static_column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.regular_and_static
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Case-insensitive lookup over every column.
    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.all_columns().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Comparator for cell names: `[clustering…, column name, element key?]`.
    pub fn comparator(&self) -> &Validator {
        &self.comparator
    }

    pub fn shared_comparator(&self) -> Arc<Validator> {
        Arc::clone(&self.comparator)
    }

    /// Validator of the partition key: the sole partition column's validator,
    /// or a composite of all of them.
    pub fn key_validator(&self) -> &Validator {
        &self.key_validator
    }

    pub fn has_composite_key(&self) -> bool {
        self.partition_keys.len() > 1
    }

    pub fn has_collections(&self) -> bool {
        self.has_collections
    }

    pub fn gc_grace_seconds(&self) -> i32 {
        self.gc_grace_seconds
    }
}

pub struct SchemaBuilder {
    keyspace: String,
    name: String,
    partition_keys: Vec<(String, Validator)>,
    clustering_keys: Vec<(String, Validator)>,
    regular_and_static: Vec<(String, Validator, ColumnKind)>,
    gc_grace_seconds: i32,
}

impl SchemaBuilder {
    pub fn partition_key(mut self, name: &str, validator: Validator) -> Self {
        self.partition_keys.push((name.to_string(), validator));
        self
    }

    pub fn clustering_key(mut self, name: &str, validator: Validator) -> Self {
        self.clustering_keys.push((name.to_string(), validator));
        self
    }

    pub fn regular(mut self, name: &str, validator: Validator) -> Self {
        self.regular_and_static
            .push((name.to_string(), validator, ColumnKind::Regular));
        self
    }

    pub fn static_column(mut self, name: &str, validator: Validator) -> Self {
        self.regular_and_static
            .push((name.to_string(), validator, ColumnKind::Static));
        self
    }

    pub fn gc_grace_seconds(mut self, seconds: i32) -> Self {
        self.gc_grace_seconds = seconds;
        self
    }

    pub fn build(self) -> ColumnFamilySchema {
        let composite_key = self.partition_keys.len() > 1;
        let partition_keys: Vec<ColumnDefinition> = self
            .partition_keys
            .into_iter()
            .enumerate()
            .map(|(i, (name, validator))| ColumnDefinition {
                name,
                kind: ColumnKind::PartitionKey,
                component_index: composite_key.then_some(i),
                validator,
            })
            .collect();

        let clustering_keys: Vec<ColumnDefinition> = self
            .clustering_keys
            .into_iter()
            .enumerate()
            .map(|(i, (name, validator))| ColumnDefinition {
                name,
                kind: ColumnKind::ClusteringKey,
                component_index: Some(i),
                validator,
            })
            .collect();

        let regular_and_static: Vec<ColumnDefinition> = self
            .regular_and_static
            .into_iter()
            .map(|(name, validator, kind)| ColumnDefinition {
                name,
                kind,
                component_index: None,
                validator,
            })
            .collect();

        let has_collections = regular_and_static
            .iter()
            .any(|c| c.validator.is_collection());

        let mut comparator_types: Vec<Validator> = clustering_keys
            .iter()
            .map(|c| c.validator.clone())
            .collect();
        comparator_types.push(Validator::Native(NativeType::Varchar));
        if has_collections {
            // Element keys differ per collection column; compared as bytes.
            comparator_types.push(Validator::Native(NativeType::Blob));
        }

        let key_validator = if composite_key {
            Validator::Composite(partition_keys.iter().map(|c| c.validator.clone()).collect())
        } else {
            partition_keys
                .first()
                .map(|c| c.validator.clone())
                .unwrap_or(Validator::Native(NativeType::Blob))
        };

        ColumnFamilySchema {
            keyspace: self.keyspace,
            name: self.name,
            partition_keys,
            clustering_keys,
            regular_and_static,
            comparator: Arc::new(Validator::Composite(comparator_types)),
            key_validator,
            has_collections,
            gc_grace_seconds: self.gc_grace_seconds,
        }
    }
}
