//! User mapping: which columns are indexed and how.
//!
//! The mapping is a recursive `Properties` record supplied as JSON at index
//! creation. Every option is optional; defaults follow the table below.
//!
//! ```text
//! type                       inferred from the column validator
//! analyzer                   mapping-level default ("standard")
//! indexed / tokenized        true / true
//! stored                     false
//! storeTermVectors*          false
//! omitNorms                  true
//! indexOptions               docs_and_freqs_and_positions
//! numericPrecisionStep       4
//! striped                    no
//! fields                     {}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_ANALYZER, DEFAULT_NUMERIC_PRECISION_STEP};
use crate::error::Result;
use crate::index::field_type::{NumericConfig, NumericType};

/// Sub-property of a map column holding the element key.
pub const MAP_KEY_FIELD: &str = "_key";

/// Sub-property of a map column holding the element value.
pub const MAP_VALUE_FIELD: &str = "_value";

/// Abstract field type of an indexed column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Integer,
    Bigint,
    Bigdecimal,
    Decimal,
    Text,
    String,
    Date,
    Bool,
    Object,
    Map,
}

impl PropertyType {
    /// Numeric kind implied by an explicit user type.
    pub fn numeric_type(&self) -> Option<NumericType> {
        match self {
            PropertyType::Integer => Some(NumericType::Int),
            PropertyType::Bigint | PropertyType::Date => Some(NumericType::Long),
            PropertyType::Decimal => Some(NumericType::Float),
            PropertyType::Bigdecimal => Some(NumericType::Double),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric_type().is_some()
    }
}

/// Doc-values emission policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Striped {
    /// Indexed field only.
    #[default]
    #[serde(alias = "none")]
    No,
    /// Indexed field plus a doc-values sibling.
    Also,
    /// Doc-values sibling only.
    Only,
}

impl Striped {
    pub fn emits_doc_values(&self) -> bool {
        matches!(self, Striped::Also | Striped::Only)
    }

    pub fn emits_indexed(&self) -> bool {
        !matches!(self, Striped::Only)
    }
}

/// What the inverted index records per term.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IndexOptions {
    #[serde(rename = "docs", alias = "DOCS_ONLY", alias = "DOCS")]
    Docs,
    #[serde(rename = "docs_and_freqs", alias = "DOCS_AND_FREQS")]
    DocsAndFreqs,
    #[default]
    #[serde(
        rename = "docs_and_freqs_and_positions",
        alias = "DOCS_AND_FREQS_AND_POSITIONS"
    )]
    DocsAndFreqsAndPositions,
    #[serde(
        rename = "docs_and_freqs_and_positions_and_offsets",
        alias = "DOCS_AND_FREQS_AND_POSITIONS_AND_OFFSETS"
    )]
    DocsAndFreqsAndPositionsAndOffsets,
}

/// Mapping options for one field, and recursively for its sub-fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Properties {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<PropertyType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
    pub indexed: bool,
    pub tokenized: bool,
    pub stored: bool,
    pub store_term_vectors: bool,
    pub store_term_vector_offsets: bool,
    pub store_term_vector_positions: bool,
    pub store_term_vector_payloads: bool,
    pub omit_norms: bool,
    pub index_options: IndexOptions,
    pub numeric_precision_step: u32,
    pub striped: Striped,
    /// Opaque to the core; carried for the query layer.
    pub meta_column: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Properties>,
}

impl Default for Properties {
    fn default() -> Self {
        Self {
            field_type: None,
            analyzer: None,
            indexed: true,
            tokenized: true,
            stored: false,
            store_term_vectors: false,
            store_term_vector_offsets: false,
            store_term_vector_positions: false,
            store_term_vector_payloads: false,
            omit_norms: true,
            index_options: IndexOptions::default(),
            numeric_precision_step: DEFAULT_NUMERIC_PRECISION_STEP,
            striped: Striped::default(),
            meta_column: false,
            fields: BTreeMap::new(),
        }
    }
}

impl Properties {
    /// Parse a mapping document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_type(field_type: PropertyType) -> Self {
        Self {
            field_type: Some(field_type),
            ..Self::default()
        }
    }

    /// Analyzer name, falling back to the mapping-wide default.
    pub fn analyzer_name(&self) -> &str {
        self.analyzer.as_deref().unwrap_or(DEFAULT_ANALYZER)
    }

    /// Fields that name their own analyzer, keyed by lowercase field name.
    pub fn per_field_analyzers(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter_map(|(name, props)| {
                props
                    .analyzer
                    .as_ref()
                    .map(|a| (name.to_lowercase(), a.clone()))
            })
            .collect()
    }

    /// Numeric configuration for fields whose explicit type is numeric.
    /// Children of `object` fields are reported as `parent.child`.
    pub fn dynamic_numeric_config(&self) -> BTreeMap<String, NumericConfig> {
        let mut out = BTreeMap::new();
        collect_numeric(&self.fields, None, &mut out);
        out
    }
}

fn collect_numeric(
    fields: &BTreeMap<String, Properties>,
    parent: Option<&str>,
    out: &mut BTreeMap<String, NumericConfig>,
) {
    for (name, props) in fields {
        let name = name.to_lowercase();
        let path = match parent {
            Some(p) => format!("{}.{}", p, name),
            None => name,
        };
        match props.field_type {
            Some(PropertyType::Object) => collect_numeric(&props.fields, Some(&path), out),
            Some(t) => {
                if let Some(numeric_type) = t.numeric_type() {
                    out.insert(
                        path,
                        NumericConfig {
                            precision_step: props.numeric_precision_step,
                            numeric_type,
                        },
                    );
                }
            }
            None => {}
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────
