//! Index configuration surface.
//!
//! The host passes index options as a flat string map at index creation.
//! The mapping document lives under [`SG_OPTIONS`]; the indexed column name
//! comes from the index declaration and becomes the plan's default field.

use std::collections::HashMap;

use crate::error::{IndexError, Result};
use crate::mapping::Properties;

/// Host index option naming the JSON mapping document.
pub const SG_OPTIONS: &str = "sg_options";

/// Analyzer used when neither the field nor the mapping names one.
pub const DEFAULT_ANALYZER: &str = "standard";

/// Trie precision step for numeric fields without an explicit setting.
pub const DEFAULT_NUMERIC_PRECISION_STEP: u32 = 4;

/// Parsed index options.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Column the index is declared on.
    pub column_name: String,
    pub mapping: Properties,
}

impl IndexConfig {
    pub fn new(column_name: &str, mapping: Properties) -> Self {
        Self {
            column_name: column_name.to_string(),
            mapping,
        }
    }

    /// Read the mapping out of the host's index options.
    pub fn from_options(options: &HashMap<String, String>, column_name: &str) -> Result<Self> {
        let json = options
            .get(SG_OPTIONS)
            .ok_or_else(|| IndexError::MissingOption(SG_OPTIONS.to_string()))?;
        Ok(Self::new(column_name, Properties::from_json(json)?))
    }
}
