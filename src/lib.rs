//! sgindex - schema-to-index projection core
//!
//! Embeds a search index alongside a wide-column store. Given a JSON mapping
//! and a table schema it resolves an `IndexPlan`, projects host rows into
//! index documents, and materializes stored rows back into typed tuples.
//!
//! # Modules
//!
//! - `types` -- validators, values, schema, rows
//! - `codec` -- composite names and primary-key decomposition
//! - `mapping` -- user mapping and host-type inference
//! - `analysis` -- analyzers and per-field routing
//! - `index` -- plan resolution, projection, materialization
//! - `host` -- read-path filtering
//! - `function` -- query-function hook points

pub mod analysis;
pub mod codec;
pub mod config;
pub mod error;
pub mod function;
pub mod host;
pub mod index;
pub mod mapping;
pub mod telemetry;
pub mod types;

pub use config::IndexConfig;
pub use error::{IndexError, Result};
pub use index::{materialize, project, resolve, Document, IndexPlan, RowIndex, Tuple};
pub use mapping::Properties;
pub use types::{ColumnFamilySchema, Row, Validator, Value};
