//! Schema-to-index projection core.
//!
//! Provides:
//! - `field_type` -- field descriptors handed to the search backend
//! - `plan` -- the immutable resolved `IndexPlan`
//! - `resolver` -- mapping + schema → plan
//! - `document` -- projected document shape
//! - `projector` -- host row → document
//! - `materializer` -- stored row → typed tuple
//! - `row_index` -- per-table handle tying the above together

pub mod field_type;
pub mod plan;
pub mod resolver;
pub mod document;
pub mod projector;
pub mod materializer;
pub mod row_index;

pub use document::{Document, FieldValue, IndexableField};
pub use field_type::{DocValuesType, FieldType, NumericConfig, NumericType};
pub use materializer::{materialize, Tuple};
pub use plan::{CollectionFieldType, IndexPlan};
pub use projector::project;
pub use resolver::{resolve, resolve_json};
pub use row_index::RowIndex;
