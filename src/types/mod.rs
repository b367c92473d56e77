//! Host-side data model: validators, values, schema, rows.

pub mod validator;
pub mod value;
pub mod schema;
pub mod row;

pub use validator::{NativeType, Validator};
pub use value::Value;
pub use schema::{ColumnDefinition, ColumnFamilySchema, ColumnKind, SchemaBuilder};
pub use row::{Cell, CellKind, ColumnFamily, DeletionTime, Row};
