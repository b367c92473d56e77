//! Declarative index mapping and host-type inference.

pub mod properties;
pub mod type_mapper;

pub use properties::{IndexOptions, Properties, PropertyType, Striped, MAP_KEY_FIELD, MAP_VALUE_FIELD};
