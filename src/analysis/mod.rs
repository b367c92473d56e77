//! Text analysis for indexed fields.
//!
//! Provides:
//! - `analyzer` -- the `Analyzer` trait and built-in analyzers
//! - `per_field` -- per-field routing by column name

pub mod analyzer;
pub mod per_field;

pub use analyzer::{analyzer_for_name, Analyzer, Token};
pub use per_field::PerFieldAnalyzerWrapper;
