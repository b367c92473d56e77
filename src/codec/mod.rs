//! Byte-level codecs for composite names and primary keys.
//!
//! Provides:
//! - `composite` -- length-prefixed component encoding, split/build/compare
//! - `key` -- primary-key decomposition over a table's comparator

pub mod composite;
pub mod key;

pub use composite::CompositeBuilder;
pub use key::KeyCodec;
