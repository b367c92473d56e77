//! Primary-key decomposition over a table's cell comparator.
//!
//! Cell names are composites laid out as
//! `[ck_1 … ck_n, column_name, element_key?]`; the trailing element-key slot
//! exists only when the table has a collection column. A primary key as
//! handed back by the index is the composite `[row_key, ck_1 … ck_n]`.
//!
//! `prefix_size` (the clustering prefix length) is derived here and nowhere
//! else.

use std::sync::Arc;

use crate::codec::composite::{self, CompositeBuilder};
use crate::error::{IndexError, Result};
use crate::types::schema::ColumnFamilySchema;
use crate::types::validator::Validator;

#[derive(Debug, Clone)]
pub struct KeyCodec {
    comparator: Arc<Validator>,
    key_validator: Validator,
    has_collections: bool,
    prefix_size: usize,
}

impl KeyCodec {
    pub fn new(schema: &ColumnFamilySchema) -> Self {
        let comparator = schema.shared_comparator();
        let has_collections = schema.has_collections();
        let reserved = if has_collections { 2 } else { 1 };
        let prefix_size = comparator.components().len().saturating_sub(reserved);
        Self {
            comparator,
            key_validator: schema.key_validator().clone(),
            has_collections,
            prefix_size,
        }
    }

    /// Number of clustering components preceding the column-name slot.
    pub fn prefix_size(&self) -> usize {
        self.prefix_size
    }

    pub fn has_collections(&self) -> bool {
        self.has_collections
    }

    /// Split a primary key with the table comparator. Non-composite
    /// comparators yield the key itself as the only component.
    pub fn split_pk<'a>(&self, pk: &'a [u8]) -> Result<Vec<&'a [u8]>> {
        if self.comparator.is_composite() {
            composite::split(pk)
        } else {
            Ok(vec![pk])
        }
    }

    /// Separate the row key from the clustering prefix of `pk`. The returned
    /// builder is seeded with the prefix so callers can extend it into a
    /// full cell name or a slice bound.
    pub fn row_key_and_builder(&self, pk: &[u8]) -> Result<(Vec<u8>, CompositeBuilder)> {
        let components = self.split_pk(pk)?;
        if components.len() < 1 + self.prefix_size {
            return Err(IndexError::InvalidFormat(format!(
                "Primary key has {} components, expected at least {}",
                components.len(),
                1 + self.prefix_size
            )));
        }
        let mut builder = CompositeBuilder::new();
        for component in &components[1..=self.prefix_size] {
            builder.add(component);
        }
        Ok((components[0].to_vec(), builder))
    }

    /// Final component of a composite cell name.
    pub fn extract_last_component<'a>(&self, cell_name: &'a [u8]) -> Result<&'a [u8]> {
        if !self.comparator.is_composite() {
            return Ok(cell_name);
        }
        composite::last_component(cell_name)?
            .ok_or_else(|| IndexError::InvalidFormat("Empty cell name".into()))
    }

    fn column_name_bytes<'a>(&self, cell_name: &'a [u8]) -> Result<&'a [u8]> {
        if !self.comparator.is_composite() {
            return Ok(cell_name);
        }
        let components = composite::split(cell_name)?;
        components.get(self.prefix_size).copied().ok_or_else(|| {
            IndexError::InvalidFormat(format!(
                "Cell name has {} components, no column slot at {}",
                components.len(),
                self.prefix_size
            ))
        })
    }

    /// User-visible column identifier of a cell, without a leading `.`.
    pub fn column_name(&self, cell_name: &[u8]) -> Result<String> {
        let raw = self.column_name_bytes(cell_name)?;
        let s = std::str::from_utf8(raw)
            .map_err(|e| IndexError::InvalidFormat(format!("Column name is not UTF-8: {}", e)))?;
        Ok(s.strip_prefix('.').unwrap_or(s).trim().to_string())
    }

    /// Collection element key of a cell, when the name carries one.
    pub fn element_key<'a>(&self, cell_name: &'a [u8]) -> Result<Option<&'a [u8]>> {
        if !self.has_collections {
            return Ok(None);
        }
        Ok(composite::split(cell_name)?.get(self.prefix_size + 1).copied())
    }

    /// Clustering components of a cell name.
    pub fn clustering_prefix<'a>(&self, cell_name: &'a [u8]) -> Result<Vec<&'a [u8]>> {
        if !self.comparator.is_composite() {
            return Ok(Vec::new());
        }
        let mut components = composite::split(cell_name)?;
        if components.len() < self.prefix_size {
            return Err(IndexError::InvalidFormat(
                "Cell name shorter than clustering prefix".into(),
            ));
        }
        components.truncate(self.prefix_size);
        Ok(components)
    }

    /// Primary key `[row_key, clustering prefix…]` of the logical row that
    /// owns `cell_name`.
    pub fn primary_key(&self, row_key: &[u8], cell_name: &[u8]) -> Result<Vec<u8>> {
        let prefix = self.clustering_prefix(cell_name)?;
        let mut builder = CompositeBuilder::new();
        builder.add(row_key);
        for component in prefix {
            builder.add(component);
        }
        builder.build()
    }

    /// Partition key components, split with the key validator.
    pub fn partition_key_components<'a>(&self, row_key: &'a [u8]) -> Result<Vec<&'a [u8]>> {
        if self.key_validator.is_composite() {
            composite::split(row_key)
        } else {
            Ok(vec![row_key])
        }
    }

    /// Encode a partition key from its components.
    pub fn partition_key(&self, components: &[&[u8]]) -> Result<Vec<u8>> {
        if self.key_validator.is_composite() {
            composite::build(components.iter().copied())
        } else {
            Ok(components.first().map(|c| c.to_vec()).unwrap_or_default())
        }
    }

    /// Encode a cell name for `column` under a clustering prefix.
    pub fn cell_name(&self, clustering: &[&[u8]], column: &str, element: Option<&[u8]>) -> Result<Vec<u8>> {
        if !self.comparator.is_composite() {
            return Ok(column.as_bytes().to_vec());
        }
        let mut builder = CompositeBuilder::new();
        for component in clustering {
            builder.add(component);
        }
        builder.add(column.as_bytes());
        if let Some(element) = element {
            builder.add(element);
        }
        builder.build()
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Validator {
        s.parse().unwrap()
    }

    fn event_schema() -> ColumnFamilySchema {
        ColumnFamilySchema::builder("ks", "mp")
            .partition_key("user", v("text"))
            .clustering_key("event_time", v("int"))
            .regular("event_type", v("text"))
            .build()
    }

    fn collection_schema() -> ColumnFamilySchema {
        ColumnFamilySchema::builder("ks", "items")
            .partition_key("id", v("text"))
            .clustering_key("bucket", v("int"))
            .clustering_key("seq", v("int"))
            .regular("tags", v("set<text>"))
            .regular("title", v("text"))
            .build()
    }

    #[test]
    fn test_prefix_size_reserves_column_slot() {
        assert_eq!(KeyCodec::new(&event_schema()).prefix_size(), 1);
        // Two clustering columns; collection slot reserved in addition.
        assert_eq!(KeyCodec::new(&collection_schema()).prefix_size(), 2);
    }

    #[test]
    fn test_row_key_and_builder() {
        let codec = KeyCodec::new(&event_schema());
        let pk = composite::build([b"user1".as_slice(), &4i32.to_be_bytes()]).unwrap();

        let (row_key, builder) = codec.row_key_and_builder(&pk).unwrap();
        assert_eq!(row_key, b"user1");
        assert_eq!(builder.len(), 1);
        assert_eq!(builder.components()[0], 4i32.to_be_bytes());
    }

    #[test]
    fn test_row_key_and_builder_rejects_short_key() {
        let codec = KeyCodec::new(&collection_schema());
        let pk = composite::build([b"only-row".as_slice(), &1i32.to_be_bytes()]).unwrap();
        assert!(codec.row_key_and_builder(&pk).is_err());
    }

    #[test]
    fn test_column_name_and_element_key() {
        let codec = KeyCodec::new(&collection_schema());
        let (b, s) = (1i32.to_be_bytes(), 2i32.to_be_bytes());

        let tag = codec.cell_name(&[b.as_slice(), s.as_slice()], "tags", Some(b"red".as_slice())).unwrap();
        assert_eq!(codec.column_name(&tag).unwrap(), "tags");
        assert_eq!(codec.element_key(&tag).unwrap(), Some(b"red".as_slice()));
        assert_eq!(codec.extract_last_component(&tag).unwrap(), b"red");

        let title = codec.cell_name(&[b.as_slice(), s.as_slice()], "title", None).unwrap();
        assert_eq!(codec.column_name(&title).unwrap(), "title");
        assert_eq!(codec.element_key(&title).unwrap(), None);
        assert_eq!(codec.extract_last_component(&title).unwrap(), b"title");
    }

    #[test]
    fn test_column_name_strips_leading_dot() {
        let codec = KeyCodec::new(&event_schema());
        let name = codec.cell_name(&[1i32.to_be_bytes().as_slice()], ".event_type ", None).unwrap();
        assert_eq!(codec.column_name(&name).unwrap(), "event_type");
    }

    #[test]
    fn test_primary_key_inverts_row_key_and_builder() {
        let codec = KeyCodec::new(&collection_schema());
        let (b, s) = (7i32.to_be_bytes(), 9i32.to_be_bytes());
        let cell = codec.cell_name(&[b.as_slice(), s.as_slice()], "tags", Some(b"x".as_slice())).unwrap();

        let pk = codec.primary_key(b"row-1", &cell).unwrap();
        let (row_key, builder) = codec.row_key_and_builder(&pk).unwrap();
        assert_eq!(row_key, b"row-1");
        assert_eq!(builder.components(), &[b.to_vec(), s.to_vec()]);

        // The builder extends into the original cell name.
        let mut name = builder.clone();
        name.add(b"tags").add(b"x");
        assert_eq!(name.build().unwrap(), cell);
    }

    #[test]
    fn test_partition_key_components() {
        let schema = ColumnFamilySchema::builder("ks", "t")
            .partition_key("a", v("text"))
            .partition_key("b", v("int"))
            .regular("c", v("text"))
            .build();
        let codec = KeyCodec::new(&schema);
        let key = codec.partition_key(&[b"x".as_slice(), &5i32.to_be_bytes()]).unwrap();
        let parts = codec.partition_key_components(&key).unwrap();
        assert_eq!(parts, vec![b"x".as_slice(), &5i32.to_be_bytes()]);

        let single = KeyCodec::new(&event_schema());
        assert_eq!(single.partition_key_components(b"user1").unwrap(), vec![b"user1".as_slice()]);
        assert_eq!(single.partition_key(&[b"user1".as_slice()]).unwrap(), b"user1");
    }
}
