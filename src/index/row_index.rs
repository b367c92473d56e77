//! RowIndex - per-table index handle owned by the host.
//!
//! Holds the current `IndexPlan` behind a lock so schema changes can swap in
//! a freshly resolved plan while readers keep the generation they started
//! with. Projection and materialization clone the `Arc` and never hold the
//! lock while working.
//!
//! ```no_run
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use sgindex::index::RowIndex;
//! use sgindex::types::ColumnFamilySchema;
//!
//! let schema = Arc::new(
//!     ColumnFamilySchema::builder("ks", "events")
//!         .partition_key("user", "text".parse().unwrap())
//!         .regular("event_type", "text".parse().unwrap())
//!         .build(),
//! );
//! let mut options = HashMap::new();
//! options.insert("sg_options".to_string(), r#"{"fields":{"event_type":{}}}"#.to_string());
//!
//! let index = RowIndex::new("events_idx", &options, "magic", schema).unwrap();
//! assert_eq!(index.generation(), 1);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use rayon::prelude::*;

use crate::config::IndexConfig;
use crate::error::Result;
use crate::host::filter::{filter_column_family, QueryFilter};
use crate::index::document::Document;
use crate::index::materializer::{materialize, Tuple};
use crate::index::plan::IndexPlan;
use crate::index::projector::project;
use crate::index::resolver::resolve;
use crate::types::row::{ColumnFamily, Row};
use crate::types::schema::ColumnFamilySchema;

pub struct RowIndex {
    name: String,
    config: IndexConfig,
    plan: RwLock<Arc<IndexPlan>>,
    generation: AtomicU64,
}

impl RowIndex {
    /// Create from the host's index options; the mapping is read from
    /// `sg_options`.
    pub fn new(
        name: &str,
        options: &HashMap<String, String>,
        column_name: &str,
        schema: Arc<ColumnFamilySchema>,
    ) -> Result<Self> {
        Self::from_config(name, IndexConfig::from_options(options, column_name)?, schema)
    }

    pub fn from_config(name: &str, config: IndexConfig, schema: Arc<ColumnFamilySchema>) -> Result<Self> {
        let plan = resolve(&config.mapping, schema, &config.column_name)?;
        tracing::info!(
            index = name,
            table = plan.schema().name.as_str(),
            fields = plan.indexed_column_names().len(),
            "Index plan created"
        );
        Ok(Self {
            name: name.to_string(),
            config,
            plan: RwLock::new(Arc::new(plan)),
            generation: AtomicU64::new(1),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Current plan. Callers keep the returned generation for the whole
    /// request even if a reload happens meanwhile.
    pub fn plan(&self) -> Arc<IndexPlan> {
        let guard = self.plan.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Re-resolve against a changed schema. On failure the current plan
    /// stays in place.
    pub fn reload(&self, schema: Arc<ColumnFamilySchema>) -> Result<u64> {
        let plan = Arc::new(resolve(&self.config.mapping, schema, &self.config.column_name)?);
        *self.plan.write().unwrap_or_else(PoisonError::into_inner) = plan;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(index = self.name.as_str(), generation, "Index plan reloaded");
        Ok(generation)
    }

    /// Project one row written by the host.
    pub fn index(&self, row: &Row) -> Result<Document> {
        project(&self.plan(), row)
    }

    /// Project a batch of rows, e.g. when rebuilding the derived index from
    /// host data. Output order follows `rows`.
    pub fn rebuild(&self, rows: &[Row]) -> Result<Vec<Document>> {
        let plan = self.plan();
        let docs: Result<Vec<Document>> = if rows.len() <= 1 {
            rows.iter().map(|row| project(&plan, row)).collect()
        } else {
            rows.par_iter().map(|row| project(&plan, row)).collect()
        };
        let docs = docs?;
        tracing::debug!(index = self.name.as_str(), rows = docs.len(), "Rebuilt documents");
        Ok(docs)
    }

    /// Fill `tuple` from a stored row.
    pub fn load(&self, row: &Row, positions: &HashMap<String, usize>, tuple: &mut Tuple) -> Result<()> {
        materialize(&self.plan(), row, positions, tuple)
    }

    /// Apply a host query filter to a cached row.
    pub fn filter(&self, cached: &ColumnFamily, filter: &QueryFilter) -> ColumnFamily {
        filter_column_family(self.plan().schema(), cached, filter)
    }
}

// ── Tests ──────────────────────────────────────────────────────────
