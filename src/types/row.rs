//! Rows and cells handed to the index by the host.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::types::schema::ColumnFamilySchema;
use crate::types::validator::Validator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Live,
    /// Deletion marker; `local_deletion_time` is in seconds since epoch.
    Tombstone { local_deletion_time: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Composite cell name.
    pub name: Vec<u8>,
    pub value: Vec<u8>,
    /// Write timestamp in microseconds.
    pub timestamp: i64,
    pub kind: CellKind,
}

impl Cell {
    pub fn live(name: Vec<u8>, value: Vec<u8>, timestamp: i64) -> Self {
        Self {
            name,
            value,
            timestamp,
            kind: CellKind::Live,
        }
    }

    pub fn tombstone(name: Vec<u8>, timestamp: i64, local_deletion_time: i32) -> Self {
        Self {
            name,
            value: Vec::new(),
            timestamp,
            kind: CellKind::Tombstone { local_deletion_time },
        }
    }

    pub fn is_live(&self) -> bool {
        self.kind == CellKind::Live
    }

    /// A tombstone that may be purged when collecting with `gc_before`.
    pub fn is_gcable(&self, gc_before: i32) -> bool {
        match self.kind {
            CellKind::Tombstone { local_deletion_time } => local_deletion_time < gc_before,
            CellKind::Live => false,
        }
    }
}

/// Partition-level deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletionTime {
    pub marked_for_delete_at: i64,
    pub local_deletion_time: i32,
}

/// Cells of one row, kept sorted by the table comparator.
#[derive(Debug, Clone)]
pub struct ColumnFamily {
    comparator: Arc<Validator>,
    cells: Vec<Cell>,
    reversed: bool,
    deletion: Option<DeletionTime>,
}

impl ColumnFamily {
    pub fn new(schema: &ColumnFamilySchema) -> Self {
        Self::with_comparator(schema.shared_comparator())
    }

    pub fn with_comparator(comparator: Arc<Validator>) -> Self {
        Self {
            comparator,
            cells: Vec::new(),
            reversed: false,
            deletion: None,
        }
    }

    /// Copy of the metadata without any cells.
    pub fn clone_shallow(&self, reversed: bool) -> Self {
        Self {
            comparator: Arc::clone(&self.comparator),
            cells: Vec::new(),
            reversed,
            deletion: self.deletion,
        }
    }

    pub fn comparator(&self) -> &Validator {
        &self.comparator
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn deletion(&self) -> Option<DeletionTime> {
        self.deletion
    }

    pub fn delete(&mut self, deletion: DeletionTime) {
        let keep = match self.deletion {
            Some(existing) => existing.marked_for_delete_at >= deletion.marked_for_delete_at,
            None => false,
        };
        if !keep {
            self.deletion = Some(deletion);
        }
    }

    /// Insert a cell in comparator order. A cell with an equal name is
    /// reconciled: the higher timestamp wins, tombstones win ties.
    pub fn add(&mut self, cell: Cell) {
        let comparator = Arc::clone(&self.comparator);
        match self
            .cells
            .binary_search_by(|probe| comparator.compare(&probe.name, &cell.name))
        {
            Ok(pos) => {
                let existing = &self.cells[pos];
                let replace = match cell.timestamp.cmp(&existing.timestamp) {
                    Ordering::Greater => true,
                    Ordering::Less => false,
                    Ordering::Equal => !cell.is_live() && existing.is_live(),
                };
                if replace {
                    self.cells[pos] = cell;
                }
            }
            Err(pos) => self.cells.insert(pos, cell),
        }
    }

    /// Cells in comparator order, independent of `reversed`.
    pub fn sorted_cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cells in query order: descending when the family is reversed.
    pub fn iter_in_query_order(&self) -> Box<dyn Iterator<Item = &Cell> + '_> {
        if self.reversed {
            Box::new(self.cells.iter().rev())
        } else {
            Box::new(self.cells.iter())
        }
    }

    pub fn retain<F: FnMut(&Cell) -> bool>(&mut self, f: F) {
        self.cells.retain(f);
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_live()).count()
    }
}

/// Row key plus the cells of one logical row.
#[derive(Debug, Clone)]
pub struct Row {
    pub key: Vec<u8>,
    pub cf: ColumnFamily,
}

impl Row {
    pub fn new(key: Vec<u8>, cf: ColumnFamily) -> Self {
        Self { key, cf }
    }
}
