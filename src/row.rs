//! Rows: per-column cell maps, optionally carrying a row-level tombstone.

use std::{collections::BTreeMap, fmt};

use crate::{cell::AtomicCell, tombstone::Tombstone};

/// Identifier of a static or regular column within its kind.
pub type ColumnId = u32;

/// Cells of the static row or of one clustering row, ordered by column id.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Row {
    cells: BTreeMap<ColumnId, AtomicCell>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cell for `column`, replacing any previous cell without merging.
    pub fn set_cell(&mut self, column: ColumnId, cell: AtomicCell) {
        self.cells.insert(column, cell);
    }

    /// Raw cell stored for `column`; `None` means the column was never set.
    pub fn cell(&self, column: ColumnId) -> Option<&AtomicCell> {
        self.cells.get(&column)
    }

    /// Iterate cells in column-id order.
    pub fn iter(&self) -> impl Iterator<Item = (ColumnId, &AtomicCell)> {
        self.cells.iter().map(|(id, cell)| (*id, cell))
    }

    /// Number of columns set.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether no column is set.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Merge `other` column by column, keeping the winning cell per
    /// [`AtomicCell::reconcile`].
    pub fn apply(&mut self, other: &Row) {
        for (id, cell) in &other.cells {
            match self.cells.get_mut(id) {
                Some(existing) => {
                    existing.reconcile(cell);
                }
                None => {
                    self.cells.insert(*id, cell.clone());
                }
            }
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (idx, (id, cell)) in self.cells.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{id}: {cell}")?;
        }
        f.write_str("}")
    }
}

/// A clustering row: its cells plus a row-level tombstone.
///
/// The tombstone shadows cells written at or before it when the row is
/// read; shadowed cells stay in `cells` until reclaimed elsewhere.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct DeletableRow {
    /// Row-level deletion.
    pub tombstone: Tombstone,
    /// Cells of the row.
    pub cells: Row,
}

impl DeletableRow {
    /// Row-level tombstone.
    pub fn tombstone(&self) -> Tombstone {
        self.tombstone
    }

    /// Merge another version of the same row.
    pub fn apply(&mut self, other: &DeletableRow) {
        self.tombstone.apply(other.tombstone);
        self.cells.apply(&other.cells);
    }
}
