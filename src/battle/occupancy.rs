//! Per-tick unit occupancy for collision-aware pathing
//!
//! Sparse cell -> unit lookup. Rebuilt by the surrounding game loop each tick
//! and read-only to the tactical core.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{Cell, UnitId};

/// Cells currently occupied by ground units
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OccupancyMap {
    cells: AHashMap<Cell, UnitId>,
}

impl OccupancyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (unit, cell) pairs
    pub fn from_positions(positions: impl Iterator<Item = (UnitId, Cell)>) -> Self {
        let mut map = Self::new();
        for (unit, cell) in positions {
            map.occupy(cell, unit);
        }
        map
    }

    pub fn occupy(&mut self, cell: Cell, unit: UnitId) {
        self.cells.insert(cell, unit);
    }

    pub fn vacate(&mut self, cell: Cell) {
        self.cells.remove(&cell);
    }

    pub fn occupant(&self, cell: Cell) -> Option<UnitId> {
        self.cells.get(&cell).copied()
    }

    pub fn is_occupied(&self, cell: Cell) -> bool {
        self.cells.contains_key(&cell)
    }

    /// Occupied by some unit other than `unit`
    pub fn is_blocked_for(&self, cell: Cell, unit: UnitId) -> bool {
        matches!(self.cells.get(&cell), Some(other) if *other != unit)
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
