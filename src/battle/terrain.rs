//! Terrain grid consumed read-only by the tactical core
//!
//! Each cell carries its terrain class plus the overlays the AI cares about:
//! resource deposits, structure footprints, no-build zones and known mines.

use serde::{Deserialize, Serialize};

use crate::core::types::{Cell, PlayerId, StructureId};
use crate::spatial::Grid;

/// Primary terrain class of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TerrainClass {
    #[default]
    Open,  // No movement penalty
    Road,  // Movement bonus
    Rough, // Slight penalty
    Water, // Impassable for ground units
    Rock,  // Impassable for ground units
}

impl TerrainClass {
    /// Movement cost multiplier (1.0 = normal)
    pub fn movement_cost(&self) -> f32 {
        match self {
            TerrainClass::Open => 1.0,
            TerrainClass::Road => 0.7,
            TerrainClass::Rough => 1.5,
            TerrainClass::Water => f32::INFINITY,
            TerrainClass::Rock => f32::INFINITY,
        }
    }

    /// Can ground units cross this terrain?
    pub fn is_passable(&self) -> bool {
        !matches!(self, TerrainClass::Water | TerrainClass::Rock)
    }
}

/// A single terrain cell
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TerrainCell {
    pub class: TerrainClass,
    pub resource_deposit: bool,
    pub structure: Option<StructureId>,
    pub no_build: bool,
    /// Owner of a known mine on this cell
    pub mine: Option<PlayerId>,
}

impl TerrainCell {
    /// Passable for ground movement (terrain and structures)
    pub fn is_walkable(&self) -> bool {
        self.class.is_passable() && self.structure.is_none()
    }
}

/// The full terrain map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainMap {
    cells: Grid<TerrainCell>,
}

impl TerrainMap {
    /// Create a new map with open terrain
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            cells: Grid::new(width as usize, height as usize),
        }
    }

    pub fn width(&self) -> usize {
        self.cells.width
    }

    pub fn height(&self) -> usize {
        self.cells.height
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        self.cells.in_bounds(cell)
    }

    pub fn get(&self, cell: Cell) -> Option<&TerrainCell> {
        self.cells.get(cell)
    }

    pub fn set_terrain(&mut self, cell: Cell, class: TerrainClass) {
        if let Some(c) = self.cells.get_mut(cell) {
            c.class = class;
        }
    }

    pub fn set_resource(&mut self, cell: Cell, present: bool) {
        if let Some(c) = self.cells.get_mut(cell) {
            c.resource_deposit = present;
        }
    }

    pub fn set_no_build(&mut self, cell: Cell, no_build: bool) {
        if let Some(c) = self.cells.get_mut(cell) {
            c.no_build = no_build;
        }
    }

    pub fn place_mine(&mut self, cell: Cell, owner: PlayerId) {
        if let Some(c) = self.cells.get_mut(cell) {
            c.mine = Some(owner);
        }
    }

    /// Mark a structure footprint on the map
    pub fn place_structure(&mut self, id: StructureId, x: i32, y: i32, width: u32, height: u32) {
        for dy in 0..height as i32 {
            for dx in 0..width as i32 {
                if let Some(c) = self.cells.get_mut(Cell::new(x + dx, y + dy)) {
                    c.structure = Some(id);
                }
            }
        }
    }

    /// Remove a structure footprint from the map
    pub fn clear_structure(&mut self, id: StructureId) {
        let cells: Vec<Cell> = self.cells.cells().collect();
        for cell in cells {
            if let Some(c) = self.cells.get_mut(cell) {
                if c.structure == Some(id) {
                    c.structure = None;
                }
            }
        }
    }

    /// Terrain class allows ground movement (ignores structures)
    pub fn is_passable(&self, cell: Cell) -> bool {
        self.get(cell).map(|c| c.class.is_passable()).unwrap_or(false)
    }

    /// A ground unit could stand here: passable terrain, no structure
    pub fn is_walkable(&self, cell: Cell) -> bool {
        self.get(cell).map(|c| c.is_walkable()).unwrap_or(false)
    }

    /// Movement cost of entering a cell (infinite when blocked)
    pub fn movement_cost(&self, cell: Cell) -> f32 {
        match self.get(cell) {
            Some(c) if c.is_walkable() => c.class.movement_cost(),
            _ => f32::INFINITY,
        }
    }
}
