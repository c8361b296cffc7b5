//! Grid pathfinding primitive
//!
//! The tactical core only talks to the `Pathfinder` trait; `GridAStar` is the
//! default 8-neighbour A* over the terrain grid. Respects terrain costs,
//! structure footprints, optional unit occupancy and optional mine avoidance.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::battle::occupancy::OccupancyMap;
use crate::battle::terrain::TerrainMap;
use crate::core::types::{Cell, PlayerId};

/// Flags that change which cells a search may cross
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathOptions {
    /// Treat cells occupied by units as blocked (close-range/combat movement)
    pub respect_occupancy: bool,
    /// Treat mines laid by other players as blocked
    pub avoid_mines: bool,
}

impl PathOptions {
    pub fn combat() -> Self {
        Self {
            respect_occupancy: true,
            avoid_mines: true,
        }
    }
}

/// External search primitive wrapped by the path cache
///
/// Returns the ordered cells from `start` to `end` inclusive, or an empty
/// vector when `end` is unreachable.
pub trait Pathfinder {
    fn find_path(
        &self,
        start: Cell,
        end: Cell,
        terrain: &TerrainMap,
        occupancy: &OccupancyMap,
        owner: PlayerId,
        options: PathOptions,
    ) -> Vec<Cell>;
}

/// Node in the A* open set
#[derive(Debug, Clone)]
struct PathNode {
    cell: Cell,
    f_cost: f32, // g_cost + heuristic
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.cell == other.cell
    }
}

impl Eq for PathNode {}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .f_cost
            .partial_cmp(&self.f_cost)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// 8-neighbour A* over the terrain grid
#[derive(Debug, Clone, Default)]
pub struct GridAStar {
    /// Stop after expanding this many nodes (0 = map size)
    pub max_expansions: usize,
}

impl GridAStar {
    pub fn new() -> Self {
        Self::default()
    }

    fn blocked(
        cell: Cell,
        start: Cell,
        end: Cell,
        terrain: &TerrainMap,
        occupancy: &OccupancyMap,
        owner: PlayerId,
        options: PathOptions,
    ) -> bool {
        let Some(tile) = terrain.get(cell) else {
            return true;
        };
        if !tile.is_walkable() {
            return true;
        }
        if options.avoid_mines && matches!(tile.mine, Some(layer) if layer != owner) {
            return true;
        }
        options.respect_occupancy && cell != start && cell != end && occupancy.is_occupied(cell)
    }
}

/// Octile distance scaled by the cheapest terrain so it never overestimates
fn heuristic(a: Cell, b: Cell) -> f32 {
    let dx = (a.x - b.x).abs() as f32;
    let dy = (a.y - b.y).abs() as f32;
    let (long, short) = if dx > dy { (dx, dy) } else { (dy, dx) };
    (long + (std::f32::consts::SQRT_2 - 1.0) * short) * 0.7
}

impl Pathfinder for GridAStar {
    fn find_path(
        &self,
        start: Cell,
        end: Cell,
        terrain: &TerrainMap,
        occupancy: &OccupancyMap,
        owner: PlayerId,
        options: PathOptions,
    ) -> Vec<Cell> {
        if !terrain.in_bounds(start) || !terrain.in_bounds(end) {
            return Vec::new();
        }
        if start == end {
            return vec![start];
        }
        if Self::blocked(end, start, end, terrain, occupancy, owner, options) {
            return Vec::new();
        }

        let budget = if self.max_expansions == 0 {
            terrain.width() * terrain.height()
        } else {
            self.max_expansions
        };

        let mut open_set = BinaryHeap::new();
        let mut came_from: AHashMap<Cell, Cell> = AHashMap::new();
        let mut g_scores: AHashMap<Cell, f32> = AHashMap::new();
        let mut closed: AHashSet<Cell> = AHashSet::new();

        g_scores.insert(start, 0.0);
        open_set.push(PathNode {
            cell: start,
            f_cost: heuristic(start, end),
        });

        while let Some(current) = open_set.pop() {
            if current.cell == end {
                return reconstruct_path(&came_from, current.cell);
            }
            // Stale heap entries for cells already expanded cost nothing
            if !closed.insert(current.cell) {
                continue;
            }
            if closed.len() > budget {
                break;
            }

            let current_g = *g_scores.get(&current.cell).unwrap_or(&f32::INFINITY);

            for neighbor in current.cell.neighbors() {
                if Self::blocked(neighbor, start, end, terrain, occupancy, owner, options) {
                    continue;
                }

                let dx = neighbor.x - current.cell.x;
                let dy = neighbor.y - current.cell.y;
                let diagonal = dx != 0 && dy != 0;
                // No corner cutting past blocked orthogonal cells
                if diagonal
                    && (!terrain.is_walkable(current.cell.offset(dx, 0))
                        || !terrain.is_walkable(current.cell.offset(0, dy)))
                {
                    continue;
                }

                let step = if diagonal { std::f32::consts::SQRT_2 } else { 1.0 };
                let tentative_g = current_g + step * terrain.movement_cost(neighbor);
                let neighbor_g = *g_scores.get(&neighbor).unwrap_or(&f32::INFINITY);

                if tentative_g < neighbor_g && !closed.contains(&neighbor) {
                    came_from.insert(neighbor, current.cell);
                    g_scores.insert(neighbor, tentative_g);
                    open_set.push(PathNode {
                        cell: neighbor,
                        f_cost: tentative_g + heuristic(neighbor, end),
                    });
                }
            }
        }

        Vec::new() // No path found
    }
}

/// Reconstruct path from came_from map
fn reconstruct_path(came_from: &AHashMap<Cell, Cell>, mut current: Cell) -> Vec<Cell> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// Sum of terrain costs along a path
pub fn path_cost(terrain: &TerrainMap, path: &[Cell]) -> f32 {
    path.iter().map(|cell| terrain.movement_cost(*cell)).sum()
}
