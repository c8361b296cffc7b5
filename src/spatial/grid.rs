//! Generic grid for per-cell data

use serde::{Deserialize, Serialize};

use crate::core::types::Cell;

/// Generic 2D grid addressed by terrain cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid<T: Clone + Default> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }

    #[inline]
    fn index(&self, cell: Cell) -> Option<usize> {
        if self.in_bounds(cell) {
            Some(cell.y as usize * self.width + cell.x as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as usize) < self.width && (cell.y as usize) < self.height
    }

    #[inline]
    pub fn get(&self, cell: Cell) -> Option<&T> {
        self.index(cell).map(|i| &self.data[i])
    }

    #[inline]
    pub fn get_mut(&mut self, cell: Cell) -> Option<&mut T> {
        self.index(cell).map(move |i| &mut self.data[i])
    }

    #[inline]
    pub fn set(&mut self, cell: Cell, value: T) {
        if let Some(i) = self.index(cell) {
            self.data[i] = value;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reset every cell to the default value
    pub fn clear(&mut self) {
        self.data.iter_mut().for_each(|v| *v = T::default());
    }

    /// Iterate over all cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Cell::new(x as i32, y as i32)))
    }
}

impl Grid<f64> {
    /// Add to a cell, ignoring out-of-bounds writes
    #[inline]
    pub fn add(&mut self, cell: Cell, amount: f64) {
        if let Some(v) = self.get_mut(cell) {
            *v += amount;
        }
    }

    /// Value at a cell, zero outside the grid
    #[inline]
    pub fn value(&self, cell: Cell) -> f64 {
        self.get(cell).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_bounds() {
        let grid: Grid<u8> = Grid::new(4, 3);
        assert!(grid.in_bounds(Cell::new(3, 2)));
        assert!(!grid.in_bounds(Cell::new(4, 0)));
        assert!(!grid.in_bounds(Cell::new(0, -1)));
        assert!(grid.get(Cell::new(10, 10)).is_none());
    }

    #[test]
    fn test_grid_set_get() {
        let mut grid: Grid<u8> = Grid::new(4, 3);
        grid.set(Cell::new(1, 2), 7);
        assert_eq!(grid.get(Cell::new(1, 2)), Some(&7));
        grid.set(Cell::new(9, 9), 1);
        assert_eq!(grid.cells().count(), 12);
    }

    #[test]
    fn test_float_grid_add() {
        let mut grid: Grid<f64> = Grid::new(2, 2);
        grid.add(Cell::new(0, 0), 1.5);
        grid.add(Cell::new(0, 0), 2.0);
        grid.add(Cell::new(5, 5), 2.0);
        assert_eq!(grid.value(Cell::new(0, 0)), 3.5);
        assert_eq!(grid.value(Cell::new(5, 5)), 0.0);
    }
}
