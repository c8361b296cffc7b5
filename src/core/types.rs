//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Simulation time in milliseconds since the skirmish started
pub type GameTime = u64;

/// Identifier for a participant in the skirmish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    pub fn new(id: u8) -> Self {
        Self(id)
    }
}

/// Unique identifier for units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl UnitId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Unique identifier for structures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructureId(pub u32);

impl StructureId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Unique identifier for wrecks left behind by destroyed units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WreckId(pub u32);

/// Identifier for an active formation group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FormationGroupId(pub u32);

/// Integer terrain cell coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Center of the cell in continuous (cell-unit) coordinates
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x as f32 + 0.5, self.y as f32 + 0.5)
    }

    /// Euclidean distance between cell centers
    pub fn distance(&self, other: &Self) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// Chebyshev (king-move) distance
    pub fn chebyshev(&self, other: &Self) -> u32 {
        (self.x - other.x).unsigned_abs().max((self.y - other.y).unsigned_abs())
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// The 8 surrounding cells
    pub fn neighbors(&self) -> [Cell; 8] {
        [
            self.offset(1, 0),
            self.offset(1, -1),
            self.offset(0, -1),
            self.offset(-1, -1),
            self.offset(-1, 0),
            self.offset(-1, 1),
            self.offset(0, 1),
            self.offset(1, 1),
        ]
    }

    /// Cells forming the square ring at Chebyshev distance `radius`
    pub fn ring(&self, radius: u32) -> Vec<Cell> {
        let r = radius as i32;
        if r == 0 {
            return vec![*self];
        }
        let mut cells = Vec::with_capacity((8 * r) as usize);
        for dx in -r..=r {
            cells.push(self.offset(dx, -r));
            cells.push(self.offset(dx, r));
        }
        for dy in (-r + 1)..r {
            cells.push(self.offset(-r, dy));
            cells.push(self.offset(r, dy));
        }
        cells
    }

    /// Cells on the straight line from self to other (inclusive)
    pub fn line_to(&self, other: &Self) -> Vec<Cell> {
        let n = self.chebyshev(other) as i32;
        if n == 0 {
            return vec![*self];
        }

        let mut results = Vec::with_capacity((n + 1) as usize);
        for i in 0..=n {
            let t = i as f32 / n as f32;
            let x = self.x as f32 + (other.x - self.x) as f32 * t;
            let y = self.y as f32 + (other.y - self.y) as f32 * t;
            results.push(Cell::new(x.round() as i32, y.round() as i32));
        }
        results
    }
}

/// 2D position in continuous cell units
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0001 {
            Self { x: self.x / len, y: self.y / len }
        } else {
            Self::default()
        }
    }

    /// Cell containing this position
    pub fn cell(&self) -> Cell {
        Cell::new(self.x.floor() as i32, self.y.floor() as i32)
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self { x: self.x * rhs, y: self.y * rhs }
    }
}
