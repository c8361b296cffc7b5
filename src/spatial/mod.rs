//! Spatial containers shared by the tactical layers

pub mod grid;

pub use grid::Grid;
