//! Geometric primitives for ray traversal

pub mod aabb;
pub mod ray;
pub mod dda;

pub use aabb::Aabb;
pub use ray::Ray;
pub use dda::{CellWalk, CellVisit};
