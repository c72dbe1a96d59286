//! Occupancy masks: which voxels of the grid hold trained features.
//!
//! [`OccupancyMask`] is the exact per-voxel answer used while marching;
//! [`OccupancyOctree`] is its coarsened summary used to find where a ray
//! first enters occupied space.

pub mod octree;
pub mod builder;

pub use octree::{OccupancyOctree, OctreeLevel};
pub use builder::OctreeBuilder;

use crate::core::types::{IVec3, UVec3};

/// Dense boolean occupancy over a cubic lattice of cells.
///
/// Cells are stored `i` slowest, `k` fastest, matching the vertex
/// flattening of the model file.
#[derive(Clone, Debug, PartialEq)]
pub struct OccupancyMask {
    dim: u32,
    cells: Vec<bool>,
}

impl OccupancyMask {
    /// Create an empty mask of `dim³` cells
    pub fn new(dim: u32) -> Self {
        let n = dim as usize;
        Self {
            dim,
            cells: vec![false; n * n * n],
        }
    }

    /// Cells per axis
    pub fn dim(&self) -> u32 {
        self.dim
    }

    fn offset(&self, cell: UVec3) -> usize {
        let n = self.dim as usize;
        (cell.x as usize * n + cell.y as usize) * n + cell.z as usize
    }

    fn contains(&self, cell: IVec3) -> bool {
        let n = self.dim as i32;
        cell.x >= 0 && cell.y >= 0 && cell.z >= 0 && cell.x < n && cell.y < n && cell.z < n
    }

    /// Mark a cell occupied. Returns false if the cell is outside the mask.
    pub fn set(&mut self, cell: UVec3) -> bool {
        if cell.max_element() >= self.dim {
            return false;
        }
        let offset = self.offset(cell);
        self.cells[offset] = true;
        true
    }

    /// Whether a cell is occupied. Cells outside the mask are empty.
    pub fn is_occupied(&self, cell: IVec3) -> bool {
        self.contains(cell) && self.cells[self.offset(cell.as_uvec3())]
    }

    /// Number of occupied cells
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Iterate the coordinates of occupied cells
    pub fn occupied_cells(&self) -> impl Iterator<Item = UVec3> + '_ {
        let n = self.dim as usize;
        self.cells.iter().enumerate().filter(|(_, c)| **c).map(move |(idx, _)| {
            UVec3::new((idx / (n * n)) as u32, ((idx / n) % n) as u32, (idx % n) as u32)
        })
    }
}
