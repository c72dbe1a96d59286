//! Voxel grid geometry.
//!
//! The grid is a cube of `voxel_num³` voxels centred on the world origin.
//! Rendering works in grid-local voxel units where the grid spans
//! `[0, voxel_num]³`; vertices sit on integer coordinates `0..=voxel_num`.

use crate::core::error::ConfigError;
use crate::core::types::{UVec3, Vec3};
use crate::math::Aabb;

/// Largest `voxel_num` whose `(voxel_num + 1)³` vertex lattice fits a `u32` index
pub const MAX_VOXEL_NUM: u32 = 1624;

/// Validated grid parameters, supplied alongside the model file
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridParams {
    voxel_num: u32,
    voxel_dim: u32,
    grid_size: f32,
}

impl GridParams {
    pub fn new(voxel_num: u32, voxel_dim: u32, grid_size: f32) -> Result<Self, ConfigError> {
        if voxel_num == 0 {
            return Err(ConfigError::VoxelNum);
        }
        if voxel_num > MAX_VOXEL_NUM {
            return Err(ConfigError::VoxelNumTooLarge { voxel_num, max: MAX_VOXEL_NUM });
        }
        if voxel_dim == 0 {
            return Err(ConfigError::VoxelDim);
        }
        if !grid_size.is_finite() || grid_size <= 0.0 {
            return Err(ConfigError::GridSize(grid_size));
        }
        Ok(Self { voxel_num, voxel_dim, grid_size })
    }

    pub fn voxel_num(&self) -> u32 {
        self.voxel_num
    }

    pub fn voxel_dim(&self) -> u32 {
        self.voxel_dim
    }
}

/// Uniform axis-aligned voxel lattice
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoxelGrid {
    params: GridParams,
    voxel_size: f32,
    xyzmin: Vec3,
    xyzmax: Vec3,
}

impl VoxelGrid {
    pub fn new(params: GridParams) -> Self {
        let voxel_size = params.grid_size / params.voxel_num as f32;
        let half = params.grid_size * 0.5;
        Self {
            params,
            voxel_size,
            xyzmin: Vec3::splat(-half),
            xyzmax: Vec3::splat(half),
        }
    }

    /// Voxels per axis
    pub fn voxel_num(&self) -> u32 {
        self.params.voxel_num
    }

    /// Feature width
    pub fn voxel_dim(&self) -> u32 {
        self.params.voxel_dim
    }

    /// World-space edge length of one voxel
    pub fn voxel_size(&self) -> f32 {
        self.voxel_size
    }

    /// World-space bounds
    pub fn world_bounds(&self) -> Aabb {
        Aabb::new(self.xyzmin, self.xyzmax)
    }

    /// Grid-local bounds, `[0, voxel_num]³`
    pub fn local_bounds(&self) -> Aabb {
        Aabb::new(Vec3::ZERO, Vec3::splat(self.params.voxel_num as f32))
    }

    pub fn world_to_local(&self, p: Vec3) -> Vec3 {
        (p - self.xyzmin) / self.voxel_size
    }

    pub fn local_to_world(&self, p: Vec3) -> Vec3 {
        self.xyzmin + p * self.voxel_size
    }

    /// Vertices per axis (`voxel_num + 1`)
    pub fn vertices_per_axis(&self) -> u64 {
        self.params.voxel_num as u64 + 1
    }

    /// Total vertex count
    pub fn vertex_count(&self) -> u64 {
        let v = self.vertices_per_axis();
        v * v * v
    }

    /// Total voxel count
    pub fn voxel_count(&self) -> usize {
        let n = self.params.voxel_num as usize;
        n * n * n
    }

    /// Flatten a vertex coordinate, `i` slowest and `k` fastest.
    pub fn flatten_vertex(&self, v: UVec3) -> u64 {
        let n1 = self.vertices_per_axis();
        (v.x as u64 * n1 + v.y as u64) * n1 + v.z as u64
    }

    /// Decode a flattened vertex index, or `None` if it lies outside the lattice.
    pub fn unflatten_vertex(&self, index: u64) -> Option<UVec3> {
        let n1 = self.vertices_per_axis();
        let plane = n1 * n1;
        let i = index / plane;
        if i >= n1 {
            return None;
        }
        let rem = index % plane;
        let j = rem / n1;
        let k = rem % n1;
        Some(UVec3::new(i as u32, j as u32, k as u32))
    }
}
