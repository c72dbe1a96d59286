//! Occupancy octree construction by successive max-pooling

use super::{OccupancyMask, OccupancyOctree};

/// Pooling strides, finest first
pub const DEFAULT_STRIDES: [u32; 3] = [4, 16, 64];

/// Builds an [`OccupancyOctree`] from a voxel mask.
///
/// Each level pools the previous one (the mask itself for the finest) over
/// non-overlapping blocks, so every stride must be a multiple of the one
/// before it. Grids that are not a multiple of the stride get a partial last
/// block per axis.
pub struct OctreeBuilder {
    strides: Vec<u32>,
}

impl OctreeBuilder {
    /// Create a builder for the given strides, finest first.
    ///
    /// Returns `None` unless the strides are increasing multiples of each
    /// other starting above 1.
    pub fn new(strides: &[u32]) -> Option<Self> {
        let mut prev = 1;
        for &s in strides {
            if s <= prev || s % prev != 0 {
                return None;
            }
            prev = s;
        }
        Some(Self { strides: strides.to_vec() })
    }

    /// Pool `mask` and return levels coarsest first.
    pub fn build(&self, mask: &OccupancyMask) -> OccupancyOctree {
        let mut pooled: Vec<(u32, OccupancyMask)> = Vec::with_capacity(self.strides.len());
        let mut prev_stride = 1;

        for &stride in &self.strides {
            let factor = stride / prev_stride;
            let finer = pooled.last().map(|(_, m)| m).unwrap_or(mask);
            let coarse = Self::pool(finer, factor);
            pooled.push((stride, coarse));
            prev_stride = stride;
        }

        pooled.reverse();
        let octree = OccupancyOctree::from_levels(pooled);
        log::debug!(
            "Built occupancy octree: {} levels, {} cells",
            octree.levels().len(),
            octree.cells().len()
        );
        octree
    }

    /// Logical OR over `factor³` blocks
    fn pool(finer: &OccupancyMask, factor: u32) -> OccupancyMask {
        let dim = finer.dim().div_ceil(factor);
        let mut coarse = OccupancyMask::new(dim);
        for cell in finer.occupied_cells() {
            coarse.set(cell / factor);
        }
        coarse
    }
}

impl Default for OctreeBuilder {
    fn default() -> Self {
        Self { strides: DEFAULT_STRIDES.to_vec() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{IVec3, UVec3};

    #[test]
    fn test_invalid_strides() {
        assert!(OctreeBuilder::new(&[4, 16, 64]).is_some());
        assert!(OctreeBuilder::new(&[2, 8]).is_some());
        assert!(OctreeBuilder::new(&[1, 4]).is_none());
        assert!(OctreeBuilder::new(&[4, 6]).is_none());
        assert!(OctreeBuilder::new(&[16, 4]).is_none());
    }

    #[test]
    fn test_build_empty() {
        let mask = OccupancyMask::new(64);
        let octree = OctreeBuilder::default().build(&mask);
        assert!(octree.cells().iter().all(|&c| !c));
        assert_eq!(octree.levels()[0].dim, 1);
    }

    #[test]
    fn test_pooling_matches_brute_force() {
        let mut mask = OccupancyMask::new(32);
        for v in [UVec3::new(0, 0, 0), UVec3::new(5, 17, 30), UVec3::new(31, 31, 31), UVec3::new(12, 3, 9)] {
            mask.set(v);
        }
        let octree = OctreeBuilder::default().build(&mask);

        for (level, lvl) in octree.levels().iter().enumerate() {
            let d = lvl.dim as i32;
            for i in 0..d {
                for j in 0..d {
                    for k in 0..d {
                        let cell = IVec3::new(i, j, k);
                        let expected = mask
                            .occupied_cells()
                            .any(|v| v.as_ivec3() / lvl.stride as i32 == cell);
                        assert_eq!(octree.is_occupied(level, cell), expected, "level {level} cell {cell}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_non_multiple_grid() {
        // 10 voxels: stride 4 -> 3 cells, stride 16 -> 1, stride 64 -> 1
        let mut mask = OccupancyMask::new(10);
        mask.set(UVec3::new(9, 0, 0));
        let octree = OctreeBuilder::default().build(&mask);
        let dims: Vec<u32> = octree.levels().iter().map(|l| l.dim).collect();
        assert_eq!(dims, vec![1, 1, 3]);
        assert!(octree.is_occupied(2, IVec3::new(2, 0, 0)));
    }

    #[test]
    fn test_tiny_grid() {
        let mut mask = OccupancyMask::new(2);
        mask.set(UVec3::ZERO);
        let octree = OctreeBuilder::default().build(&mask);
        assert!(octree.levels().iter().all(|l| l.dim == 1));
        assert!((0..3).all(|level| octree.is_occupied(level, IVec3::ZERO)));
    }
}
