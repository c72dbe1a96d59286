//! Coarsened occupancy hierarchy.
//!
//! Levels are max-pooled copies of the occupancy mask at decreasing strides,
//! stored coarsest first in one flat buffer. A cell is set iff any voxel in
//! its `stride³` block is occupied, so an empty cell at any level proves the
//! whole block empty.

use crate::core::types::{IVec3, Vec3};
use crate::math::{Aabb, CellVisit, CellWalk, Ray};
use super::OccupancyMask;

/// Placement of one level inside the flat cell buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OctreeLevel {
    /// Voxels per cell edge
    pub stride: u32,
    /// Cells per axis
    pub dim: u32,
    /// Index of the level's first cell in the flat buffer
    pub offset: usize,
}

/// Occupancy levels, coarsest first
#[derive(Clone, Debug, PartialEq)]
pub struct OccupancyOctree {
    levels: Vec<OctreeLevel>,
    cells: Vec<bool>,
}

impl OccupancyOctree {
    /// Concatenate pooled masks given coarsest first as `(stride, mask)`.
    pub(crate) fn from_levels(pooled: Vec<(u32, OccupancyMask)>) -> Self {
        let total: usize = pooled.iter().map(|(_, m)| {
            let d = m.dim() as usize;
            d * d * d
        }).sum();

        let mut levels = Vec::with_capacity(pooled.len());
        let mut cells = Vec::with_capacity(total);
        for (stride, mask) in pooled {
            let dim = mask.dim();
            let offset = cells.len();
            let d = dim as i32;
            for i in 0..d {
                for j in 0..d {
                    for k in 0..d {
                        cells.push(mask.is_occupied(IVec3::new(i, j, k)));
                    }
                }
            }
            levels.push(OctreeLevel { stride, dim, offset });
        }

        Self { levels, cells }
    }

    /// Level descriptors, coarsest first
    pub fn levels(&self) -> &[OctreeLevel] {
        &self.levels
    }

    /// The flat cell buffer
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// Whether a cell of a level is occupied. Out-of-range cells are empty.
    pub fn is_occupied(&self, level: usize, cell: IVec3) -> bool {
        let Some(lvl) = self.levels.get(level) else {
            return false;
        };
        let d = lvl.dim as i32;
        if cell.min_element() < 0 || cell.max_element() >= d {
            return false;
        }
        let dim = lvl.dim as usize;
        let local = (cell.x as usize * dim + cell.y as usize) * dim + cell.z as usize;
        self.cells[lvl.offset + local]
    }

    /// Find the first occupied voxel along a ray in `[t_start, t_end]`.
    ///
    /// Walks the coarsest level in ray order and only descends into occupied
    /// cells, finishing on the exact voxel mask. Returns the voxel visit
    /// (in grid-local voxel coordinates) or `None` if the range is empty.
    pub fn first_occupied(
        &self,
        mask: &OccupancyMask,
        ray: &Ray,
        t_start: f32,
        t_end: f32,
    ) -> Option<CellVisit> {
        let n = mask.dim() as f32;
        let bounds = Aabb::new(Vec3::ZERO, Vec3::splat(n));
        let (t_near, t_far) = ray.intersects_aabb(&bounds)?;
        let t_start = t_start.max(t_near);
        let t_end = t_end.min(t_far);
        if t_start >= t_end {
            return None;
        }
        self.descend(0, mask, ray, t_start, t_end)
    }

    fn descend(
        &self,
        level: usize,
        mask: &OccupancyMask,
        ray: &Ray,
        t_start: f32,
        t_end: f32,
    ) -> Option<CellVisit> {
        let Some(lvl) = self.levels.get(level) else {
            let dims = IVec3::splat(mask.dim() as i32);
            return CellWalk::new(ray, 1.0, dims, t_start, t_end)
                .find(|visit| mask.is_occupied(visit.cell));
        };

        let dims = IVec3::splat(lvl.dim as i32);
        CellWalk::new(ray, lvl.stride as f32, dims, t_start, t_end)
            .filter(|visit| self.is_occupied(level, visit.cell))
            .find_map(|visit| self.descend(level + 1, mask, ray, visit.t_enter, visit.t_exit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::UVec3;
    use crate::mask::OctreeBuilder;

    fn single_voxel(dim: u32, voxel: UVec3) -> (OccupancyMask, OccupancyOctree) {
        let mut mask = OccupancyMask::new(dim);
        mask.set(voxel);
        let octree = OctreeBuilder::default().build(&mask);
        (mask, octree)
    }

    #[test]
    fn test_level_layout() {
        let (_, octree) = single_voxel(128, UVec3::ZERO);
        let levels = octree.levels();
        assert_eq!(levels.len(), 3);
        assert_eq!((levels[0].stride, levels[0].dim, levels[0].offset), (64, 2, 0));
        assert_eq!((levels[1].stride, levels[1].dim, levels[1].offset), (16, 8, 8));
        assert_eq!((levels[2].stride, levels[2].dim, levels[2].offset), (4, 32, 8 + 512));
        assert_eq!(octree.cells().len(), 8 + 512 + 32 * 32 * 32);
    }

    #[test]
    fn test_occupied_at_every_level() {
        let (_, octree) = single_voxel(128, UVec3::new(70, 5, 127));
        assert!(octree.is_occupied(0, IVec3::new(1, 0, 1)));
        assert!(octree.is_occupied(1, IVec3::new(4, 0, 7)));
        assert!(octree.is_occupied(2, IVec3::new(17, 1, 31)));
        assert!(!octree.is_occupied(2, IVec3::new(17, 1, 30)));
        assert!(!octree.is_occupied(3, IVec3::ZERO));
        assert!(!octree.is_occupied(0, IVec3::new(2, 0, 0)));
    }

    #[test]
    fn test_first_occupied_finds_voxel() {
        let voxel = UVec3::new(40, 9, 100);
        let (mask, octree) = single_voxel(128, voxel);
        let target = voxel.as_vec3() + Vec3::splat(0.5);
        let origin = Vec3::new(-50.0, 300.0, 64.0);
        let ray = Ray::new(origin, (target - origin).normalize());

        let hit = octree.first_occupied(&mask, &ray, 0.0, 1000.0).unwrap();
        assert_eq!(hit.cell, voxel.as_ivec3());
        let entry = ray.at(hit.t_enter);
        assert!(entry.cmpge(voxel.as_vec3() - 1e-3).all());
        assert!(entry.cmple(voxel.as_vec3() + 1.0 + 1e-3).all());
    }

    #[test]
    fn test_first_occupied_misses_nearby_ray() {
        let voxel = UVec3::new(40, 9, 100);
        let (mask, octree) = single_voxel(128, voxel);
        // Passes through the same stride-4 block but one voxel over
        let target = voxel.as_vec3() + Vec3::new(1.5, 0.5, 0.5);
        let origin = Vec3::new(target.x, target.y, -10.0);
        let ray = Ray::new(origin, Vec3::Z);
        assert!(octree.first_occupied(&mask, &ray, 0.0, 200.0).is_none());
    }

    #[test]
    fn test_first_occupied_returns_nearest() {
        let mut mask = OccupancyMask::new(64);
        mask.set(UVec3::new(10, 10, 50));
        mask.set(UVec3::new(10, 10, 20));
        let octree = OctreeBuilder::default().build(&mask);
        let ray = Ray::new(Vec3::new(10.5, 10.5, 0.0), Vec3::Z);
        let hit = octree.first_occupied(&mask, &ray, 0.0, 64.0).unwrap();
        assert_eq!(hit.cell, IVec3::new(10, 10, 20));
        assert!((hit.t_enter - 20.0).abs() < 1e-4);
    }
}
