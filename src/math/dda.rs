//! Uniform grid traversal (Amanatides & Woo).
//!
//! [`CellWalk`] visits, in ray order, every lattice cell a ray passes through
//! between two parameters. It is used at every level of the occupancy
//! hierarchy and by the per-voxel marcher.

use crate::core::types::{IVec3, Vec3};
use super::ray::{Ray, PARALLEL_EPSILON};

/// Visits shorter than this (in ray parameter) are skipped
pub const SPAN_EPSILON: f32 = 1e-5;

/// Points this close to a cell boundary (in cells) are resolved by direction
const TIE_EPSILON: f32 = 1e-4;

/// One cell crossed by a ray
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellVisit {
    pub cell: IVec3,
    pub t_enter: f32,
    pub t_exit: f32,
}

/// Iterator over the cells of a `dims`-sized lattice with cells of edge
/// `cell_size` (lattice origin at zero) crossed by a ray in `[t_start, t_end]`.
///
/// Every step moves to a neighbouring cell, so the walk ends after at most
/// `dims.x + dims.y + dims.z` steps regardless of floating point noise.
pub struct CellWalk {
    cell: IVec3,
    step: IVec3,
    t_next: Vec3,
    t_delta: Vec3,
    t: f32,
    t_end: f32,
    dims: IVec3,
    done: bool,
}

impl CellWalk {
    pub fn new(ray: &Ray, cell_size: f32, dims: IVec3, t_start: f32, t_end: f32) -> Self {
        let p = ray.at(t_start) / cell_size;
        let mut cell = IVec3::ZERO;
        let mut step = IVec3::ZERO;
        let mut t_next = Vec3::splat(f32::INFINITY);
        let mut t_delta = Vec3::splat(f32::INFINITY);

        let valid = p.is_finite() && t_start < t_end && dims.min_element() > 0;

        if valid {
            for axis in 0..3 {
                let d = ray.direction[axis];
                let o = ray.origin[axis];

                // A start point on a boundary belongs to the cell the ray moves into
                let nearest = p[axis].round();
                let c = if (p[axis] - nearest).abs() < TIE_EPSILON {
                    if d < 0.0 { nearest - 1.0 } else { nearest }
                } else {
                    p[axis].floor()
                };
                let c = (c as i32).clamp(0, dims[axis] - 1);
                cell[axis] = c;

                if d.abs() < PARALLEL_EPSILON {
                    continue;
                }
                if d > 0.0 {
                    step[axis] = 1;
                    t_next[axis] = ((c + 1) as f32 * cell_size - o) / d;
                    t_delta[axis] = cell_size / d;
                } else {
                    step[axis] = -1;
                    t_next[axis] = (c as f32 * cell_size - o) / d;
                    t_delta[axis] = -cell_size / d;
                }
            }
        }

        Self {
            cell,
            step,
            t_next,
            t_delta,
            t: t_start,
            t_end,
            dims,
            done: !valid,
        }
    }

    fn exit_axis(&self) -> usize {
        let t = self.t_next;
        if t.x < t.y {
            if t.x < t.z { 0 } else { 2 }
        } else if t.y < t.z {
            1
        } else {
            2
        }
    }
}

impl Iterator for CellWalk {
    type Item = CellVisit;

    fn next(&mut self) -> Option<CellVisit> {
        while !self.done {
            let axis = self.exit_axis();
            let boundary = self.t_next[axis];
            let t_exit = boundary.min(self.t_end);
            let visit = CellVisit {
                cell: self.cell,
                t_enter: self.t,
                t_exit,
            };

            if boundary >= self.t_end || self.step[axis] == 0 {
                self.done = true;
            } else {
                self.cell[axis] += self.step[axis];
                self.t_next[axis] += self.t_delta[axis];
                if self.cell[axis] < 0 || self.cell[axis] >= self.dims[axis] {
                    self.done = true;
                }
            }
            self.t = self.t.max(t_exit);

            if visit.t_exit - visit.t_enter > SPAN_EPSILON {
                return Some(visit);
            }
        }
        None
    }
}
