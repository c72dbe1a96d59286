//! First stage of a frame: camera rays against the occupancy hierarchy.

use rayon::prelude::*;

use crate::core::camera::CameraView;
use crate::core::types::{Vec3, Vec4};
use crate::math::Ray;
use crate::scene::Scene;
use super::buffer::{FrameBuffers, PinholeCamera, RayPhase, Span};

/// Initializes every pixel's ray state for a new frame.
pub struct AabbIntersector;

impl AabbIntersector {
    /// Generate the pixel rays and narrow each to the part of the grid that
    /// starts at its first occupied voxel. Rays that miss the grid or see
    /// no occupied voxel are finished with zero color and opacity.
    pub fn run(buffers: &mut FrameBuffers, scene: &Scene, view: &CameraView) {
        let pinhole = PinholeCamera::new(buffers.width(), buffers.height());
        let width = buffers.width().max(1) as usize;
        let bounds = scene.grid().local_bounds();
        let mask = scene.mask();
        let octree = scene.octree();

        let FrameBuffers { directions, phases, rgba, hit_count, .. } = buffers;

        (directions, phases, rgba, hit_count)
            .into_par_iter()
            .enumerate()
            .for_each(|(id, (direction, phase, rgba, hits))| {
                let (px, py) = ((id % width) as u32, (id / width) as u32);
                *direction = pinhole.direction(view, px, py);
                *rgba = Vec4::ZERO;
                *hits = 0;

                let ray = Ray::new(view.center, *direction);
                *phase = match ray.intersects_aabb(&bounds) {
                    Some((t_near, t_far)) if *direction != Vec3::ZERO => {
                        match octree.first_occupied(mask, &ray, t_near, t_far) {
                            Some(visit) => RayPhase::Marching(Span::new(visit.t_enter, t_far)),
                            None => RayPhase::Finished,
                        }
                    }
                    _ => RayPhase::Finished,
                };
            });
    }
}
