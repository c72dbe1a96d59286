//! Advances marching rays to their next occupied voxel.

use rayon::prelude::*;

use crate::core::types::Vec3;
use crate::math::Ray;
use crate::scene::Scene;
use super::buffer::{FrameBuffers, Hit, RayPhase, Span};

/// Moves each `Marching` ray forward by exactly one occupied voxel.
pub struct RayMarcher;

impl RayMarcher {
    /// Advance every marching ray. Empty voxels are skipped through the
    /// occupancy hierarchy without decoding; a ray that reaches the end of
    /// its span, or has already decoded `max_hits` spans, is finished.
    ///
    /// Returns the number of rays left unfinished.
    pub fn run(buffers: &mut FrameBuffers, scene: &Scene, origin: Vec3, max_hits: u32) -> usize {
        let FrameBuffers { directions, phases, hit_count, .. } = buffers;

        (phases, &*directions, &*hit_count)
            .into_par_iter()
            .map(|(phase, direction, hits)| {
                if let RayPhase::Marching(span) = *phase {
                    *phase = if *hits >= max_hits {
                        RayPhase::Finished
                    } else {
                        Self::advance(scene, &Ray::new(origin, *direction), span)
                    };
                }
                usize::from(!phase.is_finished())
            })
            .sum::<usize>()
    }

    /// Next phase of one marching ray
    pub fn advance(scene: &Scene, ray: &Ray, span: Span) -> RayPhase {
        if span.is_empty() {
            return RayPhase::Finished;
        }
        match scene.octree().first_occupied(scene.mask(), ray, span.entry, span.exit) {
            // The walk never yields a visit that ends before it starts, so
            // `rest` always begins strictly after `span.entry`.
            Some(visit) if visit.t_exit > span.entry => RayPhase::Pending {
                hit: Hit {
                    voxel: visit.cell,
                    span: Span::new(visit.t_enter, visit.t_exit),
                },
                rest: Span::new(visit.t_exit, span.exit),
            },
            _ => RayPhase::Finished,
        }
    }
}
