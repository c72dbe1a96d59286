//! Decode stage: evaluates pending hits and blends them front to back.

use rayon::prelude::*;

use crate::core::types::{Vec3, Vec4};
use crate::decoder::{Decoder, FeatureBlock, Sample};
use crate::scene::Scene;
use super::buffer::{FrameBuffers, Hit, RayPhase};

/// Accumulated opacity at which a pixel stops marching
pub const SATURATION_ALPHA: f32 = 0.999;

/// Clamp a decoded opacity into `[0, 1]`; NaN counts as transparent.
pub fn sanitize_alpha(alpha: f32) -> f32 {
    if alpha.is_nan() { 0.0 } else { alpha.clamp(0.0, 1.0) }
}

/// Blend one sample behind what a pixel has accumulated so far.
pub fn blend_front_to_back(acc: Vec4, sample: Sample) -> Vec4 {
    let alpha = sanitize_alpha(sample.alpha);
    let rgb = if sample.rgb.is_finite() { sample.rgb } else { Vec3::ZERO };
    let transmittance = 1.0 - acc.w;
    let color = acc.truncate() + transmittance * alpha * rgb;
    color.extend(acc.w + transmittance * alpha)
}

/// Runs the injected decoder on every pending hit.
pub struct SampleDecoder;

impl SampleDecoder {
    /// Decode and composite all `Pending` pixels. Returns the number of
    /// decoder calls made.
    pub fn run<D: Decoder>(buffers: &mut FrameBuffers, scene: &Scene, decoder: &D, origin: Vec3) -> usize {
        let FrameBuffers { directions, phases, rgba, hit_count, .. } = buffers;

        (phases, rgba, hit_count, &*directions)
            .into_par_iter()
            .map_init(
                || decoder.scratch(),
                |scratch, (phase, rgba, hits, direction)| {
                    let RayPhase::Pending { hit, rest } = *phase else {
                        return 0usize;
                    };
                    let sample = decoder.decode(&Self::feature_block(scene, origin, *direction, &hit), *direction, scratch);
                    *rgba = blend_front_to_back(*rgba, sample);
                    *hits += 1;
                    *phase = if rgba.w >= SATURATION_ALPHA {
                        RayPhase::Finished
                    } else {
                        RayPhase::Marching(rest)
                    };
                    1
                },
            )
            .sum::<usize>()
    }

    /// Corner features and voxel-local endpoints of a hit
    pub fn feature_block<'a>(scene: &'a Scene, origin: Vec3, direction: Vec3, hit: &Hit) -> FeatureBlock<'a> {
        let base = hit.voxel.as_vec3();
        let local = |t: f32| (origin + direction * t - base).clamp(Vec3::ZERO, Vec3::ONE);
        FeatureBlock {
            corners: scene.index().corner_rows(scene.features(), hit.voxel),
            entry: local(hit.span.entry),
            exit: local(hit.span.exit),
            length: hit.span.length(),
        }
    }
}
