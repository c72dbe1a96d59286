//! Per-sample decoding of voxel features into color and opacity.
//!
//! The renderer treats the decoder as a black box: given the feature rows at
//! the 8 corners of a voxel, the part of the ray inside that voxel, and the
//! ray direction, it returns `(rgb, alpha)`. [`mlp::MlpDecoder`] is the
//! network stored with the model; tests inject their own implementations.

pub mod mlp;

pub use mlp::{DecoderWeights, LayerWeights, MlpDecoder};

use crate::core::types::Vec3;

/// Local feature context of one ray segment.
///
/// `corners[c]` is the feature row at corner offset
/// `(c & 1, (c >> 1) & 1, (c >> 2) & 1)`. `entry` and `exit` are the segment
/// endpoints in voxel-local `[0, 1]³` coordinates and `length` is the segment
/// length in voxels.
#[derive(Clone, Copy, Debug)]
pub struct FeatureBlock<'a> {
    pub corners: [&'a [f32]; 8],
    pub entry: Vec3,
    pub exit: Vec3,
    pub length: f32,
}

impl FeatureBlock<'_> {
    /// Feature width
    pub fn dim(&self) -> usize {
        self.corners[0].len()
    }

    /// Add `scale` times the trilinear interpolation at `p` into `out`.
    pub fn accumulate_trilinear(&self, p: Vec3, scale: f32, out: &mut [f32]) {
        for (c, corner) in self.corners.iter().enumerate() {
            let wx = if c & 1 != 0 { p.x } else { 1.0 - p.x };
            let wy = if c & 2 != 0 { p.y } else { 1.0 - p.y };
            let wz = if c & 4 != 0 { p.z } else { 1.0 - p.z };
            let w = wx * wy * wz * scale;
            if w == 0.0 {
                continue;
            }
            for (o, f) in out.iter_mut().zip(corner.iter()) {
                *o += w * f;
            }
        }
    }

    /// Add the integral of the trilinear feature field along the segment
    /// into `out`.
    ///
    /// Restricted to a line, trilinear interpolation is a cubic in the
    /// segment parameter, so Simpson's rule is exact.
    pub fn integrate_into(&self, out: &mut [f32]) {
        let mid = (self.entry + self.exit) * 0.5;
        let h = self.length / 6.0;
        self.accumulate_trilinear(self.entry, h, out);
        self.accumulate_trilinear(mid, 4.0 * h, out);
        self.accumulate_trilinear(self.exit, h, out);
    }
}

/// Decoded radiance sample
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub rgb: Vec3,
    pub alpha: f32,
}

/// Turns a segment's feature context into a radiance sample.
///
/// Implementations are shared read-only across worker threads; per-thread
/// working memory lives in `Scratch`, created once per worker.
pub trait Decoder: Send + Sync {
    type Scratch: Send;

    /// Fresh working memory for one worker
    fn scratch(&self) -> Self::Scratch;

    fn decode(&self, block: &FeatureBlock<'_>, direction: Vec3, scratch: &mut Self::Scratch) -> Sample;
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZERO: [f32; 1] = [0.0];
    const ONE: [f32; 1] = [1.0];

    fn block<'a>(corners: [&'a [f32]; 8], entry: Vec3, exit: Vec3) -> FeatureBlock<'a> {
        FeatureBlock { corners, entry, exit, length: (exit - entry).length() }
    }

    #[test]
    fn test_trilinear_at_corners() {
        let mut corners: [&[f32]; 8] = [&ZERO; 8];
        corners[5] = &ONE; // (1, 0, 1)
        let b = block(corners, Vec3::ZERO, Vec3::ONE);

        let mut out = [0.0];
        b.accumulate_trilinear(Vec3::new(1.0, 0.0, 1.0), 1.0, &mut out);
        assert!((out[0] - 1.0).abs() < 1e-6);

        let mut out = [0.0];
        b.accumulate_trilinear(Vec3::new(0.0, 0.0, 1.0), 1.0, &mut out);
        assert_eq!(out[0], 0.0);
    }

    #[test]
    fn test_constant_field_integrates_to_length() {
        let b = block([&ONE; 8], Vec3::new(0.0, 0.2, 0.5), Vec3::new(1.0, 0.7, 0.5));
        let mut out = [0.0];
        b.integrate_into(&mut out);
        assert!((out[0] - b.length).abs() < 1e-5);
    }

    #[test]
    fn test_integral_of_linear_ramp() {
        // f = x; along x from 0 to 1 the integral is 1/2
        let mut corners: [&[f32]; 8] = [&ZERO; 8];
        for c in [1, 3, 5, 7] {
            corners[c] = &ONE;
        }
        let b = block(corners, Vec3::new(0.0, 0.5, 0.5), Vec3::new(1.0, 0.5, 0.5));
        let mut out = [0.0];
        b.integrate_into(&mut out);
        assert!((out[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_integral_of_cubic_term_is_exact() {
        // f = xyz along the diagonal: integral of t^3 * sqrt(3) dt = sqrt(3) / 4
        let mut corners: [&[f32]; 8] = [&ZERO; 8];
        corners[7] = &ONE;
        let b = block(corners, Vec3::ZERO, Vec3::ONE);
        let mut out = [0.0];
        b.integrate_into(&mut out);
        assert!((out[0] - 3f32.sqrt() / 4.0).abs() < 1e-5);
    }
}
