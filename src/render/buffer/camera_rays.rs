//! Pinhole ray generation

use crate::core::camera::CameraView;
use crate::core::types::Vec3;

/// Focal length as a fraction of the image width
pub const FOCAL_SCALE: f32 = 0.7;

/// Fixed pinhole projection for one resolution
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinholeCamera {
    width: u32,
    height: u32,
    focal: f32,
}

impl PinholeCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            focal: FOCAL_SCALE * width as f32,
        }
    }

    pub fn focal(&self) -> f32 {
        self.focal
    }

    /// Unit direction through the centre of pixel `(px, py)`, row 0 at the top
    pub fn direction(&self, view: &CameraView, px: u32, py: u32) -> Vec3 {
        let x = (px as f32 + 0.5 - self.width as f32 * 0.5) / self.focal;
        let y = (self.height as f32 * 0.5 - py as f32 - 0.5) / self.focal;
        (view.rotation * Vec3::new(x, y, -1.0)).normalize_or_zero()
    }
}
