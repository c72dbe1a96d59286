//! Per-pixel frame state, stored as parallel arrays indexed by pixel id.

pub mod ray_state;
pub mod camera_rays;

pub use ray_state::{Hit, RayPhase, Span};
pub use camera_rays::{PinholeCamera, FOCAL_SCALE};

use crate::core::types::{Vec3, Vec4};

/// Structure-of-arrays ray state for one frame.
///
/// Pixel `id = py * width + px`. Every array has `width * height` entries.
/// The intersect stage overwrites all of them at the start of a frame, so
/// the allocation is reused as long as the resolution is unchanged.
#[derive(Clone, Debug)]
pub struct FrameBuffers {
    width: u32,
    height: u32,
    /// Unit ray direction per pixel, grid-local
    pub directions: Vec<Vec3>,
    pub phases: Vec<RayPhase>,
    /// Accumulated premultiplied color in xyz, opacity in w
    pub rgba: Vec<Vec4>,
    /// Spans decoded so far this frame
    pub hit_count: Vec<u32>,
}

impl FrameBuffers {
    pub fn new(width: u32, height: u32) -> Self {
        let n = width as usize * height as usize;
        Self {
            width,
            height,
            directions: vec![Vec3::ZERO; n],
            phases: vec![RayPhase::Finished; n],
            rgba: vec![Vec4::ZERO; n],
            hit_count: vec![0; n],
        }
    }

    /// Change the resolution, reallocating only when it differs.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        log::debug!("Resizing frame buffers {}x{} -> {}x{}", self.width, self.height, width, height);
        *self = Self::new(width, height);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.phases.len()
    }

    pub fn active_count(&self) -> usize {
        self.phases.iter().filter(|p| !p.is_finished()).count()
    }

    pub fn all_finished(&self) -> bool {
        self.phases.iter().all(RayPhase::is_finished)
    }

    /// Finish every remaining ray, keeping what it has accumulated.
    pub fn finish_all(&mut self) {
        for phase in &mut self.phases {
            *phase = RayPhase::Finished;
        }
    }
}
