//! Mouse-driven orbit camera controller

use crate::core::camera::OrbitCamera;
use crate::core::input::{CameraInput, DragButton};

/// Which drag delta source is honored
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DragMode {
    #[default]
    Idle,
    Rotating,
    Panning,
}

/// Maps drag and scroll events onto an [`OrbitCamera`].
///
/// Both buttons can be held at once; rotation then takes precedence and the
/// pan delta is dropped for that update.
pub struct OrbitController {
    /// Radians per pixel of horizontal/vertical drag
    pub rotate_speed: f32,
    /// Voxels per pixel of drag
    pub pan_speed: f32,
    /// Radius change per scroll notch
    pub zoom_speed: f32,
    rotating: bool,
    panning: bool,
}

impl OrbitController {
    /// Create new controller
    pub fn new(rotate_speed: f32, pan_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            pan_speed,
            zoom_speed,
            rotating: false,
            panning: false,
        }
    }

    /// Current drag mode
    pub fn mode(&self) -> DragMode {
        if self.rotating {
            DragMode::Rotating
        } else if self.panning {
            DragMode::Panning
        } else {
            DragMode::Idle
        }
    }

    /// Apply one input event to the camera
    pub fn handle(&mut self, camera: &mut OrbitCamera, input: CameraInput) {
        match input {
            CameraInput::DragStart(DragButton::Rotate) => self.rotating = true,
            CameraInput::DragStart(DragButton::Pan) => self.panning = true,
            CameraInput::DragEnd(DragButton::Rotate) => self.rotating = false,
            CameraInput::DragEnd(DragButton::Pan) => self.panning = false,
            CameraInput::Drag { dx, dy } => match self.mode() {
                DragMode::Rotating => {
                    camera.rotate(dx * self.rotate_speed, dy * self.rotate_speed);
                }
                DragMode::Panning => {
                    camera.pan(dx * self.pan_speed, dy * self.pan_speed);
                }
                DragMode::Idle => {}
            },
            CameraInput::Scroll { delta } => {
                if delta < 0.0 {
                    camera.zoom(self.zoom_speed);
                } else if delta > 0.0 {
                    camera.zoom(-self.zoom_speed);
                }
            }
        }
    }
}

impl Default for OrbitController {
    fn default() -> Self {
        // One degree per pixel
        Self::new(0.017453292519444, 0.5, 10.0)
    }
}
