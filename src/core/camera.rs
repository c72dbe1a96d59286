//! Orbit camera for viewing the voxel grid

use crate::core::types::{Mat3, Vec3};
use crate::scene::grid::VoxelGrid;

/// Smallest allowed distance between the camera and its pivot
pub const MIN_RADIUS: f32 = 1e-3;

/// Camera pose consumed by the renderer.
///
/// `rotation` columns are the camera's right, up and backward axes in
/// grid-local space; the camera looks along `-rotation.z_axis`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraView {
    /// Camera center in grid-local coordinates
    pub center: Vec3,
    /// Orthonormal camera basis
    pub rotation: Mat3,
}

impl CameraView {
    pub fn right(&self) -> Vec3 {
        self.rotation.x_axis
    }

    pub fn up(&self) -> Vec3 {
        self.rotation.y_axis
    }

    /// Viewing direction (from the camera towards the pivot)
    pub fn forward(&self) -> Vec3 {
        -self.rotation.z_axis
    }
}

/// Camera orbiting a pivot point at a given radius.
///
/// Azimuth rotates about the grid's +Z axis, elevation tilts about the
/// camera's right axis. The rotation matrix and center are derived from
/// `(pivot, azimuth, elevation, radius)` after every mutation and never set
/// independently.
#[derive(Clone, Debug)]
pub struct OrbitCamera {
    pivot: Vec3,
    azimuth: f32,
    elevation: f32,
    radius: f32,
    rotation: Mat3,
    center: Vec3,
}

impl OrbitCamera {
    /// Create a camera. Angles are in degrees, `pivot` and `radius` in
    /// grid-local (voxel) units.
    pub fn new(pivot: Vec3, azimuth_degrees: f32, elevation_degrees: f32, radius: f32) -> Self {
        let mut camera = Self {
            pivot,
            azimuth: azimuth_degrees.to_radians(),
            elevation: elevation_degrees.to_radians(),
            radius: radius.max(MIN_RADIUS),
            rotation: Mat3::IDENTITY,
            center: Vec3::ZERO,
        };
        camera.update_rotation();
        camera.update_center();
        camera
    }

    /// Default framing for a grid: orbit the grid center from two grid
    /// widths away, looking down at 60 degrees.
    pub fn framing(grid: &VoxelGrid) -> Self {
        let n = grid.voxel_num() as f32;
        Self::new(Vec3::splat(n * 0.5), 0.0, -60.0, n * 2.0)
    }

    /// Rotate by angle deltas in radians.
    pub fn rotate(&mut self, d_azimuth: f32, d_elevation: f32) {
        self.azimuth -= d_azimuth;
        self.elevation += d_elevation;
        self.update_rotation();
        self.update_center();
    }

    /// Move the pivot in the camera plane.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let right = self.rotation.x_axis;
        let up = self.rotation.y_axis;
        self.pivot += right * dx - up * dy;
        self.update_center();
    }

    /// Change the orbit radius. The radius never drops below [`MIN_RADIUS`].
    pub fn zoom(&mut self, delta: f32) {
        self.radius = (self.radius + delta).max(MIN_RADIUS);
        self.update_center();
    }

    /// Current pose
    pub fn view(&self) -> CameraView {
        CameraView {
            center: self.center,
            rotation: self.rotation,
        }
    }

    pub fn pivot(&self) -> Vec3 {
        self.pivot
    }

    /// Azimuth in radians
    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    /// Elevation in radians
    pub fn elevation(&self) -> f32 {
        self.elevation
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    // R = Rz(azimuth) * Rx(elevation)
    fn update_rotation(&mut self) {
        let (sp, cp) = self.azimuth.sin_cos();
        let (st, ct) = self.elevation.sin_cos();
        self.rotation = Mat3::from_cols(
            Vec3::new(cp, sp, 0.0),
            Vec3::new(-sp * ct, ct * cp, st),
            Vec3::new(sp * st, -st * cp, ct),
        );
    }

    fn update_center(&mut self) {
        self.center = self.pivot + self.rotation.z_axis * self.radius;
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 0.0, 60.0, 400.0)
    }
}
