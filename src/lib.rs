//! neuvox - real-time renderer for sparse neural voxel scenes

pub mod core;
pub mod math;
pub mod mask;
pub mod scene;
pub mod decoder;
pub mod render;
