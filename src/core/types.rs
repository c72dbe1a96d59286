//! Core type aliases and re-exports

pub use glam::{
    Vec3, Vec4,
    Mat3,
    IVec3, UVec3,
};

/// Standard Result type for the renderer
pub type Result<T> = std::result::Result<T, crate::core::error::Error>;
