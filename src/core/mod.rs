//! Core types, configuration, and camera control

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod time;
pub mod camera;
pub mod input;
pub mod camera_controller;

pub use types::*;
pub use error::{Error, LoadError, ConfigError};
