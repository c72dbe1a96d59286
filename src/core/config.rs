//! Renderer configuration.
//!
//! The command-line layer fills a [`RenderConfig`] (directly or from a JSON
//! file); everything below it only sees validated plain parameters.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;
use crate::scene::grid::GridParams;

/// Where the per-pixel stages run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Device {
    /// The global rayon pool
    #[default]
    Cpu,
    /// A dedicated pool with a fixed number of threads
    CpuThreads(usize),
}

impl Device {
    /// Parse `"cpu"` or `"cpu:<threads>"`. An empty string means `"cpu"`.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("cpu") {
            return Ok(Device::Cpu);
        }
        if let Some(threads) = s.strip_prefix("cpu:") {
            return match threads.parse::<usize>() {
                Ok(n) if n > 0 => Ok(Device::CpuThreads(n)),
                _ => Err(ConfigError::Device(s.to_string())),
            };
        }
        Err(ConfigError::Device(s.to_string()))
    }

    /// Build the thread pool for this device, if it needs its own.
    pub fn thread_pool(&self) -> crate::core::Result<Option<rayon::ThreadPool>> {
        match *self {
            Device::Cpu => Ok(None),
            Device::CpuThreads(n) => rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .thread_name(|i| format!("neuvox-worker-{i}"))
                .build()
                .map(Some)
                .map_err(|e| crate::core::Error::ThreadPool(e.to_string())),
        }
    }
}

/// Full renderer configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Path to the compressed model file
    pub weight_path: PathBuf,
    /// Voxels per grid axis
    pub voxel_num: u32,
    /// Feature vector width
    pub voxel_dim: u32,
    /// World-space edge length of the grid
    pub grid_size: f32,
    /// Compute device, `"cpu"` or `"cpu:<threads>"`
    pub device: String,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Maximum decoded voxels per pixel per frame
    pub max_hits: u32,
    /// Color composited behind the accumulated radiance
    pub background: [f32; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            weight_path: PathBuf::from("model.nvx"),
            voxel_num: 256,
            voxel_dim: 32,
            grid_size: 2.8,
            device: "cpu".to_string(),
            width: 800,
            height: 800,
            max_hits: 64,
            background: [1.0, 1.0, 1.0],
        }
    }
}

impl RenderConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    /// Parse a JSON config string. Missing fields take their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check every parameter the renderer depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid_params()?;
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Resolution { width: self.width, height: self.height });
        }
        if self.max_hits == 0 {
            return Err(ConfigError::MaxHits);
        }
        self.device()?;
        Ok(())
    }

    /// Validated grid parameters
    pub fn grid_params(&self) -> Result<GridParams, ConfigError> {
        GridParams::new(self.voxel_num, self.voxel_dim, self.grid_size)
    }

    /// Parsed device
    pub fn device(&self) -> Result<Device, ConfigError> {
        Device::parse(&self.device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RenderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.voxel_num, 256);
        assert_eq!(config.voxel_dim, 32);
        assert_eq!(config.background, [1.0; 3]);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = RenderConfig::from_json_str(r#"{ "voxel_num": 128, "width": 320 }"#).unwrap();
        assert_eq!(config.voxel_num, 128);
        assert_eq!(config.width, 320);
        assert_eq!(config.height, 800);
        assert_eq!(config.device, "cpu");
    }

    #[test]
    fn test_invalid_json() {
        let err = RenderConfig::from_json_str("{ voxel_num: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_rejects_bad_grid() {
        let config = RenderConfig { voxel_num: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::VoxelNum)));

        let config = RenderConfig { voxel_num: u32::MAX, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::VoxelNumTooLarge { .. })));

        let config = RenderConfig { grid_size: -1.0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::GridSize(_))));

        let config = RenderConfig { grid_size: f32::NAN, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::GridSize(_))));
    }

    #[test]
    fn test_rejects_bad_frame_params() {
        let config = RenderConfig { width: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Resolution { .. })));

        let config = RenderConfig { max_hits: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::MaxHits)));
    }

    #[test]
    fn test_device_parse() {
        assert_eq!(Device::parse("").unwrap(), Device::Cpu);
        assert_eq!(Device::parse("CPU").unwrap(), Device::Cpu);
        assert_eq!(Device::parse("cpu:4").unwrap(), Device::CpuThreads(4));
        assert!(Device::parse("cpu:0").is_err());
        assert!(Device::parse("cuda:0").is_err());
    }

    #[test]
    fn test_dedicated_pool() {
        let pool = Device::CpuThreads(2).thread_pool().unwrap().unwrap();
        assert_eq!(pool.current_num_threads(), 2);
        assert!(Device::Cpu.thread_pool().unwrap().is_none());
    }
}
