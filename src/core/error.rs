//! Error types for the renderer

use thiserror::Error;

/// Failure to load a model file into a scene.
///
/// Always fatal at startup: a scene is either fully built or not built at all.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed model file: {0}")]
    Malformed(String),

    #[error("model was built for {file} voxels per axis, configured for {configured}")]
    GridMismatch { file: u32, configured: u32 },

    #[error("model feature width {file} does not match configured voxel_dim {configured}")]
    FeatureWidthMismatch { file: u32, configured: u32 },

    #[error("{indices} vertex indices but {rows} feature rows")]
    CountMismatch { indices: usize, rows: usize },

    #[error("vertex index {index} decodes outside a grid of {voxel_num} voxels")]
    VertexOutOfRange { index: u64, voxel_num: u32 },

    #[error("vertex ({i}, {j}, {k}) listed more than once")]
    DuplicateVertex { i: u32, j: u32, k: u32 },

    #[error("occupancy entry {entry} does not name a vertex (only {vertices} vertices)")]
    OccupancyOutOfRange { entry: u32, vertices: usize },

    #[error("occupied vertex ({i}, {j}, {k}) is not the corner of a voxel in a grid of {voxel_num}")]
    OccupiedOutsideGrid { i: u32, j: u32, k: u32, voxel_num: u32 },

    #[error("decoder weights: {0}")]
    Decoder(String),
}

/// Inconsistent renderer configuration, rejected before anything is loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("voxel_num must be positive")]
    VoxelNum,

    #[error("voxel_num {voxel_num} exceeds the largest supported grid of {max}")]
    VoxelNumTooLarge { voxel_num: u32, max: u32 },

    #[error("voxel_dim must be positive")]
    VoxelDim,

    #[error("grid_size must be a positive finite number, got {0}")]
    GridSize(f32),

    #[error("image resolution must be non-zero, got {width}x{height}")]
    Resolution { width: u32, height: u32 },

    #[error("max_hits must be at least 1")]
    MaxHits,

    #[error("unsupported device '{0}' (expected \"cpu\" or \"cpu:<threads>\")")]
    Device(String),

    #[error("failed to read config: {0}")]
    Parse(String),
}

/// Main error type for the renderer
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Display error: {0}")]
    Display(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}
