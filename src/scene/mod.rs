//! Scene data: grid geometry, per-vertex features, and the model file.

pub mod grid;
pub mod features;
pub mod disk_io;
pub mod store;

pub use grid::{GridParams, VoxelGrid, MAX_VOXEL_NUM};
pub use features::{FeatureTable, VertexFeatureIndex, NO_FEATURE};
pub use disk_io::ModelData;
pub use store::{Scene, SceneHandle, SceneStore};
