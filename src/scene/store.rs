//! Scene loading: turns a model file into the read-only structures the
//! renderer samples every frame.

use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

use crate::core::error::LoadError;
use crate::decoder::{DecoderWeights, MlpDecoder};
use crate::mask::{OccupancyMask, OccupancyOctree, OctreeBuilder};
use super::disk_io::{self, ModelData};
use super::features::{FeatureTable, VertexFeatureIndex};
use super::grid::{GridParams, VoxelGrid};

/// Everything needed to render a model, immutable once built
#[derive(Debug)]
pub struct Scene {
    grid: VoxelGrid,
    mask: OccupancyMask,
    octree: OccupancyOctree,
    features: FeatureTable,
    index: VertexFeatureIndex,
    decoder_weights: DecoderWeights,
}

impl Scene {
    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    pub fn mask(&self) -> &OccupancyMask {
        &self.mask
    }

    pub fn octree(&self) -> &OccupancyOctree {
        &self.octree
    }

    pub fn features(&self) -> &FeatureTable {
        &self.features
    }

    pub fn index(&self) -> &VertexFeatureIndex {
        &self.index
    }

    /// Reference decoder over the stored weights
    pub fn mlp_decoder(&self) -> Result<MlpDecoder, LoadError> {
        MlpDecoder::new(self.decoder_weights.clone(), self.grid.voxel_dim())
    }
}

/// Shared handle to a loaded scene. Cloning shares the same data.
#[derive(Clone, Debug)]
pub struct SceneHandle(Arc<Scene>);

impl Deref for SceneHandle {
    type Target = Scene;

    fn deref(&self) -> &Scene {
        &self.0
    }
}

/// Builds [`SceneHandle`]s from model files
pub struct SceneStore;

impl SceneStore {
    /// Read and validate a model file.
    pub fn load(path: &Path, params: GridParams) -> Result<SceneHandle, LoadError> {
        log::info!("Loading model from {}", path.display());
        let model = disk_io::read_model(path)?;
        Self::from_model(model, params)
    }

    /// Async variant of [`SceneStore::load`]
    pub async fn load_async(path: &Path, params: GridParams) -> Result<SceneHandle, LoadError> {
        log::info!("Loading model from {}", path.display());
        let model = disk_io::load_model(path).await?;
        Self::from_model(model, params)
    }

    /// Validate decoded model contents against the grid parameters and
    /// build the scene.
    pub fn from_model(model: ModelData, params: GridParams) -> Result<SceneHandle, LoadError> {
        if model.voxel_num != params.voxel_num() {
            return Err(LoadError::GridMismatch {
                file: model.voxel_num,
                configured: params.voxel_num(),
            });
        }
        if model.voxel_dim != params.voxel_dim() {
            return Err(LoadError::FeatureWidthMismatch {
                file: model.voxel_dim,
                configured: params.voxel_dim(),
            });
        }

        let grid = VoxelGrid::new(params);
        let features = FeatureTable::from_packed(params.voxel_dim() as usize, &model.features)?;
        if features.len() != model.vertex_indices.len() {
            return Err(LoadError::CountMismatch {
                indices: model.vertex_indices.len(),
                rows: features.len(),
            });
        }

        let index = Self::build_index(&grid, &model.vertex_indices)?;
        let mask = Self::build_mask(&grid, &model.vertex_indices, &model.occupied)?;
        model.decoder.validate(params.voxel_dim())?;

        let octree = OctreeBuilder::default().build(&mask);

        log::info!(
            "Scene ready: {}^3 voxels, {} occupied, {} feature vertices (dim {}), {} decoder layers",
            grid.voxel_num(),
            mask.occupied_count(),
            features.len(),
            features.dim(),
            model.decoder.layers.len()
        );

        Ok(SceneHandle(Arc::new(Scene {
            grid,
            mask,
            octree,
            features,
            index,
            decoder_weights: model.decoder,
        })))
    }

    fn build_index(grid: &VoxelGrid, vertex_indices: &[u64]) -> Result<VertexFeatureIndex, LoadError> {
        let mut index = VertexFeatureIndex::new(grid.voxel_num());
        for (row, &flat) in vertex_indices.iter().enumerate() {
            let v = grid.unflatten_vertex(flat).ok_or(LoadError::VertexOutOfRange {
                index: flat,
                voxel_num: grid.voxel_num(),
            })?;
            if index.insert(v, row as u32).is_some() {
                return Err(LoadError::DuplicateVertex { i: v.x, j: v.y, k: v.z });
            }
        }
        Ok(index)
    }

    fn build_mask(grid: &VoxelGrid, vertex_indices: &[u64], occupied: &[u32]) -> Result<OccupancyMask, LoadError> {
        let mut mask = OccupancyMask::new(grid.voxel_num());
        for &entry in occupied {
            let flat = vertex_indices.get(entry as usize).ok_or(LoadError::OccupancyOutOfRange {
                entry,
                vertices: vertex_indices.len(),
            })?;
            // Already range-checked by build_index
            let v = grid.unflatten_vertex(*flat).ok_or(LoadError::VertexOutOfRange {
                index: *flat,
                voxel_num: grid.voxel_num(),
            })?;
            if !mask.set(v) {
                return Err(LoadError::OccupiedOutsideGrid {
                    i: v.x,
                    j: v.y,
                    k: v.z,
                    voxel_num: grid.voxel_num(),
                });
            }
        }
        Ok(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{IVec3, UVec3};
    use crate::decoder::DecoderWeights;
    use crate::scene::disk_io::create_test_sphere;
    use tempfile::tempdir;

    fn params(voxel_num: u32, voxel_dim: u32) -> GridParams {
        GridParams::new(voxel_num, voxel_dim, 2.0).unwrap()
    }

    /// Two-voxel grid with one occupied corner voxel and features at its 8 corners
    fn corner_model() -> ModelData {
        let grid = VoxelGrid::new(params(2, 1));
        let mut vertex_indices = Vec::new();
        for c in 0..8u32 {
            vertex_indices.push(grid.flatten_vertex(UVec3::new(c & 1, (c >> 1) & 1, (c >> 2) & 1)));
        }
        ModelData {
            voxel_num: 2,
            voxel_dim: 1,
            vertex_indices,
            occupied: vec![0],
            features: (0..8).map(|c| c as f32).collect(),
            decoder: DecoderWeights::color_passthrough(1),
        }
    }

    #[test]
    fn test_from_model() {
        let scene = SceneStore::from_model(corner_model(), params(2, 1)).unwrap();
        assert_eq!(scene.mask().occupied_count(), 1);
        assert!(scene.mask().is_occupied(IVec3::ZERO));
        assert!(scene.octree().levels().iter().all(|l| l.dim == 1));
        assert_eq!(scene.index().populated(), 8);
        assert_eq!(scene.features().row(scene.index().get(IVec3::new(1, 1, 1)).unwrap()), &[7.0]);
        assert!(scene.mlp_decoder().is_ok());
    }

    #[test]
    fn test_handle_clone_shares_scene() {
        let scene = SceneStore::from_model(corner_model(), params(2, 1)).unwrap();
        let other = scene.clone();
        assert!(std::ptr::eq(scene.mask(), other.mask()));
    }

    #[test]
    fn test_parameter_mismatch() {
        assert!(matches!(
            SceneStore::from_model(corner_model(), params(4, 1)),
            Err(LoadError::GridMismatch { file: 2, configured: 4 })
        ));
        assert!(matches!(
            SceneStore::from_model(corner_model(), params(2, 3)),
            Err(LoadError::FeatureWidthMismatch { file: 1, configured: 3 })
        ));
    }

    #[test]
    fn test_count_mismatch() {
        let mut model = corner_model();
        model.features.pop();
        assert!(matches!(
            SceneStore::from_model(model, params(2, 1)),
            Err(LoadError::CountMismatch { indices: 8, rows: 7 })
        ));
    }

    #[test]
    fn test_vertex_out_of_range() {
        let mut model = corner_model();
        model.vertex_indices[3] = 27;
        assert!(matches!(
            SceneStore::from_model(model, params(2, 1)),
            Err(LoadError::VertexOutOfRange { index: 27, .. })
        ));
    }

    #[test]
    fn test_duplicate_vertex() {
        let mut model = corner_model();
        model.vertex_indices[3] = model.vertex_indices[2];
        assert!(matches!(
            SceneStore::from_model(model, params(2, 1)),
            Err(LoadError::DuplicateVertex { .. })
        ));
    }

    #[test]
    fn test_bad_occupancy() {
        let mut model = corner_model();
        model.occupied.push(8);
        assert!(matches!(
            SceneStore::from_model(model, params(2, 1)),
            Err(LoadError::OccupancyOutOfRange { entry: 8, vertices: 8 })
        ));

        // Vertex (2, 2, 2) is on the far boundary and starts no voxel
        let mut model = corner_model();
        let grid = VoxelGrid::new(params(2, 1));
        model.vertex_indices.push(grid.flatten_vertex(UVec3::splat(2)));
        model.features.push(0.0);
        model.occupied.push(8);
        assert!(matches!(
            SceneStore::from_model(model, params(2, 1)),
            Err(LoadError::OccupiedOutsideGrid { i: 2, j: 2, k: 2, voxel_num: 2 })
        ));
    }

    #[test]
    fn test_bad_decoder() {
        let mut model = corner_model();
        model.decoder = DecoderWeights::default();
        assert!(matches!(SceneStore::from_model(model, params(2, 1)), Err(LoadError::Decoder(_))));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sphere.nvx");
        disk_io::write_model(&path, &create_test_sphere(16, 4, 5.0)).unwrap();

        let scene = SceneStore::load(&path, params(16, 4)).unwrap();
        assert!(scene.mask().occupied_count() > 0);
        assert_eq!(scene.grid().voxel_num(), 16);

        std::fs::write(&path, [16u8, 0, 0, 0, 1, 2, 3]).unwrap();
        assert!(SceneStore::load(&path, params(16, 4)).is_err());
    }

    #[tokio::test]
    async fn test_load_async() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sphere.nvx");
        disk_io::save_model(&path, &create_test_sphere(8, 4, 3.0)).await.unwrap();
        let scene = SceneStore::load_async(&path, params(8, 4)).await.unwrap();
        assert_eq!(scene.mask().occupied_count(), create_test_sphere(8, 4, 3.0).occupied.len());
    }
}
