//! Model serialization and disk I/O

use crate::core::error::LoadError;
use crate::decoder::DecoderWeights;
use crate::scene::features::NO_FEATURE;
use rkyv::{Archive, Deserialize, Serialize};
use std::path::Path;

/// Density written to the vertices of [`create_test_sphere`]
const SPHERE_DENSITY: f32 = 4.0;

/// Serializable model contents.
///
/// `vertex_indices[r]` is the flattened lattice vertex whose features are
/// row `r` of `features` (`voxel_dim` floats per row, tightly packed).
/// `occupied` lists positions into `vertex_indices`; each names the
/// minimum corner of an occupied voxel.
#[derive(Debug, Clone, PartialEq, Archive, Deserialize, Serialize)]
pub struct ModelData {
    pub voxel_num: u32,
    pub voxel_dim: u32,
    pub vertex_indices: Vec<u64>,
    pub occupied: Vec<u32>,
    pub features: Vec<f32>,
    pub decoder: DecoderWeights,
}

/// Serialize a model to bytes (uncompressed)
pub fn serialize_model(model: &ModelData) -> Result<Vec<u8>, LoadError> {
    let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(model)
        .map_err(|e| LoadError::Malformed(format!("serialization failed: {}", e)))?;
    Ok(bytes.to_vec())
}

/// Deserialize a model from bytes (uncompressed)
pub fn deserialize_model(data: &[u8]) -> Result<ModelData, LoadError> {
    let archived = rkyv::access::<ArchivedModelData, rkyv::rancor::Error>(data)
        .map_err(|e| LoadError::Malformed(e.to_string()))?;

    rkyv::deserialize::<ModelData, rkyv::rancor::Error>(archived)
        .map_err(|e| LoadError::Malformed(e.to_string()))
}

/// Serialize and compress a model using LZ4
pub fn compress_model(model: &ModelData) -> Result<Vec<u8>, LoadError> {
    let serialized = serialize_model(model)?;
    Ok(lz4_flex::compress_prepend_size(&serialized))
}

/// Decompress and deserialize a model
pub fn decompress_model(data: &[u8]) -> Result<ModelData, LoadError> {
    let decompressed = lz4_flex::decompress_size_prepended(data)
        .map_err(|e| LoadError::Malformed(format!("LZ4 decompression failed: {}", e)))?;
    deserialize_model(&decompressed)
}

/// Write a compressed model file
pub fn write_model(path: &Path, model: &ModelData) -> Result<(), LoadError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, compress_model(model)?)?;
    Ok(())
}

/// Read a compressed model file
pub fn read_model(path: &Path) -> Result<ModelData, LoadError> {
    let compressed = std::fs::read(path)?;
    decompress_model(&compressed)
}

/// Save a model to disk (compressed)
pub async fn save_model(path: &Path, model: &ModelData) -> Result<(), LoadError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let compressed = compress_model(model)?;
    tokio::fs::write(path, compressed).await?;

    Ok(())
}

/// Load a model from disk
pub async fn load_model(path: &Path) -> Result<ModelData, LoadError> {
    let compressed = tokio::fs::read(path).await?;
    decompress_model(&compressed)
}

/// Build a synthetic solid sphere centred in the grid.
///
/// Every voxel whose centre lies within `radius` voxels of the grid centre
/// is occupied. Its corners carry a constant density in channel 0 and a
/// color ramp over the grid in channels 1..=3; the decoder maps those
/// channels straight to color.
pub fn create_test_sphere(voxel_num: u32, voxel_dim: u32, radius: f32) -> ModelData {
    let n = voxel_num as usize;
    let n1 = n + 1;
    let center = voxel_num as f32 * 0.5;
    let flatten = |i: usize, j: usize, k: usize| (i * n1 + j) * n1 + k;

    let mut occupied_voxels = Vec::new();
    let mut needed = vec![false; n1 * n1 * n1];
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                let dx = i as f32 + 0.5 - center;
                let dy = j as f32 + 0.5 - center;
                let dz = k as f32 + 0.5 - center;
                if dx * dx + dy * dy + dz * dz > radius * radius {
                    continue;
                }
                occupied_voxels.push((i, j, k));
                for c in 0..8 {
                    needed[flatten(i + (c & 1), j + ((c >> 1) & 1), k + ((c >> 2) & 1))] = true;
                }
            }
        }
    }

    let dim = voxel_dim as usize;
    let scale = voxel_num.max(1) as f32;
    let mut positions = vec![NO_FEATURE; needed.len()];
    let mut vertex_indices = Vec::new();
    let mut features = Vec::new();
    for (idx, _) in needed.iter().enumerate().filter(|(_, n)| **n) {
        positions[idx] = vertex_indices.len() as u32;
        vertex_indices.push(idx as u64);

        let i = idx / (n1 * n1);
        let j = (idx / n1) % n1;
        let k = idx % n1;
        let ramp = [i as f32 / scale, j as f32 / scale, k as f32 / scale];
        let mut row = vec![0.0; dim];
        if let Some(density) = row.first_mut() {
            *density = SPHERE_DENSITY;
        }
        for (slot, t) in row.iter_mut().skip(1).zip(ramp) {
            *slot = 4.0 * t - 2.0;
        }
        features.extend_from_slice(&row);
    }

    let occupied = occupied_voxels
        .into_iter()
        .map(|(i, j, k)| positions[flatten(i, j, k)])
        .collect();

    ModelData {
        voxel_num,
        voxel_dim,
        vertex_indices,
        occupied,
        features,
        decoder: DecoderWeights::color_passthrough(voxel_dim),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_model_roundtrip() {
        let model = create_test_sphere(8, 4, 3.0);
        let bytes = compress_model(&model).unwrap();
        let restored = decompress_model(&bytes).unwrap();
        assert_eq!(restored, model);
    }

    #[test]
    fn test_corrupt_data_rejected() {
        let model = create_test_sphere(4, 4, 1.0);
        let mut bytes = compress_model(&model).unwrap();
        bytes.truncate(bytes.len() / 2);
        assert!(matches!(decompress_model(&bytes), Err(LoadError::Malformed(_))));
        assert!(matches!(decompress_model(&[1, 2, 3]), Err(LoadError::Malformed(_))));
    }

    #[test]
    fn test_read_write_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("models").join("sphere.nvx");
        let model = create_test_sphere(6, 8, 2.0);
        write_model(&path, &model).unwrap();
        assert_eq!(read_model(&path).unwrap(), model);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let result = read_model(&dir.path().join("absent.nvx"));
        assert!(matches!(result, Err(LoadError::Io(_))));
    }

    #[tokio::test]
    async fn test_async_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sphere.nvx");
        let model = create_test_sphere(8, 4, 3.5);
        save_model(&path, &model).await.unwrap();
        let loaded = load_model(&path).await.unwrap();
        assert_eq!(loaded, model);
    }

    #[test]
    fn test_sphere_contents() {
        let model = create_test_sphere(4, 4, 1.0);
        // Radius 1 around (2, 2, 2) covers the 8 voxels touching the centre
        assert_eq!(model.occupied.len(), 8);
        assert_eq!(model.vertex_indices.len(), 27);
        assert_eq!(model.features.len(), 27 * 4);
        assert!(model.decoder.validate(4).is_ok());
        assert!(model.features.chunks_exact(4).all(|row| row[0] == SPHERE_DENSITY));
    }

    #[test]
    fn test_empty_sphere() {
        let model = create_test_sphere(4, 4, 0.1);
        assert!(model.occupied.is_empty());
        assert!(model.vertex_indices.is_empty());
    }
}
