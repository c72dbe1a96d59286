//! Scenes and decoders shared by the stage tests

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::core::types::{UVec3, Vec3};
use crate::decoder::{Decoder, DecoderWeights, FeatureBlock, Sample};
use crate::scene::disk_io::{create_test_sphere, ModelData};
use crate::scene::{GridParams, SceneHandle, SceneStore, VoxelGrid};
use super::buffer::{FrameBuffers, RayPhase, Span};

const DIM: u32 = 4;

/// Scene from occupied voxels; every corner of an occupied voxel gets
/// density 1 and zero color logits.
pub fn voxel_scene(voxel_num: u32, voxels: &[UVec3]) -> SceneHandle {
    let params = GridParams::new(voxel_num, DIM, 2.0).unwrap();
    let grid = VoxelGrid::new(params);

    let mut vertex_indices: Vec<u64> = Vec::new();
    for v in voxels {
        for c in 0..8u32 {
            let flat = grid.flatten_vertex(*v + UVec3::new(c & 1, (c >> 1) & 1, (c >> 2) & 1));
            if !vertex_indices.contains(&flat) {
                vertex_indices.push(flat);
            }
        }
    }
    let occupied = voxels
        .iter()
        .map(|v| vertex_indices.iter().position(|&f| f == grid.flatten_vertex(*v)).unwrap() as u32)
        .collect();
    let features = vertex_indices.iter().flat_map(|_| [1.0, 0.0, 0.0, 0.0]).collect();

    let model = ModelData {
        voxel_num,
        voxel_dim: DIM,
        vertex_indices,
        occupied,
        features,
        decoder: DecoderWeights::color_passthrough(DIM),
    };
    SceneStore::from_model(model, params).unwrap()
}

/// Only voxel (0, 0, 0) occupied
pub fn corner_scene(voxel_num: u32) -> SceneHandle {
    voxel_scene(voxel_num, &[UVec3::ZERO])
}

pub fn empty_scene(voxel_num: u32) -> SceneHandle {
    voxel_scene(voxel_num, &[])
}

/// Occupied voxels `(0, 0, z)` for each listed `z`
pub fn line_scene(voxel_num: u32, zs: &[u32]) -> SceneHandle {
    let voxels: Vec<UVec3> = zs.iter().map(|&z| UVec3::new(0, 0, z)).collect();
    voxel_scene(voxel_num, &voxels)
}

pub fn sphere_scene(voxel_num: u32, radius: f32) -> SceneHandle {
    let params = GridParams::new(voxel_num, DIM, 2.0).unwrap();
    SceneStore::from_model(create_test_sphere(voxel_num, DIM, radius), params).unwrap()
}

/// Single-row buffers with every ray marching along `direction`
pub fn marching_buffers(pixels: u32, direction: Vec3, span: Span) -> FrameBuffers {
    let mut buffers = FrameBuffers::new(pixels, 1);
    buffers.directions.fill(direction);
    buffers.phases.fill(RayPhase::Marching(span));
    buffers
}

/// Returns the same sample everywhere and counts its calls
#[derive(Debug)]
pub struct ConstantDecoder {
    sample: Sample,
    calls: AtomicUsize,
}

impl ConstantDecoder {
    pub fn new(rgb: Vec3, alpha: f32) -> Self {
        Self {
            sample: Sample { rgb, alpha },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Decoder for ConstantDecoder {
    type Scratch = ();

    fn scratch(&self) {}

    fn decode(&self, _block: &FeatureBlock<'_>, _direction: Vec3, _scratch: &mut ()) -> Sample {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.sample
    }
}
