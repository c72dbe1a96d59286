//! Per-vertex feature storage

use crate::core::error::LoadError;
use crate::core::types::{IVec3, UVec3};

/// Floats per alignment block; rows are padded to a multiple of this (32 bytes)
pub const FEATURE_ALIGN: usize = 8;

/// Marks a vertex without a feature vector
pub const NO_FEATURE: u32 = u32::MAX;

/// Dense table of feature vectors, one row per stored vertex.
///
/// Rows are padded to `stride` floats so each vertex read touches one
/// aligned contiguous block. One extra all-zero row after the last feature
/// stands in for vertices that have no feature.
#[derive(Clone, Debug)]
pub struct FeatureTable {
    dim: usize,
    stride: usize,
    rows: usize,
    data: Vec<f32>,
}

impl FeatureTable {
    /// Build from tightly packed rows of width `dim`.
    pub fn from_packed(dim: usize, packed: &[f32]) -> Result<Self, LoadError> {
        if dim == 0 || packed.len() % dim != 0 {
            return Err(LoadError::Malformed(format!(
                "feature table of {} floats is not a whole number of {}-wide rows",
                packed.len(),
                dim
            )));
        }
        let rows = packed.len() / dim;
        let stride = dim.next_multiple_of(FEATURE_ALIGN);

        let mut data = vec![0.0; (rows + 1) * stride];
        for (dst, src) in data.chunks_exact_mut(stride).zip(packed.chunks_exact(dim)) {
            dst[..dim].copy_from_slice(src);
        }

        Ok(Self { dim, stride, rows, data })
    }

    /// Feature width
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Padded row width in floats
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of stored feature rows (excluding the zero row)
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Feature vector of a row, or the zero row for [`NO_FEATURE`] / out of range.
    pub fn row(&self, index: u32) -> &[f32] {
        let row = if (index as usize) < self.rows { index as usize } else { self.rows };
        let start = row * self.stride;
        &self.data[start..start + self.dim]
    }

    /// The all-zero row
    pub fn zero_row(&self) -> &[f32] {
        self.row(NO_FEATURE)
    }
}

/// Maps every lattice vertex to its feature row.
#[derive(Clone, Debug)]
pub struct VertexFeatureIndex {
    vertices_per_axis: u32,
    entries: Vec<u32>,
}

impl VertexFeatureIndex {
    /// Empty index for a grid of `voxel_num` voxels per axis
    pub fn new(voxel_num: u32) -> Self {
        let n1 = voxel_num as usize + 1;
        Self {
            vertices_per_axis: voxel_num + 1,
            entries: vec![NO_FEATURE; n1 * n1 * n1],
        }
    }

    fn offset(&self, v: UVec3) -> usize {
        let n1 = self.vertices_per_axis as usize;
        (v.x as usize * n1 + v.y as usize) * n1 + v.z as usize
    }

    /// Assign a feature row to a vertex. Returns the previous entry.
    pub fn insert(&mut self, vertex: UVec3, row: u32) -> Option<u32> {
        let offset = self.offset(vertex);
        let prev = std::mem::replace(&mut self.entries[offset], row);
        (prev != NO_FEATURE).then_some(prev)
    }

    /// Feature row of a vertex, if it has one
    pub fn get(&self, vertex: IVec3) -> Option<u32> {
        let n1 = self.vertices_per_axis as i32;
        if vertex.min_element() < 0 || vertex.max_element() >= n1 {
            return None;
        }
        let entry = self.entries[self.offset(vertex.as_uvec3())];
        (entry != NO_FEATURE).then_some(entry)
    }

    /// Number of vertices with a feature
    pub fn populated(&self) -> usize {
        self.entries.iter().filter(|&&e| e != NO_FEATURE).count()
    }

    /// Feature rows at the 8 corners of a voxel.
    ///
    /// Corner `c` is offset by `(c & 1, (c >> 1) & 1, (c >> 2) & 1)`; missing
    /// corners yield the table's zero row.
    pub fn corner_rows<'a>(&self, table: &'a FeatureTable, voxel: IVec3) -> [&'a [f32]; 8] {
        std::array::from_fn(|c| {
            let offset = IVec3::new((c & 1) as i32, ((c >> 1) & 1) as i32, ((c >> 2) & 1) as i32);
            match self.get(voxel + offset) {
                Some(row) => table.row(row),
                None => table.zero_row(),
            }
        })
    }
}
