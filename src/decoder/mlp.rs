//! Small dense network stored alongside the voxel features

use rkyv::{Archive, Deserialize, Serialize};

use super::{Decoder, FeatureBlock, Sample};
use crate::core::error::LoadError;
use crate::core::types::Vec3;

/// Components of the ray direction appended to the network input
const DIRECTION_INPUTS: usize = 3;

/// One fully connected layer; `weights` is row-major `outputs × inputs`.
#[derive(Debug, Clone, PartialEq, Archive, Deserialize, Serialize)]
pub struct LayerWeights {
    pub inputs: u32,
    pub outputs: u32,
    pub weights: Vec<f32>,
    pub bias: Vec<f32>,
}

impl LayerWeights {
    /// Zero-initialised layer
    pub fn zeros(inputs: u32, outputs: u32) -> Self {
        Self {
            inputs,
            outputs,
            weights: vec![0.0; inputs as usize * outputs as usize],
            bias: vec![0.0; outputs as usize],
        }
    }

    fn apply(&self, input: &[f32], output: &mut [f32], relu: bool) {
        let n_in = self.inputs as usize;
        for (o, (row, b)) in output.iter_mut().zip(self.weights.chunks_exact(n_in).zip(&self.bias)) {
            let v = row.iter().zip(input).fold(*b, |acc, (w, x)| acc + w * x);
            *o = if relu { v.max(0.0) } else { v };
        }
    }
}

/// Layer stack of the color network
#[derive(Debug, Clone, PartialEq, Default, Archive, Deserialize, Serialize)]
pub struct DecoderWeights {
    pub layers: Vec<LayerWeights>,
}

impl DecoderWeights {
    /// Single layer that maps feature channels 1..=3 straight to the color
    /// logits and ignores the view direction.
    pub fn color_passthrough(voxel_dim: u32) -> Self {
        let inputs = voxel_dim.saturating_sub(1) + DIRECTION_INPUTS as u32;
        let mut layer = LayerWeights::zeros(inputs, 3);
        for c in 0..3u32 {
            if c + 1 < voxel_dim {
                layer.weights[(c * inputs + c) as usize] = 1.0;
            }
        }
        Self { layers: vec![layer] }
    }

    /// Check layer shapes against a feature width of `voxel_dim`.
    pub fn validate(&self, voxel_dim: u32) -> Result<(), LoadError> {
        let Some(last) = self.layers.last() else {
            return Err(LoadError::Decoder("no layers".to_string()));
        };
        if voxel_dim == 0 {
            return Err(LoadError::Decoder("feature width is zero".to_string()));
        }

        let mut expected = voxel_dim - 1 + DIRECTION_INPUTS as u32;
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.inputs != expected {
                return Err(LoadError::Decoder(format!(
                    "layer {} takes {} inputs, expected {}",
                    i, layer.inputs, expected
                )));
            }
            if layer.outputs == 0 {
                return Err(LoadError::Decoder(format!("layer {} has no outputs", i)));
            }
            let weight_count = layer.inputs as usize * layer.outputs as usize;
            if layer.weights.len() != weight_count || layer.bias.len() != layer.outputs as usize {
                return Err(LoadError::Decoder(format!(
                    "layer {} has {} weights and {} biases for a {}x{} layer",
                    i,
                    layer.weights.len(),
                    layer.bias.len(),
                    layer.outputs,
                    layer.inputs
                )));
            }
            expected = layer.outputs;
        }

        if last.outputs != 3 {
            return Err(LoadError::Decoder(format!("final layer has {} outputs, expected 3", last.outputs)));
        }
        Ok(())
    }
}

/// Per-worker buffers for [`MlpDecoder`]
#[derive(Debug, Clone)]
pub struct MlpScratch {
    feature: Vec<f32>,
    front: Vec<f32>,
    back: Vec<f32>,
}

/// Reference decoder.
///
/// The span's feature integral gives density in channel 0
/// (`alpha = 1 - exp(-max(f0, 0))`) and, together with the view direction,
/// the input to a ReLU network whose three outputs pass through a sigmoid.
#[derive(Debug, Clone)]
pub struct MlpDecoder {
    weights: DecoderWeights,
    feature_dim: usize,
    max_width: usize,
}

impl MlpDecoder {
    pub fn new(weights: DecoderWeights, voxel_dim: u32) -> Result<Self, LoadError> {
        weights.validate(voxel_dim)?;
        let max_width = weights
            .layers
            .iter()
            .map(|l| l.inputs.max(l.outputs) as usize)
            .max()
            .unwrap_or(DIRECTION_INPUTS);
        Ok(Self {
            weights,
            feature_dim: voxel_dim as usize,
            max_width,
        })
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

impl Decoder for MlpDecoder {
    type Scratch = MlpScratch;

    fn scratch(&self) -> MlpScratch {
        MlpScratch {
            feature: vec![0.0; self.feature_dim],
            front: vec![0.0; self.max_width],
            back: vec![0.0; self.max_width],
        }
    }

    fn decode(&self, block: &FeatureBlock<'_>, direction: Vec3, scratch: &mut MlpScratch) -> Sample {
        let MlpScratch { feature, front, back } = scratch;

        feature.fill(0.0);
        block.integrate_into(feature);

        let density = feature[0].max(0.0);
        let alpha = 1.0 - (-density).exp();

        let n = self.feature_dim - 1;
        front[..n].copy_from_slice(&feature[1..]);
        front[n..n + DIRECTION_INPUTS].copy_from_slice(&direction.to_array());

        let last = self.weights.layers.len() - 1;
        for (i, layer) in self.weights.layers.iter().enumerate() {
            layer.apply(&front[..layer.inputs as usize], &mut back[..layer.outputs as usize], i != last);
            std::mem::swap(front, back);
        }

        Sample {
            rgb: Vec3::new(sigmoid(front[0]), sigmoid(front[1]), sigmoid(front[2])),
            alpha,
        }
    }
}
