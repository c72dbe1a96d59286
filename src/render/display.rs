//! Finished frames and where they go

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::ImageEncoder;

use crate::core::error::Error;
use crate::core::types::Result;

/// Rendered image, `height × width × 3` floats in row-major,
/// channel-last order. Row 0 is the top of the image.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 3]>,
}

impl Frame {
    pub fn new(width: u32, height: u32, pixels: Vec<[f32; 3]>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize);
        Self { width, height, pixels }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[[f32; 3]] {
        &self.pixels
    }

    /// Color at `(x, y)`
    pub fn get(&self, x: u32, y: u32) -> Option<[f32; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y as usize * self.width as usize + x as usize).copied()
    }

    /// The frame as a flat `H × W × 3` slice
    pub fn as_slice(&self) -> &[f32] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Quantize to 8-bit RGB, clamping to `[0, 1]`
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.as_slice()
            .iter()
            .map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect()
    }
}

/// Receives every rendered frame
pub trait FrameSink {
    fn present(&mut self, frame: &Frame) -> Result<()>;
}

/// Discards frames, counting them
#[derive(Debug, Default)]
pub struct NullSink {
    presented: u64,
}

impl NullSink {
    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl FrameSink for NullSink {
    fn present(&mut self, _frame: &Frame) -> Result<()> {
        self.presented += 1;
        Ok(())
    }
}

/// Writes frames as numbered PNG files: `<dir>/<prefix>_00000.png`, ...
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    prefix: String,
    next_index: u32,
}

impl PngSequenceSink {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            prefix: prefix.into(),
            next_index: 0,
        })
    }

    /// Path the next frame will be written to
    pub fn next_path(&self) -> PathBuf {
        self.dir.join(format!("{}_{:05}.png", self.prefix, self.next_index))
    }

    pub fn write_png(path: &Path, frame: &Frame) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        image::codecs::png::PngEncoder::new(writer)
            .write_image(&frame.to_rgb8(), frame.width, frame.height, image::ExtendedColorType::Rgb8)
            .map_err(|e| Error::Display(format!("failed to write {}: {}", path.display(), e)))
    }
}

impl FrameSink for PngSequenceSink {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        let path = self.next_path();
        Self::write_png(&path, frame)?;
        log::debug!("Wrote {}", path.display());
        self.next_index += 1;
        Ok(())
    }
}
