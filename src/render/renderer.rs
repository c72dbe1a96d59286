//! Frame loop tying the stages together

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use crate::core::camera::CameraView;
use crate::core::config::RenderConfig;
use crate::core::error::ConfigError;
use crate::core::types::{Result, Vec3};
use crate::decoder::Decoder;
use crate::scene::{Scene, SceneHandle};
use super::buffer::FrameBuffers;
use super::composite::SampleDecoder;
use super::display::Frame;
use super::intersect::AabbIntersector;
use super::march::RayMarcher;
use super::profiler::{millis, FrameProfiler, FrameStats};

/// Per-frame parameters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    /// Maximum decoded spans per pixel per frame
    pub max_hits: u32,
    pub background: Vec3,
}

impl RenderSettings {
    pub fn from_config(config: &RenderConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            width: config.width,
            height: config.height,
            max_hits: config.max_hits,
            background: Vec3::from_array(config.background),
        })
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            max_hits: 64,
            background: Vec3::ONE,
        }
    }
}

/// Renders a scene through an injected decoder.
///
/// Each frame runs the intersect stage once, then alternates march and
/// decode stages until every pixel is finished, and finally composites the
/// accumulated color over the background. Every stage completes for all
/// pixels before the next one starts.
pub struct Renderer<D: Decoder> {
    scene: SceneHandle,
    decoder: D,
    settings: RenderSettings,
    buffers: FrameBuffers,
    pool: Option<Arc<rayon::ThreadPool>>,
    profiler: FrameProfiler,
}

impl<D: Decoder> Renderer<D> {
    pub fn new(scene: SceneHandle, decoder: D, settings: RenderSettings) -> Self {
        Self {
            buffers: FrameBuffers::new(settings.width, settings.height),
            scene,
            decoder,
            settings,
            pool: None,
            profiler: FrameProfiler::default(),
        }
    }

    /// Build a renderer from a full configuration, including its device.
    pub fn from_config(scene: SceneHandle, decoder: D, config: &RenderConfig) -> Result<Self> {
        let settings = RenderSettings::from_config(config)?;
        let pool = config.device()?.thread_pool()?;
        if let Some(pool) = &pool {
            log::info!("Rendering on a dedicated pool of {} threads", pool.current_num_threads());
        } else {
            log::info!("Rendering on the global pool ({} threads)", rayon::current_num_threads());
        }
        let mut renderer = Self::new(scene, decoder, settings);
        renderer.pool = pool.map(Arc::new);
        Ok(renderer)
    }

    pub fn scene(&self) -> &SceneHandle {
        &self.scene
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    pub fn settings(&self) -> RenderSettings {
        self.settings
    }

    /// Ray state left by the last frame
    pub fn buffers(&self) -> &FrameBuffers {
        &self.buffers
    }

    pub fn profiler(&self) -> &FrameProfiler {
        &self.profiler
    }

    /// Change the output resolution for subsequent frames.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.settings.width = width;
        self.settings.height = height;
    }

    pub fn set_background(&mut self, background: Vec3) {
        self.settings.background = background;
    }

    /// Render one frame from the given camera pose.
    pub fn render(&mut self, view: &CameraView) -> Frame {
        match self.pool.clone() {
            Some(pool) => pool.install(|| self.render_frame(view)),
            None => self.render_frame(view),
        }
    }

    fn render_frame(&mut self, view: &CameraView) -> Frame {
        let frame_start = Instant::now();
        let mut stats = FrameStats::default();
        let RenderSettings { width, height, max_hits, background } = self.settings;
        let scene: &Scene = &self.scene;

        self.buffers.resize(width, height);

        let start = Instant::now();
        AabbIntersector::run(&mut self.buffers, scene, view);
        stats.intersect_ms = millis(start.elapsed());
        stats.active_pixels = self.buffers.active_count() as u64;

        // Each round either decodes one span of an active pixel or finishes
        // it, so `max_hits + 1` rounds finish every pixel.
        let mut active = stats.active_pixels as usize;
        for _ in 0..=max_hits {
            if active == 0 {
                break;
            }
            stats.rounds += 1;

            let start = Instant::now();
            active = RayMarcher::run(&mut self.buffers, scene, view.center, max_hits);
            stats.march_ms += millis(start.elapsed());
            if active == 0 {
                break;
            }

            let start = Instant::now();
            stats.decode_calls += SampleDecoder::run(&mut self.buffers, scene, &self.decoder, view.center) as u64;
            stats.decode_ms += millis(start.elapsed());
        }
        if !self.buffers.all_finished() {
            log::warn!("{} pixels still active after {} rounds", self.buffers.active_count(), stats.rounds);
            self.buffers.finish_all();
        }

        let start = Instant::now();
        let pixels = self
            .buffers
            .rgba
            .par_iter()
            .map(|acc| (acc.truncate() + (1.0 - acc.w) * background).to_array())
            .collect();
        stats.composite_ms = millis(start.elapsed());
        stats.total_ms = millis(frame_start.elapsed());

        log::debug!(
            "Frame {}x{}: {} active pixels, {} rounds, {} decodes, {:.2} ms",
            width,
            height,
            stats.active_pixels,
            stats.rounds,
            stats.decode_calls,
            stats.total_ms
        );
        self.profiler.record(stats);

        Frame::new(width, height, pixels)
    }
}
