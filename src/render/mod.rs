//! Per-frame rendering pipeline.
//!
//! Stages run data-parallel over pixels and communicate only through
//! [`FrameBuffers`]: [`AabbIntersector`] once per frame, then
//! [`RayMarcher`] and [`SampleDecoder`] alternately until every pixel is
//! finished.

pub mod buffer;
pub mod intersect;
pub mod march;
pub mod composite;
pub mod renderer;
pub mod display;
pub mod profiler;

#[cfg(test)]
pub(crate) mod test_util;

pub use buffer::{FrameBuffers, Hit, PinholeCamera, RayPhase, Span};
pub use intersect::AabbIntersector;
pub use march::RayMarcher;
pub use composite::{SampleDecoder, SATURATION_ALPHA};
pub use renderer::{RenderSettings, Renderer};
pub use display::{Frame, FrameSink, NullSink, PngSequenceSink};
pub use profiler::{FrameProfiler, FrameStats};
