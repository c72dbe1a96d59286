//! Frame timing utilities

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Frame time statistics over a window of recent frames
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FpsWindow {
    pub avg: f32,
    pub min: f32,
    pub max: f32,
}

/// Rolling FPS statistics
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct FpsStats {
    /// Last 10 frames
    pub short: FpsWindow,
    /// Last 60 frames
    pub long: FpsWindow,
    pub current_fps: f32,
    pub frame_count: u64,
}

const HISTORY_LEN: usize = 60;
const SHORT_WINDOW: usize = 10;

/// Measures how long each frame takes to render and keeps a short history.
///
/// Unlike a vsync-driven game loop, the viewer measures the render call
/// itself, so FPS here is `1 / render_time`.
pub struct FrameTimer {
    started: Option<Instant>,
    last: Duration,
    frame_count: u64,
    history: VecDeque<f32>,
}

impl FrameTimer {
    /// Create a new frame timer
    pub fn new() -> Self {
        Self {
            started: None,
            last: Duration::ZERO,
            frame_count: 0,
            history: VecDeque::with_capacity(HISTORY_LEN),
        }
    }

    /// Mark the start of a frame
    pub fn begin(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Mark the end of a frame started with [`FrameTimer::begin`].
    ///
    /// Returns the measured frame time, or zero when `begin` was not called.
    pub fn end(&mut self) -> Duration {
        let Some(started) = self.started.take() else {
            return Duration::ZERO;
        };
        let elapsed = started.elapsed();
        self.record(elapsed);
        elapsed
    }

    /// Record an externally measured frame time
    pub fn record(&mut self, frame_time: Duration) {
        self.last = frame_time;
        self.frame_count += 1;
        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(frame_time.as_secs_f32());
    }

    /// FPS of the most recent frame
    pub fn fps(&self) -> f32 {
        let secs = self.last.as_secs_f32();
        if secs > 0.0 { 1.0 / secs } else { 0.0 }
    }

    /// Total number of recorded frames
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Rolling statistics over the last 10 and 60 frames
    pub fn fps_stats(&self) -> FpsStats {
        FpsStats {
            short: self.window_stats(SHORT_WINDOW),
            long: self.window_stats(HISTORY_LEN),
            current_fps: self.fps(),
            frame_count: self.frame_count,
        }
    }

    fn window_stats(&self, frames: usize) -> FpsWindow {
        let skip = self.history.len().saturating_sub(frames);
        let mut count = 0;
        let mut total_time = 0.0f32;
        let mut min_fps = f32::INFINITY;
        let mut max_fps = 0.0f32;

        for &frame_time in self.history.iter().skip(skip) {
            count += 1;
            total_time += frame_time;
            let fps = if frame_time > 0.0 { 1.0 / frame_time } else { 0.0 };
            min_fps = min_fps.min(fps);
            max_fps = max_fps.max(fps);
        }

        if count == 0 {
            return FpsWindow::default();
        }

        FpsWindow {
            avg: if total_time > 0.0 { count as f32 / total_time } else { 0.0 },
            min: min_fps,
            max: max_fps,
        }
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_timer() {
        let timer = FrameTimer::new();
        assert_eq!(timer.fps(), 0.0);
        assert_eq!(timer.fps_stats().long, FpsWindow::default());
    }

    #[test]
    fn test_end_without_begin() {
        let mut timer = FrameTimer::new();
        assert_eq!(timer.end(), Duration::ZERO);
        assert_eq!(timer.frame_count(), 0);
    }

    #[test]
    fn test_window_stats() {
        let mut timer = FrameTimer::new();
        timer.record(Duration::from_millis(100));
        timer.record(Duration::from_millis(50));

        let stats = timer.fps_stats();
        assert_eq!(stats.frame_count, 2);
        assert!((stats.current_fps - 20.0).abs() < 0.01);
        assert!((stats.short.min - 10.0).abs() < 0.01);
        assert!((stats.short.max - 20.0).abs() < 0.01);
        // 2 frames in 0.15s
        assert!((stats.short.avg - 13.333).abs() < 0.01);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut timer = FrameTimer::new();
        for _ in 0..(HISTORY_LEN + 20) {
            timer.record(Duration::from_millis(10));
        }
        assert_eq!(timer.history.len(), HISTORY_LEN);
        assert_eq!(timer.frame_count(), (HISTORY_LEN + 20) as u64);
    }
}
