//! Per-frame stage timing and work counters

use std::collections::VecDeque;
use std::time::Duration;

/// Timings (in milliseconds) and work counts of one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrameStats {
    pub intersect_ms: f32,
    pub march_ms: f32,
    pub decode_ms: f32,
    pub composite_ms: f32,
    pub total_ms: f32,
    /// March/decode rounds run
    pub rounds: u32,
    /// Decoder invocations across all pixels
    pub decode_calls: u64,
    /// Pixels with an occupied span after intersection
    pub active_pixels: u64,
}

impl FrameStats {
    fn accumulate(&mut self, other: &FrameStats) {
        self.intersect_ms += other.intersect_ms;
        self.march_ms += other.march_ms;
        self.decode_ms += other.decode_ms;
        self.composite_ms += other.composite_ms;
        self.total_ms += other.total_ms;
        self.rounds += other.rounds;
        self.decode_calls += other.decode_calls;
        self.active_pixels += other.active_pixels;
    }
}

pub(crate) fn millis(d: Duration) -> f32 {
    d.as_secs_f32() * 1000.0
}

/// Keeps the latest frame statistics and a rolling history
#[derive(Debug, Clone)]
pub struct FrameProfiler {
    latest: FrameStats,
    history: VecDeque<FrameStats>,
    max_history: usize,
}

impl FrameProfiler {
    pub fn new(max_history: usize) -> Self {
        Self {
            latest: FrameStats::default(),
            history: VecDeque::with_capacity(max_history),
            max_history: max_history.max(1),
        }
    }

    pub fn record(&mut self, stats: FrameStats) {
        self.history.push_back(stats);
        if self.history.len() > self.max_history {
            self.history.pop_front();
        }
        self.latest = stats;
    }

    /// Statistics of the most recent frame
    pub fn latest(&self) -> FrameStats {
        self.latest
    }

    /// Mean over the history window (counters are averaged and truncated)
    pub fn average(&self) -> FrameStats {
        if self.history.is_empty() {
            return FrameStats::default();
        }
        let mut sum = FrameStats::default();
        for stats in &self.history {
            sum.accumulate(stats);
        }
        let n = self.history.len();
        let nf = n as f32;
        FrameStats {
            intersect_ms: sum.intersect_ms / nf,
            march_ms: sum.march_ms / nf,
            decode_ms: sum.decode_ms / nf,
            composite_ms: sum.composite_ms / nf,
            total_ms: sum.total_ms / nf,
            rounds: sum.rounds / n as u32,
            decode_calls: sum.decode_calls / n as u64,
            active_pixels: sum.active_pixels / n as u64,
        }
    }
}

impl Default for FrameProfiler {
    fn default() -> Self {
        Self::new(60)
    }
}
