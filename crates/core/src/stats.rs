//! Per-video interpolation counters and the statistics snapshot built from them.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Cumulative counters for one video since its last `initialize`.
#[derive(Debug, Clone, Default)]
pub struct VideoCounters {
    /// Every `get_frame` call, including each frame of a range request.
    pub requests: u64,
    /// Requests answered with a real sample.
    pub source_hits: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Interior gaps synthesized by blending.
    pub interpolated: u64,
    /// Boundary gaps synthesized by duplication.
    pub boundary: u64,
    /// Synthesized frames carrying at least one degradation.
    pub degraded: u64,
    /// Time spent synthesizing frames (misses only).
    pub synthesis_time: Duration,
}

impl VideoCounters {
    /// Hits over all gap lookups; `0.0` before any gap was requested.
    pub fn cache_hit_rate(&self) -> f64 {
        let lookups = self.cache_hits + self.cache_misses;
        if lookups == 0 {
            return 0.0;
        }
        self.cache_hits as f64 / lookups as f64
    }

    /// Mean synthesis time per synthesized frame in milliseconds.
    pub fn avg_interpolation_time_ms(&self) -> f64 {
        let synthesized = self.interpolated + self.boundary;
        if synthesized == 0 {
            return 0.0;
        }
        self.synthesis_time.as_secs_f64() * 1000.0 / synthesized as f64
    }
}

/// Observational snapshot returned by `get_statistics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpolationStatistics {
    pub total_frames: usize,
    pub source_frames: usize,
    /// Distinct frames synthesized and cached since `initialize` (interior
    /// and boundary). A miss that loses a race to a concurrent miss on the
    /// same frame counts as a hit instead.
    pub interpolated_frames: u64,
    pub boundary_frames: u64,
    pub degraded_frames: u64,
    pub cached_frames: usize,
    pub requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
    pub avg_interpolation_time_ms: f64,
    pub initialized_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_are_zero_without_traffic() {
        let counters = VideoCounters::default();
        assert_eq!(counters.cache_hit_rate(), 0.0);
        assert_eq!(counters.avg_interpolation_time_ms(), 0.0);
    }

    #[test]
    fn hit_rate_counts_only_gap_lookups() {
        let counters = VideoCounters {
            requests: 10,
            source_hits: 6,
            cache_hits: 3,
            cache_misses: 1,
            ..Default::default()
        };
        assert_eq!(counters.cache_hit_rate(), 0.75);
    }

    #[test]
    fn average_time_is_per_synthesized_frame() {
        let counters = VideoCounters {
            interpolated: 3,
            boundary: 1,
            synthesis_time: Duration::from_millis(2),
            ..Default::default()
        };
        assert!((counters.avg_interpolation_time_ms() - 0.5).abs() < 1e-9);
    }
}
