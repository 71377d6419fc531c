//! Per-video dense frame service.
//!
//! [`InterpolationService`] owns, for every initialized video, the gap map,
//! the resident real samples, the synthesized-frame cache and the
//! statistics counters. It performs no I/O: real samples are handed in by
//! the caller (see [`crate::store::load_sequence`]).
//!
//! All state sits behind one mutex. `get_frame` takes it to look things up,
//! releases it while blending, and takes it again to store the result. A
//! per-video generation number keeps a blend that raced with
//! `initialize`/`put_sample` from landing in the fresh cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::cache::FrameCache;
use crate::config::{InterpolationConfig, WideGapAction};
use crate::error::CoreError;
use crate::gap::{GapKind, GapMap};
use crate::interpolate::{blend_samples, duplicate_sample};
use crate::sample::{validate_fps, Degradation, Frame, FrameOrigin, Sample, SparseSequence};
use crate::stats::{InterpolationStatistics, VideoCounters};
use crate::types::{FrameIndex, Timestamp, VideoId};

/// Timing facts a playback cursor needs about a video.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackInfo {
    pub total_frames: usize,
    pub fps: f64,
}

struct VideoEntry {
    gaps: GapMap,
    fps: f64,
    samples: HashMap<FrameIndex, Arc<Frame>>,
    counters: VideoCounters,
    generation: u64,
    initialized_at: Timestamp,
}

impl VideoEntry {
    fn resident(&self, video_id: &str, index: FrameIndex) -> Result<Arc<Frame>, CoreError> {
        self.samples
            .get(&index)
            .cloned()
            .ok_or_else(|| CoreError::SampleUnavailable {
                video_id: video_id.to_string(),
                index,
            })
    }
}

#[derive(Default)]
struct ServiceState {
    videos: HashMap<VideoId, VideoEntry>,
    cache: FrameCache,
    /// Last generation handed out. Service-wide, so a video that is
    /// removed and loaded again never reuses a number.
    generation: u64,
}

impl ServiceState {
    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
}

/// Work captured under the lock and performed outside it.
enum Synthesis {
    Duplicate {
        nearest: Arc<Frame>,
        fps: f64,
    },
    Blend {
        before: Arc<Frame>,
        after: Arc<Frame>,
        factor: f64,
    },
}

pub struct InterpolationService {
    config: InterpolationConfig,
    state: Mutex<ServiceState>,
}

impl Default for InterpolationService {
    fn default() -> Self {
        Self::new(InterpolationConfig::default())
    }
}

impl InterpolationService {
    pub fn new(config: InterpolationConfig) -> Self {
        Self {
            config,
            state: Mutex::new(ServiceState::default()),
        }
    }

    pub fn config(&self) -> &InterpolationConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Initialization
    // -----------------------------------------------------------------------

    /// (Re)build the gap map for a video.
    ///
    /// Clears the video's cached frames and statistics. Resident samples
    /// whose index is still a source index are kept, so a growing prefix
    /// of the sequence can be re-initialized without reloading everything.
    pub fn initialize(
        &self,
        video_id: &str,
        source_indices: &[FrameIndex],
        total_frames: usize,
        fps: f64,
    ) -> Result<(), CoreError> {
        validate_fps(fps)?;
        let gaps = GapMap::analyze(source_indices, total_frames)?;
        self.install(video_id, gaps, fps, None);
        Ok(())
    }

    /// Initialize from a complete sparse sequence and make all of its
    /// samples resident.
    ///
    /// The new gap map and samples replace the old entry in one step, so
    /// no reader can observe the new gap map alongside old samples.
    pub fn load_sequence(&self, sequence: SparseSequence) -> Result<(), CoreError> {
        let video_id = sequence.video_id().to_string();
        let fps = sequence.fps();
        let gaps = GapMap::analyze(&sequence.source_indices(), sequence.total_frames())?;
        let samples = sequence
            .into_samples()
            .map(|sample| (sample.frame_index, Arc::new(Frame::source(sample))))
            .collect();
        self.install(&video_id, gaps, fps, Some(samples));
        Ok(())
    }

    /// Replace the entry for `video_id`. Without `samples`, resident
    /// samples that are still source indices carry over.
    fn install(
        &self,
        video_id: &str,
        gaps: GapMap,
        fps: f64,
        samples: Option<HashMap<FrameIndex, Arc<Frame>>>,
    ) {
        let mut state = self.lock();
        let generation = state.next_generation();
        let ServiceState { videos, cache, .. } = &mut *state;
        let dropped = cache.clear_video(video_id);

        let previous = videos.remove(video_id);
        let samples = samples.unwrap_or_else(|| {
            previous
                .map(|e| e.samples)
                .unwrap_or_default()
                .into_iter()
                .filter(|(index, _)| gaps.is_source(*index))
                .collect()
        });

        tracing::info!(
            video_id,
            total_frames = gaps.total_frames(),
            fps,
            source_frames = gaps.source_count(),
            resident_samples = samples.len(),
            gap_frames = gaps.gap_count(),
            dropped_cache_entries = dropped,
            "Initialized interpolation state",
        );

        videos.insert(
            video_id.to_string(),
            VideoEntry {
                gaps,
                fps,
                samples,
                counters: VideoCounters::default(),
                generation,
                initialized_at: chrono::Utc::now(),
            },
        );
    }

    /// Make a real sample resident.
    ///
    /// The sample's index must be one of the video's source indices, and
    /// its timestamp must not precede the nearest resident sample before
    /// it nor follow the nearest one after it. Cached frames derived from
    /// that index are invalidated.
    pub fn put_sample(&self, video_id: &str, sample: Sample) -> Result<(), CoreError> {
        let mut state = self.lock();
        let generation = state.next_generation();
        let ServiceState { videos, cache, .. } = &mut *state;
        let entry = videos
            .get_mut(video_id)
            .ok_or_else(|| CoreError::NotInitialized(video_id.to_string()))?;

        let index = sample.frame_index;
        if !entry.gaps.is_source(index) {
            return Err(CoreError::InvalidInput(format!(
                "frame {index} is not a source frame of video {video_id}"
            )));
        }

        let sources = entry.gaps.sources();
        let position = sources.partition_point(|&i| i < index);
        let previous = sources[..position]
            .iter()
            .rev()
            .find_map(|i| entry.samples.get(i));
        let next = sources[position + 1..]
            .iter()
            .find_map(|i| entry.samples.get(i));
        if let Some(prev) = previous.filter(|prev| sample.timestamp < prev.sample.timestamp) {
            return Err(CoreError::InvalidInput(format!(
                "timestamp of frame {index} ({}) precedes frame {} ({})",
                sample.timestamp,
                prev.index(),
                prev.sample.timestamp
            )));
        }
        if let Some(next) = next.filter(|next| sample.timestamp > next.sample.timestamp) {
            return Err(CoreError::InvalidInput(format!(
                "timestamp of frame {index} ({}) follows frame {} ({})",
                sample.timestamp,
                next.index(),
                next.sample.timestamp
            )));
        }

        entry.samples.insert(index, Arc::new(Frame::source(sample)));
        entry.generation = generation;
        let invalidated = cache.invalidate_derived_from(video_id, index);
        if invalidated > 0 {
            tracing::debug!(video_id, index, invalidated, "Invalidated frames derived from replaced sample");
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Frame access
    // -----------------------------------------------------------------------

    /// Return the frame at `index`: the real sample if there is one,
    /// otherwise a cached or freshly synthesized frame.
    pub fn get_frame(&self, video_id: &str, index: FrameIndex) -> Result<Arc<Frame>, CoreError> {
        let (synthesis, generation, wide_gap) = {
            let mut state = self.lock();
            let ServiceState { videos, cache, .. } = &mut *state;
            let entry = videos
                .get_mut(video_id)
                .ok_or_else(|| CoreError::NotInitialized(video_id.to_string()))?;

            let kind = entry
                .gaps
                .classify(index)
                .ok_or_else(|| CoreError::OutOfRange {
                    video_id: video_id.to_string(),
                    index,
                    total_frames: entry.gaps.total_frames(),
                })?;
            entry.counters.requests += 1;

            let (before, after, factor) = match kind {
                GapKind::Real => {
                    let frame = entry.resident(video_id, index)?;
                    entry.counters.source_hits += 1;
                    return Ok(frame);
                }
                GapKind::Boundary { nearest } => (nearest, nearest, 0.0),
                GapKind::Interior {
                    before,
                    after,
                    factor,
                } => (before, after, factor),
            };

            if let Some(hit) = cache.get(video_id, index) {
                entry.counters.cache_hits += 1;
                return Ok(hit);
            }

            let width = entry.gaps.gap_width(index).unwrap_or(0);
            let wide_gap = match self.config.action_for(width) {
                Some(WideGapAction::Reject) => {
                    return Err(CoreError::GapTooWide {
                        video_id: video_id.to_string(),
                        index,
                        width,
                        max: self.config.max_gap_frames.unwrap_or(0),
                    });
                }
                Some(WideGapAction::Flag) => Some(width),
                Some(WideGapAction::Interpolate) | None => None,
            };

            let synthesis = match kind {
                GapKind::Boundary { .. } => Synthesis::Duplicate {
                    nearest: entry.resident(video_id, before)?,
                    fps: entry.fps,
                },
                _ => Synthesis::Blend {
                    before: entry.resident(video_id, before)?,
                    after: entry.resident(video_id, after)?,
                    factor,
                },
            };
            (synthesis, entry.generation, wide_gap)
        };

        let started = Instant::now();
        let frame = Arc::new(synthesize(synthesis, index, wide_gap));
        let elapsed = started.elapsed();

        if frame.is_degraded() {
            tracing::warn!(
                video_id,
                index,
                degradations = ?frame.degradations,
                "Synthesized degraded frame",
            );
        }

        let mut state = self.lock();
        let ServiceState { videos, cache, .. } = &mut *state;
        if let Some(entry) = videos.get_mut(video_id) {
            if entry.generation == generation {
                // A concurrent miss on the same frame got here first.
                if let Some(winner) = cache.get(video_id, index) {
                    entry.counters.cache_hits += 1;
                    return Ok(winner);
                }
                let counters = &mut entry.counters;
                counters.cache_misses += 1;
                counters.synthesis_time += elapsed;
                match frame.origin {
                    FrameOrigin::Boundary { .. } => counters.boundary += 1,
                    _ => counters.interpolated += 1,
                }
                if frame.is_degraded() {
                    counters.degraded += 1;
                }
                cache.insert(video_id, index, Arc::clone(&frame));
            }
        }

        Ok(frame)
    }

    /// Frames `start..=end` in index order.
    ///
    /// Bounds are checked up front so a bad range does no partial work.
    pub fn get_frame_range(
        &self,
        video_id: &str,
        start: FrameIndex,
        end: FrameIndex,
    ) -> Result<Vec<Arc<Frame>>, CoreError> {
        if start > end {
            return Err(CoreError::InvalidInput(format!(
                "range start {start} is after end {end}"
            )));
        }
        let info = self.playback_info(video_id)?;
        if end >= info.total_frames {
            return Err(CoreError::OutOfRange {
                video_id: video_id.to_string(),
                index: end,
                total_frames: info.total_frames,
            });
        }

        (start..=end)
            .map(|index| self.get_frame(video_id, index))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Observation and housekeeping
    // -----------------------------------------------------------------------

    pub fn get_statistics(&self, video_id: &str) -> Result<InterpolationStatistics, CoreError> {
        let state = self.lock();
        let entry = state
            .videos
            .get(video_id)
            .ok_or_else(|| CoreError::NotInitialized(video_id.to_string()))?;
        let c = &entry.counters;

        Ok(InterpolationStatistics {
            total_frames: entry.gaps.total_frames(),
            source_frames: entry.gaps.source_count(),
            interpolated_frames: c.interpolated + c.boundary,
            boundary_frames: c.boundary,
            degraded_frames: c.degraded,
            cached_frames: state.cache.video_len(video_id),
            requests: c.requests,
            cache_hits: c.cache_hits,
            cache_misses: c.cache_misses,
            cache_hit_rate: c.cache_hit_rate(),
            avg_interpolation_time_ms: c.avg_interpolation_time_ms(),
            initialized_at: entry.initialized_at,
        })
    }

    /// Drop cached synthetic frames for one video, or for all videos when
    /// `video_id` is `None`. Source samples are untouched.
    pub fn clear_cache(&self, video_id: Option<&str>) -> usize {
        let mut state = self.lock();
        let dropped = match video_id {
            Some(id) => state.cache.clear_video(id),
            None => state.cache.clear_all(),
        };
        tracing::info!(video_id = video_id.unwrap_or("*"), dropped, "Cleared frame cache");
        dropped
    }

    pub fn playback_info(&self, video_id: &str) -> Result<PlaybackInfo, CoreError> {
        let state = self.lock();
        let entry = state
            .videos
            .get(video_id)
            .ok_or_else(|| CoreError::NotInitialized(video_id.to_string()))?;
        Ok(PlaybackInfo {
            total_frames: entry.gaps.total_frames(),
            fps: entry.fps,
        })
    }

    pub fn is_initialized(&self, video_id: &str) -> bool {
        self.lock().videos.contains_key(video_id)
    }

    /// Forget a video entirely. Returns `false` if it was unknown.
    pub fn remove(&self, video_id: &str) -> bool {
        let mut state = self.lock();
        state.cache.clear_video(video_id);
        state.videos.remove(video_id).is_some()
    }

    pub fn video_ids(&self) -> Vec<VideoId> {
        let mut ids: Vec<_> = self.lock().videos.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn lock(&self) -> MutexGuard<'_, ServiceState> {
        // Every critical section leaves the maps consistent, so a panic in
        // another holder does not invalidate them.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn synthesize(synthesis: Synthesis, index: FrameIndex, wide_gap: Option<usize>) -> Frame {
    let mut frame = match synthesis {
        Synthesis::Duplicate { nearest, fps } => Frame {
            sample: duplicate_sample(&nearest.sample, index, fps),
            origin: FrameOrigin::Boundary {
                nearest: nearest.index(),
            },
            degradations: Vec::new(),
        },
        Synthesis::Blend {
            before,
            after,
            factor,
        } => {
            let (sample, degradations) = blend_samples(&before.sample, &after.sample, index, factor);
            Frame {
                sample,
                origin: FrameOrigin::Interpolated {
                    before: before.index(),
                    after: after.index(),
                    factor,
                },
                degradations,
            }
        }
    };
    if let Some(width) = wide_gap {
        frame.degradations.push(Degradation::WideGap { width });
    }
    frame
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
