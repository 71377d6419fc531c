//! Memoization of synthesized frames.
//!
//! [`FrameCache`] is an explicit value owned by one
//! [`InterpolationService`](crate::service::InterpolationService); there is
//! no process-wide cache. Entries are keyed by `(video, frame index)` and
//! only ever hold synthetic frames: real samples are returned directly.

use std::collections::HashMap;
use std::sync::Arc;

use crate::sample::{Frame, FrameOrigin};
use crate::types::{FrameIndex, VideoId};

#[derive(Debug, Default)]
pub struct FrameCache {
    videos: HashMap<VideoId, HashMap<FrameIndex, Arc<Frame>>>,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, video_id: &str, index: FrameIndex) -> Option<Arc<Frame>> {
        self.videos.get(video_id)?.get(&index).cloned()
    }

    /// Insert a synthesized frame. Inserting twice for the same key
    /// overwrites, which is safe because interpolation is deterministic.
    pub fn insert(&mut self, video_id: &str, index: FrameIndex, frame: Arc<Frame>) {
        self.videos
            .entry(video_id.to_string())
            .or_default()
            .insert(index, frame);
    }

    /// Drop all entries of one video. Returns how many were dropped.
    pub fn clear_video(&mut self, video_id: &str) -> usize {
        self.videos.remove(video_id).map_or(0, |entries| entries.len())
    }

    /// Drop every entry. Returns how many were dropped.
    pub fn clear_all(&mut self) -> usize {
        let dropped = self.len();
        self.videos.clear();
        dropped
    }

    /// Drop entries of `video_id` that were derived from `source`.
    pub fn invalidate_derived_from(&mut self, video_id: &str, source: FrameIndex) -> usize {
        let Some(entries) = self.videos.get_mut(video_id) else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|_, frame| !derives_from(frame.origin, source));
        before - entries.len()
    }

    pub fn video_len(&self, video_id: &str) -> usize {
        self.videos.get(video_id).map_or(0, HashMap::len)
    }

    pub fn len(&self) -> usize {
        self.videos.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn derives_from(origin: FrameOrigin, source: FrameIndex) -> bool {
    match origin {
        FrameOrigin::Source => false,
        FrameOrigin::Boundary { nearest } => nearest == source,
        FrameOrigin::Interpolated { before, after, .. } => before == source || after == source,
    }
}
