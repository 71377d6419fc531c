//! Gap analysis over a video's sparse source indices.
//!
//! [`GapMap`] answers, for any frame index, whether a real sample exists
//! there and, if not, which real samples bound the gap and with what blend
//! factor. Every query is a binary search over the sorted source indices.
//!
//! Gap width is reported but never acted upon here; any maximum-gap policy
//! lives in [`crate::config`] and is applied by the service.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::FrameIndex;

/// Classification of a single frame index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GapKind {
    /// A real sample exists at this index.
    Real,
    /// Before the first or after the last real sample. Filled by
    /// duplicating `nearest`; never extrapolated.
    Boundary { nearest: FrameIndex },
    /// Strictly between two real samples.
    Interior {
        before: FrameIndex,
        after: FrameIndex,
        /// `(i - before) / (after - before)`, in `(0, 1)`.
        factor: f64,
    },
}

/// Sorted, de-duplicated source indices plus the declared frame count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GapMap {
    sources: Vec<FrameIndex>,
    total_frames: usize,
}

impl GapMap {
    /// Build a gap map.
    ///
    /// Fails with [`CoreError::InvalidInput`] when `total_frames == 0`, when
    /// there are no source indices (every frame would be a gap with nothing
    /// to fill it from), or when any index lies outside `[0, total_frames)`.
    pub fn analyze(source_indices: &[FrameIndex], total_frames: usize) -> Result<Self, CoreError> {
        if total_frames == 0 {
            return Err(CoreError::InvalidInput(
                "total_frames must be greater than 0".to_string(),
            ));
        }
        if source_indices.is_empty() {
            return Err(CoreError::InvalidInput(
                "at least one source frame is required".to_string(),
            ));
        }
        if let Some(&bad) = source_indices.iter().find(|&&i| i >= total_frames) {
            return Err(CoreError::InvalidInput(format!(
                "source index {bad} is outside [0, {total_frames})"
            )));
        }

        let mut sources = source_indices.to_vec();
        sources.sort_unstable();
        sources.dedup();

        Ok(Self {
            sources,
            total_frames,
        })
    }

    /// Classify `index`. Returns `None` if `index >= total_frames`.
    pub fn classify(&self, index: FrameIndex) -> Option<GapKind> {
        if index >= self.total_frames {
            return None;
        }

        let kind = match self.sources.binary_search(&index) {
            Ok(_) => GapKind::Real,
            Err(0) => GapKind::Boundary {
                nearest: self.sources[0],
            },
            Err(pos) if pos == self.sources.len() => GapKind::Boundary {
                nearest: self.sources[pos - 1],
            },
            Err(pos) => {
                let before = self.sources[pos - 1];
                let after = self.sources[pos];
                GapKind::Interior {
                    before,
                    after,
                    factor: (index - before) as f64 / (after - before) as f64,
                }
            }
        };
        Some(kind)
    }

    /// Number of consecutive missing frames in the gap containing `index`.
    ///
    /// Zero for real indices; `None` when out of range.
    pub fn gap_width(&self, index: FrameIndex) -> Option<usize> {
        let width = match self.classify(index)? {
            GapKind::Real => 0,
            GapKind::Boundary { nearest } if index < nearest => nearest,
            GapKind::Boundary { nearest } => self.total_frames - 1 - nearest,
            GapKind::Interior { before, after, .. } => after - before - 1,
        };
        Some(width)
    }

    /// Iterate over maximal runs of missing frames as `(start, end)` inclusive.
    pub fn gaps(&self) -> impl Iterator<Item = (FrameIndex, FrameIndex)> + '_ {
        let first = self.sources[0];
        let last = self.sources[self.sources.len() - 1];

        let leading = (first > 0).then(|| (0, first - 1));
        let interior = self
            .sources
            .windows(2)
            .filter(|w| w[1] - w[0] > 1)
            .map(|w| (w[0] + 1, w[1] - 1));
        let trailing = (last + 1 < self.total_frames).then(|| (last + 1, self.total_frames - 1));

        leading.into_iter().chain(interior).chain(trailing)
    }

    pub fn is_source(&self, index: FrameIndex) -> bool {
        self.sources.binary_search(&index).is_ok()
    }

    pub fn sources(&self) -> &[FrameIndex] {
        &self.sources
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Number of frames without a real sample.
    pub fn gap_count(&self) -> usize {
        self.total_frames - self.sources.len()
    }

    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    pub fn first(&self) -> FrameIndex {
        self.sources[0]
    }

    pub fn last(&self) -> FrameIndex {
        self.sources[self.sources.len() - 1]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
