//! Canonical pose sample shapes shared by every component.
//!
//! External pose data is converted into [`Sample`] at the boundary (see
//! [`crate::ingest`]); nothing inside the core deals with the pose
//! service's own field names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{FrameIndex, Vec3, VideoId};

/// A triangle as three indices into the vertex list.
pub type Face = [u32; 3];

// ---------------------------------------------------------------------------
// Sample
// ---------------------------------------------------------------------------

/// A single named body keypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub name: String,
    pub position: Vec3,
    /// Detector confidence in `[0, 1]`.
    pub confidence: f64,
}

impl Keypoint {
    pub fn new(name: impl Into<String>, position: Vec3, confidence: f64) -> Self {
        Self {
            name: name.into(),
            position,
            confidence,
        }
    }
}

/// One frame's pose data, real or synthetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub frame_index: FrameIndex,
    /// Seconds from the start of the video.
    pub timestamp: f64,
    #[serde(default)]
    pub keypoints: Vec<Keypoint>,
    #[serde(default)]
    pub vertices: Vec<Vec3>,
    #[serde(default)]
    pub faces: Vec<Face>,
    #[serde(default)]
    pub camera_translation: Option<Vec3>,
}

impl Sample {
    /// An empty sample at `frame_index`, timestamped from the video's fps.
    pub fn empty(frame_index: FrameIndex, fps: f64) -> Self {
        Self {
            frame_index,
            timestamp: frame_index as f64 / fps,
            keypoints: Vec::new(),
            vertices: Vec::new(),
            faces: Vec::new(),
            camera_translation: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Frame (a sample plus where it came from)
// ---------------------------------------------------------------------------

/// How a [`Frame`] was produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrameOrigin {
    /// A real sample from the pose pipeline, unmodified.
    Source,
    /// A leading or trailing gap filled by duplicating the nearest real sample.
    Boundary { nearest: FrameIndex },
    /// An interior gap blended from its two bounding real samples.
    Interpolated {
        before: FrameIndex,
        after: FrameIndex,
        factor: f64,
    },
}

/// Which side of an interpolation a piece of data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Before,
    After,
}

/// Why a synthetic frame is only a best-effort reconstruction.
///
/// Degradations are observational: the frame is still returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Degradation {
    /// A keypoint existed on only one side and was duplicated from it.
    MissingKeypoint { name: String, present_on: Side },
    /// Vertex counts differed; the shorter list was padded before blending.
    VertexCountMismatch { before: usize, after: usize },
    /// One side had no mesh at all; the other side's mesh was duplicated.
    MissingMesh { present_on: Side },
    /// The gap is wider than the configured maximum.
    WideGap { width: usize },
}

/// A dense-sequence frame as handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(flatten)]
    pub sample: Sample,
    pub origin: FrameOrigin,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degradations: Vec<Degradation>,
}

impl Frame {
    pub fn source(sample: Sample) -> Self {
        Self {
            sample,
            origin: FrameOrigin::Source,
            degradations: Vec::new(),
        }
    }

    pub fn index(&self) -> FrameIndex {
        self.sample.frame_index
    }

    pub fn is_source(&self) -> bool {
        matches!(self.origin, FrameOrigin::Source)
    }

    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SparseSequence
// ---------------------------------------------------------------------------

/// Validate a declared frame rate. There is no default: callers must pass
/// the rate read from the source video's container.
pub fn validate_fps(fps: f64) -> Result<(), CoreError> {
    if !fps.is_finite() || fps <= 0.0 {
        return Err(CoreError::InvalidInput(format!(
            "fps must be a positive finite number, got {fps}"
        )));
    }
    Ok(())
}

/// Validate a declared total frame count.
pub fn validate_total_frames(total_frames: usize) -> Result<(), CoreError> {
    if total_frames == 0 {
        return Err(CoreError::InvalidInput(
            "total_frames must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

/// All real samples of one video plus its declared length and frame rate.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseSequence {
    video_id: VideoId,
    total_frames: usize,
    fps: f64,
    samples: BTreeMap<FrameIndex, Sample>,
}

impl SparseSequence {
    /// Build a sequence, checking:
    /// - `total_frames > 0` and `fps` positive and finite
    /// - every sample index in `[0, total_frames)` and unique
    /// - timestamps non-decreasing with index
    pub fn new(
        video_id: impl Into<VideoId>,
        total_frames: usize,
        fps: f64,
        samples: impl IntoIterator<Item = Sample>,
    ) -> Result<Self, CoreError> {
        let video_id = video_id.into();
        validate_total_frames(total_frames)?;
        validate_fps(fps)?;

        let mut by_index = BTreeMap::new();
        for sample in samples {
            let index = sample.frame_index;
            if index >= total_frames {
                return Err(CoreError::InvalidInput(format!(
                    "sample index {index} is outside [0, {total_frames})"
                )));
            }
            if by_index.insert(index, sample).is_some() {
                return Err(CoreError::InvalidInput(format!(
                    "duplicate sample for frame {index}"
                )));
            }
        }

        let mut previous: Option<&Sample> = None;
        for sample in by_index.values() {
            if let Some(prev) = previous {
                if sample.timestamp < prev.timestamp {
                    return Err(CoreError::InvalidInput(format!(
                        "timestamp of frame {} ({}) precedes frame {} ({})",
                        sample.frame_index, sample.timestamp, prev.frame_index, prev.timestamp
                    )));
                }
            }
            previous = Some(sample);
        }

        Ok(Self {
            video_id,
            total_frames,
            fps,
            samples: by_index,
        })
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Sorted indices of the real samples.
    pub fn source_indices(&self) -> Vec<FrameIndex> {
        self.samples.keys().copied().collect()
    }

    pub fn get(&self, index: FrameIndex) -> Option<&Sample> {
        self.samples.get(&index)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Consume the sequence, yielding its samples in index order.
    pub fn into_samples(self) -> impl Iterator<Item = Sample> {
        self.samples.into_values()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
