//! Pure sample interpolators.
//!
//! [`blend_samples`] produces the synthetic sample for an interior gap;
//! [`duplicate_sample`] fills boundary gaps. Neither touches shared state.

pub mod keypoints;
pub mod mesh;

use crate::sample::{Degradation, Sample};
use crate::types::{lerp, FrameIndex};

pub use keypoints::{interpolate_keypoints, KeypointBlend};
pub use mesh::{interpolate_mesh, MeshBlend};

/// Blend two real samples into the synthetic sample at `index`.
///
/// Returns the sample and every degradation encountered along the way.
pub fn blend_samples(
    before: &Sample,
    after: &Sample,
    index: FrameIndex,
    factor: f64,
) -> (Sample, Vec<Degradation>) {
    let KeypointBlend {
        keypoints,
        degradations: mut degraded,
    } = interpolate_keypoints(&before.keypoints, &after.keypoints, factor);

    let MeshBlend {
        vertices,
        faces,
        camera_translation,
        degradations: mesh_degraded,
    } = interpolate_mesh(before, after, factor);
    degraded.extend(mesh_degraded);

    let sample = Sample {
        frame_index: index,
        timestamp: lerp(before.timestamp, after.timestamp, factor),
        keypoints,
        vertices,
        faces,
        camera_translation,
    };
    (sample, degraded)
}

/// Copy `nearest` to a boundary gap at `index`, re-timestamped from `fps`.
pub fn duplicate_sample(nearest: &Sample, index: FrameIndex, fps: f64) -> Sample {
    let offset = index as f64 - nearest.frame_index as f64;
    Sample {
        frame_index: index,
        timestamp: (nearest.timestamp + offset / fps).max(0.0),
        ..nearest.clone()
    }
}
