//! Dense pose reconstruction from sparse per-frame pose/mesh samples.
//!
//! The pose-estimation pipeline only yields data for a subset of a video's
//! frames. This crate fills every remaining frame and keeps the dense
//! sequence in step with video playback:
//!
//! - [`gap`]: classifies any frame index as real, boundary gap, or interior gap.
//! - [`interpolate`]: blends two real samples (keypoints, mesh, camera).
//! - [`service`]: the per-video `get_frame` / `get_frame_range` contract with
//!   memoization and statistics.
//! - [`playback`]: maps video time to frame indices for independent cursors.
//! - [`store`] / [`ingest`]: seams to the persistence and pose-extraction
//!   collaborators.

pub mod cache;
pub mod config;
pub mod error;
pub mod gap;
pub mod ingest;
pub mod interpolate;
pub mod playback;
pub mod sample;
pub mod service;
pub mod stats;
pub mod store;
pub mod types;

pub use error::CoreError;
pub use service::InterpolationService;
