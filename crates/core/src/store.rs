//! Sample storage collaborator.
//!
//! The service never fetches samples itself. Callers load them through a
//! [`SampleStore`] (usually via [`load_sequence`]) and hand them to
//! [`InterpolationService::load_sequence`](crate::service::InterpolationService::load_sequence).

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::CoreError;
use crate::sample::{Sample, SparseSequence};
use crate::types::{FrameIndex, VideoId};

/// Declared length and frame rate of a stored video.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub total_frames: usize,
    pub fps: f64,
}

/// Read access to persisted pose samples.
///
/// Implementations report failures as [`CoreError::Storage`] and unknown
/// videos as [`CoreError::NotInitialized`].
#[async_trait]
pub trait SampleStore: Send + Sync {
    async fn load_video_info(&self, video_id: &str) -> Result<VideoInfo, CoreError>;

    /// The real sample at `index`, or `None` if the pose pipeline produced
    /// nothing for that frame.
    async fn load_sample(&self, video_id: &str, index: FrameIndex) -> Result<Option<Sample>, CoreError>;

    /// Sorted indices of every stored sample.
    async fn load_source_indices(&self, video_id: &str) -> Result<Vec<FrameIndex>, CoreError>;
}

/// Fetch everything needed to initialize `video_id`.
///
/// Samples are requested concurrently. An index listed by
/// `load_source_indices` whose sample then comes back empty is a storage
/// inconsistency and fails the whole load.
pub async fn load_sequence<S>(store: &S, video_id: &str) -> Result<SparseSequence, CoreError>
where
    S: SampleStore + ?Sized,
{
    let (info, indices) = futures::try_join!(
        store.load_video_info(video_id),
        store.load_source_indices(video_id),
    )?;

    let samples = try_join_all(indices.iter().map(|&index| async move {
        store
            .load_sample(video_id, index)
            .await?
            .ok_or_else(|| CoreError::Storage(format!("sample {index} of video {video_id} is listed but missing")))
    }))
    .await?;

    tracing::debug!(video_id, samples = samples.len(), total_frames = info.total_frames, "Loaded sparse sequence");
    SparseSequence::new(video_id, info.total_frames, info.fps, samples)
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct StoredVideo {
    info: VideoInfo,
    samples: BTreeMap<FrameIndex, Sample>,
}

/// Process-local [`SampleStore`] used by the API server and tests.
#[derive(Debug, Default)]
pub struct InMemorySampleStore {
    videos: RwLock<HashMap<VideoId, StoredVideo>>,
}

impl InMemorySampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) a whole sequence.
    pub async fn save_sequence(&self, sequence: SparseSequence) {
        let video_id = sequence.video_id().to_string();
        let info = VideoInfo {
            total_frames: sequence.total_frames(),
            fps: sequence.fps(),
        };
        let samples = sequence
            .into_samples()
            .map(|sample| (sample.frame_index, sample))
            .collect();

        self.videos
            .write()
            .await
            .insert(video_id, StoredVideo { info, samples });
    }

    pub async fn delete(&self, video_id: &str) -> bool {
        self.videos.write().await.remove(video_id).is_some()
    }

    pub async fn contains(&self, video_id: &str) -> bool {
        self.videos.read().await.contains_key(video_id)
    }
}

#[async_trait]
impl SampleStore for InMemorySampleStore {
    async fn load_video_info(&self, video_id: &str) -> Result<VideoInfo, CoreError> {
        let videos = self.videos.read().await;
        videos
            .get(video_id)
            .map(|v| v.info)
            .ok_or_else(|| CoreError::NotInitialized(video_id.to_string()))
    }

    async fn load_sample(&self, video_id: &str, index: FrameIndex) -> Result<Option<Sample>, CoreError> {
        let videos = self.videos.read().await;
        let video = videos
            .get(video_id)
            .ok_or_else(|| CoreError::NotInitialized(video_id.to_string()))?;
        Ok(video.samples.get(&index).cloned())
    }

    async fn load_source_indices(&self, video_id: &str) -> Result<Vec<FrameIndex>, CoreError> {
        let videos = self.videos.read().await;
        let video = videos
            .get(video_id)
            .ok_or_else(|| CoreError::NotInitialized(video_id.to_string()))?;
        Ok(video.samples.keys().copied().collect())
    }
}
