//! Handlers for the `/videos` resource.
//!
//! Videos are identified by the opaque id assigned at upload. A video must
//! be ingested (or initialized from the store) before its frames can be
//! read.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use posefill_core::ingest::{parse_document, IngestOptions};
use posefill_core::sample::SparseSequence;
use posefill_core::store;
use posefill_core::types::FrameIndex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Widest range served in one request.
const MAX_RANGE_FRAMES: usize = 1000;

// ---------------------------------------------------------------------------
// Query / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct IngestParams {
    /// Apply the renderer coordinate transform (default: true).
    pub renderer_transform: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct FrameRangeParams {
    pub start: FrameIndex,
    pub end: FrameIndex,
}

#[derive(Debug, Serialize)]
pub struct VideoSummary {
    pub video_id: String,
    pub total_frames: usize,
    pub fps: f64,
    pub source_frames: usize,
    pub gap_frames: usize,
    /// Cursors whose timing was updated to the new sequence.
    pub rebound_cursors: usize,
}

#[derive(Debug, Serialize)]
pub struct ClearedCache {
    pub cleared: usize,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Hand a sequence to the service and re-time any cursors already open on
/// the video.
async fn activate(state: &AppState, sequence: SparseSequence) -> AppResult<VideoSummary> {
    let video_id = sequence.video_id().to_string();
    let total_frames = sequence.total_frames();
    let source_frames = sequence.len();

    state.service.load_sequence(sequence)?;
    let info = state.service.playback_info(&video_id)?;
    let rebound_cursors = state.playback.write().await.rebind_video(&video_id, info)?;

    Ok(VideoSummary {
        video_id,
        total_frames,
        fps: info.fps,
        source_frames,
        gap_frames: total_frames - source_frames,
        rebound_cursors,
    })
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// GET /api/v1/videos
pub async fn list_videos(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(DataResponse {
        data: state.service.video_ids(),
    }))
}

/// POST /api/v1/videos/{video_id}/ingest
///
/// Accept a pose service document, persist its samples, and initialize
/// the video for frame access. A body that is not a pose document is
/// rejected as invalid input.
pub async fn ingest(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(params): Query<IngestParams>,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let options = IngestOptions {
        renderer_transform: params.renderer_transform.unwrap_or(true),
    };
    let sequence = parse_document(&body)?.into_sequence(video_id.as_str(), options)?;
    if sequence.is_empty() {
        return Err(AppError::BadRequest(
            "Pose document contains no frame with a detected person".into(),
        ));
    }

    state.store.save_sequence(sequence.clone()).await;
    let summary = activate(&state, sequence).await?;

    tracing::info!(
        video_id = %summary.video_id,
        total_frames = summary.total_frames,
        source_frames = summary.source_frames,
        "Ingested pose document",
    );

    Ok(DataResponse::created(summary))
}

/// POST /api/v1/videos/{video_id}/initialize
///
/// Reload the video's samples from the store and rebuild its gap map.
/// Clears the video's frame cache and statistics.
pub async fn initialize(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let sequence = store::load_sequence(state.store.as_ref(), &video_id).await?;
    let summary = activate(&state, sequence).await?;
    Ok(Json(DataResponse { data: summary }))
}

/// DELETE /api/v1/videos/{video_id}
///
/// Forget the video's state, stored samples and cursors.
pub async fn remove_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let known = state.service.remove(&video_id);
    let stored = state.store.delete(&video_id).await;
    if !known && !stored {
        return Err(posefill_core::CoreError::NotInitialized(video_id).into());
    }
    let cursors = state.playback.write().await.remove_video(&video_id);

    tracing::info!(video_id = %video_id, cursors, "Removed video");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// GET /api/v1/videos/{video_id}/frames/{index}
pub async fn get_frame(
    State(state): State<AppState>,
    Path((video_id, index)): Path<(String, FrameIndex)>,
) -> AppResult<impl IntoResponse> {
    let frame = state.service.get_frame(&video_id, index)?;
    Ok(DataResponse::ok(frame.as_ref()))
}

/// GET /api/v1/videos/{video_id}/frames?start=&end=
///
/// Inclusive range. Synthesis runs on the blocking pool since a wide
/// range of mesh frames is real CPU work.
pub async fn get_frame_range(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(params): Query<FrameRangeParams>,
) -> AppResult<impl IntoResponse> {
    let FrameRangeParams { start, end } = params;
    if end >= start && end - start >= MAX_RANGE_FRAMES {
        return Err(AppError::BadRequest(format!(
            "Range may span at most {MAX_RANGE_FRAMES} frames"
        )));
    }

    let service = state.service.clone();
    let frames = tokio::task::spawn_blocking(move || service.get_frame_range(&video_id, start, end))
        .await
        .map_err(|e| AppError::InternalError(format!("Frame range task failed: {e}")))??;

    let frames: Vec<_> = frames.iter().map(AsRef::as_ref).collect();
    Ok(DataResponse::ok(frames))
}

// ---------------------------------------------------------------------------
// Statistics and cache
// ---------------------------------------------------------------------------

/// GET /api/v1/videos/{video_id}/statistics
pub async fn get_statistics(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let stats = state.service.get_statistics(&video_id)?;
    Ok(Json(DataResponse { data: stats }))
}

/// DELETE /api/v1/videos/{video_id}/cache
pub async fn clear_video_cache(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    if !state.service.is_initialized(&video_id) {
        return Err(posefill_core::CoreError::NotInitialized(video_id).into());
    }
    let cleared = state.service.clear_cache(Some(&video_id));
    Ok(Json(DataResponse {
        data: ClearedCache { cleared },
    }))
}

/// DELETE /api/v1/cache
pub async fn clear_all_caches(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let cleared = state.service.clear_cache(None);
    Ok(Json(DataResponse {
        data: ClearedCache { cleared },
    }))
}
