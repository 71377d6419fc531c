//! Handlers for playback cursors.
//!
//! Cursors hold timing state only. `advance` is the one endpoint that also
//! returns pose data: the frame at the cursor's new index.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use posefill_core::playback::CursorSnapshot;
use posefill_core::sample::Frame;
use posefill_core::types::CursorId;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateCursor {
    pub video_id: String,
    /// Defaults to 1.0.
    pub playback_rate: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct VideoTime {
    /// Seconds from the start of the video.
    pub time: f64,
}

#[derive(Debug, Deserialize)]
pub struct Elapsed {
    /// Wall-clock seconds since the previous tick.
    pub elapsed: f64,
}

#[derive(Debug, Serialize)]
pub struct CursorFrame<'a> {
    pub cursor: CursorSnapshot,
    pub frame: &'a Frame,
}

#[derive(Debug, Serialize)]
pub struct Affected {
    pub cursors: usize,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// GET /api/v1/cursors
pub async fn list_cursors(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let snapshots = state.playback.read().await.snapshots();
    Ok(Json(DataResponse { data: snapshots }))
}

/// POST /api/v1/cursors
///
/// Open a stopped cursor at frame 0 of an initialized video.
pub async fn create_cursor(
    State(state): State<AppState>,
    Json(input): Json<CreateCursor>,
) -> AppResult<impl IntoResponse> {
    let mut playback = state.playback.write().await;
    let id = playback.create_cursor(&state.service, &input.video_id)?;

    if let Some(rate) = input.playback_rate {
        if let Err(e) = playback.cursor_mut(id).and_then(|c| c.set_playback_rate(rate)) {
            playback.remove_cursor(id)?;
            return Err(e.into());
        }
    }

    let snapshot = playback.cursor(id)?.snapshot();
    tracing::info!(cursor_id = %id, video_id = %input.video_id, "Cursor created");
    Ok(DataResponse::created(snapshot))
}

/// GET /api/v1/cursors/{id}
pub async fn get_cursor(
    State(state): State<AppState>,
    Path(id): Path<CursorId>,
) -> AppResult<impl IntoResponse> {
    let snapshot = state.playback.read().await.cursor(id)?.snapshot();
    Ok(Json(DataResponse { data: snapshot }))
}

/// DELETE /api/v1/cursors/{id}
pub async fn delete_cursor(
    State(state): State<AppState>,
    Path(id): Path<CursorId>,
) -> AppResult<impl IntoResponse> {
    state.playback.write().await.remove_cursor(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// POST /api/v1/cursors/{id}/play
pub async fn play(
    State(state): State<AppState>,
    Path(id): Path<CursorId>,
) -> AppResult<impl IntoResponse> {
    let mut playback = state.playback.write().await;
    let cursor = playback.cursor_mut(id)?;
    cursor.play()?;
    Ok(Json(DataResponse {
        data: cursor.snapshot(),
    }))
}

/// POST /api/v1/cursors/{id}/pause
pub async fn pause(
    State(state): State<AppState>,
    Path(id): Path<CursorId>,
) -> AppResult<impl IntoResponse> {
    let mut playback = state.playback.write().await;
    let cursor = playback.cursor_mut(id)?;
    cursor.pause()?;
    Ok(Json(DataResponse {
        data: cursor.snapshot(),
    }))
}

/// POST /api/v1/cursors/{id}/seek
///
/// A playing cursor keeps playing from the new time.
pub async fn seek(
    State(state): State<AppState>,
    Path(id): Path<CursorId>,
    Json(input): Json<VideoTime>,
) -> AppResult<impl IntoResponse> {
    let mut playback = state.playback.write().await;
    let cursor = playback.cursor_mut(id)?;
    cursor.seek_to_time(input.time)?;
    Ok(Json(DataResponse {
        data: cursor.snapshot(),
    }))
}

/// POST /api/v1/cursors/{id}/sync
///
/// Re-anchor to the video element's reported time without a state change.
pub async fn sync(
    State(state): State<AppState>,
    Path(id): Path<CursorId>,
    Json(input): Json<VideoTime>,
) -> AppResult<impl IntoResponse> {
    let mut playback = state.playback.write().await;
    let cursor = playback.cursor_mut(id)?;
    cursor.sync_to_video_time(input.time)?;
    Ok(Json(DataResponse {
        data: cursor.snapshot(),
    }))
}

/// POST /api/v1/cursors/{id}/advance
///
/// Advance one cursor and return the frame at its new index.
pub async fn advance(
    State(state): State<AppState>,
    Path(id): Path<CursorId>,
    Json(input): Json<Elapsed>,
) -> AppResult<impl IntoResponse> {
    let snapshot = {
        let mut playback = state.playback.write().await;
        let cursor = playback.cursor_mut(id)?;
        cursor.advance(input.elapsed)?;
        cursor.snapshot()
    };

    let frame = state
        .service
        .get_frame(&snapshot.video_id, snapshot.frame_index)?;
    Ok(DataResponse::ok(CursorFrame {
        cursor: snapshot,
        frame: frame.as_ref(),
    }))
}

// ---------------------------------------------------------------------------
// Shared play signal
// ---------------------------------------------------------------------------

/// POST /api/v1/cursors/tick
///
/// Advance every playing cursor by the same wall-clock delta.
pub async fn tick(
    State(state): State<AppState>,
    Json(input): Json<Elapsed>,
) -> AppResult<impl IntoResponse> {
    let advanced = state.playback.write().await.tick(input.elapsed)?;
    Ok(Json(DataResponse { data: advanced }))
}

/// POST /api/v1/cursors/play-all
pub async fn play_all(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let cursors = state.playback.write().await.play_all();
    Ok(Json(DataResponse {
        data: Affected { cursors },
    }))
}

/// POST /api/v1/cursors/pause-all
pub async fn pause_all(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let cursors = state.playback.write().await.pause_all();
    Ok(Json(DataResponse {
        data: Affected { cursors },
    }))
}
