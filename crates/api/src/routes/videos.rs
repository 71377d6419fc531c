//! Route definitions for per-video dense frame access.
//!
//! Mounted at `/videos`.
//!
//! ```text
//! GET    /                               list_videos
//! DELETE /{video_id}                     remove_video
//! POST   /{video_id}/ingest              ingest
//! POST   /{video_id}/initialize          initialize
//! GET    /{video_id}/frames              get_frame_range
//! GET    /{video_id}/frames/{index}      get_frame
//! GET    /{video_id}/statistics          get_statistics
//! DELETE /{video_id}/cache               clear_video_cache
//! ```

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::videos;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(videos::list_videos))
        .route("/{video_id}", delete(videos::remove_video))
        .route("/{video_id}/ingest", post(videos::ingest))
        .route("/{video_id}/initialize", post(videos::initialize))
        .route("/{video_id}/frames", get(videos::get_frame_range))
        .route("/{video_id}/frames/{index}", get(videos::get_frame))
        .route("/{video_id}/statistics", get(videos::get_statistics))
        .route("/{video_id}/cache", delete(videos::clear_video_cache))
}
