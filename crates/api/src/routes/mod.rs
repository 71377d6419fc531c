pub mod cursors;
pub mod health;
pub mod videos;

use axum::routing::delete;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /videos                                   list initialized videos
/// /videos/{video_id}                        remove (DELETE)
/// /videos/{video_id}/ingest                 ingest pose document (POST)
/// /videos/{video_id}/initialize             reload from store (POST)
/// /videos/{video_id}/frames                 frame range (GET ?start=&end=)
/// /videos/{video_id}/frames/{index}         single frame (GET)
/// /videos/{video_id}/statistics             interpolation statistics (GET)
/// /videos/{video_id}/cache                  clear video cache (DELETE)
///
/// /cache                                    clear every cache (DELETE)
///
/// /cursors                                  list, create (GET, POST)
/// /cursors/tick                             shared play signal (POST)
/// /cursors/play-all                         start every stopped cursor (POST)
/// /cursors/pause-all                        stop every playing cursor (POST)
/// /cursors/{id}                             get, remove (GET, DELETE)
/// /cursors/{id}/play                        play (POST)
/// /cursors/{id}/pause                       pause (POST)
/// /cursors/{id}/seek                        seek to video time (POST)
/// /cursors/{id}/sync                        drift correction (POST)
/// /cursors/{id}/advance                     advance and fetch frame (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/videos", videos::router())
        .route("/cache", delete(handlers::videos::clear_all_caches))
        .nest("/cursors", cursors::router())
}
