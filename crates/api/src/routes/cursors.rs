//! Route definitions for playback cursors.
//!
//! Mounted at `/cursors`.
//!
//! ```text
//! GET    /                  list_cursors
//! POST   /                  create_cursor
//! POST   /tick              tick
//! POST   /play-all          play_all
//! POST   /pause-all         pause_all
//! GET    /{id}              get_cursor
//! DELETE /{id}              delete_cursor
//! POST   /{id}/play         play
//! POST   /{id}/pause        pause
//! POST   /{id}/seek         seek
//! POST   /{id}/sync         sync
//! POST   /{id}/advance      advance
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::cursors;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cursors::list_cursors).post(cursors::create_cursor))
        .route("/tick", post(cursors::tick))
        .route("/play-all", post(cursors::play_all))
        .route("/pause-all", post(cursors::pause_all))
        .route(
            "/{id}",
            get(cursors::get_cursor).delete(cursors::delete_cursor),
        )
        .route("/{id}/play", post(cursors::play))
        .route("/{id}/pause", post(cursors::pause))
        .route("/{id}/seek", post(cursors::seek))
        .route("/{id}/sync", post(cursors::sync))
        .route("/{id}/advance", post(cursors::advance))
}
