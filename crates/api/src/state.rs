use std::sync::Arc;

use posefill_core::playback::PlaybackSync;
use posefill_core::store::InMemorySampleStore;
use posefill_core::InterpolationService;
use tokio::sync::RwLock;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything lives behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Dense frame service. Internally synchronized.
    pub service: Arc<InterpolationService>,
    /// Persisted sparse samples, written by ingest and read by initialize.
    pub store: Arc<InMemorySampleStore>,
    /// Playback cursors of every connected view.
    pub playback: Arc<RwLock<PlaybackSync>>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let service = InterpolationService::new(config.interpolation);
        Self {
            config: Arc::new(config),
            service: Arc::new(service),
            store: Arc::new(InMemorySampleStore::new()),
            playback: Arc::new(RwLock::new(PlaybackSync::new())),
        }
    }
}
