//! Playback cursors: wall-clock time to frame index.
//!
//! A [`PlaybackCursor`] tracks one view's position in one video. It holds
//! no pose data, only its video time, the video's declared fps and frame
//! count, and a small state machine:
//!
//! ```text
//! stopped --play--> playing --pause--> stopped
//! stopped|playing --begin_seek--> seeking --end_seek--> (previous state)
//! ```
//!
//! [`PlaybackSync`] owns every cursor of a session and fans a shared play
//! signal (`tick`) out to each playing cursor. Cursors never share state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::sample::{validate_fps, validate_total_frames};
use crate::service::{InterpolationService, PlaybackInfo};
use crate::types::{CursorId, FrameIndex, VideoId};

/// Tolerance when flooring `time * fps`, so that `frame_time(i)` maps back
/// to `i` despite rounding.
const INDEX_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Cursor state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum CursorState {
    Stopped,
    Playing,
    /// A scrub is in progress. `resume_playing` records the state to
    /// return to on `end_seek`.
    Seeking { resume_playing: bool },
}

impl CursorState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Playing => "playing",
            Self::Seeking { .. } => "seeking",
        }
    }
}

/// Serializable view of a cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorSnapshot {
    pub id: CursorId,
    pub video_id: VideoId,
    pub state: CursorState,
    pub frame_index: FrameIndex,
    pub video_time: f64,
    pub fps: f64,
    pub total_frames: usize,
    pub playback_rate: f64,
}

// ---------------------------------------------------------------------------
// PlaybackCursor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PlaybackCursor {
    id: CursorId,
    video_id: VideoId,
    total_frames: usize,
    fps: f64,
    playback_rate: f64,
    video_time: f64,
    state: CursorState,
}

impl PlaybackCursor {
    /// A stopped cursor at frame 0.
    pub fn new(video_id: impl Into<VideoId>, info: PlaybackInfo) -> Result<Self, CoreError> {
        validate_fps(info.fps)?;
        validate_total_frames(info.total_frames)?;
        Ok(Self {
            id: CursorId::new_v4(),
            video_id: video_id.into(),
            total_frames: info.total_frames,
            fps: info.fps,
            playback_rate: 1.0,
            video_time: 0.0,
            state: CursorState::Stopped,
        })
    }

    pub fn id(&self) -> CursorId {
        self.id
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn video_time(&self) -> f64 {
        self.video_time
    }

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    /// Current frame index, always in `[0, total_frames - 1]`.
    pub fn frame_index(&self) -> FrameIndex {
        self.index_for_time(self.video_time)
    }

    /// Presentation time of frame `index` in seconds.
    pub fn frame_time(&self, index: FrameIndex) -> f64 {
        index as f64 / self.fps
    }

    pub fn snapshot(&self) -> CursorSnapshot {
        CursorSnapshot {
            id: self.id,
            video_id: self.video_id.clone(),
            state: self.state,
            frame_index: self.frame_index(),
            video_time: self.video_time,
            fps: self.fps,
            total_frames: self.total_frames,
            playback_rate: self.playback_rate,
        }
    }

    pub fn set_playback_rate(&mut self, rate: f64) -> Result<(), CoreError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(CoreError::InvalidInput(format!(
                "playback rate must be a positive finite number, got {rate}"
            )));
        }
        self.playback_rate = rate;
        Ok(())
    }

    // -- transport -------------------------------------------------------------

    pub fn play(&mut self) -> Result<(), CoreError> {
        match self.state {
            CursorState::Playing => Ok(()),
            CursorState::Stopped => {
                self.state = CursorState::Playing;
                Ok(())
            }
            CursorState::Seeking { .. } => Err(self.invalid("play")),
        }
    }

    pub fn pause(&mut self) -> Result<(), CoreError> {
        match self.state {
            CursorState::Stopped => Ok(()),
            CursorState::Playing => {
                self.state = CursorState::Stopped;
                Ok(())
            }
            CursorState::Seeking { .. } => Err(self.invalid("pause")),
        }
    }

    /// Advance by `elapsed` wall-clock seconds. Only a playing cursor moves.
    ///
    /// Reaching the last frame clamps there and stops the cursor.
    pub fn advance(&mut self, elapsed: f64) -> Result<FrameIndex, CoreError> {
        if !elapsed.is_finite() || elapsed < 0.0 {
            return Err(CoreError::InvalidInput(format!(
                "elapsed time must be a non-negative finite number, got {elapsed}"
            )));
        }
        if self.state != CursorState::Playing {
            return Ok(self.frame_index());
        }

        self.video_time += elapsed * self.playback_rate;
        let last = self.total_frames - 1;
        if self.index_for_time(self.video_time) >= last {
            self.video_time = self.video_time.min(self.frame_time(last));
            self.state = CursorState::Stopped;
            tracing::debug!(cursor_id = %self.id, video_id = %self.video_id, "Cursor reached end of video");
            return Ok(last);
        }
        Ok(self.frame_index())
    }

    /// Jump to `time` seconds: `begin_seek`, `scrub_to_time` and `end_seek`
    /// as one step. A playing cursor keeps playing from there. On error the
    /// cursor is unchanged.
    pub fn seek_to_time(&mut self, time: f64) -> Result<FrameIndex, CoreError> {
        if matches!(self.state, CursorState::Seeking { .. }) {
            return Err(self.invalid("seek"));
        }
        self.anchor(time)?;
        Ok(self.frame_index())
    }

    pub fn begin_seek(&mut self) -> Result<(), CoreError> {
        let resume_playing = match self.state {
            CursorState::Playing => true,
            CursorState::Stopped => false,
            CursorState::Seeking { .. } => return Err(self.invalid("begin seeking")),
        };
        self.state = CursorState::Seeking { resume_playing };
        Ok(())
    }

    /// Move a seeking cursor without leaving the seeking state.
    pub fn scrub_to_time(&mut self, time: f64) -> Result<FrameIndex, CoreError> {
        if !matches!(self.state, CursorState::Seeking { .. }) {
            return Err(self.invalid("scrub"));
        }
        self.anchor(time)?;
        Ok(self.frame_index())
    }

    pub fn end_seek(&mut self) -> Result<(), CoreError> {
        let CursorState::Seeking { resume_playing } = self.state else {
            return Err(self.invalid("end seeking"));
        };
        self.state = if resume_playing {
            CursorState::Playing
        } else {
            CursorState::Stopped
        };
        Ok(())
    }

    /// Re-anchor to the video element's reported time without changing
    /// state. Used to correct drift between the cursor and the element.
    pub fn sync_to_video_time(&mut self, time: f64) -> Result<FrameIndex, CoreError> {
        self.anchor(time)?;
        Ok(self.frame_index())
    }

    /// Adopt new timing facts after the video was re-initialized.
    pub fn rebind(&mut self, info: PlaybackInfo) -> Result<(), CoreError> {
        validate_fps(info.fps)?;
        validate_total_frames(info.total_frames)?;
        self.fps = info.fps;
        self.total_frames = info.total_frames;
        self.video_time = self.video_time.min(self.frame_time(self.total_frames - 1));
        Ok(())
    }

    fn anchor(&mut self, time: f64) -> Result<(), CoreError> {
        if !time.is_finite() {
            return Err(CoreError::InvalidInput(format!(
                "video time must be finite, got {time}"
            )));
        }
        let end = self.frame_time(self.total_frames - 1);
        self.video_time = time.clamp(0.0, end);
        Ok(())
    }

    fn index_for_time(&self, time: f64) -> FrameIndex {
        let raw = (time * self.fps + INDEX_EPSILON).floor();
        if raw <= 0.0 {
            return 0;
        }
        (raw as FrameIndex).min(self.total_frames - 1)
    }

    fn invalid(&self, action: &'static str) -> CoreError {
        CoreError::InvalidTransition {
            from: self.state.label(),
            action,
        }
    }
}

// ---------------------------------------------------------------------------
// PlaybackSync
// ---------------------------------------------------------------------------

/// Registry of independent cursors driven by a shared play signal.
#[derive(Debug, Default)]
pub struct PlaybackSync {
    cursors: HashMap<CursorId, PlaybackCursor>,
}

impl PlaybackSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stopped cursor for an initialized video.
    pub fn create_cursor(
        &mut self,
        service: &InterpolationService,
        video_id: &str,
    ) -> Result<CursorId, CoreError> {
        let info = service.playback_info(video_id)?;
        let cursor = PlaybackCursor::new(video_id, info)?;
        let id = cursor.id();
        tracing::debug!(cursor_id = %id, video_id, fps = info.fps, "Created playback cursor");
        self.cursors.insert(id, cursor);
        Ok(id)
    }

    pub fn remove_cursor(&mut self, id: CursorId) -> Result<PlaybackCursor, CoreError> {
        self.cursors.remove(&id).ok_or(CoreError::CursorNotFound(id))
    }

    pub fn cursor(&self, id: CursorId) -> Result<&PlaybackCursor, CoreError> {
        self.cursors.get(&id).ok_or(CoreError::CursorNotFound(id))
    }

    pub fn cursor_mut(&mut self, id: CursorId) -> Result<&mut PlaybackCursor, CoreError> {
        self.cursors.get_mut(&id).ok_or(CoreError::CursorNotFound(id))
    }

    /// Start every stopped cursor. Seeking cursors are left alone.
    /// Returns how many cursors started.
    pub fn play_all(&mut self) -> usize {
        let mut started = 0;
        for cursor in self.cursors.values_mut() {
            if cursor.state() == CursorState::Stopped && cursor.play().is_ok() {
                started += 1;
            }
        }
        started
    }

    /// Stop every playing cursor. Returns how many cursors stopped.
    pub fn pause_all(&mut self) -> usize {
        let mut stopped = 0;
        for cursor in self.cursors.values_mut() {
            if cursor.state() == CursorState::Playing && cursor.pause().is_ok() {
                stopped += 1;
            }
        }
        stopped
    }

    /// Advance every playing cursor by the same wall-clock delta.
    ///
    /// Each cursor computes its index from its own video time and fps.
    /// Returns snapshots of the cursors that were playing, ordered by id.
    pub fn tick(&mut self, elapsed: f64) -> Result<Vec<CursorSnapshot>, CoreError> {
        if !elapsed.is_finite() || elapsed < 0.0 {
            return Err(CoreError::InvalidInput(format!(
                "elapsed time must be a non-negative finite number, got {elapsed}"
            )));
        }

        let mut advanced = Vec::new();
        for cursor in self.cursors.values_mut() {
            if cursor.state() == CursorState::Playing {
                cursor.advance(elapsed)?;
                advanced.push(cursor.snapshot());
            }
        }
        advanced.sort_by_key(|s| s.id);
        Ok(advanced)
    }

    /// Propagate a video's new timing to its cursors. Returns how many
    /// cursors were updated.
    pub fn rebind_video(&mut self, video_id: &str, info: PlaybackInfo) -> Result<usize, CoreError> {
        let mut updated = 0;
        for cursor in self.cursors.values_mut().filter(|c| c.video_id == video_id) {
            cursor.rebind(info)?;
            updated += 1;
        }
        Ok(updated)
    }

    /// Drop every cursor bound to `video_id`. Returns how many were dropped.
    pub fn remove_video(&mut self, video_id: &str) -> usize {
        let before = self.cursors.len();
        self.cursors.retain(|_, c| c.video_id != video_id);
        before - self.cursors.len()
    }

    pub fn snapshots(&self) -> Vec<CursorSnapshot> {
        let mut all: Vec<_> = self.cursors.values().map(PlaybackCursor::snapshot).collect();
        all.sort_by_key(|s| s.id);
        all
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn cursor(total_frames: usize, fps: f64) -> PlaybackCursor {
        PlaybackCursor::new("v", PlaybackInfo { total_frames, fps }).unwrap()
    }

    // -- timing ----------------------------------------------------------------

    #[test]
    fn advance_uses_declared_fps() {
        let mut film = cursor(1000, 24.0);
        let mut game = cursor(1000, 60.0);
        film.play().unwrap();
        game.play().unwrap();

        assert_eq!(film.advance(1.0).unwrap(), 24);
        assert_eq!(game.advance(1.0).unwrap(), 60);
    }

    #[test]
    fn frame_time_round_trips_to_index() {
        let c = cursor(500, 29.97);
        for index in [0, 1, 7, 299, 499] {
            let mut probe = c.clone();
            assert_eq!(probe.sync_to_video_time(c.frame_time(index)).unwrap(), index);
        }
    }

    #[test]
    fn indices_are_monotonic_and_bounded() {
        let mut c = cursor(90, 30.0);
        c.play().unwrap();
        let mut previous = 0;
        for step in [0.0, 0.01, 0.033, 0.5, 0.016, 0.2, 1.7, 0.9] {
            let index = c.advance(step).unwrap();
            assert!(index >= previous);
            assert!(index < 90);
            previous = index;
        }
    }

    #[test]
    fn reaching_the_end_stops_playback() {
        let mut c = cursor(10, 10.0);
        c.play().unwrap();
        assert_eq!(c.advance(5.0).unwrap(), 9);
        assert_eq!(c.state(), CursorState::Stopped);
        assert_eq!(c.advance(1.0).unwrap(), 9);
    }

    #[test]
    fn stopped_cursor_does_not_move() {
        let mut c = cursor(100, 30.0);
        assert_eq!(c.advance(2.0).unwrap(), 0);
    }

    #[test]
    fn playback_rate_scales_advance() {
        let mut c = cursor(1000, 30.0);
        c.set_playback_rate(2.0).unwrap();
        c.play().unwrap();
        assert_eq!(c.advance(1.0).unwrap(), 60);
        assert_matches!(c.set_playback_rate(0.0), Err(CoreError::InvalidInput(_)));
    }

    #[test]
    fn bad_elapsed_is_rejected() {
        let mut c = cursor(10, 30.0);
        c.play().unwrap();
        assert_matches!(c.advance(-0.1), Err(CoreError::InvalidInput(_)));
        assert_matches!(c.advance(f64::INFINITY), Err(CoreError::InvalidInput(_)));
    }

    // -- seeking ---------------------------------------------------------------

    #[test]
    fn seek_floors_and_clamps() {
        let mut c = cursor(100, 30.0);
        assert_eq!(c.seek_to_time(1.99).unwrap(), 59);
        assert_eq!(c.seek_to_time(-3.0).unwrap(), 0);
        assert_eq!(c.seek_to_time(1e6).unwrap(), 99);
        assert_matches!(c.seek_to_time(f64::NAN), Err(CoreError::InvalidInput(_)));
        assert_eq!(c.state(), CursorState::Stopped);
        assert_eq!(c.frame_index(), 99);
    }

    #[test]
    fn seek_while_playing_keeps_playing_from_new_origin() {
        let mut c = cursor(1000, 30.0);
        c.play().unwrap();
        c.advance(1.0).unwrap();
        assert_eq!(c.seek_to_time(10.0).unwrap(), 300);
        assert_eq!(c.state(), CursorState::Playing);
        assert_eq!(c.advance(1.0).unwrap(), 330);
    }

    #[test]
    fn scrubbing_holds_position_until_released() {
        let mut c = cursor(1000, 30.0);
        c.play().unwrap();
        c.begin_seek().unwrap();
        c.scrub_to_time(2.0).unwrap();
        assert_eq!(c.advance(5.0).unwrap(), 60);
        c.end_seek().unwrap();
        assert_eq!(c.state(), CursorState::Playing);
    }

    // -- state machine ---------------------------------------------------------

    #[test]
    fn play_and_pause_are_idempotent() {
        let mut c = cursor(10, 30.0);
        c.pause().unwrap();
        assert_eq!(c.state(), CursorState::Stopped);
        c.play().unwrap();
        c.play().unwrap();
        assert_eq!(c.state(), CursorState::Playing);
    }

    #[test]
    fn transitions_out_of_seeking_require_end_seek() {
        let mut c = cursor(10, 30.0);
        c.begin_seek().unwrap();
        assert_matches!(
            c.play(),
            Err(CoreError::InvalidTransition {
                from: "seeking",
                action: "play"
            })
        );
        assert_matches!(c.pause(), Err(CoreError::InvalidTransition { .. }));
        assert_matches!(c.begin_seek(), Err(CoreError::InvalidTransition { .. }));
        c.end_seek().unwrap();
        assert_matches!(c.end_seek(), Err(CoreError::InvalidTransition { from: "stopped", .. }));
        assert_matches!(c.scrub_to_time(1.0), Err(CoreError::InvalidTransition { .. }));
    }

    #[test]
    fn sync_corrects_drift_without_state_change() {
        let mut c = cursor(1000, 25.0);
        c.play().unwrap();
        c.advance(1.0).unwrap();
        assert_eq!(c.sync_to_video_time(1.2).unwrap(), 30);
        assert_eq!(c.state(), CursorState::Playing);
    }

    // -- registry --------------------------------------------------------------

    fn service_with(videos: &[(&str, usize, f64)]) -> InterpolationService {
        let service = InterpolationService::default();
        for &(id, total, fps) in videos {
            service.initialize(id, &[0], total, fps).unwrap();
        }
        service
    }

    #[test]
    fn create_requires_initialized_video() {
        let service = InterpolationService::default();
        let mut sync = PlaybackSync::new();
        assert_matches!(
            sync.create_cursor(&service, "missing"),
            Err(CoreError::NotInitialized(_))
        );
        assert!(sync.is_empty());
    }

    #[test]
    fn cursors_on_same_video_are_independent() {
        let service = service_with(&[("v", 300, 30.0)]);
        let mut sync = PlaybackSync::new();
        let a = sync.create_cursor(&service, "v").unwrap();
        let b = sync.create_cursor(&service, "v").unwrap();

        sync.cursor_mut(a).unwrap().seek_to_time(1.0).unwrap();
        sync.cursor_mut(b).unwrap().seek_to_time(5.0).unwrap();
        sync.cursor_mut(a).unwrap().play().unwrap();
        sync.tick(1.0).unwrap();

        assert_eq!(sync.cursor(a).unwrap().frame_index(), 60);
        assert_eq!(sync.cursor(b).unwrap().frame_index(), 150);
    }

    #[test]
    fn tick_drives_each_cursor_at_its_own_fps() {
        let service = service_with(&[("slow", 1000, 24.0), ("fast", 1000, 60.0)]);
        let mut sync = PlaybackSync::new();
        let slow = sync.create_cursor(&service, "slow").unwrap();
        let fast = sync.create_cursor(&service, "fast").unwrap();

        assert_eq!(sync.play_all(), 2);
        let advanced = sync.tick(0.5).unwrap();
        assert_eq!(advanced.len(), 2);
        assert_eq!(sync.cursor(slow).unwrap().frame_index(), 12);
        assert_eq!(sync.cursor(fast).unwrap().frame_index(), 30);

        assert_eq!(sync.pause_all(), 2);
        assert!(sync.tick(0.5).unwrap().is_empty());
    }

    #[test]
    fn rebind_clamps_to_new_length() {
        let service = service_with(&[("v", 300, 30.0)]);
        let mut sync = PlaybackSync::new();
        let id = sync.create_cursor(&service, "v").unwrap();
        sync.cursor_mut(id).unwrap().seek_to_time(9.0).unwrap();

        let updated = sync
            .rebind_video("v", PlaybackInfo { total_frames: 100, fps: 30.0 })
            .unwrap();
        assert_eq!(updated, 1);
        assert_eq!(sync.cursor(id).unwrap().frame_index(), 99);
    }

    #[test]
    fn removed_cursor_is_not_found() {
        let service = service_with(&[("v", 10, 30.0)]);
        let mut sync = PlaybackSync::new();
        let id = sync.create_cursor(&service, "v").unwrap();
        sync.remove_cursor(id).unwrap();
        assert_matches!(sync.cursor(id), Err(CoreError::CursorNotFound(missing)) if missing == id);
        assert_eq!(sync.remove_video("v"), 0);
    }
}
