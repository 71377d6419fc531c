use crate::types::{CursorId, FrameIndex, VideoId};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Frame {index} is out of range for video {video_id} ({total_frames} frames)")]
    OutOfRange {
        video_id: VideoId,
        index: FrameIndex,
        total_frames: usize,
    },

    #[error("Video {0} has not been initialized")]
    NotInitialized(VideoId),

    #[error("Source sample {index} of video {video_id} is not resident")]
    SampleUnavailable { video_id: VideoId, index: FrameIndex },

    #[error("Frame {index} of video {video_id} lies in a gap of {width} frames (max {max})")]
    GapTooWide {
        video_id: VideoId,
        index: FrameIndex,
        width: usize,
        max: usize,
    },

    #[error("Cannot {action} a cursor that is {from}")]
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },

    #[error("Cursor {0} not found")]
    CursorNotFound(CursorId),

    #[error("Storage error: {0}")]
    Storage(String),
}
