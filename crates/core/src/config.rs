//! Interpolation policy applied on top of gap analysis.
//!
//! The gap analyzer treats a 1-frame and a 200-frame gap identically.
//! Whether very wide gaps should still be filled is a deployment decision,
//! expressed here and enforced by [`crate::service::InterpolationService`].

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// WideGapAction
// ---------------------------------------------------------------------------

/// What to do with a frame whose gap exceeds `max_gap_frames`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WideGapAction {
    /// Fill it like any other gap.
    #[default]
    Interpolate,
    /// Fill it, but mark the frame degraded.
    Flag,
    /// Refuse with [`CoreError::GapTooWide`].
    Reject,
}

impl WideGapAction {
    /// Parse `"interpolate"`, `"flag"` or `"reject"` (case-insensitive).
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interpolate" => Ok(Self::Interpolate),
            "flag" => Ok(Self::Flag),
            "reject" => Ok(Self::Reject),
            other => Err(CoreError::InvalidInput(format!(
                "Unknown wide gap action '{other}'. Expected interpolate, flag or reject"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// InterpolationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InterpolationConfig {
    /// Widest gap (in missing frames) filled without applying
    /// `wide_gap_action`. `None` means no limit.
    pub max_gap_frames: Option<usize>,
    pub wide_gap_action: WideGapAction,
}

impl InterpolationConfig {
    pub fn new(max_gap_frames: Option<usize>, wide_gap_action: WideGapAction) -> Result<Self, CoreError> {
        let config = Self {
            max_gap_frames,
            wide_gap_action,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_gap_frames == Some(0) {
            return Err(CoreError::InvalidInput(
                "max_gap_frames must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }

    /// The action that applies to a gap of `width` frames, if any.
    pub fn action_for(&self, width: usize) -> Option<WideGapAction> {
        match self.max_gap_frames {
            Some(max) if width > max => Some(self.wide_gap_action),
            _ => None,
        }
    }
}
