use serde::{Deserialize, Serialize};

/// Videos are identified by the opaque id the upload layer assigns.
pub type VideoId = String;

/// Frame indices are zero-based positions in the source video.
pub type FrameIndex = usize;

/// Playback cursors are identified by a random UUID.
pub type CursorId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// A point or translation in 3D space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Linear blend `self + (other - self) * t`.
    ///
    /// `t == 0.0` reproduces `self` bit-for-bit.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            x: lerp(self.x, other.x, t),
            y: lerp(self.y, other.y, t),
            z: lerp(self.z, other.z, t),
        }
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

/// Scalar linear blend. Written as `a + (b - a) * t` so that `t == 0`
/// returns `a` exactly.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
