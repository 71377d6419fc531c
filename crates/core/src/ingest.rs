//! Adapter from the pose service's JSON output to [`SparseSequence`].
//!
//! The pose service emits one entry per processed frame with a list of
//! tracked persons. Only the first person is used. Frames with no persons
//! are treated as gaps, the same as frames the service never emitted.
//!
//! Mesh vertices arrive in the model's camera space. Renderers expect
//! them rotated 180 degrees about X, and the camera translation mirrored in
//! X; [`IngestOptions::renderer_transform`] applies both.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::sample::{validate_fps, validate_total_frames, Face, Keypoint, Sample, SparseSequence};
use crate::types::{FrameIndex, Vec3, VideoId};

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoseDocument {
    pub total_frames: usize,
    pub fps: f64,
    #[serde(default)]
    pub frames: Vec<PoseFrame>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoseFrame {
    pub frame_number: FrameIndex,
    #[serde(default)]
    pub persons: Vec<PosePerson>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosePerson {
    #[serde(default)]
    pub person_id: Option<i64>,
    #[serde(default = "full_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub keypoints: Vec<PoseKeypoint>,
    #[serde(default)]
    pub mesh_vertices: Vec<[f64; 3]>,
    #[serde(default)]
    pub mesh_faces: Vec<Face>,
    #[serde(default)]
    pub camera: Option<PoseCamera>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseKeypoint {
    pub name: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    /// Falls back to the person's confidence when absent.
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseCamera {
    pub tx: f64,
    pub ty: f64,
    pub tz: f64,
}

fn full_confidence() -> f64 {
    1.0
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    /// Rotate vertices into renderer space and mirror the camera in X.
    pub renderer_transform: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            renderer_transform: true,
        }
    }
}

/// Parse a pose service document.
pub fn parse_document(bytes: &[u8]) -> Result<PoseDocument, CoreError> {
    serde_json::from_slice(bytes)
        .map_err(|e| CoreError::InvalidInput(format!("Malformed pose document: {e}")))
}

impl PoseDocument {
    pub fn into_sequence(
        self,
        video_id: impl Into<VideoId>,
        options: IngestOptions,
    ) -> Result<SparseSequence, CoreError> {
        let video_id = video_id.into();
        validate_total_frames(self.total_frames)?;
        validate_fps(self.fps)?;

        let emitted = self.frames.len();
        let fps = self.fps;
        let samples: Vec<Sample> = self
            .frames
            .into_iter()
            .filter_map(|frame| {
                let index = frame.frame_number;
                let person = frame.persons.into_iter().next()?;
                Some(person_to_sample(person, index, fps, options))
            })
            .collect();

        if samples.len() < emitted {
            tracing::debug!(
                video_id = %video_id,
                emitted,
                kept = samples.len(),
                "Skipped pose frames without a detected person",
            );
        }

        SparseSequence::new(video_id, self.total_frames, fps, samples)
    }
}

fn person_to_sample(person: PosePerson, index: FrameIndex, fps: f64, options: IngestOptions) -> Sample {
    let keypoints = person
        .keypoints
        .into_iter()
        .map(|kp| {
            let confidence = kp.confidence.unwrap_or(person.confidence).clamp(0.0, 1.0);
            Keypoint::new(kp.name, Vec3::new(kp.x, kp.y, kp.z), confidence)
        })
        .collect();

    let vertices = person
        .mesh_vertices
        .into_iter()
        .map(Vec3::from)
        .map(|v| {
            if options.renderer_transform {
                Vec3::new(v.x, -v.y, -v.z)
            } else {
                v
            }
        })
        .collect();

    let camera_translation = person.camera.map(|c| {
        let tx = if options.renderer_transform { -c.tx } else { c.tx };
        Vec3::new(tx, c.ty, c.tz)
    });

    Sample {
        frame_index: index,
        timestamp: index as f64 / fps,
        keypoints,
        vertices,
        faces: person.mesh_faces,
        camera_translation,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn document() -> serde_json::Value {
        json!({
            "totalFrames": 6,
            "fps": 24.0,
            "frames": [
                {
                    "frameNumber": 0,
                    "timestamp": 0.0,
                    "persons": [{
                        "personId": 1,
                        "confidence": 0.8,
                        "keypoints": [
                            { "name": "pelvis", "x": 0.5, "y": 0.4, "z": 0.1, "confidence": 0.95 },
                            { "name": "head", "x": 0.5, "y": 0.1 }
                        ],
                        "meshVertices": [[1.0, 2.0, 3.0]],
                        "meshFaces": [[0, 0, 0]],
                        "camera": { "tx": 0.2, "ty": 0.1, "tz": 45.0 }
                    }, {
                        "personId": 2,
                        "confidence": 0.4
                    }]
                },
                { "frameNumber": 2, "persons": [] },
                { "frameNumber": 4, "persons": [{ "confidence": 0.5 }] }
            ]
        })
    }

    fn parse(value: serde_json::Value) -> PoseDocument {
        parse_document(value.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn frames_without_persons_become_gaps() {
        let seq = parse(document()).into_sequence("v", IngestOptions::default()).unwrap();
        assert_eq!(seq.source_indices(), vec![0, 4]);
        assert_eq!(seq.fps(), 24.0);
    }

    #[test]
    fn timestamps_come_from_declared_fps() {
        let seq = parse(document()).into_sequence("v", IngestOptions::default()).unwrap();
        let sample = seq.get(4).unwrap();
        assert!((sample.timestamp - 4.0 / 24.0).abs() < 1e-12);
    }

    #[test]
    fn first_person_is_used_and_confidence_falls_back() {
        let seq = parse(document()).into_sequence("v", IngestOptions::default()).unwrap();
        let sample = seq.get(0).unwrap();
        assert_eq!(sample.keypoints.len(), 2);
        assert_eq!(sample.keypoints[0].confidence, 0.95);
        assert_eq!(sample.keypoints[1].confidence, 0.8);
        assert_eq!(sample.faces, vec![[0, 0, 0]]);
    }

    #[test]
    fn renderer_transform_is_applied_to_mesh_and_camera() {
        let seq = parse(document()).into_sequence("v", IngestOptions::default()).unwrap();
        let sample = seq.get(0).unwrap();
        assert_eq!(sample.vertices, vec![Vec3::new(1.0, -2.0, -3.0)]);
        assert_eq!(sample.camera_translation, Some(Vec3::new(-0.2, 0.1, 45.0)));
        assert_eq!(sample.keypoints[0].position, Vec3::new(0.5, 0.4, 0.1));

        let raw = parse(document())
            .into_sequence("v", IngestOptions { renderer_transform: false })
            .unwrap();
        assert_eq!(raw.get(0).unwrap().vertices, vec![Vec3::new(1.0, 2.0, 3.0)]);
    }

    #[test]
    fn missing_fps_is_rejected() {
        let mut doc = document();
        doc.as_object_mut().unwrap().remove("fps");
        assert_matches!(
            parse_document(doc.to_string().as_bytes()),
            Err(CoreError::InvalidInput(_))
        );

        let mut doc = document();
        doc["fps"] = json!(0.0);
        assert_matches!(
            parse(doc).into_sequence("v", IngestOptions::default()),
            Err(CoreError::InvalidInput(_))
        );
    }

    #[test]
    fn frame_past_end_is_rejected() {
        let mut doc = document();
        doc["frames"][2]["frameNumber"] = json!(6);
        assert_matches!(
            parse(doc).into_sequence("v", IngestOptions::default()),
            Err(CoreError::InvalidInput(_))
        );
    }
}
