//! Keypoint blending between two real samples.

use std::collections::{HashMap, HashSet};

use crate::sample::{Degradation, Keypoint, Side};

/// Result of blending two keypoint lists.
#[derive(Debug, Clone, PartialEq)]
pub struct KeypointBlend {
    pub keypoints: Vec<Keypoint>,
    pub degradations: Vec<Degradation>,
}

/// Blend keypoints matched by name.
///
/// - Matched pairs: position blended linearly; confidence never exceeds
///   the lower of the two source confidences.
/// - Keypoints present on one side only are duplicated from that side and
///   reported as [`Degradation::MissingKeypoint`]. Nothing is dropped.
///
/// Output order is `before`'s order followed by `after`-only keypoints in
/// `after`'s order. If a name repeats within one list, the first occurrence
/// is used for matching.
pub fn interpolate_keypoints(before: &[Keypoint], after: &[Keypoint], factor: f64) -> KeypointBlend {
    let mut after_by_name: HashMap<&str, &Keypoint> = HashMap::with_capacity(after.len());
    for kp in after {
        after_by_name.entry(kp.name.as_str()).or_insert(kp);
    }

    let mut keypoints = Vec::with_capacity(before.len().max(after.len()));
    let mut degradations = Vec::new();
    let mut seen: HashSet<&str> = HashSet::with_capacity(before.len());

    for b in before {
        if !seen.insert(b.name.as_str()) {
            continue;
        }
        match after_by_name.get(b.name.as_str()) {
            Some(a) => keypoints.push(blend_pair(b, a, factor)),
            None => {
                keypoints.push(b.clone());
                degradations.push(Degradation::MissingKeypoint {
                    name: b.name.clone(),
                    present_on: Side::Before,
                });
            }
        }
    }

    for a in after {
        if !seen.insert(a.name.as_str()) {
            continue;
        }
        keypoints.push(a.clone());
        degradations.push(Degradation::MissingKeypoint {
            name: a.name.clone(),
            present_on: Side::After,
        });
    }

    KeypointBlend {
        keypoints,
        degradations,
    }
}

fn blend_pair(before: &Keypoint, after: &Keypoint, factor: f64) -> Keypoint {
    let ceiling = before.confidence.min(after.confidence);
    let blended = crate::types::lerp(before.confidence, after.confidence, factor);

    Keypoint {
        name: before.name.clone(),
        position: before.position.lerp(after.position, factor),
        confidence: blended.min(ceiling).clamp(0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vec3;

    fn kp(name: &str, x: f64, confidence: f64) -> Keypoint {
        Keypoint::new(name, Vec3::new(x, 0.0, 0.0), confidence)
    }

    #[test]
    fn matched_keypoints_blend_position() {
        let blend = interpolate_keypoints(
            &[kp("head", 0.0, 0.9), kp("neck", 10.0, 0.9)],
            &[kp("neck", 20.0, 0.9), kp("head", 4.0, 0.9)],
            0.25,
        );
        assert!(blend.degradations.is_empty());
        assert_eq!(blend.keypoints[0].name, "head");
        assert_eq!(blend.keypoints[0].position.x, 1.0);
        assert_eq!(blend.keypoints[1].name, "neck");
        assert_eq!(blend.keypoints[1].position.x, 12.5);
    }

    #[test]
    fn confidence_never_exceeds_lower_source() {
        let blend = interpolate_keypoints(&[kp("wrist", 0.0, 0.95)], &[kp("wrist", 1.0, 0.40)], 0.1);
        assert!(blend.keypoints[0].confidence <= 0.40);
    }

    #[test]
    fn factor_zero_reproduces_before_when_it_is_less_confident() {
        let before = kp("knee", 3.25, 0.6);
        let blend = interpolate_keypoints(std::slice::from_ref(&before), &[kp("knee", 9.0, 0.8)], 0.0);
        assert_eq!(blend.keypoints[0], before);
    }

    #[test]
    fn one_sided_keypoints_are_duplicated_not_dropped() {
        let blend = interpolate_keypoints(
            &[kp("head", 0.0, 0.9), kp("left_hand", 5.0, 0.7)],
            &[kp("head", 2.0, 0.9), kp("right_hand", 8.0, 0.6)],
            0.5,
        );
        let names: Vec<_> = blend.keypoints.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["head", "left_hand", "right_hand"]);
        assert_eq!(blend.keypoints[1].position.x, 5.0);
        assert_eq!(blend.keypoints[2].position.x, 8.0);
        assert_eq!(
            blend.degradations,
            vec![
                Degradation::MissingKeypoint {
                    name: "left_hand".into(),
                    present_on: Side::Before
                },
                Degradation::MissingKeypoint {
                    name: "right_hand".into(),
                    present_on: Side::After
                },
            ]
        );
    }
}
