//! Mesh vertex and camera translation blending.
//!
//! The upstream body model occasionally emits meshes with a different
//! vertex count than its neighbours. Those samples are repaired by padding
//! rather than rejected: mesh data drives visualization only, so a
//! slightly wrong mesh is preferred over a missing one.

use crate::sample::{Degradation, Face, Sample, Side};
use crate::types::Vec3;

/// Result of blending two meshes.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshBlend {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<Face>,
    pub camera_translation: Option<Vec3>,
    pub degradations: Vec<Degradation>,
}

/// Blend the mesh and camera of two samples.
///
/// - Equal vertex counts blend element-wise.
/// - Unequal counts: the shorter list is padded with repeats of its own last
///   vertex up to the longer count, then blended. Flagged as
///   [`Degradation::VertexCountMismatch`].
/// - One side without vertices: the other side's mesh is duplicated.
/// - Faces come from `before` when `factor < 0.5`, otherwise from `after`.
pub fn interpolate_mesh(before: &Sample, after: &Sample, factor: f64) -> MeshBlend {
    let mut degradations = Vec::new();

    let (vertices, faces) = match (before.vertices.is_empty(), after.vertices.is_empty()) {
        (true, true) => (Vec::new(), closer_faces(before, after, factor).to_vec()),
        (false, true) => {
            degradations.push(Degradation::MissingMesh {
                present_on: Side::Before,
            });
            (before.vertices.clone(), before.faces.clone())
        }
        (true, false) => {
            degradations.push(Degradation::MissingMesh {
                present_on: Side::After,
            });
            (after.vertices.clone(), after.faces.clone())
        }
        (false, false) => {
            let (b, a) = (before.vertices.len(), after.vertices.len());
            if b != a {
                tracing::debug!(
                    before_frame = before.frame_index,
                    after_frame = after.frame_index,
                    before_vertices = b,
                    after_vertices = a,
                    "Vertex count mismatch, padding shorter mesh",
                );
                degradations.push(Degradation::VertexCountMismatch {
                    before: b,
                    after: a,
                });
            }
            (
                blend_vertices(&before.vertices, &after.vertices, factor),
                closer_faces(before, after, factor).to_vec(),
            )
        }
    };

    let camera_translation = match (before.camera_translation, after.camera_translation) {
        (Some(b), Some(a)) => Some(b.lerp(a, factor)),
        (Some(only), None) | (None, Some(only)) => Some(only),
        (None, None) => None,
    };

    MeshBlend {
        vertices,
        faces,
        camera_translation,
        degradations,
    }
}

/// Blend two non-empty vertex lists, padding the shorter one with its last vertex.
fn blend_vertices(before: &[Vec3], after: &[Vec3], factor: f64) -> Vec<Vec3> {
    let len = before.len().max(after.len());
    let pad_before = before[before.len() - 1];
    let pad_after = after[after.len() - 1];

    (0..len)
        .map(|i| {
            let b = before.get(i).copied().unwrap_or(pad_before);
            let a = after.get(i).copied().unwrap_or(pad_after);
            b.lerp(a, factor)
        })
        .collect()
}

fn closer_faces<'a>(before: &'a Sample, after: &'a Sample, factor: f64) -> &'a [Face] {
    if factor < 0.5 {
        &before.faces
    } else {
        &after.faces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh(index: usize, xs: &[f64], faces: Vec<Face>) -> Sample {
        let mut sample = Sample::empty(index, 30.0);
        sample.vertices = xs.iter().map(|&x| Vec3::new(x, 0.0, 0.0)).collect();
        sample.faces = faces;
        sample
    }

    #[test]
    fn equal_counts_blend_element_wise() {
        let blend = interpolate_mesh(
            &mesh(0, &[0.0, 10.0], vec![]),
            &mesh(2, &[2.0, 20.0], vec![]),
            0.5,
        );
        assert!(blend.degradations.is_empty());
        assert_eq!(blend.vertices, vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(15.0, 0.0, 0.0)]);
    }

    #[test]
    fn mismatched_counts_pad_shorter_mesh_with_its_last_vertex() {
        let before_xs: Vec<f64> = (0..6890).map(|i| i as f64).collect();
        let after_xs: Vec<f64> = (0..6888).map(|i| i as f64 + 2.0).collect();
        let blend = interpolate_mesh(
            &mesh(0, &before_xs, vec![]),
            &mesh(1, &after_xs, vec![]),
            0.5,
        );

        assert_eq!(blend.vertices.len(), 6890);
        // After's last vertex is x = 6889; the two padded slots reuse it.
        assert_eq!(blend.vertices[6888].x, (6888.0 + 6889.0) / 2.0);
        assert_eq!(blend.vertices[6889].x, (6889.0 + 6889.0) / 2.0);
        assert_eq!(
            blend.degradations,
            vec![Degradation::VertexCountMismatch {
                before: 6890,
                after: 6888
            }]
        );
    }

    #[test]
    fn faces_follow_the_closer_sample() {
        let before = mesh(0, &[0.0, 1.0, 2.0], vec![[0, 1, 2]]);
        let after = mesh(4, &[0.0, 1.0, 2.0], vec![[2, 1, 0]]);
        assert_eq!(interpolate_mesh(&before, &after, 0.25).faces, vec![[0, 1, 2]]);
        assert_eq!(interpolate_mesh(&before, &after, 0.5).faces, vec![[2, 1, 0]]);
    }

    #[test]
    fn missing_mesh_duplicates_the_other_side() {
        let before = mesh(0, &[], vec![]);
        let after = mesh(2, &[5.0], vec![[0, 0, 0]]);
        let blend = interpolate_mesh(&before, &after, 0.1);
        assert_eq!(blend.vertices, after.vertices);
        assert_eq!(blend.faces, after.faces);
        assert_eq!(
            blend.degradations,
            vec![Degradation::MissingMesh {
                present_on: Side::After
            }]
        );
    }

    #[test]
    fn camera_translation_blends_or_duplicates() {
        let mut before = mesh(0, &[], vec![]);
        let mut after = mesh(2, &[], vec![]);
        before.camera_translation = Some(Vec3::new(0.0, 0.0, 10.0));
        after.camera_translation = Some(Vec3::new(2.0, 0.0, 20.0));
        assert_eq!(
            interpolate_mesh(&before, &after, 0.5).camera_translation,
            Some(Vec3::new(1.0, 0.0, 15.0))
        );

        after.camera_translation = None;
        assert_eq!(
            interpolate_mesh(&before, &after, 0.5).camera_translation,
            before.camera_translation
        );
    }
}
