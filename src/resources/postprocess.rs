//! Fixed clean-up steps every importer runs before handing a sub-mesh out.

use std::collections::HashMap;

use cgmath::{InnerSpace, Vector2, Vector3, Zero};

use crate::data_structures::scene_graph::SubMesh;

/// Which post-processing steps to run on imported meshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostProcess {
    /// Split polygons into triangles while parsing.
    pub triangulate: bool,
    /// Generate normals for meshes that have none.
    pub gen_smooth_normals: bool,
    /// `v <- 1 - v`, moving the UV origin from bottom-left to top-left.
    pub flip_uvs: bool,
    /// Generate tangents and bitangents for textured meshes that have none.
    pub calc_tangent_space: bool,
}

impl PostProcess {
    /// What [`Model::load`](crate::data_structures::model::Model::load) asks for.
    pub const MODEL_DEFAULTS: PostProcess = PostProcess {
        triangulate: true,
        gen_smooth_normals: true,
        flip_uvs: true,
        calc_tangent_space: true,
    };

    pub const NONE: PostProcess = PostProcess {
        triangulate: false,
        gen_smooth_normals: false,
        flip_uvs: false,
        calc_tangent_space: false,
    };

    /// Run the enabled steps on `mesh`: UV flip, then normals, then tangents.
    ///
    /// Expects a mesh that passed [`SubMesh::validate`].
    pub fn apply(&self, mesh: &mut SubMesh) {
        if self.flip_uvs {
            if let Some(tex_coords) = mesh.tex_coords.as_mut() {
                flip_uvs(tex_coords);
            }
        }
        if self.gen_smooth_normals && mesh.normals.is_none() {
            mesh.normals = Some(smooth_normals(&mesh.positions, &mesh.faces));
        }
        if self.calc_tangent_space && mesh.tangents.is_none() {
            if let Some(tex_coords) = mesh.tex_coords.as_ref() {
                let (tangents, bitangents) =
                    tangent_space(&mesh.positions, tex_coords, &mesh.faces);
                mesh.tangents = Some(tangents);
                mesh.bitangents = Some(bitangents);
            }
        }
    }
}

pub fn flip_uvs(tex_coords: &mut [[f32; 2]]) {
    for uv in tex_coords {
        uv[1] = 1.0 - uv[1];
    }
}

fn position_key(p: [f32; 3]) -> [u32; 3] {
    // -0.0 and 0.0 are the same corner
    p.map(|c| if c == 0.0 { 0 } else { c.to_bits() })
}

/// Area-weighted vertex normals, shared by every vertex at the same position
/// so hard edges from split vertices are smoothed over.
///
/// # Panics
///
/// If a face index is out of range for `positions`.
pub fn smooth_normals(positions: &[[f32; 3]], faces: &[[u32; 3]]) -> Vec<[f32; 3]> {
    let mut accumulated: HashMap<[u32; 3], Vector3<f32>> = HashMap::new();
    for face in faces {
        let [a, b, c] = face.map(|i| Vector3::from(positions[i as usize]));
        // the cross product's length is twice the triangle area
        let face_normal = (b - a).cross(c - a);
        for &i in face {
            *accumulated
                .entry(position_key(positions[i as usize]))
                .or_insert_with(Vector3::zero) += face_normal;
        }
    }

    positions
        .iter()
        .map(|p| {
            let n = accumulated
                .get(&position_key(*p))
                .copied()
                .unwrap_or_else(Vector3::zero);
            if n.magnitude2() > 0.0 {
                n.normalize().into()
            } else {
                [0.0; 3]
            }
        })
        .collect()
}

/// Per-vertex tangents and bitangents, averaged over the triangles a vertex
/// belongs to.
///
/// Triangles whose UVs are degenerate contribute nothing; vertices touched by
/// no usable triangle keep zero vectors.
///
/// # Panics
///
/// If a face index is out of range for `positions` or `tex_coords`.
pub fn tangent_space(
    positions: &[[f32; 3]],
    tex_coords: &[[f32; 2]],
    faces: &[[u32; 3]],
) -> (Vec<[f32; 3]>, Vec<[f32; 3]>) {
    let mut tangents = vec![Vector3::zero(); positions.len()];
    let mut bitangents = vec![Vector3::zero(); positions.len()];
    let mut triangles_included = vec![0u32; positions.len()];

    for face in faces {
        let [i0, i1, i2] = face.map(|i| i as usize);
        let pos0 = Vector3::from(positions[i0]);
        let pos1 = Vector3::from(positions[i1]);
        let pos2 = Vector3::from(positions[i2]);
        let uv0 = Vector2::from(tex_coords[i0]);
        let uv1 = Vector2::from(tex_coords[i1]);
        let uv2 = Vector2::from(tex_coords[i2]);

        let delta_pos1 = pos1 - pos0;
        let delta_pos2 = pos2 - pos0;
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        // Solving
        //     delta_pos1 = delta_uv1.x * T + delta_uv1.y * B
        //     delta_pos2 = delta_uv2.x * T + delta_uv2.y * B
        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() <= f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
        // flipped for right-handed normal maps in wgpu's texture space
        let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * -r;

        for i in [i0, i1, i2] {
            tangents[i] += tangent;
            bitangents[i] += bitangent;
            triangles_included[i] += 1;
        }
    }

    let average = |sums: Vec<Vector3<f32>>| -> Vec<[f32; 3]> {
        sums.into_iter()
            .zip(&triangles_included)
            .map(|(sum, &n)| {
                if n == 0 {
                    [0.0; 3]
                } else {
                    (sum / n as f32).into()
                }
            })
            .collect()
    };
    (average(tangents), average(bitangents))
}
