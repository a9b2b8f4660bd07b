use crate::data_structures::{
    model::{MAX_BONE_INFLUENCE, ModelVertex},
    scene_graph::SubMesh,
};

/**
 * Interleave an imported sub-mesh into GPU vertices and a flat index list.
 *
 * Missing normals and UVs become zero. Tangents and bitangents are only taken
 * when the sub-mesh has UV0, without texture coordinates there is no tangent
 * frame to speak of. Bone slots with zero weight keep the `-1` id.
 */
pub fn convert_sub_mesh(mesh: &SubMesh) -> (Vec<ModelVertex>, Vec<u32>) {
    let textured = mesh.has_tex_coords();
    let vertices = (0..mesh.vertex_count())
        .map(|i| {
            let mut vertex = ModelVertex {
                position: mesh.positions[i],
                ..Default::default()
            };
            if let Some(normal) = attribute(&mesh.normals, i) {
                vertex.normal = normal;
            }
            if textured {
                if let Some(tex_coords) = attribute(&mesh.tex_coords, i) {
                    vertex.tex_coords = tex_coords;
                }
                if let Some(tangent) = attribute(&mesh.tangents, i) {
                    vertex.tangent = tangent;
                }
                if let Some(bitangent) = attribute(&mesh.bitangents, i) {
                    vertex.bitangent = bitangent;
                }
            }
            if let (Some(joints), Some(weights)) =
                (attribute(&mesh.joints, i), attribute(&mesh.weights, i))
            {
                for slot in 0..MAX_BONE_INFLUENCE {
                    if weights[slot] > 0.0 {
                        vertex.bone_ids[slot] = i32::from(joints[slot]);
                        vertex.bone_weights[slot] = weights[slot];
                    }
                }
            }
            vertex
        })
        .collect();

    let indices = mesh.faces.iter().flatten().copied().collect();
    (vertices, indices)
}

fn attribute<T: Copy>(values: &Option<Vec<T>>, i: usize) -> Option<T> {
    values.as_ref().and_then(|v| v.get(i)).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> SubMesh {
        SubMesh {
            name: "tri".into(),
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: Some(vec![[0.0, 0.0, 1.0]; 3]),
            faces: vec![[0, 1, 2]],
            ..Default::default()
        }
    }

    #[test]
    fn untextured_mesh_has_zero_uvs_and_tangents() {
        let mut mesh = triangle();
        // tangents without UVs are ignored
        mesh.tangents = Some(vec![[1.0, 0.0, 0.0]; 3]);
        mesh.bitangents = Some(vec![[0.0, 1.0, 0.0]; 3]);

        let (vertices, indices) = convert_sub_mesh(&mesh);
        assert_eq!(indices, [0, 1, 2]);
        for v in &vertices {
            assert_eq!(v.tex_coords, [0.0, 0.0]);
            assert_eq!(v.tangent, [0.0; 3]);
            assert_eq!(v.bitangent, [0.0; 3]);
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn textured_mesh_keeps_uvs_and_tangents() {
        let mut mesh = triangle();
        mesh.tex_coords = Some(vec![[0.0, 1.0], [1.0, 1.0], [0.0, 0.0]]);
        mesh.tangents = Some(vec![[1.0, 0.0, 0.0]; 3]);
        mesh.bitangents = Some(vec![[0.0, 1.0, 0.0]; 3]);

        let (vertices, _) = convert_sub_mesh(&mesh);
        assert_eq!(vertices[1].tex_coords, [1.0, 1.0]);
        assert_eq!(vertices[2].tangent, [1.0, 0.0, 0.0]);
        assert_eq!(vertices[2].bitangent, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn missing_normals_become_zero() {
        let mut mesh = triangle();
        mesh.normals = None;
        let (vertices, _) = convert_sub_mesh(&mesh);
        assert!(vertices.iter().all(|v| v.normal == [0.0; 3]));
    }

    #[test]
    fn only_weighted_bone_slots_are_set() {
        let mut mesh = triangle();
        mesh.joints = Some(vec![[3, 7, 0, 0]; 3]);
        mesh.weights = Some(vec![[0.75, 0.25, 0.0, 0.0]; 3]);

        let (vertices, _) = convert_sub_mesh(&mesh);
        assert_eq!(vertices[0].bone_ids, [3, 7, -1, -1]);
        assert_eq!(vertices[0].bone_weights, [0.75, 0.25, 0.0, 0.0]);
    }

    #[test]
    fn faces_flatten_in_order() {
        let mut mesh = triangle();
        mesh.positions.push([1.0, 1.0, 0.0]);
        mesh.faces.push([1, 3, 2]);
        let (vertices, indices) = convert_sub_mesh(&mesh);
        assert_eq!(vertices.len(), 4);
        assert_eq!(indices, [0, 1, 2, 1, 3, 2]);
    }
}
