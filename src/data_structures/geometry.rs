//! Procedural geometry of the demo scene: the textured container cube, where
//! the ten containers stand and where the four point lights hang.

use cgmath::{InnerSpace, Rotation3};

use crate::data_structures::{
    instance::Instance,
    scene_graph::{MaterialChannel, MaterialData, SceneData, SceneNode, SubMesh},
};

pub const CUBE_POSITIONS: [[f32; 3]; 10] = [
    [0.0, 0.0, 0.0],
    [2.0, 5.0, -15.0],
    [-1.5, -2.2, -2.5],
    [-3.8, -2.0, -12.3],
    [2.4, -0.4, -3.5],
    [-1.7, 3.0, -7.5],
    [1.3, -2.0, -2.5],
    [1.5, 2.0, -2.5],
    [1.5, 0.2, -1.5],
    [-1.3, 1.0, -1.5],
];

pub const POINT_LIGHT_POSITIONS: [[f32; 3]; 4] = [
    [0.7, 0.2, 2.0],
    [2.3, -3.3, -4.0],
    [-4.0, 2.0, -12.0],
    [0.0, 0.0, -3.0],
];

pub const POINT_LIGHT_COLORS: [[f32; 3]; 4] = [
    [0.2, 0.2, 0.6],
    [0.3, 0.3, 0.7],
    [0.0, 0.0, 0.3],
    [0.4, 0.4, 0.4],
];

/// Light markers are the unit cube at a fifth of its size.
pub const LIGHT_MARKER_SCALE: f32 = 0.2;

// (normal, right, up) with right x up == normal, so every face winds counter-clockwise
const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
];

const CORNERS: [(f32, f32); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

/// A unit cube centred on the origin: four vertices per face so each face has
/// its own normal, UVs and tangent frame.
pub fn cube(name: &str, material: usize) -> SubMesh {
    let mut mesh = SubMesh {
        name: name.to_string(),
        material,
        ..Default::default()
    };
    let mut normals = Vec::with_capacity(24);
    let mut tex_coords = Vec::with_capacity(24);
    let mut tangents = Vec::with_capacity(24);
    let mut bitangents = Vec::with_capacity(24);

    for (face, (normal, right, up)) in FACES.into_iter().enumerate() {
        for (sx, sy) in CORNERS {
            mesh.positions.push(std::array::from_fn(|i| {
                0.5 * (normal[i] + sx * right[i] + sy * up[i])
            }));
            normals.push(normal);
            // image rows run top to bottom
            tex_coords.push([(sx + 1.0) * 0.5, (1.0 - sy) * 0.5]);
            tangents.push(right);
            bitangents.push(up);
        }
        let base = face as u32 * 4;
        mesh.faces.push([base, base + 1, base + 2]);
        mesh.faces.push([base + 2, base + 3, base]);
    }

    mesh.normals = Some(normals);
    mesh.tex_coords = Some(tex_coords);
    mesh.tangents = Some(tangents);
    mesh.bitangents = Some(bitangents);
    mesh
}

/// The container cube with a diffuse and a specular map, paths relative to
/// the directory the model is built with.
pub fn container_scene(diffuse: &str, specular: &str) -> SceneData {
    SceneData {
        root: SceneNode::new("container").with_meshes([0]),
        meshes: vec![cube("container", 0)],
        materials: vec![
            MaterialData::new("container")
                .with_texture(MaterialChannel::Diffuse, diffuse)
                .with_texture(MaterialChannel::Specular, specular),
        ],
    }
}

/// The untextured cube the point-light markers are drawn with.
pub fn light_cube_scene() -> SceneData {
    SceneData {
        root: SceneNode::new("light").with_meshes([0]),
        meshes: vec![cube("light", 0)],
        materials: vec![MaterialData::new("light")],
    }
}

/// Container `i` is turned by `20 * i` degrees around (1, 0.3, 0.5).
pub fn container_instances() -> Vec<Instance> {
    let axis = cgmath::Vector3::new(1.0, 0.3, 0.5).normalize();
    CUBE_POSITIONS
        .iter()
        .enumerate()
        .map(|(i, position)| Instance {
            position: (*position).into(),
            rotation: cgmath::Quaternion::from_axis_angle(axis, cgmath::Deg(20.0 * i as f32)),
            ..Default::default()
        })
        .collect()
}

pub fn light_marker_instances() -> Vec<Instance> {
    POINT_LIGHT_POSITIONS
        .iter()
        .map(|position| {
            Instance::from(cgmath::Vector3::from(*position)).with_scale(LIGHT_MARKER_SCALE)
        })
        .collect()
}
