//! glTF 2.0 import through the `gltf` crate.
//!
//! Only `.gltf` files with external or `.glb`-embedded buffers are read;
//! images must be referenced by URI to be usable as material textures.

use std::{collections::HashSet, path::Path};

use cgmath::Vector3;

use crate::{
    data_structures::scene_graph::{MaterialChannel, MaterialData, SceneData, SceneNode, SubMesh},
    error::{NginError, Result},
    resources::{SceneImporter, postprocess::PostProcess},
};

#[derive(Debug, Default, Clone, Copy)]
pub struct GltfImporter;

impl SceneImporter for GltfImporter {
    fn import(&self, path: &Path, post: PostProcess) -> Result<SceneData> {
        let gltf::Gltf { document, blob } =
            gltf::Gltf::open(path).map_err(|e| NginError::import(path, e.to_string()))?;
        let buffers = gltf::import_buffers(&document, path.parent(), blob)
            .map_err(|e| NginError::import(path, e.to_string()))?;

        let mut materials: Vec<MaterialData> = document.materials().map(convert_material).collect();
        let mut default_material = None;

        // sub-mesh indices of every glTF mesh, one per usable primitive
        let mut mesh_primitives: Vec<Vec<usize>> = Vec::with_capacity(document.meshes().len());
        let mut meshes = Vec::new();
        for mesh in document.meshes() {
            let mut primitives = Vec::new();
            for primitive in mesh.primitives() {
                let name = match mesh.name() {
                    Some(name) if mesh.primitives().len() == 1 => name.to_string(),
                    Some(name) => format!("{name}.{}", primitive.index()),
                    None => format!("mesh{}.{}", mesh.index(), primitive.index()),
                };
                let material = match primitive.material().index() {
                    Some(index) => index,
                    None => *default_material.get_or_insert_with(|| {
                        materials.push(MaterialData::new("default"));
                        materials.len() - 1
                    }),
                };
                let Some(mut sub_mesh) = convert_primitive(path, &buffers, &primitive, name, material)?
                else {
                    continue;
                };
                sub_mesh.validate(path)?;
                post.apply(&mut sub_mesh);
                primitives.push(meshes.len());
                meshes.push(sub_mesh);
            }
            mesh_primitives.push(primitives);
        }

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or_else(|| NginError::import(path, "the file contains no scene"))?;
        let mut visited = HashSet::new();
        let mut roots = scene
            .nodes()
            .map(|node| convert_node(path, &node, &mesh_primitives, &mut visited))
            .collect::<Result<Vec<_>>>()?;
        let root = if roots.len() == 1 {
            roots.remove(0)
        } else {
            let mut root = SceneNode::new(scene.name().unwrap_or("scene"));
            root.children = roots;
            root
        };

        log::debug!(
            "imported {} with {} primitives and {} materials",
            path.display(),
            meshes.len(),
            materials.len()
        );
        Ok(SceneData {
            root,
            meshes,
            materials,
        })
    }
}

fn convert_node(
    path: &Path,
    node: &gltf::Node,
    mesh_primitives: &[Vec<usize>],
    visited: &mut HashSet<usize>,
) -> Result<SceneNode> {
    if !visited.insert(node.index()) {
        return Err(NginError::import(
            path,
            format!("node {} is reachable twice", node.index()),
        ));
    }
    let mut scene_node = SceneNode::new(
        node.name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("node{}", node.index())),
    );
    scene_node.transform = node.transform().matrix().into();
    if let Some(mesh) = node.mesh() {
        scene_node.meshes = mesh_primitives[mesh.index()].clone();
    }
    for child in node.children() {
        scene_node
            .children
            .push(convert_node(path, &child, mesh_primitives, visited)?);
    }
    Ok(scene_node)
}

/// `None` for primitives that are not made of triangles.
fn convert_primitive(
    path: &Path,
    buffers: &[gltf::buffer::Data],
    primitive: &gltf::Primitive,
    name: String,
    material: usize,
) -> Result<Option<SubMesh>> {
    use gltf::mesh::Mode;

    let mode = primitive.mode();
    if !matches!(mode, Mode::Triangles | Mode::TriangleStrip | Mode::TriangleFan) {
        log::warn!("skipping {name}: {mode:?} primitives are not drawn");
        return Ok(None);
    }

    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));
    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| NginError::import(path, format!("primitive {name} has no positions")))?
        .collect();
    let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|n| n.collect());
    // glTF puts the UV origin top-left, post-processing expects bottom-left
    let tex_coords: Option<Vec<[f32; 2]>> = reader
        .read_tex_coords(0)
        .map(|t| t.into_f32().map(|[u, v]| [u, 1.0 - v]).collect());

    let (tangents, bitangents) = match (reader.read_tangents(), normals.as_ref()) {
        (Some(tangents), Some(normals)) => {
            let tangents: Vec<[f32; 4]> = tangents.collect();
            let bitangents: Vec<[f32; 3]> = tangents
                .iter()
                .zip(normals)
                .map(|(t, n)| {
                    (Vector3::from(*n).cross(Vector3::new(t[0], t[1], t[2])) * t[3]).into()
                })
                .collect();
            (
                Some(tangents.iter().map(|t| [t[0], t[1], t[2]]).collect()),
                Some(bitangents),
            )
        }
        _ => (None, None),
    };

    let joints = reader.read_joints(0).map(|j| j.into_u16().collect());
    let weights = reader.read_weights(0).map(|w| w.into_f32().collect());

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    let faces = match mode {
        Mode::TriangleStrip => strip_to_list(&indices),
        Mode::TriangleFan => fan_to_list(&indices),
        _ => indices
            .chunks_exact(3)
            .map(|f| [f[0], f[1], f[2]])
            .collect(),
    };

    Ok(Some(SubMesh {
        name,
        positions,
        normals,
        tex_coords,
        tangents,
        bitangents,
        joints,
        weights,
        faces,
        material,
    }))
}

/// Every second strip triangle is swapped to keep the winding.
pub fn strip_to_list(indices: &[u32]) -> Vec<[u32; 3]> {
    indices
        .windows(3)
        .enumerate()
        .map(|(i, w)| {
            if i % 2 == 0 {
                [w[0], w[1], w[2]]
            } else {
                [w[1], w[0], w[2]]
            }
        })
        .collect()
}

pub fn fan_to_list(indices: &[u32]) -> Vec<[u32; 3]> {
    match indices.split_first() {
        Some((&centre, rest)) => rest.windows(2).map(|w| [centre, w[0], w[1]]).collect(),
        None => Vec::new(),
    }
}

/// Image URIs are percent-encoded relative references; the cache and the
/// loader want the file path they name.
pub fn decode_uri(uri: &str) -> String {
    match urlencoding::decode(uri) {
        Ok(path) => path.into_owned(),
        Err(e) => {
            log::warn!("image uri '{uri}' does not decode to UTF-8 ({e}), using it as is");
            uri.to_string()
        }
    }
}

fn convert_material(material: gltf::Material) -> MaterialData {
    let mut data = MaterialData::new(
        material
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("material{}", material.index().unwrap_or_default())),
    );
    let pbr = material.pbr_metallic_roughness();
    let channels = [
        (
            MaterialChannel::Diffuse,
            pbr.base_color_texture().map(|info| info.texture()),
        ),
        (
            MaterialChannel::Normals,
            material.normal_texture().map(|normal| normal.texture()),
        ),
        (
            MaterialChannel::Lightmap,
            material.occlusion_texture().map(|occlusion| occlusion.texture()),
        ),
        (
            MaterialChannel::Emissive,
            material.emissive_texture().map(|info| info.texture()),
        ),
    ];
    for (channel, texture) in channels {
        let Some(texture) = texture else { continue };
        match texture.source().source() {
            gltf::image::Source::Uri { uri, .. } if !uri.starts_with("data:") => {
                data.add_texture(channel, decode_uri(uri));
            }
            _ => log::warn!(
                "material {}: embedded {channel:?} image is not supported, skipped",
                data.name
            ),
        }
    }
    data
}
