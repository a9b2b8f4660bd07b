//! Imported scene graph.
//!
//! This is the in-memory form every [`SceneImporter`](crate::resources::SceneImporter)
//! produces: a node tree that references sub-meshes by index into a flat mesh
//! array, and a flat material array the sub-meshes point into. The loader only
//! consumes it; nothing here owns GPU resources.

use std::path::Path;

use cgmath::SquareMatrix;

use crate::error::{NginError, Result};

/// A whole imported asset.
#[derive(Clone, Debug)]
pub struct SceneData {
    pub root: SceneNode,
    pub meshes: Vec<SubMesh>,
    pub materials: Vec<MaterialData>,
}

impl SceneData {
    /// Number of nodes in the tree, root included.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

/// A node of the imported hierarchy.
///
/// `transform` is kept as imported. The loader does not apply it: every
/// sub-mesh is taken to be in model space already.
#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: String,
    pub transform: cgmath::Matrix4<f32>,
    pub meshes: Vec<usize>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: cgmath::Matrix4::identity(),
            meshes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_meshes(mut self, meshes: impl IntoIterator<Item = usize>) -> Self {
        self.meshes.extend(meshes);
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn has_identity_transform(&self) -> bool {
        self.transform == cgmath::Matrix4::identity()
    }
}

/// One contiguous triangle batch with a single material.
///
/// Faces are triangles by construction; importers triangulate before they
/// hand a sub-mesh out. All optional attribute arrays, when present, have one
/// entry per position.
#[derive(Clone, Debug, Default)]
pub struct SubMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub tex_coords: Option<Vec<[f32; 2]>>,
    /// Tangents and bitangents, always set together.
    pub tangents: Option<Vec<[f32; 3]>>,
    pub bitangents: Option<Vec<[f32; 3]>>,
    pub joints: Option<Vec<[u16; 4]>>,
    pub weights: Option<Vec<[f32; 4]>>,
    pub faces: Vec<[u32; 3]>,
    pub material: usize,
}

impl SubMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn has_tex_coords(&self) -> bool {
        self.tex_coords.is_some()
    }

    /// Check that every face addresses a vertex and every attribute array has
    /// one entry per position. `path` names the file in the import error.
    pub fn validate(&self, path: &Path) -> Result<()> {
        let vertex_count = self.vertex_count();
        if let Some(&index) = self
            .faces
            .iter()
            .flatten()
            .find(|&&i| i as usize >= vertex_count)
        {
            return Err(NginError::IndexOutOfRange {
                mesh: self.name.clone(),
                index,
                vertex_count,
            });
        }

        let lengths = [
            ("normals", self.normals.as_ref().map(Vec::len)),
            ("tex_coords", self.tex_coords.as_ref().map(Vec::len)),
            ("tangents", self.tangents.as_ref().map(Vec::len)),
            ("bitangents", self.bitangents.as_ref().map(Vec::len)),
            ("joints", self.joints.as_ref().map(Vec::len)),
            ("weights", self.weights.as_ref().map(Vec::len)),
        ];
        for (attribute, len) in lengths {
            if let Some(len) = len.filter(|&len| len != vertex_count) {
                return Err(NginError::import(
                    path,
                    format!(
                        "mesh '{}' has {len} {attribute} for {vertex_count} positions",
                        self.name
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Texture slots a material can carry, named after what the source format
/// calls them rather than after how the renderer uses them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaterialChannel {
    Diffuse,
    Specular,
    Ambient,
    Emissive,
    Height,
    Normals,
    Shininess,
    Opacity,
    Lightmap,
}

#[derive(Clone, Debug, Default)]
pub struct MaterialData {
    pub name: String,
    textures: Vec<(MaterialChannel, String)>,
}

impl MaterialData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            textures: Vec::new(),
        }
    }

    pub fn with_texture(mut self, channel: MaterialChannel, path: impl Into<String>) -> Self {
        self.add_texture(channel, path);
        self
    }

    pub fn add_texture(&mut self, channel: MaterialChannel, path: impl Into<String>) {
        self.textures.push((channel, path.into()));
    }

    /// Texture paths of one channel in source order.
    pub fn textures(&self, channel: MaterialChannel) -> impl Iterator<Item = &str> {
        self.textures
            .iter()
            .filter(move |(c, _)| *c == channel)
            .map(|(_, path)| path.as_str())
    }

    pub fn texture_count(&self, channel: MaterialChannel) -> usize {
        self.textures(channel).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_nested_nodes() {
        let scene = SceneData {
            root: SceneNode::new("root")
                .with_child(SceneNode::new("a").with_child(SceneNode::new("b")))
                .with_child(SceneNode::new("c")),
            meshes: Vec::new(),
            materials: Vec::new(),
        };
        assert_eq!(scene.node_count(), 4);
    }

    #[test]
    fn material_textures_keep_source_order_per_channel() {
        let material = MaterialData::new("m")
            .with_texture(MaterialChannel::Diffuse, "a.png")
            .with_texture(MaterialChannel::Specular, "s.png")
            .with_texture(MaterialChannel::Diffuse, "b.png");

        let diffuse: Vec<_> = material.textures(MaterialChannel::Diffuse).collect();
        assert_eq!(diffuse, ["a.png", "b.png"]);
        assert_eq!(material.texture_count(MaterialChannel::Specular), 1);
        assert_eq!(material.texture_count(MaterialChannel::Height), 0);
    }

    fn triangle() -> SubMesh {
        SubMesh {
            name: "tri".into(),
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            tex_coords: Some(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]),
            faces: vec![[0, 1, 2]],
            ..Default::default()
        }
    }

    #[test]
    fn valid_sub_mesh_passes() {
        assert!(triangle().validate(Path::new("tri.gltf")).is_ok());
    }

    #[test]
    fn face_past_the_last_vertex_is_out_of_range() {
        let mut mesh = triangle();
        mesh.faces = vec![[0, 1, 7]];
        match mesh.validate(Path::new("tri.gltf")) {
            Err(NginError::IndexOutOfRange {
                mesh,
                index,
                vertex_count,
            }) => {
                assert_eq!(mesh, "tri");
                assert_eq!(index, 7);
                assert_eq!(vertex_count, 3);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn short_attribute_is_an_import_error() {
        let mut mesh = triangle();
        mesh.tex_coords = Some(vec![[0.0, 0.0], [1.0, 0.0]]);
        let result = mesh.validate(Path::new("tri.gltf"));
        assert!(matches!(result, Err(NginError::ModelImport { .. })));
    }
}
