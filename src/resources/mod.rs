//! Loading models and textures from files.
//!
//! An importer turns a file into [`SceneData`]; [`build_model`] walks the scene
//! and turns every referenced sub-mesh into a GPU [`Mesh`], loading each
//! material texture once per model through the [`TextureCache`].

use std::path::{Path, PathBuf};

use crate::{
    context::GraphicsContext,
    data_structures::{
        model::{Mesh, Model},
        scene_graph::{MaterialChannel, SceneData, SceneNode},
        texture::TextureKind,
    },
    error::{NginError, Result},
    resources::{postprocess::PostProcess, texture::TextureCache},
};

pub mod gltf;
pub mod mesh;
pub mod obj;
pub mod postprocess;
pub mod texture;

/// Parses a model file into an in-memory scene.
pub trait SceneImporter {
    fn import(&self, path: &Path, post: PostProcess) -> Result<SceneData>;
}

/// Importer material channels the renderer reads, and what it reads them as.
///
/// OBJ files conventionally keep normal maps in `map_Bump`, which lands in the
/// height channel, and height maps in `map_Ka`.
pub const MATERIAL_CHANNELS: [(MaterialChannel, TextureKind); 4] = [
    (MaterialChannel::Diffuse, TextureKind::Diffuse),
    (MaterialChannel::Specular, TextureKind::Specular),
    (MaterialChannel::Height, TextureKind::Normal),
    (MaterialChannel::Ambient, TextureKind::Height),
];

/// Pick an importer from the file extension.
pub fn importer_for_path(path: &Path) -> Result<Box<dyn SceneImporter>> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    match extension.as_deref() {
        Some("obj") => Ok(Box::new(obj::ObjImporter)),
        Some("gltf" | "glb") => Ok(Box::new(self::gltf::GltfImporter)),
        _ => Err(NginError::import(path, "unsupported model format")),
    }
}

/// Import `path` and build the model; textures resolve against its directory.
pub fn load_model<G: GraphicsContext>(
    ctx: &G,
    importer: &dyn SceneImporter,
    path: &Path,
) -> Result<Model<G>> {
    log::debug!("loading model {}", path.display());
    let scene = importer.import(path, PostProcess::MODEL_DEFAULTS)?;
    let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
    build_model(ctx, &scene, directory)
}

/// Walk `scene` depth first and build one mesh per sub-mesh reference.
///
/// A node's own meshes come before those of its children, and children are
/// visited in order. Everything is built in locals: on error the meshes and
/// textures made so far are dropped and no model exists.
pub fn build_model<G: GraphicsContext>(
    ctx: &G,
    scene: &SceneData,
    directory: PathBuf,
) -> Result<Model<G>> {
    let mut textures = TextureCache::new();
    let mut meshes = Vec::new();

    let mut stack: Vec<&SceneNode> = vec![&scene.root];
    while let Some(node) = stack.pop() {
        if !node.has_identity_transform() {
            log::debug!("node {} has a transform, meshes are used as stored", node.name);
        }
        for &mesh_index in &node.meshes {
            meshes.push(build_mesh(ctx, scene, mesh_index, &directory, &mut textures)?);
        }
        stack.extend(node.children.iter().rev());
    }

    log::debug!(
        "built {} meshes with {} textures from {}",
        meshes.len(),
        textures.len(),
        directory.display()
    );
    Ok(Model {
        meshes,
        textures,
        directory,
    })
}

fn build_mesh<G: GraphicsContext>(
    ctx: &G,
    scene: &SceneData,
    mesh_index: usize,
    directory: &Path,
    textures: &mut TextureCache<G::Texture>,
) -> Result<Mesh<G>> {
    let sub_mesh = scene.meshes.get(mesh_index).ok_or_else(|| {
        NginError::import(
            directory,
            format!(
                "a node references mesh {mesh_index} of {}",
                scene.meshes.len()
            ),
        )
    })?;
    let material = scene.materials.get(sub_mesh.material).ok_or_else(|| {
        NginError::import(
            directory,
            format!(
                "mesh '{}' references material {} of {}",
                sub_mesh.name,
                sub_mesh.material,
                scene.materials.len()
            ),
        )
    })?;

    let (vertices, indices) = mesh::convert_sub_mesh(sub_mesh);

    let mut mesh_textures = Vec::new();
    for (channel, kind) in MATERIAL_CHANNELS {
        for path in material.textures(channel) {
            mesh_textures.push(textures.load(ctx, path, directory, kind)?);
        }
    }

    Mesh::new(ctx, &sub_mesh.name, vertices, indices, mesh_textures)
}
