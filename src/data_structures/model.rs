//! Drawable meshes and the models that own them.
//!
//! A [`Model`] is an ordered list of [`Mesh`]es plus the texture cache they were
//! resolved through. Both are generic over the [`GraphicsContext`] that created
//! their GPU handles, so the same loading code runs against wgpu and against a
//! recording context in tests.

use std::{
    ops::Range,
    path::{Path, PathBuf},
};

use crate::{
    context::{GpuContext, GraphicsContext},
    data_structures::{
        scene_graph::SceneData,
        texture::{TextureKind, TextureRef},
    },
    error::{NginError, Result},
    resources::{self, SceneImporter, texture::TextureCache},
};

/// Maximum number of bones that may influence one vertex.
pub const MAX_BONE_INFLUENCE: usize = 4;

/// Trait for types that describe their own GPU vertex buffer layout.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// The interleaved vertex every mesh is uploaded with.
///
/// Unused bone slots carry id `-1` and weight `0`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
    pub bone_ids: [i32; MAX_BONE_INFLUENCE],
    pub bone_weights: [f32; MAX_BONE_INFLUENCE],
}

impl Default for ModelVertex {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            normal: [0.0; 3],
            tex_coords: [0.0; 2],
            tangent: [0.0; 3],
            bitangent: [0.0; 3],
            bone_ids: [-1; MAX_BONE_INFLUENCE],
            bone_weights: [0.0; MAX_BONE_INFLUENCE],
        }
    }
}

impl ModelVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 7] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
        3 => Float32x3,
        4 => Float32x3,
        5 => Sint32x4,
        6 => Float32x4,
    ];
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// One entry of a mesh's material binding: which texture goes into which
/// texture unit and under which sampler name.
#[derive(Debug)]
pub struct MaterialBinding<'a, T> {
    /// Sequential texture unit, in texture-list order.
    pub slot: u32,
    pub kind: TextureKind,
    /// `texture_diffuse1`, `texture_specular2`, ...
    pub sampler: &'a str,
    pub path: &'a str,
    pub texture: &'a T,
}

// manual impls, T itself need not be Clone
impl<T> Clone for MaterialBinding<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for MaterialBinding<'_, T> {}

/// Sampler names for a texture list: `<type>_<n>` with `n` counted from 1,
/// separately for every kind.
pub fn sampler_names(kinds: impl IntoIterator<Item = TextureKind>) -> Vec<String> {
    let mut counters = [0u32; TextureKind::ALL.len()];
    kinds
        .into_iter()
        .map(|kind| {
            let counter = &mut counters[kind as usize];
            *counter += 1;
            format!("{}{}", kind.type_name(), counter)
        })
        .collect()
}

fn bindings_of<'a, T>(
    textures: &'a [TextureRef<T>],
    samplers: &'a [String],
) -> Vec<MaterialBinding<'a, T>> {
    textures
        .iter()
        .zip(samplers)
        .enumerate()
        .map(|(slot, (texture, sampler))| MaterialBinding {
            slot: slot as u32,
            kind: texture.kind,
            sampler,
            path: &texture.path,
            texture: texture.texture(),
        })
        .collect()
}

/// One drawable batch: the CPU-side geometry, the textures it samples and the
/// GPU handles uploaded from them.
///
/// Immutable after construction. The buffers and the material live exactly as
/// long as the mesh.
pub struct Mesh<G: GraphicsContext> {
    pub name: String,
    vertices: Vec<ModelVertex>,
    indices: Vec<u32>,
    textures: Vec<TextureRef<G::Texture>>,
    samplers: Vec<String>,
    pub vertex_buffer: G::Buffer,
    pub index_buffer: G::Buffer,
    pub material: G::Material,
    pub num_elements: u32,
}

impl<G: GraphicsContext> Mesh<G> {
    /// Upload a triangle list and build its material binding.
    ///
    /// Fails with [`NginError::IndexOutOfRange`] before anything is uploaded
    /// if an index does not address a vertex.
    pub fn new(
        ctx: &G,
        name: impl Into<String>,
        vertices: Vec<ModelVertex>,
        indices: Vec<u32>,
        textures: Vec<TextureRef<G::Texture>>,
    ) -> Result<Self> {
        let name = name.into();
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(NginError::IndexOutOfRange {
                mesh: name,
                index,
                vertex_count: vertices.len(),
            });
        }

        let vertex_buffer = ctx.create_vertex_buffer(&format!("{name} Vertex Buffer"), &vertices);
        let index_buffer = ctx.create_index_buffer(&format!("{name} Index Buffer"), &indices);
        let samplers = sampler_names(textures.iter().map(|t| t.kind));
        let material = ctx.create_material(
            &format!("{name} Material"),
            &bindings_of(&textures, &samplers),
        );

        Ok(Self {
            num_elements: indices.len() as u32,
            name,
            vertices,
            indices,
            textures,
            samplers,
            vertex_buffer,
            index_buffer,
            material,
        })
    }

    pub fn vertices(&self) -> &[ModelVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn textures(&self) -> &[TextureRef<G::Texture>] {
        &self.textures
    }

    /// The material binding descriptor, one entry per texture in list order.
    pub fn bindings(&self) -> Vec<MaterialBinding<'_, G::Texture>> {
        bindings_of(&self.textures, &self.samplers)
    }

    pub fn draw<P: DrawModel<G> + ?Sized>(&self, pass: &mut P) {
        pass.draw_mesh(self);
    }
}

/// A loaded asset: its meshes in traversal order and the textures they share.
///
/// Read-only once built. Nothing is shared with other models, loading the same
/// file twice uploads its textures twice.
pub struct Model<G: GraphicsContext> {
    pub meshes: Vec<Mesh<G>>,
    pub textures: TextureCache<G::Texture>,
    pub directory: PathBuf,
}

impl<G: GraphicsContext> Model<G> {
    /// Import `path` with `importer` and build every mesh it contains.
    ///
    /// Either the whole model is built or nothing is: on error every buffer and
    /// texture created so far is dropped before this returns.
    pub fn load(ctx: &G, importer: &dyn SceneImporter, path: impl AsRef<Path>) -> Result<Self> {
        resources::load_model(ctx, importer, path.as_ref())
    }

    /// Like [`load`](Self::load), with the importer chosen by file extension.
    pub fn from_file(ctx: &G, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let importer = resources::importer_for_path(path)?;
        Self::load(ctx, importer.as_ref(), path)
    }

    /// Build a model from an already imported scene. Texture paths resolve
    /// against `directory`.
    pub fn from_scene(ctx: &G, scene: &SceneData, directory: impl Into<PathBuf>) -> Result<Self> {
        resources::build_model(ctx, scene, directory.into())
    }

    pub fn meshes(&self) -> &[Mesh<G>] {
        &self.meshes
    }

    /// Number of distinct texture uploads this model made.
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn draw<P: DrawModel<G> + ?Sized>(&self, pass: &mut P) {
        pass.draw_model(self);
    }
}

/// Issues the draw calls for meshes and models.
///
/// Implementors bind the mesh's own material on every draw.
pub trait DrawModel<G: GraphicsContext> {
    fn draw_mesh_instanced(&mut self, mesh: &Mesh<G>, instances: Range<u32>);

    fn draw_mesh(&mut self, mesh: &Mesh<G>) {
        self.draw_mesh_instanced(mesh, 0..1);
    }

    fn draw_model_instanced(&mut self, model: &Model<G>, instances: Range<u32>) {
        for mesh in &model.meshes {
            self.draw_mesh_instanced(mesh, instances.clone());
        }
    }

    fn draw_model(&mut self, model: &Model<G>) {
        self.draw_model_instanced(model, 0..1);
    }
}

/// Material bind group at index 0; camera and light groups are set by the caller.
impl DrawModel<GpuContext> for wgpu::RenderPass<'_> {
    fn draw_mesh_instanced(&mut self, mesh: &Mesh<GpuContext>, instances: Range<u32>) {
        if mesh.num_elements == 0 {
            return;
        }
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, &mesh.material, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, instances);
    }
}

/// Draws geometry only, for the untextured light markers.
pub trait DrawLight {
    fn draw_light_mesh_instanced(&mut self, mesh: &Mesh<GpuContext>, instances: Range<u32>);

    fn draw_light_model_instanced(&mut self, model: &Model<GpuContext>, instances: Range<u32>) {
        for mesh in &model.meshes {
            self.draw_light_mesh_instanced(mesh, instances.clone());
        }
    }
}

impl DrawLight for wgpu::RenderPass<'_> {
    fn draw_light_mesh_instanced(&mut self, mesh: &Mesh<GpuContext>, instances: Range<u32>) {
        if mesh.num_elements == 0 {
            return;
        }
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.num_elements, 0, instances);
    }
}

#[cfg(test)]
mod tests {
    use std::mem::{offset_of, size_of};

    use super::*;

    #[test]
    fn vertex_layout_matches_struct() {
        let desc = ModelVertex::desc();
        assert_eq!(size_of::<ModelVertex>(), 88);
        assert_eq!(desc.array_stride, 88);

        let expected = [
            (0, offset_of!(ModelVertex, position)),
            (1, offset_of!(ModelVertex, normal)),
            (2, offset_of!(ModelVertex, tex_coords)),
            (3, offset_of!(ModelVertex, tangent)),
            (4, offset_of!(ModelVertex, bitangent)),
            (5, offset_of!(ModelVertex, bone_ids)),
            (6, offset_of!(ModelVertex, bone_weights)),
        ];
        assert_eq!(desc.attributes.len(), expected.len());
        for (attribute, (location, offset)) in desc.attributes.iter().zip(expected) {
            assert_eq!(attribute.shader_location, location);
            assert_eq!(attribute.offset, offset as u64);
        }
        assert_eq!(desc.attributes[5].format, wgpu::VertexFormat::Sint32x4);
    }

    #[test]
    fn default_vertex_has_no_bone_influence() {
        let v = ModelVertex::default();
        assert_eq!(v.bone_ids, [-1; 4]);
        assert_eq!(v.bone_weights, [0.0; 4]);
    }

    #[test]
    fn sampler_numbering_restarts_per_kind() {
        let names = sampler_names([
            TextureKind::Diffuse,
            TextureKind::Specular,
            TextureKind::Diffuse,
            TextureKind::Normal,
            TextureKind::Height,
        ]);
        assert_eq!(
            names,
            [
                "texture_diffuse1",
                "texture_specular1",
                "texture_diffuse2",
                "texture_normal1",
                "texture_height1",
            ]
        );
    }
}
