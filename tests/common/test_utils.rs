use std::{
    cell::RefCell,
    fs,
    ops::Range,
    path::{Path, PathBuf},
    rc::Rc,
    sync::atomic::{AtomicUsize, Ordering},
};

use lumen_ngin::{
    context::GraphicsContext,
    data_structures::{
        model::{DrawModel, MaterialBinding, Mesh, ModelVertex},
        scene_graph::SceneData,
        texture::TextureKind,
    },
    error::Result,
    resources::{SceneImporter, postprocess::PostProcess},
};

/// What the recording context has been asked to do so far.
#[derive(Debug, Default)]
pub struct Ledger {
    next_id: u64,
    pub live_buffers: usize,
    pub live_textures: usize,
    pub live_materials: usize,
    pub buffer_uploads: usize,
    /// Label and kind of every texture upload, in order.
    pub texture_uploads: Vec<(String, TextureKind)>,
    /// Device texture size limit; wgpu's default of 8192 when unset.
    pub max_texture_dimension: Option<u32>,
}

impl Ledger {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// A [`GraphicsContext`] that creates no GPU objects, only counts them.
#[derive(Debug, Clone, Default)]
pub struct RecordingContext {
    pub ledger: Rc<RefCell<Ledger>>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_texture_dimension(max: u32) -> Self {
        let ctx = Self::default();
        ctx.ledger.borrow_mut().max_texture_dimension = Some(max);
        ctx
    }

    pub fn live_buffers(&self) -> usize {
        self.ledger.borrow().live_buffers
    }

    pub fn live_textures(&self) -> usize {
        self.ledger.borrow().live_textures
    }

    pub fn live_materials(&self) -> usize {
        self.ledger.borrow().live_materials
    }

    pub fn texture_uploads(&self) -> usize {
        self.ledger.borrow().texture_uploads.len()
    }

    /// Nothing created by this context is alive anymore.
    pub fn is_drained(&self) -> bool {
        let ledger = self.ledger.borrow();
        ledger.live_buffers == 0 && ledger.live_textures == 0 && ledger.live_materials == 0
    }
}

#[derive(Debug)]
pub struct MockBuffer {
    pub id: u64,
    pub label: String,
    pub len: usize,
    ledger: Rc<RefCell<Ledger>>,
}

impl Drop for MockBuffer {
    fn drop(&mut self) {
        self.ledger.borrow_mut().live_buffers -= 1;
    }
}

#[derive(Debug)]
pub struct MockTexture {
    pub id: u64,
    pub label: String,
    pub kind: TextureKind,
    pub width: u32,
    pub height: u32,
    ledger: Rc<RefCell<Ledger>>,
}

impl Drop for MockTexture {
    fn drop(&mut self) {
        self.ledger.borrow_mut().live_textures -= 1;
    }
}

/// A material binding with the borrowed texture replaced by its id.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedBinding {
    pub slot: u32,
    pub kind: TextureKind,
    pub sampler: String,
    pub path: String,
    pub texture_id: u64,
}

#[derive(Debug)]
pub struct MockMaterial {
    pub label: String,
    pub bindings: Vec<RecordedBinding>,
    ledger: Rc<RefCell<Ledger>>,
}

impl Drop for MockMaterial {
    fn drop(&mut self) {
        self.ledger.borrow_mut().live_materials -= 1;
    }
}

impl RecordingContext {
    fn buffer(&self, label: &str, len: usize) -> MockBuffer {
        let mut ledger = self.ledger.borrow_mut();
        ledger.live_buffers += 1;
        ledger.buffer_uploads += 1;
        MockBuffer {
            id: ledger.next_id(),
            label: label.to_string(),
            len,
            ledger: Rc::clone(&self.ledger),
        }
    }
}

impl GraphicsContext for RecordingContext {
    type Buffer = MockBuffer;
    type Texture = MockTexture;
    type Material = MockMaterial;

    fn create_vertex_buffer(&self, label: &str, vertices: &[ModelVertex]) -> MockBuffer {
        self.buffer(label, vertices.len())
    }

    fn create_index_buffer(&self, label: &str, indices: &[u32]) -> MockBuffer {
        self.buffer(label, indices.len())
    }

    fn create_texture(
        &self,
        label: &str,
        image: &image::DynamicImage,
        kind: TextureKind,
    ) -> MockTexture {
        let mut ledger = self.ledger.borrow_mut();
        ledger.live_textures += 1;
        ledger.texture_uploads.push((label.to_string(), kind));
        MockTexture {
            id: ledger.next_id(),
            label: label.to_string(),
            kind,
            width: image.width(),
            height: image.height(),
            ledger: Rc::clone(&self.ledger),
        }
    }

    fn max_texture_dimension(&self) -> u32 {
        self.ledger.borrow().max_texture_dimension.unwrap_or(8192)
    }

    fn create_material(
        &self,
        label: &str,
        bindings: &[MaterialBinding<'_, MockTexture>],
    ) -> MockMaterial {
        self.ledger.borrow_mut().live_materials += 1;
        MockMaterial {
            label: label.to_string(),
            bindings: bindings
                .iter()
                .map(|binding| RecordedBinding {
                    slot: binding.slot,
                    kind: binding.kind,
                    sampler: binding.sampler.to_string(),
                    path: binding.path.to_string(),
                    texture_id: binding.texture.id,
                })
                .collect(),
            ledger: Rc::clone(&self.ledger),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub mesh: String,
    pub index_count: u32,
    pub instances: Range<u32>,
    pub bindings: Vec<RecordedBinding>,
}

/// Stands in for a render pass and keeps every draw it is handed.
#[derive(Debug, Default)]
pub struct RecordingPass {
    pub draws: Vec<RecordedDraw>,
}

impl RecordingPass {
    pub fn mesh_names(&self) -> Vec<&str> {
        self.draws.iter().map(|draw| draw.mesh.as_str()).collect()
    }
}

impl DrawModel<RecordingContext> for RecordingPass {
    fn draw_mesh_instanced(&mut self, mesh: &Mesh<RecordingContext>, instances: Range<u32>) {
        self.draws.push(RecordedDraw {
            mesh: mesh.name.clone(),
            index_count: mesh.num_elements,
            instances,
            bindings: mesh.material.bindings.clone(),
        });
    }
}

/// Hands out a fixed scene whatever path it is asked for.
pub struct InMemoryImporter {
    pub scene: SceneData,
}

impl SceneImporter for InMemoryImporter {
    fn import(&self, _path: &Path, _post: PostProcess) -> Result<SceneData> {
        Ok(self.scene.clone())
    }
}

/// A fresh directory under the system temp dir, removed on drop.
pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    pub fn new(name: &str) -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let path = std::env::temp_dir().join(format!(
            "lumen-ngin-{name}-{}-{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        fs::create_dir_all(&path).expect("failed to create temp dir");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create fixture dir");
        }
        fs::write(&path, contents).expect("failed to write fixture");
        path
    }

    /// A solid-colour PNG of the given size.
    pub fn write_png(&self, name: &str, width: u32, height: u32, rgba: [u8; 4]) -> PathBuf {
        let path = self.path.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create fixture dir");
        }
        image::RgbaImage::from_pixel(width, height, image::Rgba(rgba))
            .save(&path)
            .expect("failed to write png fixture");
        path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}
