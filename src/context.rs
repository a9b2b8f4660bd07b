//! GPU and window context.
//!
//! [`GraphicsContext`] is the narrow set of GPU capabilities the model loader
//! needs. [`GpuContext`] implements it over a wgpu device and queue, and
//! [`Context`] adds everything the demo renders with: the window surface, the
//! depth buffer, camera and light uniforms and the pipelines.

use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    camera::{self, CameraResources, Projection},
    data_structures::{
        model::{MaterialBinding, ModelVertex},
        texture::{self, Texture, TextureKind},
    },
    error::{NginError, Result},
    pipelines::{
        Pipelines,
        light::{LightResources, Lights},
    },
    resources::texture::material_layout,
};

/// Creates the GPU objects a [`Mesh`](crate::data_structures::model::Mesh)
/// owns.
///
/// Every returned handle is an owned value; dropping it releases the GPU
/// resource.
pub trait GraphicsContext {
    type Buffer;
    type Texture;
    type Material;

    fn create_vertex_buffer(&self, label: &str, vertices: &[ModelVertex]) -> Self::Buffer;

    fn create_index_buffer(&self, label: &str, indices: &[u32]) -> Self::Buffer;

    /// Upload a decoded image as a mipmapped, repeat-wrapped, linearly filtered
    /// 2D texture.
    fn create_texture(
        &self,
        label: &str,
        image: &image::DynamicImage,
        kind: TextureKind,
    ) -> Self::Texture;

    /// Largest width or height [`create_texture`](Self::create_texture) accepts.
    fn max_texture_dimension(&self) -> u32;

    /// Bind a mesh's textures for drawing.
    fn create_material(
        &self,
        label: &str,
        bindings: &[MaterialBinding<'_, Self::Texture>],
    ) -> Self::Material;
}

/// Sampler names the shaders read, with the texture bound when a mesh has none.
const MATERIAL_SLOTS: [(&str, [u8; 4], bool); 3] = [
    ("texture_diffuse1", [255, 255, 255, 255], true),
    ("texture_specular1", [0, 0, 0, 255], false),
    ("texture_normal1", [128, 128, 255, 255], false),
];

/// wgpu device and queue plus the shared material bind group layout.
#[derive(Debug)]
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub material_layout: wgpu::BindGroupLayout,
    fallbacks: [Texture; 3],
    default_sampler: wgpu::Sampler,
}

impl GpuContext {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let material_layout = material_layout(&device);
        let fallbacks = MATERIAL_SLOTS.map(|(name, rgba, srgb)| {
            Texture::create_solid(&device, &queue, rgba, &format!("{name} fallback"), srgb)
        });
        let default_sampler = texture::create_default_sampler(&device);
        Self {
            device,
            queue,
            material_layout,
            fallbacks,
            default_sampler,
        }
    }
}

impl GraphicsContext for GpuContext {
    type Buffer = wgpu::Buffer;
    type Texture = Texture;
    type Material = wgpu::BindGroup;

    fn create_vertex_buffer(&self, label: &str, vertices: &[ModelVertex]) -> wgpu::Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            })
    }

    fn create_index_buffer(&self, label: &str, indices: &[u32]) -> wgpu::Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            })
    }

    fn create_texture(
        &self,
        label: &str,
        image: &image::DynamicImage,
        kind: TextureKind,
    ) -> Texture {
        Texture::from_image(&self.device, &self.queue, image, Some(label), kind.is_srgb())
    }

    fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    /// Binds the first texture of each family the shaders sample (diffuse,
    /// specular, normal) and the fallback for every family the mesh lacks.
    /// Height maps have no consumer in the shaders.
    fn create_material(
        &self,
        label: &str,
        bindings: &[MaterialBinding<'_, Texture>],
    ) -> wgpu::BindGroup {
        let textures: Vec<&Texture> = MATERIAL_SLOTS
            .iter()
            .zip(&self.fallbacks)
            .map(|((name, _, _), fallback)| {
                bindings
                    .iter()
                    .find(|binding| binding.sampler == *name)
                    .map_or(fallback, |binding| binding.texture)
            })
            .collect();

        let entries: Vec<wgpu::BindGroupEntry> = textures
            .iter()
            .enumerate()
            .flat_map(|(i, texture)| {
                let sampler = texture.sampler.as_ref().unwrap_or(&self.default_sampler);
                [
                    wgpu::BindGroupEntry {
                        binding: 2 * i as u32,
                        resource: wgpu::BindingResource::TextureView(&texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2 * i as u32 + 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ]
            })
            .collect();

        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.material_layout,
            entries: &entries,
            label: Some(label),
        })
    }
}

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: Texture,
    pub surface: wgpu::Surface<'static>,
    pub gpu: GpuContext,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: Projection,
    pub lights: Lights,
    pub light: LightResources,
    pub pipelines: Pipelines,
    pub clear_colour: wgpu::Color,
}

impl Context {
    /// Open the GPU for `window`, blocking until the adapter and device are ready.
    pub fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();

        log::debug!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| NginError::graphics_init("creating the surface", e))?;

        let adapter = futures::executor::block_on(instance.request_adapter(
            &wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            },
        ))
        .map_err(|e| NginError::graphics_init("requesting an adapter", e))?;

        log::debug!("device and queue");
        let (device, queue) =
            futures::executor::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            }))
            .map_err(|e| NginError::graphics_init("requesting a device", e))?;

        log::debug!("Surface");
        let surface_caps = surface.get_capabilities(&adapter);
        // The shaders assume an sRGB surface; anything else comes out darker.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| NginError::GraphicsInit {
                stage: "configuring the surface",
                source: "the adapter reports no surface formats".into(),
            })?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);
        let gpu = GpuContext::new(device, queue);

        let projection = Projection::new(
            config.width,
            config.height,
            camera::ZNEAR,
            camera::ZFAR,
        );
        let camera = CameraResources::new(
            &gpu.device,
            camera::Camera::default(),
            camera::CameraController::default(),
            &projection,
        );

        let depth_texture =
            Texture::create_depth_texture(&gpu.device, [config.width, config.height], "depth_texture");

        let lights = Lights::default();
        let light = LightResources::new(&gpu.device, lights.to_uniform(&camera.camera));

        let pipelines = Pipelines::new(
            &gpu.device,
            config.format,
            &gpu.material_layout,
            &camera.bind_group_layout,
            &light.bind_group_layout,
        );

        Ok(Self {
            window,
            depth_texture,
            surface,
            gpu,
            config,
            camera,
            projection,
            lights,
            light,
            pipelines,
            clear_colour: wgpu::Color {
                r: 0.1,
                g: 0.1,
                b: 0.1,
                a: 1.0,
            },
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Reconfigure the surface and rebuild the depth buffer; zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.projection.resize(width, height);
            self.surface.configure(&self.gpu.device, &self.config);
            self.depth_texture =
                Texture::create_depth_texture(&self.gpu.device, [width, height], "depth_texture");
        }
    }

    /// Push the current camera and light state to their uniform buffers.
    pub fn update_uniforms(&mut self) {
        self.camera
            .uniform
            .update_view_proj(&self.camera.camera, &self.projection);
        self.gpu.queue.write_buffer(
            &self.camera.buffer,
            0,
            bytemuck::cast_slice(&[self.camera.uniform]),
        );
        self.light.uniform = self.lights.to_uniform(&self.camera.camera);
        self.gpu
            .queue
            .write_buffer(&self.light.buffer, 0, bytemuck::cast_slice(&[self.light.uniform]));
    }
}
