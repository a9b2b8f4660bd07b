//! What the demo draws each frame and in which order.
//!
//! The imported model goes through the plain textured pipeline, the ten
//! containers through the lighting pipeline and the four light markers
//! through the flat white one. Each is one instanced draw per mesh.

use wgpu::util::DeviceExt;

use crate::{
    config::DemoConfig,
    context::{Context, GpuContext},
    data_structures::{
        geometry,
        instance::{Instance, InstanceRaw},
        model::{DrawLight, DrawModel, Model},
    },
    error::Result,
};

/// A model together with the per-instance transforms it is drawn with.
pub struct Instanced {
    pub model: Model<GpuContext>,
    pub instance_buffer: wgpu::Buffer,
    pub amount: u32,
}

impl Instanced {
    pub fn new(
        device: &wgpu::Device,
        model: Model<GpuContext>,
        instances: &[Instance],
        label: &str,
    ) -> Self {
        let raw: Vec<InstanceRaw> = instances.iter().map(Instance::to_raw).collect();
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&raw),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            model,
            instance_buffer,
            amount: instances.len() as u32,
        }
    }

    fn is_empty(&self) -> bool {
        self.amount == 0 || self.instance_buffer.size() == 0
    }
}

pub struct DemoScene {
    pub model: Instanced,
    pub containers: Instanced,
    pub light_markers: Instanced,
}

impl DemoScene {
    /// Load the configured model and build the procedural cubes.
    pub fn new(ctx: &Context, config: &DemoConfig) -> Result<Self> {
        let device = &ctx.gpu.device;

        let model_path = config.model_path();
        log::info!("loading {}", model_path.display());
        let model = Model::from_file(&ctx.gpu, &model_path)?;

        let container = Model::from_scene(
            &ctx.gpu,
            &geometry::container_scene(&config.container_diffuse, &config.container_specular),
            config.texture_directory(),
        )?;
        let light_cube = Model::from_scene(&ctx.gpu, &geometry::light_cube_scene(), &config.asset_root)?;

        Ok(Self {
            model: Instanced::new(device, model, &[Instance::new()], "model instances"),
            containers: Instanced::new(
                device,
                container,
                &geometry::container_instances(),
                "container instances",
            ),
            light_markers: Instanced::new(
                device,
                light_cube,
                &geometry::light_marker_instances(),
                "light marker instances",
            ),
        })
    }

    /// Record every draw of the frame into `pass`.
    pub fn draw(&self, ctx: &Context, pass: &mut wgpu::RenderPass<'_>) {
        if self.has_instances(&self.model) {
            pass.set_pipeline(&ctx.pipelines.model);
            pass.set_bind_group(1, &ctx.camera.bind_group, &[]);
            pass.set_vertex_buffer(1, self.model.instance_buffer.slice(..));
            pass.draw_model_instanced(&self.model.model, 0..self.model.amount);
        }

        if self.has_instances(&self.containers) {
            pass.set_pipeline(&ctx.pipelines.lighting);
            pass.set_bind_group(1, &ctx.camera.bind_group, &[]);
            pass.set_bind_group(2, &ctx.light.bind_group, &[]);
            pass.set_vertex_buffer(1, self.containers.instance_buffer.slice(..));
            pass.draw_model_instanced(&self.containers.model, 0..self.containers.amount);
        }

        if self.has_instances(&self.light_markers) {
            pass.set_pipeline(&ctx.pipelines.light_cube);
            pass.set_bind_group(0, &ctx.camera.bind_group, &[]);
            pass.set_vertex_buffer(1, self.light_markers.instance_buffer.slice(..));
            pass.draw_light_model_instanced(&self.light_markers.model, 0..self.light_markers.amount);
        }
    }

    fn has_instances(&self, instanced: &Instanced) -> bool {
        if instanced.is_empty() {
            log::warn!("you attempted to render something with zero instances");
            return false;
        }
        true
    }
}
