//! Render pipelines and their WGSL shaders.
//!
//! - `basic` builds the model, lighting and light-cube pipelines
//! - `light` holds the light uniforms the lighting pipeline reads

pub mod basic;
pub mod light;

/// Every pipeline the demo draws with, built once per surface format.
#[derive(Debug)]
pub struct Pipelines {
    pub model: wgpu::RenderPipeline,
    pub lighting: wgpu::RenderPipeline,
    pub light_cube: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        material_layout: &wgpu::BindGroupLayout,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        light_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        Self {
            model: basic::mk_model_pipeline(
                device,
                color_format,
                material_layout,
                camera_bind_group_layout,
            ),
            lighting: basic::mk_lighting_pipeline(
                device,
                color_format,
                material_layout,
                camera_bind_group_layout,
                light_bind_group_layout,
            ),
            light_cube: basic::mk_light_cube_pipeline(
                device,
                color_format,
                camera_bind_group_layout,
            ),
        }
    }
}
