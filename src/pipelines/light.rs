//! Scene lights and their uniform buffer.
//!
//! One directional light, four point lights and a spotlight that travels with
//! the camera. The GPU structs are padded by hand to the WGSL uniform layout.

use bytemuck::Zeroable;
use wgpu::util::DeviceExt;

use crate::{
    camera::Camera,
    data_structures::geometry::{POINT_LIGHT_COLORS, POINT_LIGHT_POSITIONS},
};

pub const NUM_POINT_LIGHTS: usize = 4;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirLight {
    pub direction: [f32; 3],
    _padding0: u32,
    pub ambient: [f32; 3],
    _padding1: u32,
    pub diffuse: [f32; 3],
    _padding2: u32,
    pub specular: [f32; 3],
    _padding3: u32,
}

impl DirLight {
    pub fn new(direction: [f32; 3], ambient: [f32; 3], diffuse: [f32; 3], specular: [f32; 3]) -> Self {
        Self {
            direction,
            ambient,
            diffuse,
            specular,
            ..Self::zeroed()
        }
    }
}

/// Attenuation terms sit in the padding after each vec3.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLight {
    pub position: [f32; 3],
    pub constant: f32,
    pub ambient: [f32; 3],
    pub linear: f32,
    pub diffuse: [f32; 3],
    pub quadratic: f32,
    pub specular: [f32; 3],
    _padding: u32,
}

impl PointLight {
    /// Ambient is a tenth of the colour, diffuse and specular the full colour.
    pub fn coloured(position: [f32; 3], colour: [f32; 3]) -> Self {
        Self {
            position,
            constant: 1.0,
            ambient: colour.map(|c| c * 0.1),
            linear: 0.09,
            diffuse: colour,
            quadratic: 0.032,
            specular: colour,
            _padding: 0,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpotLight {
    pub position: [f32; 3],
    pub constant: f32,
    pub direction: [f32; 3],
    pub linear: f32,
    pub ambient: [f32; 3],
    pub quadratic: f32,
    pub diffuse: [f32; 3],
    /// Cosine of the inner cone angle.
    pub cut_off: f32,
    pub specular: [f32; 3],
    pub outer_cut_off: f32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub dir_light: DirLight,
    pub point_lights: [PointLight; NUM_POINT_LIGHTS],
    pub spot_light: SpotLight,
    pub shininess: f32,
    /// 0 or 1; WGSL has no bool in uniform buffers.
    pub spot_enabled: u32,
    _padding: [u32; 2],
}

/// CPU-side light setup. The spotlight's position and direction are taken from
/// the camera each time the uniform is built.
#[derive(Debug, Clone)]
pub struct Lights {
    pub dir_light: DirLight,
    pub point_lights: [PointLight; NUM_POINT_LIGHTS],
    pub spot_light: SpotLight,
    pub spot_enabled: bool,
    pub shininess: f32,
}

impl Default for Lights {
    fn default() -> Self {
        Self {
            dir_light: DirLight::new(
                [-0.2, -1.0, -0.3],
                [0.05, 0.05, 0.1],
                [0.2, 0.2, 0.7],
                [0.7, 0.7, 0.7],
            ),
            point_lights: std::array::from_fn(|i| {
                PointLight::coloured(POINT_LIGHT_POSITIONS[i], POINT_LIGHT_COLORS[i])
            }),
            spot_light: SpotLight {
                position: [0.0; 3],
                constant: 1.0,
                direction: [0.0, 0.0, -1.0],
                linear: 0.009,
                ambient: [0.0; 3],
                quadratic: 0.0032,
                diffuse: [1.0; 3],
                cut_off: 10.0f32.to_radians().cos(),
                specular: [1.0; 3],
                outer_cut_off: 12.5f32.to_radians().cos(),
            },
            spot_enabled: true,
            shininess: 32.0,
        }
    }
}

impl Lights {
    pub fn toggle_spot_light(&mut self) {
        self.spot_enabled = !self.spot_enabled;
        log::debug!("spot light {}", if self.spot_enabled { "on" } else { "off" });
    }

    pub fn to_uniform(&self, camera: &Camera) -> LightUniform {
        let mut spot_light = self.spot_light;
        spot_light.position = camera.position.into();
        spot_light.direction = camera.front().into();
        LightUniform {
            dir_light: self.dir_light,
            point_lights: self.point_lights,
            spot_light,
            shininess: self.shininess,
            spot_enabled: self.spot_enabled as u32,
            _padding: [0; 2],
        }
    }
}

/// The light uniform buffer and its bind group.
#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(device: &wgpu::Device, uniform: LightUniform) -> Self {
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Uniform Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}
