//! GPU textures and the references meshes hold to them.
//!
//! This module provides [`Texture`], a wrapper around the WGPU texture, view and
//! sampler triple, the [`TextureKind`] tag that decides which material slot a
//! texture feeds, and [`TextureRef`], the shared handle a mesh keeps.

use std::rc::Rc;

use image::GenericImageView;

/// A GPU texture with a view and optional sampler.
///
/// Typically created via [`from_image`](Self::from_image) for material maps or
/// via [`create_depth_texture`](Self::create_depth_texture) for the depth buffer.
/// Dropping the last clone releases the GPU allocation.
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Create a depth texture for depth-testing during rendering.
    ///
    /// # Arguments
    ///
    /// * `size` is [width, height] of the texture in pixels
    /// * `label` is used as a debug label for the GPU resource
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            sampler: None,
        }
    }

    /// Create a 1x1 texture of a single colour.
    ///
    /// Used as the stand-in for material families a mesh has no texture for, so
    /// the shader never samples whatever another mesh left behind.
    pub fn create_solid(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: [u8; 4],
        label: &str,
        srgb: bool,
    ) -> Texture {
        let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            1,
            1,
            image::Rgba(rgba),
        ));
        Self::from_image(device, queue, &img, Some(label), srgb)
    }

    /// Upload a decoded image with a full mip chain.
    ///
    /// Whatever the source channel layout (grey, grey+alpha, RGB, RGBA) the
    /// pixels are expanded to RGBA8. `srgb` selects between a colour format
    /// (diffuse maps) and a linear one (specular, normal and height maps).
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &image::DynamicImage,
        label: Option<&str>,
        srgb: bool,
    ) -> Self {
        let dimensions = img.dimensions();
        let rgba = img.to_rgba8();

        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };
        let format = if srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };
        let mip_level_count = mip_level_count(dimensions.0, dimensions.1);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        // wgpu has no glGenerateMipmap, the chain is built on the CPU
        let mut level_image = rgba;
        for mip_level in 0..mip_level_count {
            let (width, height) = level_image.dimensions();
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level,
                    origin: wgpu::Origin3d::ZERO,
                },
                &level_image,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * width),
                    rows_per_image: Some(height),
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
            if mip_level + 1 < mip_level_count {
                level_image = image::imageops::resize(
                    &level_image,
                    (width / 2).max(1),
                    (height / 2).max(1),
                    image::imageops::FilterType::Triangle,
                );
            }
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(create_default_sampler(device));

        Self {
            texture,
            view,
            sampler,
        }
    }
}

/// Repeat wrapping with linear filtering inside and across mip levels.
pub fn create_default_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

/// Number of levels down to 1x1 for a `width` x `height` image.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// What a material texture is used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Diffuse,
    Specular,
    Normal,
    Height,
}

impl TextureKind {
    pub const ALL: [TextureKind; 4] = [
        TextureKind::Diffuse,
        TextureKind::Specular,
        TextureKind::Normal,
        TextureKind::Height,
    ];

    /// Sampler name prefix; the n-th texture of a kind binds as `<prefix><n>`.
    pub fn type_name(self) -> &'static str {
        match self {
            TextureKind::Diffuse => "texture_diffuse",
            TextureKind::Specular => "texture_specular",
            TextureKind::Normal => "texture_normal",
            TextureKind::Height => "texture_height",
        }
    }

    /// Only colour maps are stored in sRGB.
    pub fn is_srgb(self) -> bool {
        matches!(self, TextureKind::Diffuse)
    }
}

/// A material texture as a mesh sees it: the shared GPU handle, what it is
/// used for and the path it was loaded from.
///
/// Clones share the handle. The GPU texture lives until the last reference,
/// in the owning model's cache or in one of its meshes, is dropped.
#[derive(Debug)]
pub struct TextureRef<T> {
    pub kind: TextureKind,
    pub path: String,
    texture: Rc<T>,
}

impl<T> TextureRef<T> {
    pub fn new(kind: TextureKind, path: impl Into<String>, texture: Rc<T>) -> Self {
        Self {
            kind,
            path: path.into(),
            texture,
        }
    }

    pub fn texture(&self) -> &T {
        &self.texture
    }

    /// True if both references point at the same uploaded texture.
    pub fn shares_handle(&self, other: &TextureRef<T>) -> bool {
        Rc::ptr_eq(&self.texture, &other.texture)
    }
}

impl<T> Clone for TextureRef<T> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            path: self.path.clone(),
            texture: Rc::clone(&self.texture),
        }
    }
}
