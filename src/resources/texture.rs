use std::{collections::HashMap, path::Path, rc::Rc};

use crate::{
    context::GraphicsContext,
    data_structures::texture::{TextureKind, TextureRef},
    error::{NginError, Result},
};

/// Bind group layout of a mesh material: diffuse, specular and normal map,
/// each as a texture followed by its sampler.
pub fn material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let entries: Vec<wgpu::BindGroupLayoutEntry> = (0..3)
        .flat_map(|i| {
            [
                wgpu::BindGroupLayoutEntry {
                    binding: 2 * i,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2 * i + 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ]
        })
        .collect();

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &entries,
        label: Some("material_bind_group_layout"),
    })
}

/// Decode `directory/path` and upload it.
///
/// Any format the `image` crate decodes is accepted; the pixels are expanded to
/// RGBA8 whatever their channel count. A decode failure, or an image that is
/// empty or larger than the device allows, carries the path that was tried.
pub fn load_texture_from_file<G: GraphicsContext>(
    ctx: &G,
    path: &str,
    directory: &Path,
    kind: TextureKind,
) -> Result<G::Texture> {
    let full_path = directory.join(path);
    let img = image::open(&full_path).map_err(|source| NginError::TextureLoad {
        path: full_path.clone(),
        source,
    })?;
    let max = ctx.max_texture_dimension();
    if img.width() == 0 || img.height() == 0 || img.width() > max || img.height() > max {
        log::warn!(
            "{} is {}x{}, textures must be between 1 and {max} pixels a side",
            full_path.display(),
            img.width(),
            img.height()
        );
        return Err(NginError::TextureLoad {
            path: full_path,
            source: image::ImageError::Limits(image::error::LimitError::from_kind(
                image::error::LimitErrorKind::DimensionError,
            )),
        });
    }
    log::debug!(
        "decoded {} ({}x{}, {:?})",
        full_path.display(),
        img.width(),
        img.height(),
        img.color()
    );
    Ok(ctx.create_texture(&full_path.to_string_lossy(), &img, kind))
}

/// Textures already uploaded for one model, keyed by the path string the
/// material names them with.
///
/// Matching is exact: `a.png` and `./a.png` are two uploads. Nothing is ever
/// evicted; the cache lives as long as its model.
#[derive(Debug)]
pub struct TextureCache<T> {
    loaded: HashMap<String, TextureRef<T>>,
}

impl<T> TextureCache<T> {
    pub fn new() -> Self {
        Self {
            loaded: HashMap::new(),
        }
    }

    /// Resolve `path`, uploading it on first use.
    ///
    /// A hit hands out the cached entry unchanged. It keeps the kind of the
    /// first request, which is also the colour space it was uploaded in.
    pub fn load<G>(
        &mut self,
        ctx: &G,
        path: &str,
        directory: &Path,
        kind: TextureKind,
    ) -> Result<TextureRef<T>>
    where
        G: GraphicsContext<Texture = T>,
    {
        if let Some(texture) = self.loaded.get(path) {
            if texture.kind != kind {
                log::debug!(
                    "texture cache hit for {path} as {kind:?}, keeping {:?}",
                    texture.kind
                );
            } else {
                log::debug!("texture cache hit for {path}");
            }
            return Ok(texture.clone());
        }

        let texture = Rc::new(load_texture_from_file(ctx, path, directory, kind)?);
        let texture = TextureRef::new(kind, path, texture);
        self.loaded.insert(path.to_string(), texture.clone());
        Ok(texture)
    }

    /// Number of distinct uploads.
    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.loaded.contains_key(path)
    }
}

impl<T> Default for TextureCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
