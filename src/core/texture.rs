//! GPU shadow map textures
//!
//! Depth textures backing [`ShadowTargetPool`] handles on a wgpu device.
//! Textures are kept across frames and handed out again after a reset.

use crate::error::{Error, Result};
use crate::renderer::shadow::{ShadowTargetPool, TargetHandle};

/// The depth format used by shadow maps.
pub const SHADOW_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// A square depth texture, either single or six cube layers.
pub struct ShadowDepthTexture {
    _texture: wgpu::Texture,
    /// View over all layers, for sampling.
    pub(crate) view: wgpu::TextureView,
    /// One view per layer, for rendering.
    pub(crate) layer_views: Vec<wgpu::TextureView>,
    pub(crate) resolution: u32,
}

impl ShadowDepthTexture {
    /// Create a depth texture with `layers` layers (1 or 6).
    pub fn new(device: &wgpu::Device, resolution: u32, layers: u32, label: Option<&str>) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size: wgpu::Extent3d {
                width: resolution,
                height: resolution,
                depth_or_array_layers: layers,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SHADOW_DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(if layers == 6 {
                wgpu::TextureViewDimension::Cube
            } else {
                wgpu::TextureViewDimension::D2
            }),
            ..Default::default()
        });

        let layer_views = (0..layers)
            .map(|i| {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    base_array_layer: i,
                    array_layer_count: Some(1),
                    ..Default::default()
                })
            })
            .collect();

        Self {
            _texture: texture,
            view,
            layer_views,
            resolution,
        }
    }

    /// Get the sampling view.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Get a layer's render view.
    pub fn layer_view(&self, layer: u32) -> Option<&wgpu::TextureView> {
        self.layer_views.get(layer as usize)
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn layers(&self) -> u32 {
        self.layer_views.len() as u32
    }
}

/// Create a comparison sampler for shadow mapping.
pub fn create_comparison_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("shadow comparison sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        compare: Some(wgpu::CompareFunction::LessEqual),
        ..Default::default()
    })
}

/// Texture kind and level a pooled texture was created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PoolKey {
    level: usize,
    cube: bool,
}

struct PoolEntry {
    key: PoolKey,
    texture: ShadowDepthTexture,
    in_use: bool,
}

/// Shadow target pool on a wgpu device.
///
/// A single-map handle names one texture; the six handles of a cube map
/// name the layers of one six-layer texture.
pub struct GpuShadowTargets {
    device: wgpu::Device,
    limit: u32,
    entries: Vec<PoolEntry>,
}

impl GpuShadowTargets {
    pub fn new(device: wgpu::Device) -> Self {
        let limit = device.limits().max_texture_dimension_2d;
        Self {
            device,
            limit,
            entries: Vec::new(),
        }
    }

    /// Texture and layer behind a handle.
    pub fn resolve(&self, handle: TargetHandle) -> Option<(&ShadowDepthTexture, u32)> {
        let (index, layer) = decode(handle);
        self.entries.get(index).map(|e| (&e.texture, layer))
    }

    /// Render view behind a handle.
    pub fn render_view(&self, handle: TargetHandle) -> Option<&wgpu::TextureView> {
        let (texture, layer) = self.resolve(handle)?;
        texture.layer_view(layer)
    }

    fn acquire(&mut self, key: PoolKey, resolution: u32) -> Result<usize> {
        if resolution == 0 || resolution > self.limit {
            return Err(Error::TargetAllocation(format!(
                "shadow map size {resolution} outside 1..={}",
                self.limit
            )));
        }
        if let Some(index) = self
            .entries
            .iter()
            .position(|e| !e.in_use && e.key == key && e.texture.resolution == resolution)
        {
            self.entries[index].in_use = true;
            return Ok(index);
        }
        let layers = if key.cube { 6 } else { 1 };
        let label = format!("shadow map L{} {}", key.level, if key.cube { "cube" } else { "2d" });
        let texture = ShadowDepthTexture::new(&self.device, resolution, layers, Some(&label));
        tracing::debug!(level = key.level, resolution, layers, "allocated shadow texture");
        self.entries.push(PoolEntry {
            key,
            texture,
            in_use: true,
        });
        Ok(self.entries.len() - 1)
    }
}

impl ShadowTargetPool for GpuShadowTargets {
    fn single(&mut self, level: usize, resolution: u32) -> Result<TargetHandle> {
        let index = self.acquire(PoolKey { level, cube: false }, resolution)?;
        Ok(encode(index, 0))
    }

    fn cube(&mut self, level: usize, resolution: u32) -> Result<[TargetHandle; 6]> {
        let index = self.acquire(PoolKey { level, cube: true }, resolution)?;
        Ok(std::array::from_fn(|layer| encode(index, layer as u32)))
    }

    fn reset(&mut self) {
        for entry in &mut self.entries {
            entry.in_use = false;
        }
    }
}

/// Handles pack the pool index above three layer bits.
fn encode(index: usize, layer: u32) -> TargetHandle {
    TargetHandle(((index as u32) << 3) | layer)
}

fn decode(handle: TargetHandle) -> (usize, u32) {
    ((handle.0 >> 3) as usize, handle.0 & 0b111)
}
