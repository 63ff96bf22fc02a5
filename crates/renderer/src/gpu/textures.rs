use std::collections::HashMap;

use image::RgbaImage;
use wgpu::util::{DeviceExt, TextureDataOrder};

use crate::scene::{Scene, SurfaceKey};

struct SurfaceTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// GPU copies of scene surfaces, uploaded the first time they are drawn.
pub(crate) struct TextureCache {
    sampler: wgpu::Sampler,
    entries: HashMap<SurfaceKey, SurfaceTexture>,
}

impl TextureCache {
    pub fn new(device: &wgpu::Device) -> Self {
        // nearest magnification keeps tile edges crisp
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("tile sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        Self {
            sampler,
            entries: HashMap::new(),
        }
    }

    /// Uploads every scene surface not yet on the GPU.
    pub fn sync(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        scene: &Scene,
    ) {
        let mut uploaded = 0usize;
        for (key, image) in scene.surfaces() {
            if self.entries.contains_key(&key) {
                continue;
            }
            let entry = self.upload(device, queue, layout, key, image);
            self.entries.insert(key, entry);
            uploaded += 1;
        }
        if uploaded > 0 {
            tracing::debug!(uploaded, total = self.entries.len(), "uploaded tile textures");
        }
    }

    pub fn bind_group(&self, key: SurfaceKey) -> Option<&wgpu::BindGroup> {
        self.entries.get(&key).map(|entry| &entry.bind_group)
    }

    fn upload(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        key: SurfaceKey,
        image: &RgbaImage,
    ) -> SurfaceTexture {
        let (width, height) = image.dimensions();
        let label = format!("tile surface #{}", key.get());
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(&label),
                size: wgpu::Extent3d {
                    width: width.max(1),
                    height: height.max(1),
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            TextureDataOrder::LayerMajor,
            image.as_raw(),
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        SurfaceTexture {
            _texture: texture,
            bind_group,
        }
    }
}
