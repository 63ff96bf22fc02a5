use std::sync::Arc;

use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::camera::PerspectiveCamera;
use crate::scene::{DrawList, RenderBackend, Scene};
use crate::types::{AdapterProfile, Antialiasing};

use super::context::{GpuContext, SurfaceColorSpace};
use super::pipeline::{
    CameraUniforms, QuadInstance, TilePipeline, DEPTH_FORMAT, QUAD_VERTICES,
};
use super::textures::TextureCache;

struct MultisampleTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl MultisampleTarget {
    fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
        sample_count: u32,
    ) -> Self {
        let extent = wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("msaa color target"),
            size: extent,
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

struct DepthTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthTarget {
    fn new(device: &wgpu::Device, size: PhysicalSize<u32>, sample_count: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth target"),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

/// Maps an sRGB byte triple to the clear colour the surface expects.
fn clear_color(rgb: [u8; 3], color_space: SurfaceColorSpace) -> wgpu::Color {
    let channel = |value: u8| {
        let encoded = f64::from(value) / 255.0;
        match color_space {
            SurfaceColorSpace::Linear => encoded,
            SurfaceColorSpace::Srgb => {
                if encoded <= 0.04045 {
                    encoded / 12.92
                } else {
                    ((encoded + 0.055) / 1.055).powf(2.4)
                }
            }
        }
    };
    wgpu::Color {
        r: channel(rgb[0]),
        g: channel(rgb[1]),
        b: channel(rgb[2]),
        a: 1.0,
    }
}

/// wgpu implementation of [`RenderBackend`].
pub struct GpuState {
    context: GpuContext,
    pipeline: TilePipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    instances: Vec<QuadInstance>,
    textures: TextureCache,
    depth_target: DepthTarget,
    multisample_target: Option<MultisampleTarget>,
}

impl GpuState {
    pub(crate) fn new<W>(
        window: Arc<W>,
        initial_size: PhysicalSize<u32>,
        antialiasing: Antialiasing,
    ) -> Result<Self>
    where
        W: HasDisplayHandle + HasWindowHandle + Send + Sync + 'static,
    {
        let context = GpuContext::new(window, initial_size, antialiasing)?;
        let device = &context.device;
        let pipeline = TilePipeline::new(device, context.surface_format, context.sample_count);

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("camera uniforms"),
            size: std::mem::size_of::<CameraUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera bind group"),
            layout: &pipeline.camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad vertices"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let instance_capacity = 128;
        let instance_buffer = Self::create_instance_buffer(device, instance_capacity);

        let textures = TextureCache::new(device);
        let depth_target = DepthTarget::new(device, context.size, context.sample_count);
        let multisample_target = (context.sample_count > 1).then(|| {
            MultisampleTarget::new(
                device,
                context.surface_format,
                context.size,
                context.sample_count,
            )
        });

        Ok(Self {
            context,
            pipeline,
            camera_buffer,
            camera_bind_group,
            vertex_buffer,
            instance_buffer,
            instance_capacity,
            instances: Vec::with_capacity(instance_capacity),
            textures,
            depth_target,
            multisample_target,
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn adapter_profile(&self) -> &AdapterProfile {
        &self.context.adapter_profile
    }

    fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quad instances"),
            size: (capacity * std::mem::size_of::<QuadInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn upload_instances(&mut self, draw_list: &DrawList) {
        self.instances.clear();
        self.instances
            .extend(draw_list.quads().iter().map(|quad| QuadInstance {
                model: quad.model.to_cols_array_2d(),
                size: quad.size.to_array(),
                _padding: [0.0; 2],
            }));
        if self.instances.len() > self.instance_capacity {
            self.instance_capacity = self.instances.len().next_power_of_two();
            self.instance_buffer =
                Self::create_instance_buffer(&self.context.device, self.instance_capacity);
            tracing::debug!(capacity = self.instance_capacity, "grew instance buffer");
        }
        if !self.instances.is_empty() {
            self.context.queue.write_buffer(
                &self.instance_buffer,
                0,
                bytemuck::cast_slice(&self.instances),
            );
        }
    }
}

impl RenderBackend for GpuState {
    type Error = wgpu::SurfaceError;

    fn resize(&mut self, width: u32, height: u32) {
        let new_size = PhysicalSize::new(width, height);
        if width == 0 || height == 0 {
            return;
        }
        self.context.resize(new_size);
        self.depth_target =
            DepthTarget::new(&self.context.device, new_size, self.context.sample_count);
        self.multisample_target = (self.context.sample_count > 1).then(|| {
            MultisampleTarget::new(
                &self.context.device,
                self.context.surface_format,
                new_size,
                self.context.sample_count,
            )
        });
    }

    fn render(
        &mut self,
        scene: &Scene,
        draw_list: &DrawList,
        camera: &PerspectiveCamera,
    ) -> Result<(), Self::Error> {
        let frame = self.context.surface.get_current_texture()?;

        self.textures.sync(
            &self.context.device,
            &self.context.queue,
            &self.pipeline.texture_layout,
            scene,
        );
        let uniforms = CameraUniforms::new(camera.view_projection(), self.context.color_space);
        self.context
            .queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&uniforms));
        self.upload_instances(draw_list);

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("render encoder"),
                });

        {
            let (attachment_view, resolve_target) =
                if let Some(msaa) = self.multisample_target.as_ref() {
                    (&msaa.view, Some(&view))
                } else {
                    (&view, None)
                };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("tile pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment_view,
                    depth_slice: None,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(
                            scene.background(),
                            self.context.color_space,
                        )),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_target.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.pipeline.pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            for (index, quad) in draw_list.quads().iter().enumerate() {
                let Some(bind_group) = self.textures.bind_group(quad.surface) else {
                    tracing::trace!(surface = quad.surface.get(), "quad surface not registered");
                    continue;
                };
                let instance = index as u32;
                render_pass.set_bind_group(1, bind_group, &[]);
                render_pass.draw(0..QUAD_VERTICES.len() as u32, instance..instance + 1);
            }
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}
