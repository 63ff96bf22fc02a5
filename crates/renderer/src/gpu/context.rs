use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use wgpu::{TextureFormatFeatureFlags, TextureFormatFeatures};
use winit::dpi::PhysicalSize;

use crate::types::{AdapterProfile, Antialiasing};

use super::pipeline::DEPTH_FORMAT;

/// Sample counts every adapter supports for render targets without
/// `TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES`.
const PORTABLE_SAMPLE_COUNTS: [u32; 2] = [1, 4];

/// Whether the swapchain encodes to sRGB for us or the shader has to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SurfaceColorSpace {
    Srgb,
    Linear,
}

/// Sample counts usable by both the colour target and the depth buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SampleSupport {
    counts: Vec<u32>,
}

impl SampleSupport {
    /// Intersects the colour and depth counts. Without adapter specific
    /// format features only the portable counts survive.
    pub(crate) fn new(colour: &[u32], depth: &[u32], adapter_specific_formats: bool) -> Self {
        let mut counts: Vec<u32> = colour
            .iter()
            .copied()
            .filter(|count| depth.contains(count))
            .filter(|count| adapter_specific_formats || PORTABLE_SAMPLE_COUNTS.contains(count))
            .chain(std::iter::once(1))
            .collect();
        counts.sort_unstable();
        counts.dedup();
        Self { counts }
    }

    pub(crate) fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Resolves the requested setting to a count in this set, falling back
    /// to the largest supported count below the request.
    pub(crate) fn choose(&self, antialiasing: Antialiasing) -> u32 {
        match antialiasing {
            Antialiasing::Off => 1,
            Antialiasing::Auto => self.counts.last().copied().unwrap_or(1),
            Antialiasing::Samples(requested) if self.counts.contains(&requested) => requested,
            Antialiasing::Samples(requested) => {
                let fallback = self
                    .counts
                    .iter()
                    .copied()
                    .filter(|&count| count <= requested)
                    .max()
                    .unwrap_or(1);
                tracing::warn!(
                    requested,
                    fallback,
                    supported = ?self.counts,
                    "MSAA sample count unavailable for colour and depth targets"
                );
                fallback
            }
        }
    }
}

/// Whether a device must enable adapter specific format features to render
/// with `sample_count`.
pub(crate) fn needs_adapter_specific_formats(sample_count: u32) -> bool {
    !PORTABLE_SAMPLE_COUNTS.contains(&sample_count)
}

/// Device, queue and configured swapchain for one window.
///
/// The surface holds its own reference to the window, so the window cannot
/// be dropped while the surface still presents to it.
pub(crate) struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: PhysicalSize<u32>,
    pub sample_count: u32,
    pub surface_format: wgpu::TextureFormat,
    pub color_space: SurfaceColorSpace,
    pub adapter_profile: AdapterProfile,
}

impl GpuContext {
    pub(crate) fn new<W>(
        window: Arc<W>,
        initial_size: PhysicalSize<u32>,
        antialiasing: Antialiasing,
    ) -> Result<Self>
    where
        W: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });
        let surface = instance
            .create_surface(window)
            .context("failed to create rendering surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("failed to find a suitable GPU adapter")?;

        let limits = adapter.limits();
        let adapter_profile = AdapterProfile::from_wgpu(&adapter.get_info(), &limits);
        tracing::debug!(
            name = %adapter_profile.name,
            backend = ?adapter_profile.backend,
            device_type = ?adapter_profile.device_type,
            "selected GPU adapter"
        );

        let size = PhysicalSize::new(initial_size.width.max(1), initial_size.height.max(1));
        let max_side = limits.max_texture_dimension_2d;
        if size.width > max_side || size.height > max_side {
            bail!(
                "window is {}x{} but the GPU allows at most {max_side} pixels per side",
                size.width,
                size.height
            );
        }

        let capabilities = surface.get_capabilities(&adapter);
        let surface_format = pick_surface_format(&capabilities.formats)?;
        let color_space = if surface_format.is_srgb() {
            SurfaceColorSpace::Srgb
        } else {
            SurfaceColorSpace::Linear
        };

        let sample_count = negotiate_sample_count(
            &adapter,
            surface_format,
            antialiasing,
            adapter_profile.is_software(),
        );
        let required_features = if needs_adapter_specific_formats(sample_count) {
            wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES
        } else {
            wgpu::Features::empty()
        };

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("flipgrid device"),
            required_features,
            required_limits: limits,
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .context("failed to create GPU device")?;

        let present_mode = if capabilities.present_modes.contains(&wgpu::PresentMode::Fifo) {
            wgpu::PresentMode::Fifo
        } else {
            capabilities
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo)
        };
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode: capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: Vec::new(),
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        tracing::debug!(?present_mode, ?surface_format, sample_count, "surface configured");

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            sample_count,
            surface_format,
            color_space,
            adapter_profile,
        })
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }
}

/// Prefers an sRGB swapchain; otherwise the shader encodes.
fn pick_surface_format(formats: &[wgpu::TextureFormat]) -> Result<wgpu::TextureFormat> {
    if let Some(format) = formats.iter().copied().find(|format| format.is_srgb()) {
        return Ok(format);
    }
    let format = formats
        .first()
        .copied()
        .context("surface reports no supported formats")?;
    tracing::warn!(?format, "no sRGB surface format available; encoding colours in the shader");
    Ok(format)
}

fn negotiate_sample_count(
    adapter: &wgpu::Adapter,
    surface_format: wgpu::TextureFormat,
    antialiasing: Antialiasing,
    is_software: bool,
) -> u32 {
    let colour = adapter.get_texture_format_features(surface_format);
    let depth = adapter.get_texture_format_features(DEPTH_FORMAT);
    let support = SampleSupport::new(
        &colour.flags.supported_sample_counts(),
        &depth.flags.supported_sample_counts(),
        adapter
            .features()
            .contains(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES),
    );
    let sample_count = support.choose(antialiasing);
    if sample_count == 1 {
        return 1;
    }
    if !can_resolve(&colour) {
        tracing::warn!(?surface_format, "surface format cannot resolve MSAA; disabling MSAA");
        return 1;
    }
    if is_software {
        tracing::warn!(sample_count, "software rasterizer detected; disabling MSAA");
        return 1;
    }
    sample_count
}

fn can_resolve(features: &TextureFormatFeatures) -> bool {
    features
        .flags
        .contains(TextureFormatFeatureFlags::MULTISAMPLE_RESOLVE)
}
