use sceneconfig::{AntialiasSetting, SceneConfig};

use crate::orchestrator::OrchestratorOptions;
use crate::timeline::Easing;
use crate::viewport::{ScreenPosition, Viewport};

/// Anti-aliasing policy for the render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Antialiasing {
    /// Pick the highest sample count supported by the surface format.
    #[default]
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

impl From<AntialiasSetting> for Antialiasing {
    fn from(value: AntialiasSetting) -> Self {
        match value {
            AntialiasSetting::Auto => Antialiasing::Auto,
            AntialiasSetting::Off => Antialiasing::Off,
            AntialiasSetting::Samples2 => Antialiasing::Samples(2),
            AntialiasSetting::Samples4 => Antialiasing::Samples(4),
            AntialiasSetting::Samples8 => Antialiasing::Samples(8),
            AntialiasSetting::Samples16 => Antialiasing::Samples(16),
        }
    }
}

/// What we learned about the GPU adapter wgpu handed us.
#[derive(Debug, Clone)]
pub struct AdapterProfile {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
    pub max_texture_dimension: u32,
}

impl AdapterProfile {
    pub(crate) fn from_wgpu(info: &wgpu::AdapterInfo, limits: &wgpu::Limits) -> Self {
        Self {
            name: info.name.clone(),
            backend: info.backend,
            device_type: info.device_type,
            max_texture_dimension: limits.max_texture_dimension_2d,
        }
    }

    /// llvmpipe, lavapipe, WARP and friends.
    pub fn is_software(&self) -> bool {
        if self.device_type == wgpu::DeviceType::Cpu {
            return true;
        }
        let name = self.name.to_ascii_lowercase();
        ["llvmpipe", "lavapipe", "softpipe", "swiftshader", "warp"]
            .iter()
            .any(|needle| name.contains(needle))
    }
}

/// Immutable configuration passed to the renderer at start-up.
///
/// `RendererConfig` mirrors the `[window]` and `[camera]` sections plus the
/// pan settings from `[animation]`; the grid itself is built by the caller
/// and handed to [`crate::Renderer::run`] as a scene element.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Window size in physical pixels.
    pub surface_size: (u32, u32),
    pub title: String,
    /// Anti-aliasing mode requested by the caller.
    pub antialiasing: Antialiasing,
    /// Starting composition, camera window and clear colour.
    pub scene: OrchestratorOptions,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            title: "flipgrid".into(),
            antialiasing: Antialiasing::default(),
            scene: OrchestratorOptions::default(),
        }
    }
}

impl RendererConfig {
    /// Builds the renderer settings from a validated config.
    pub fn from_scene_config(config: &SceneConfig, background: [u8; 3]) -> Self {
        let (width, height) = (config.window.width, config.window.height);
        let position: ScreenPosition = config.grid.position.into();
        Self {
            surface_size: (width, height),
            title: config.window.title.clone(),
            antialiasing: config.window.antialias.into(),
            scene: OrchestratorOptions {
                viewport: Viewport::new(width as f32, height as f32, position),
                background,
                fov_degrees: config.camera.fov,
                near: config.camera.near,
                far: config.camera.far,
                camera_distance: config.camera.distance,
                pan_duration: config.animation.pan_duration,
                pan_easing: Easing::from(config.animation.pan_easing),
                stats: config.window.stats,
            },
        }
    }
}
