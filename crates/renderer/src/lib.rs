//! Renderer crate for flipgrid.
//!
//! The crate owns the animated tile scene and the window that shows it. The
//! overall flow is:
//!
//! ```text
//!   CLI / flipgrid
//!          │ RendererConfig + ImageGrid
//!          ▼
//!   Renderer::run ──▶ SceneOrchestrator ──▶ winit event loop
//!                        │        │
//!                        │        └─▶ poll_timers() ─▶ StaggerScheduler
//!                        │                                  └─▶ Tile::trigger_flip
//!                        └─▶ frame() ─▶ pan / drift / rotation
//!                                          └─▶ DrawList ─▶ GpuState
//! ```
//!
//! Everything above `gpu` and `window` is headless: the orchestrator takes any
//! [`RenderBackend`] and every time-dependent call receives the current
//! `Instant`, so animation behaviour is exercised in unit tests without a
//! display.

mod camera;
mod gpu;
mod grid;
mod orchestrator;
mod scene;
mod stats;
mod tile;
mod timeline;
mod types;
mod viewport;
mod window;

use anyhow::Result;

pub use camera::{PerspectiveCamera, ViewOffset};
pub use gpu::GpuState;
pub use grid::{Face, GridError, GridLayout, GridOptions, ImageGrid};
pub use orchestrator::{OrchestratorOptions, SceneOrchestrator};
pub use scene::{
    DrawList, PixelRect, QuadDraw, RenderBackend, Rotatable, Scene, SceneElement, Surface,
    SurfaceKey, Transform,
};
pub use stats::{FrameStats, StatsSample};
pub use tile::{FlipState, Tile, TileOptions, FLIP_DEGREES};
pub use timeline::{AnimatedValue, Easing};
pub use types::{AdapterProfile, Antialiasing, RendererConfig};
pub use viewport::{ScreenPosition, Viewport};

/// High-level entry point that owns the chosen configuration.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    /// Builds a renderer for the supplied configuration.
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Opens the window and animates `elements` until it is closed.
    ///
    /// Returns an error if no window or GPU adapter can be created (for
    /// example on a headless machine).
    pub fn run(&mut self, elements: Vec<Box<dyn SceneElement>>) -> Result<()> {
        tracing::info!(
            width = self.config.surface_size.0,
            height = self.config.surface_size.1,
            elements = elements.len(),
            "starting renderer"
        );
        window::run(&self.config, elements)
    }
}
