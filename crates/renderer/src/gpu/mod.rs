//! wgpu backend for the tile scene.
//!
//! - `context` owns wgpu instance/device/surface wiring and knows how to
//!   rebuild swapchain state when the window resizes.
//! - `pipeline` builds the single textured-quad pipeline (WGSL, depth test,
//!   back-face culling, optional MSAA).
//! - `textures` uploads scene surfaces once and hands out their bind groups.
//! - `state` glues everything together as the [`crate::RenderBackend`] used
//!   by `window`.

mod context;
mod pipeline;
mod state;
mod textures;

pub use state::GpuState;
