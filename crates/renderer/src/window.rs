use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

use tracing::{error, info, warn};

use crate::gpu::GpuState;
use crate::orchestrator::SceneOrchestrator;
use crate::scene::{RenderBackend, SceneElement};
use crate::types::RendererConfig;
use crate::viewport::ScreenPosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputAction {
    Move(ScreenPosition),
    Exit,
}

pub(crate) fn key_action(key: &Key) -> Option<InputAction> {
    match key {
        Key::Named(NamedKey::ArrowLeft) => Some(InputAction::Move(ScreenPosition::Left)),
        Key::Named(NamedKey::ArrowRight) => Some(InputAction::Move(ScreenPosition::Right)),
        Key::Named(NamedKey::Escape) => Some(InputAction::Exit),
        Key::Character(value) => match value.to_ascii_lowercase().as_str() {
            "a" => Some(InputAction::Move(ScreenPosition::Left)),
            "d" => Some(InputAction::Move(ScreenPosition::Right)),
            "c" => Some(InputAction::Move(ScreenPosition::Center)),
            "q" => Some(InputAction::Exit),
            _ => None,
        },
        _ => None,
    }
}

/// Clicks on the left half pick the left composition, the rest pick right.
pub(crate) fn click_position(x: f64, width: u32) -> ScreenPosition {
    if x < f64::from(width) / 2.0 {
        ScreenPosition::Left
    } else {
        ScreenPosition::Right
    }
}

/// Opens the window and drives `elements` until the window closes.
pub(crate) fn run(config: &RendererConfig, elements: Vec<Box<dyn SceneElement>>) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to initialize event loop")?;
    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let window = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(window_size)
        .build(&event_loop)
        .context("failed to create window")?;
    let window = Arc::new(window);

    let size = window.inner_size();
    let gpu = GpuState::new(Arc::clone(&window), size, config.antialiasing)
        .context("failed to initialise GPU renderer")?;
    let profile = gpu.adapter_profile().clone();
    if profile.is_software() {
        warn!(
            adapter = %profile.name,
            backend = ?profile.backend,
            "software rasterizer detected; animation may stutter"
        );
    }

    let mut options = config.scene.clone();
    options
        .viewport
        .update(size.width.max(1) as f32, size.height.max(1) as f32);
    let mut orchestrator = SceneOrchestrator::new(options, gpu, elements, Instant::now());
    info!(
        width = size.width,
        height = size.height,
        position = %orchestrator.viewport().position,
        "window ready"
    );

    let title = config.title.clone();
    let mut cursor: Option<PhysicalPosition<f64>> = None;
    window.request_redraw();

    let run_result = event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                orchestrator.shutdown();
                elwt.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                match key_action(&event.logical_key) {
                    Some(InputAction::Move(position)) => {
                        orchestrator.toggle_move_position(position, Instant::now());
                    }
                    Some(InputAction::Exit) => {
                        orchestrator.shutdown();
                        elwt.exit();
                    }
                    None => {}
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                cursor = Some(position);
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if let Some(position) = cursor {
                    let target = click_position(position.x, window.inner_size().width);
                    orchestrator.toggle_move_position(target, Instant::now());
                }
            }
            WindowEvent::Resized(new_size) => {
                if new_size.width == 0 || new_size.height == 0 {
                    return;
                }
                if let Err(err) = orchestrator.on_resize(new_size.width, new_size.height) {
                    handle_surface_error(err, &mut orchestrator, elwt);
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                orchestrator.poll_timers(now);
                match orchestrator.frame(now) {
                    Ok(()) => {
                        if let Some(sample) = orchestrator.take_published_stats() {
                            window.set_title(&format!("{title} ({:.0} fps)", sample.fps));
                        }
                    }
                    Err(err) => handle_surface_error(err, &mut orchestrator, elwt),
                }
            }
            _ => {}
        },
        Event::AboutToWait => {
            if !orchestrator.is_running() {
                return;
            }
            let now = Instant::now();
            orchestrator.poll_timers(now);
            window.request_redraw();
            // redraws can be throttled while the window is hidden; timers still wake us
            match orchestrator.next_deadline() {
                Some(deadline) => {
                    let ms = deadline.saturating_duration_since(now).as_millis();
                    tracing::trace!(deadline_ms = ms, "waiting until next stagger deadline");
                    elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
                }
                None => elwt.set_control_flow(ControlFlow::Wait),
            }
        }
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}

fn handle_surface_error(
    err: wgpu::SurfaceError,
    orchestrator: &mut SceneOrchestrator<GpuState>,
    elwt: &EventLoopWindowTarget<()>,
) {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
            let size = orchestrator.backend().size();
            orchestrator.backend_mut().resize(size.width, size.height);
        }
        wgpu::SurfaceError::OutOfMemory => {
            error!("surface out of memory; exiting");
            orchestrator.shutdown();
            elwt.exit();
        }
        wgpu::SurfaceError::Timeout => {
            warn!("surface timeout; retrying next frame");
        }
        other => {
            warn!(error = ?other, "surface error; retrying next frame");
        }
    }
}
