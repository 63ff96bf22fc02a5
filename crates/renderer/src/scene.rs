//! Renderer-agnostic scene plumbing shared by elements and backends.
//!
//! ```text
//!   SceneElement::attach ──▶ Scene (surface registry, background)
//!   SceneElement::collect ─▶ DrawList (one QuadDraw per visible face)
//!                                   │
//!   RenderBackend::render(scene, draw_list, camera) ◀┘
//! ```
//!
//! Elements keep ownership of their geometry and state. The scene only holds
//! shared handles to the pixel data the backend must upload once.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use glam::{Mat4, Vec2, Vec3};
use image::RgbaImage;

use crate::camera::PerspectiveCamera;
use crate::viewport::ScreenPosition;

/// Stable identifier of an uploaded surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurfaceKey(u64);

impl SurfaceKey {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        SurfaceKey(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Pixel-space rectangle inside a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn intersects(&self, other: &PixelRect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Texture content for one face of a renderable.
#[derive(Debug, Clone)]
pub struct Surface {
    key: SurfaceKey,
    image: Arc<RgbaImage>,
    window: PixelRect,
}

impl Surface {
    /// Copies `window` out of `source` into its own image.
    pub fn slice(source: &RgbaImage, window: PixelRect) -> Self {
        let image =
            image::imageops::crop_imm(source, window.x, window.y, window.width, window.height)
                .to_image();
        Self {
            key: SurfaceKey::next(),
            image: Arc::new(image),
            window,
        }
    }

    pub fn key(&self) -> SurfaceKey {
        self.key
    }

    pub fn image(&self) -> &Arc<RgbaImage> {
        &self.image
    }

    /// Region of the source image this surface was cut from.
    pub fn window(&self) -> PixelRect {
        self.window
    }
}

/// Translation plus rotation about the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation_y: f32,
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation) * Mat4::from_rotation_y(self.rotation_y)
    }
}

/// A textured quad centred on its model origin, facing +Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadDraw {
    pub model: Mat4,
    pub size: Vec2,
    pub surface: SurfaceKey,
}

#[derive(Debug, Default)]
pub struct DrawList {
    quads: Vec<QuadDraw>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.quads.clear();
    }

    pub fn push(&mut self, quad: QuadDraw) {
        self.quads.push(quad);
    }

    pub fn quads(&self) -> &[QuadDraw] {
        &self.quads
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }
}

/// Surfaces registered by elements plus the clear colour.
#[derive(Debug)]
pub struct Scene {
    background: [u8; 3],
    surfaces: BTreeMap<SurfaceKey, Arc<RgbaImage>>,
}

impl Scene {
    pub fn new(background: [u8; 3]) -> Self {
        Self {
            background,
            surfaces: BTreeMap::new(),
        }
    }

    pub fn background(&self) -> [u8; 3] {
        self.background
    }

    pub fn add_surface(&mut self, surface: &Surface) {
        self.surfaces
            .entry(surface.key())
            .or_insert_with(|| surface.image().clone());
    }

    pub fn surface(&self, key: SurfaceKey) -> Option<&Arc<RgbaImage>> {
        self.surfaces.get(&key)
    }

    pub fn surfaces(&self) -> impl Iterator<Item = (SurfaceKey, &Arc<RgbaImage>)> {
        self.surfaces.iter().map(|(key, image)| (*key, image))
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }
}

/// Something the orchestrator can place in the scene and animate every frame.
pub trait SceneElement {
    /// Registration hook, called once when the element joins `scene`.
    fn attach(&mut self, scene: &mut Scene);

    /// Per-frame update of transient visual state.
    fn animate(&mut self, now: Instant);

    /// Root transform of the element's geometry.
    fn root(&self) -> &Transform;

    /// Appends this frame's quads.
    fn collect(&self, draw_list: &mut DrawList);

    /// Fires wall-clock timers that came due.
    fn poll_timers(&mut self, _now: Instant) {}

    fn next_deadline(&self) -> Option<Instant> {
        None
    }

    /// Optional rotation capability.
    fn as_rotatable(&mut self) -> Option<&mut dyn Rotatable> {
        None
    }

    /// Cancels any timers the element still has armed.
    fn teardown(&mut self) {}
}

pub trait Rotatable {
    fn rotate(&mut self, direction: ScreenPosition, now: Instant);
}

/// Presentation surface the orchestrator draws through.
pub trait RenderBackend {
    type Error;

    fn resize(&mut self, width: u32, height: u32);

    fn render(
        &mut self,
        scene: &Scene,
        draw_list: &DrawList,
        camera: &PerspectiveCamera,
    ) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn slice_copies_requested_window() {
        let source = RgbaImage::from_fn(4, 2, |x, y| Rgba([x as u8, y as u8, 0, 255]));
        let surface = Surface::slice(
            &source,
            PixelRect {
                x: 2,
                y: 1,
                width: 2,
                height: 1,
            },
        );
        assert_eq!(surface.image().dimensions(), (2, 1));
        assert_eq!(surface.image().get_pixel(0, 0), &Rgba([2, 1, 0, 255]));
        assert_eq!(surface.image().get_pixel(1, 0), &Rgba([3, 1, 0, 255]));
    }

    #[test]
    fn surface_keys_are_unique_and_registered_once() {
        let source = RgbaImage::new(2, 2);
        let window = PixelRect {
            x: 0,
            y: 0,
            width: 1,
            height: 1,
        };
        let first = Surface::slice(&source, window);
        let second = Surface::slice(&source, window);
        assert_ne!(first.key(), second.key());

        let mut scene = Scene::new([0, 0, 0]);
        scene.add_surface(&first);
        scene.add_surface(&first);
        scene.add_surface(&second);
        assert_eq!(scene.surface_count(), 2);
        assert!(scene.surface(first.key()).is_some());
    }

    #[test]
    fn rects_report_overlap() {
        let a = PixelRect {
            x: 0,
            y: 0,
            width: 100,
            height: 100,
        };
        let b = PixelRect { x: 100, ..a };
        let c = PixelRect { x: 50, ..a };
        assert!(!a.intersects(&b));
        assert!(a.intersects(&c));
    }
}
