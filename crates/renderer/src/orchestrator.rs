//! Owns the camera, the scene and its elements, and couples a position
//! toggle to the grid rotation plus the camera pan.

use std::time::{Duration, Instant};

use glam::Vec3;

use crate::camera::PerspectiveCamera;
use crate::scene::{DrawList, RenderBackend, Scene, SceneElement};
use crate::stats::{FrameStats, StatsSample};
use crate::timeline::{AnimatedValue, Easing};
use crate::viewport::{ScreenPosition, Viewport};

#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    pub viewport: Viewport,
    pub background: [u8; 3],
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub camera_distance: f32,
    pub pan_duration: Duration,
    pub pan_easing: Easing,
    pub stats: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            viewport: Viewport::new(1280.0, 720.0, ScreenPosition::Left),
            background: [0xf0, 0xf0, 0xf0],
            fov_degrees: 90.0,
            near: 1.0,
            far: 2000.0,
            camera_distance: 900.0,
            pan_duration: Duration::from_millis(3000),
            pan_easing: Easing::EaseInOutBack,
            stats: false,
        }
    }
}

pub struct SceneOrchestrator<B: RenderBackend> {
    viewport: Viewport,
    camera: PerspectiveCamera,
    camera_pan: AnimatedValue,
    pan_duration: Duration,
    pan_easing: Easing,
    scene: Scene,
    draw_list: DrawList,
    elements: Vec<Box<dyn SceneElement>>,
    backend: B,
    stats: Option<FrameStats>,
    published_stats: Option<StatsSample>,
    running: bool,
}

impl<B: RenderBackend> SceneOrchestrator<B> {
    /// Builds the camera and scene and attaches `elements` in order.
    pub fn new(
        options: OrchestratorOptions,
        backend: B,
        elements: Vec<Box<dyn SceneElement>>,
        now: Instant,
    ) -> Self {
        let OrchestratorOptions {
            viewport,
            background,
            fov_degrees,
            near,
            far,
            camera_distance,
            pan_duration,
            pan_easing,
            stats,
        } = options;

        let mut camera = PerspectiveCamera::new(fov_degrees, viewport.aspect_ratio(), near, far);
        camera.position = Vec3::new(0.0, 0.0, camera_distance);
        camera.look_at(Vec3::ZERO);

        let mut scene = Scene::new(background);
        let mut elements = elements;
        for element in &mut elements {
            element.attach(&mut scene);
        }

        let mut orchestrator = Self {
            viewport,
            camera,
            camera_pan: AnimatedValue::new(viewport.current_offset()).rounded(),
            pan_duration,
            pan_easing,
            scene,
            draw_list: DrawList::new(),
            elements,
            backend,
            stats: stats.then(|| FrameStats::new(now)),
            published_stats: None,
            running: true,
        };
        orchestrator.apply_view_offset();

        tracing::debug!(
            width = viewport.width,
            height = viewport.height,
            position = %viewport.position,
            elements = orchestrator.elements.len(),
            surfaces = orchestrator.scene.surface_count(),
            "scene orchestrator ready"
        );
        orchestrator
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn camera_pan(&self) -> &AnimatedValue {
        &self.camera_pan
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Hands out the stats sample published since the last call, once.
    pub fn take_published_stats(&mut self) -> Option<StatsSample> {
        self.published_stats.take()
    }

    /// Moves the composition to `direction`, rotating every rotatable
    /// element and panning the camera window. Returns `false` when already
    /// there.
    pub fn toggle_move_position(&mut self, direction: ScreenPosition, now: Instant) -> bool {
        if direction == self.viewport.position {
            tracing::trace!(%direction, "already at position");
            return false;
        }

        let current = self.viewport.current_offset();
        let target = self.viewport.update_offset(direction);

        let mut rotated = 0usize;
        for element in &mut self.elements {
            if let Some(rotatable) = element.as_rotatable() {
                rotatable.rotate(direction, now);
                rotated += 1;
            }
        }

        // a pan still in flight keeps its visible offset as the starting point
        if !self.camera_pan.is_animating() {
            self.camera_pan.set(current);
        }
        self.camera_pan
            .animate_to(target, self.pan_duration, self.pan_easing, now);

        tracing::info!(%direction, from = current, to = target, rotated, "moving composition");
        true
    }

    /// One render-loop tick: sample tweens, animate elements in order, draw.
    pub fn frame(&mut self, now: Instant) -> Result<(), B::Error> {
        if !self.running {
            return Ok(());
        }

        if self.camera_pan.sample(now).is_some() {
            self.apply_view_offset();
        }
        for element in &mut self.elements {
            element.animate(now);
        }

        if let Some(stats) = self.stats.as_mut() {
            if let Some(sample) = stats.record_frame(now) {
                tracing::debug!(fps = sample.fps, frame_ms = sample.frame_ms, "frame stats");
                self.published_stats = Some(sample);
            }
        }

        self.render()
    }

    /// Fires element timers that came due at `now`.
    pub fn poll_timers(&mut self, now: Instant) {
        if !self.running {
            return;
        }
        for element in &mut self.elements {
            element.poll_timers(now);
        }
    }

    /// Earliest pending element timer.
    pub fn next_deadline(&self) -> Option<Instant> {
        if !self.running {
            return None;
        }
        self.elements
            .iter()
            .filter_map(|element| element.next_deadline())
            .min()
    }

    /// Applies new surface dimensions and draws once immediately.
    pub fn on_resize(&mut self, width: u32, height: u32) -> Result<(), B::Error> {
        let width = width.max(1);
        let height = height.max(1);
        self.viewport.update(width as f32, height as f32);
        self.backend.resize(width, height);
        self.camera.aspect = self.viewport.aspect_ratio();
        if !self.camera_pan.is_animating() {
            self.camera_pan.set(self.viewport.current_offset());
        }
        self.apply_view_offset();
        tracing::debug!(width, height, "viewport resized");

        if !self.running {
            return Ok(());
        }
        self.render()
    }

    /// Stops the loop and cancels every element's timers.
    pub fn shutdown(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        for element in &mut self.elements {
            element.teardown();
        }
        tracing::debug!("scene orchestrator shut down");
    }

    fn apply_view_offset(&mut self) {
        let Viewport { width, height, .. } = self.viewport;
        self.camera
            .set_view_offset(width, height, self.camera_pan.current(), 0.0, width, height);
    }

    fn render(&mut self) -> Result<(), B::Error> {
        self.draw_list.clear();
        for element in &self.elements {
            element.collect(&mut self.draw_list);
        }
        self.backend.render(&self.scene, &self.draw_list, &self.camera)
    }
}

impl<B: RenderBackend> Drop for SceneOrchestrator<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GridLayout, GridOptions, ImageGrid};
    use crate::scene::{Rotatable, Transform};
    use glam::Vec2;
    use image::RgbaImage;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Resize(u32, u32),
        Render { quads: usize, offset: f32 },
    }

    #[derive(Default)]
    struct RecordingBackend {
        calls: Vec<Call>,
    }

    impl RenderBackend for RecordingBackend {
        type Error = std::convert::Infallible;

        fn resize(&mut self, width: u32, height: u32) {
            self.calls.push(Call::Resize(width, height));
        }

        fn render(
            &mut self,
            _scene: &Scene,
            draw_list: &DrawList,
            camera: &PerspectiveCamera,
        ) -> Result<(), Self::Error> {
            self.calls.push(Call::Render {
                quads: draw_list.len(),
                offset: camera.view_offset().map_or(f32::NAN, |view| view.x),
            });
            Ok(())
        }
    }

    type Log = Rc<RefCell<Vec<String>>>;

    struct StubElement {
        name: &'static str,
        rotatable: bool,
        log: Log,
        root: Transform,
    }

    impl StubElement {
        fn boxed(name: &'static str, rotatable: bool, log: &Log) -> Box<dyn SceneElement> {
            Box::new(Self {
                name,
                rotatable,
                log: log.clone(),
                root: Transform::default(),
            })
        }

        fn record(&self, event: &str) {
            self.log.borrow_mut().push(format!("{}:{event}", self.name));
        }
    }

    impl SceneElement for StubElement {
        fn attach(&mut self, _scene: &mut Scene) {
            self.record("attach");
        }

        fn animate(&mut self, _now: Instant) {
            self.record("animate");
        }

        fn root(&self) -> &Transform {
            &self.root
        }

        fn collect(&self, _draw_list: &mut DrawList) {}

        fn as_rotatable(&mut self) -> Option<&mut dyn Rotatable> {
            if self.rotatable {
                Some(self)
            } else {
                None
            }
        }

        fn teardown(&mut self) {
            self.record("teardown");
        }
    }

    impl Rotatable for StubElement {
        fn rotate(&mut self, direction: ScreenPosition, _now: Instant) {
            self.record(&format!("rotate {direction}"));
        }
    }

    fn options(width: f32) -> OrchestratorOptions {
        OrchestratorOptions {
            viewport: Viewport::new(width, 600.0, ScreenPosition::Left),
            ..OrchestratorOptions::default()
        }
    }

    fn stub_elements(log: &Log) -> Vec<Box<dyn SceneElement>> {
        vec![
            StubElement::boxed("grid", true, log),
            StubElement::boxed("label", false, log),
        ]
    }

    #[test]
    fn construction_attaches_and_windows_camera() {
        let log = Log::default();
        let orchestrator = SceneOrchestrator::new(
            options(800.0),
            RecordingBackend::default(),
            stub_elements(&log),
            Instant::now(),
        );
        assert_eq!(*log.borrow(), vec!["grid:attach", "label:attach"]);
        let camera = orchestrator.camera();
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 900.0));
        assert_eq!(camera.fov_degrees, 90.0);
        assert_eq!(camera.view_offset().map(|view| view.x), Some(200.0));
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn toggle_right_pans_and_rotates_rotatables_only() {
        let log = Log::default();
        let start = Instant::now();
        let mut orchestrator = SceneOrchestrator::new(
            options(800.0),
            RecordingBackend::default(),
            stub_elements(&log),
            start,
        );
        log.borrow_mut().clear();

        assert!(orchestrator.toggle_move_position(ScreenPosition::Right, start));
        assert_eq!(*log.borrow(), vec!["grid:rotate right"]);
        assert_eq!(orchestrator.viewport().position, ScreenPosition::Right);
        assert_eq!(orchestrator.camera_pan().current(), 200.0);
        assert_eq!(orchestrator.camera_pan().target(), -200.0);

        let mut offsets = Vec::new();
        for step in 0..=30 {
            orchestrator
                .frame(start + Duration::from_millis(step * 100))
                .unwrap();
            offsets.push(orchestrator.camera().view_offset().map(|view| view.x));
        }
        assert_eq!(offsets.first(), Some(&Some(200.0)));
        assert_eq!(offsets.last(), Some(&Some(-200.0)));
        assert!(offsets
            .iter()
            .flatten()
            .all(|offset| *offset == offset.round()));
        // ease-in-out-back swings past both ends of the pan
        assert!(offsets.iter().flatten().any(|offset| *offset > 200.0));
        assert!(offsets.iter().flatten().any(|offset| *offset < -200.0));
        assert!(!orchestrator.camera_pan().is_animating());
    }

    #[test]
    fn toggle_to_current_position_is_a_no_op() {
        let log = Log::default();
        let start = Instant::now();
        let mut orchestrator = SceneOrchestrator::new(
            options(800.0),
            RecordingBackend::default(),
            stub_elements(&log),
            start,
        );
        log.borrow_mut().clear();

        assert!(!orchestrator.toggle_move_position(ScreenPosition::Left, start));
        assert!(log.borrow().is_empty());
        assert_eq!(orchestrator.viewport().position, ScreenPosition::Left);
        assert_eq!(orchestrator.viewport().current_offset(), 200.0);
        assert!(!orchestrator.camera_pan().is_animating());
    }

    #[test]
    fn redirect_mid_pan_starts_from_visible_offset() {
        let log = Log::default();
        let start = Instant::now();
        let mut orchestrator = SceneOrchestrator::new(
            options(800.0),
            RecordingBackend::default(),
            stub_elements(&log),
            start,
        );
        orchestrator.toggle_move_position(ScreenPosition::Right, start);
        let mid = start + Duration::from_millis(600);
        orchestrator.frame(mid).unwrap();
        let visible = orchestrator.camera_pan().current();
        assert!(visible > 200.0);

        assert!(orchestrator.toggle_move_position(ScreenPosition::Center, mid));
        assert_eq!(orchestrator.camera_pan().current(), visible);
        assert_eq!(orchestrator.camera_pan().target(), 0.0);
        orchestrator
            .frame(mid + Duration::from_millis(3000))
            .unwrap();
        assert_eq!(orchestrator.camera().view_offset().map(|view| view.x), Some(0.0));
    }

    #[test]
    fn frame_animates_in_registration_order_then_renders() {
        let log = Log::default();
        let start = Instant::now();
        let mut orchestrator = SceneOrchestrator::new(
            options(800.0),
            RecordingBackend::default(),
            stub_elements(&log),
            start,
        );
        log.borrow_mut().clear();
        orchestrator.frame(start).unwrap();
        assert_eq!(*log.borrow(), vec!["grid:animate", "label:animate"]);
        assert_eq!(
            orchestrator.backend().calls,
            vec![Call::Render {
                quads: 0,
                offset: 200.0
            }]
        );
    }

    #[test]
    fn resize_updates_aspect_and_forces_render() {
        let log = Log::default();
        let mut orchestrator = SceneOrchestrator::new(
            options(800.0),
            RecordingBackend::default(),
            stub_elements(&log),
            Instant::now(),
        );
        orchestrator.on_resize(1200, 600).unwrap();
        assert_eq!(orchestrator.viewport().width, 1200.0);
        assert!((orchestrator.camera().aspect - 2.0).abs() < 1e-6);
        assert_eq!(
            orchestrator.backend().calls,
            vec![
                Call::Resize(1200, 600),
                Call::Render {
                    quads: 0,
                    offset: 300.0
                }
            ]
        );
    }

    #[test]
    fn shutdown_tears_down_once_and_stops_loop() {
        let log = Log::default();
        let start = Instant::now();
        let mut orchestrator = SceneOrchestrator::new(
            options(800.0),
            RecordingBackend::default(),
            stub_elements(&log),
            start,
        );
        log.borrow_mut().clear();
        orchestrator.shutdown();
        orchestrator.shutdown();
        assert_eq!(*log.borrow(), vec!["grid:teardown", "label:teardown"]);
        assert!(!orchestrator.is_running());

        orchestrator.frame(start).unwrap();
        assert!(orchestrator.backend().calls.is_empty());
        assert_eq!(orchestrator.next_deadline(), None);
    }

    #[test]
    fn stats_sample_is_handed_out_once_per_window() {
        let log = Log::default();
        let start = Instant::now();
        let mut orchestrator = SceneOrchestrator::new(
            OrchestratorOptions {
                stats: true,
                ..options(800.0)
            },
            RecordingBackend::default(),
            stub_elements(&log),
            start,
        );

        for step in 1..60 {
            orchestrator
                .frame(start + Duration::from_millis(step * 16))
                .unwrap();
            assert_eq!(orchestrator.take_published_stats(), None);
        }
        orchestrator
            .frame(start + Duration::from_millis(1000))
            .unwrap();
        let sample = orchestrator.take_published_stats().expect("window closed");
        assert!((sample.fps - 60.0).abs() < 1e-3);
        assert_eq!(orchestrator.take_published_stats(), None);

        orchestrator
            .frame(start + Duration::from_millis(1016))
            .unwrap();
        assert_eq!(orchestrator.take_published_stats(), None);
    }

    #[test]
    fn stats_stay_silent_when_disabled() {
        let log = Log::default();
        let start = Instant::now();
        let mut orchestrator = SceneOrchestrator::new(
            options(800.0),
            RecordingBackend::default(),
            stub_elements(&log),
            start,
        );
        orchestrator.frame(start + Duration::from_secs(2)).unwrap();
        assert_eq!(orchestrator.take_published_stats(), None);
    }

    #[test]
    fn drives_a_real_grid() {
        let start = Instant::now();
        let mut grid_options = GridOptions::new(Vec2::new(200.0, 100.0))
            .with_images(RgbaImage::new(200, 100), RgbaImage::new(200, 100));
        grid_options.layout = GridLayout {
            columns: 2,
            rows: 1,
            gap: 0.0,
        };
        let grid = ImageGrid::init(grid_options, start).unwrap();
        let elements: Vec<Box<dyn SceneElement>> = vec![Box::new(grid)];
        let mut orchestrator = SceneOrchestrator::new(
            options(800.0),
            RecordingBackend::default(),
            elements,
            start,
        );
        assert_eq!(orchestrator.scene().surface_count(), 4);
        assert_eq!(orchestrator.next_deadline(), Some(start));

        orchestrator.poll_timers(start);
        orchestrator.frame(start).unwrap();
        assert_eq!(
            orchestrator.backend().calls.last(),
            Some(&Call::Render {
                quads: 4,
                offset: 200.0
            })
        );
        assert_eq!(
            orchestrator.next_deadline(),
            Some(start + Duration::from_millis(175))
        );
    }
}
