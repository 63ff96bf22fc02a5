//! The flip-card grid: layout, texture slicing, stagger flips and rotation.

use std::fmt;
use std::time::{Duration, Instant};

use glam::{Vec2, Vec3};
use image::RgbaImage;
use scheduler::{SchedulerError, StaggerScheduler, TaskHandle};
use sceneconfig::{AnimationConfig, GridConfig};

use crate::scene::{DrawList, PixelRect, Rotatable, Scene, SceneElement, Surface, Transform};
use crate::tile::{Tile, TileOptions};
use crate::timeline::{AnimatedValue, Easing};
use crate::viewport::ScreenPosition;

const DRIFT_FREQUENCY_X: f32 = 1.25;
const DRIFT_FREQUENCY_Y: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Front,
    Back,
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Face::Front => f.write_str("front"),
            Face::Back => f.write_str("back"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("no {0} image supplied")]
    MissingImage(Face),
    #[error(
        "{face} image is {width}x{height} but the grid samples {required_width}x{required_height}"
    )]
    ImageTooSmall {
        face: Face,
        width: u32,
        height: u32,
        required_width: u32,
        required_height: u32,
    },
    #[error("invalid grid layout: {0}")]
    InvalidLayout(String),
    #[error(transparent)]
    Schedule(#[from] SchedulerError),
}

/// Column/row counts and spacing between tiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub columns: u32,
    pub rows: u32,
    pub gap: f32,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            columns: 9,
            rows: 5,
            gap: 10.0,
        }
    }
}

impl GridLayout {
    pub fn tile_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    pub fn tile_size(&self, size: Vec2) -> Vec2 {
        Vec2::new(size.x / self.columns as f32, size.y / self.rows as f32)
    }

    /// Top-left anchor of the first tile.
    pub fn origin(&self, size: Vec2) -> Vec2 {
        let columns = self.columns as f32;
        let rows = self.rows as f32;
        Vec2::new(
            -(size.x / 2.0 + self.gap * (columns - 4.0)),
            size.y / 2.0 + self.gap * (rows - 2.0) - self.gap / 2.0,
        )
    }

    /// Top-left anchor of the tile at `row`/`column`; rows grow downwards.
    pub fn anchor(&self, size: Vec2, row: u32, column: u32) -> Vec2 {
        let origin = self.origin(size);
        let tile = self.tile_size(size);
        Vec2::new(
            origin.x + column as f32 * (self.gap + tile.x),
            origin.y - row as f32 * (self.gap + tile.y),
        )
    }

    /// Source-image pixels sampled by the tile at `row`/`column`.
    pub fn pixel_window(&self, size: Vec2, row: u32, column: u32) -> PixelRect {
        let tile = self.tile_size(size);
        PixelRect {
            x: (column as f32 * tile.x).floor() as u32,
            y: (row as f32 * tile.y).floor() as u32,
            width: tile.x.floor() as u32,
            height: tile.y.floor() as u32,
        }
    }

    fn validate(&self, size: Vec2) -> Result<(), GridError> {
        if self.columns == 0 || self.rows == 0 {
            return Err(GridError::InvalidLayout(format!(
                "{} columns x {} rows",
                self.columns, self.rows
            )));
        }
        if !self.gap.is_finite() || self.gap < 0.0 {
            return Err(GridError::InvalidLayout(format!("gap {}", self.gap)));
        }
        if !(size.x.is_finite() && size.y.is_finite() && size.x > 0.0 && size.y > 0.0) {
            return Err(GridError::InvalidLayout(format!(
                "grid size {}x{}",
                size.x, size.y
            )));
        }
        let tile = self.tile_size(size);
        if tile.x < 1.0 || tile.y < 1.0 {
            return Err(GridError::InvalidLayout(format!(
                "tiles of {:.2}x{:.2} are smaller than one pixel",
                tile.x, tile.y
            )));
        }
        Ok(())
    }

    /// Smallest source image, in pixels, every window fits into.
    fn required_pixels(&self, size: Vec2) -> (u32, u32) {
        let last = self.pixel_window(size, self.rows - 1, self.columns - 1);
        (last.x + last.width, last.y + last.height)
    }
}

/// Everything [`ImageGrid::init`] needs.
#[derive(Debug, Clone)]
pub struct GridOptions {
    pub size: Vec2,
    pub position: ScreenPosition,
    pub layout: GridLayout,
    pub front: Option<RgbaImage>,
    pub back: Option<RgbaImage>,
    pub flip_delay: Duration,
    pub delay_multiplier: f32,
    pub flip_speed: f32,
    pub seed_delay: Duration,
    pub rotation_degrees: f32,
    pub rotation_duration: Duration,
    pub rotation_easing: Easing,
    pub drift_amplitude: f32,
}

impl GridOptions {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            position: ScreenPosition::Left,
            layout: GridLayout::default(),
            front: None,
            back: None,
            flip_delay: Duration::from_millis(175),
            delay_multiplier: 2.0,
            flip_speed: 1.5,
            seed_delay: Duration::from_millis(50),
            rotation_degrees: 4.0,
            rotation_duration: Duration::from_millis(2000),
            rotation_easing: Easing::EaseInCubic,
            drift_amplitude: 25.0,
        }
    }

    pub fn from_config(grid: &GridConfig, animation: &AnimationConfig) -> Self {
        Self {
            size: Vec2::new(grid.width, grid.height),
            position: grid.position.into(),
            layout: GridLayout {
                columns: grid.columns,
                rows: grid.rows,
                gap: grid.gap,
            },
            front: None,
            back: None,
            flip_delay: animation.flip_delay,
            delay_multiplier: animation.delay_multiplier,
            flip_speed: animation.flip_speed,
            seed_delay: animation.seed_delay,
            rotation_degrees: animation.rotation_degrees,
            rotation_duration: animation.rotation_duration,
            rotation_easing: animation.rotation_easing.into(),
            drift_amplitude: animation.drift_amplitude,
        }
    }

    pub fn with_images(mut self, front: RgbaImage, back: RgbaImage) -> Self {
        self.front = Some(front);
        self.back = Some(back);
        self
    }
}

fn check_image(
    face: Face,
    image: Option<&RgbaImage>,
    required: (u32, u32),
) -> Result<&RgbaImage, GridError> {
    let image = image.ok_or(GridError::MissingImage(face))?;
    let (width, height) = image.dimensions();
    if width < required.0 || height < required.1 {
        return Err(GridError::ImageTooSmall {
            face,
            width,
            height,
            required_width: required.0,
            required_height: required.1,
        });
    }
    Ok(image)
}

pub struct ImageGrid {
    root: Transform,
    clock_origin: Instant,
    size: Vec2,
    layout: GridLayout,
    tiles: Vec<Tile>,
    rotation: AnimatedValue,
    rotation_degrees: f32,
    rotation_duration: Duration,
    rotation_easing: Easing,
    drift_amplitude: f32,
    schedule: StaggerScheduler,
}

impl ImageGrid {
    /// Lays out and slices every tile, orients the grid for
    /// `options.position` and arms the stagger schedule at `now`.
    pub fn init(options: GridOptions, now: Instant) -> Result<Self, GridError> {
        let GridOptions {
            size,
            position,
            layout,
            front,
            back,
            flip_delay,
            delay_multiplier,
            flip_speed,
            seed_delay,
            rotation_degrees,
            rotation_duration,
            rotation_easing,
            drift_amplitude,
        } = options;

        layout.validate(size)?;
        let required = layout.required_pixels(size);
        let front = check_image(Face::Front, front.as_ref(), required)?;
        let back = check_image(Face::Back, back.as_ref(), required)?;

        let tile_size = layout.tile_size(size);
        let mut tiles = Vec::with_capacity(layout.tile_count());
        for row in 0..layout.rows {
            for column in 0..layout.columns {
                let index = tiles.len();
                let window = layout.pixel_window(size, row, column);
                tiles.push(Tile::new(TileOptions {
                    index,
                    row,
                    column,
                    size: tile_size,
                    position: layout.anchor(size, row, column),
                    seed_delay: seed_delay.saturating_mul(index as u32),
                    flip_speed,
                    front: Surface::slice(front, window),
                    back: Surface::slice(back, window),
                }));
            }
        }

        let schedule = StaggerScheduler::start(tiles.len(), flip_delay, delay_multiplier, now)?;

        let mut grid = Self {
            root: Transform::default(),
            clock_origin: now,
            size,
            layout,
            tiles,
            rotation: AnimatedValue::new(0.0),
            rotation_degrees,
            rotation_duration,
            rotation_easing,
            drift_amplitude,
            schedule,
        };
        let angle = grid.rotation_target(position);
        grid.rotation.set(angle);
        grid.root.rotation_y = angle;

        tracing::debug!(
            tiles = grid.tiles.len(),
            columns = layout.columns,
            rows = layout.rows,
            tile_width = tile_size.x,
            tile_height = tile_size.y,
            %position,
            "image grid initialised"
        );
        Ok(grid)
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    pub fn tile_size(&self) -> Vec2 {
        self.layout.tile_size(self.size)
    }

    pub fn rotation(&self) -> &AnimatedValue {
        &self.rotation
    }

    pub fn schedule_handle(&self) -> TaskHandle {
        self.schedule.handle()
    }

    /// Resting angle, in radians, for a composition side.
    pub fn rotation_target(&self, position: ScreenPosition) -> f32 {
        match position {
            ScreenPosition::Left => self.rotation_degrees.to_radians(),
            ScreenPosition::Right => -self.rotation_degrees.to_radians(),
            ScreenPosition::Center => 0.0,
        }
    }

    fn drift(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.clock_origin).as_secs_f32();
        self.root.translation = Vec3::new(
            self.drift_amplitude * (elapsed * DRIFT_FREQUENCY_X).cos(),
            self.drift_amplitude * (elapsed * DRIFT_FREQUENCY_Y).sin(),
            0.0,
        );
    }
}

impl Rotatable for ImageGrid {
    fn rotate(&mut self, direction: ScreenPosition, now: Instant) {
        let target = self.rotation_target(direction);
        tracing::debug!(
            from = self.rotation.current(),
            to = target,
            %direction,
            "rotating grid"
        );
        self.rotation
            .animate_to(target, self.rotation_duration, self.rotation_easing, now);
    }
}

impl SceneElement for ImageGrid {
    fn attach(&mut self, scene: &mut Scene) {
        for tile in &self.tiles {
            tile.register(scene);
        }
    }

    fn animate(&mut self, now: Instant) {
        self.drift(now);
        if let Some(angle) = self.rotation.sample(now) {
            self.root.rotation_y = angle;
        }
        for tile in &mut self.tiles {
            tile.advance_frame();
        }
    }

    fn root(&self) -> &Transform {
        &self.root
    }

    fn collect(&self, draw_list: &mut DrawList) {
        let parent = self.root.matrix();
        for tile in &self.tiles {
            tile.collect(parent, draw_list);
        }
    }

    fn poll_timers(&mut self, now: Instant) {
        for trigger in self.schedule.poll(now) {
            let Some(tile) = self.tiles.get_mut(trigger.index) else {
                continue;
            };
            if !tile.trigger_flip() {
                tracing::trace!(index = trigger.index, "tile still flipping; trigger ignored");
            }
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.schedule.next_deadline()
    }

    fn as_rotatable(&mut self) -> Option<&mut dyn Rotatable> {
        Some(self)
    }

    fn teardown(&mut self) {
        if !self.schedule.is_cancelled() {
            tracing::debug!("cancelling stagger schedule");
            self.schedule.cancel();
        }
    }
}

impl Drop for ImageGrid {
    fn drop(&mut self) {
        self.schedule.cancel();
    }
}
