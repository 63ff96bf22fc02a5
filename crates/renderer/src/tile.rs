use std::f32::consts::{PI, TAU};
use std::time::Duration;

use glam::{Mat4, Vec2, Vec3};

use crate::scene::{DrawList, QuadDraw, Scene, Surface, Transform};

/// Degrees a tile turns before it snaps back to rest.
pub const FLIP_DEGREES: f32 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlipState {
    #[default]
    Idle,
    Flipping,
}

#[derive(Debug, Clone)]
pub struct TileOptions {
    pub index: usize,
    pub row: u32,
    pub column: u32,
    pub size: Vec2,
    /// Top-left corner in grid space.
    pub position: Vec2,
    pub seed_delay: Duration,
    /// Degrees advanced per rendered frame.
    pub flip_speed: f32,
    pub front: Surface,
    pub back: Surface,
}

/// One double-sided card of the grid.
#[derive(Debug, Clone)]
pub struct Tile {
    index: usize,
    row: u32,
    column: u32,
    size: Vec2,
    position: Vec2,
    seed_delay: Duration,
    flip_speed: f32,
    flip_degrees: f32,
    state: FlipState,
    flips_completed: u64,
    transform: Transform,
    front: Surface,
    back: Surface,
}

impl Tile {
    pub fn new(options: TileOptions) -> Self {
        let TileOptions {
            index,
            row,
            column,
            size,
            position,
            seed_delay,
            flip_speed,
            front,
            back,
        } = options;
        // pivot at the geometric centre, `position` is the top-left corner
        let centre = Vec3::new(position.x + size.x / 2.0, position.y - size.y / 2.0, 0.0);
        Self {
            index,
            row,
            column,
            size,
            position,
            seed_delay,
            flip_speed,
            flip_degrees: 0.0,
            state: FlipState::Idle,
            flips_completed: 0,
            transform: Transform {
                translation: centre,
                rotation_y: 0.0,
            },
            front,
            back,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn centre(&self) -> Vec2 {
        self.transform.translation.truncate()
    }

    pub fn seed_delay(&self) -> Duration {
        self.seed_delay
    }

    pub fn state(&self) -> FlipState {
        self.state
    }

    pub fn flip_degrees(&self) -> f32 {
        self.flip_degrees
    }

    pub fn flips_completed(&self) -> u64 {
        self.flips_completed
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn front(&self) -> &Surface {
        &self.front
    }

    pub fn back(&self) -> &Surface {
        &self.back
    }

    /// Starts a flip. Returns `false` when one is already running.
    pub fn trigger_flip(&mut self) -> bool {
        if self.state == FlipState::Flipping {
            return false;
        }
        self.state = FlipState::Flipping;
        self.flip_degrees = 0.0;
        self.transform.rotation_y = 0.0;
        true
    }

    /// Advances an active flip by one frame. Returns `true` on the frame the
    /// tile comes back to rest.
    pub fn advance_frame(&mut self) -> bool {
        if self.state != FlipState::Flipping {
            return false;
        }
        self.transform.rotation_y += self.flip_speed.to_radians();
        self.flip_degrees += self.flip_speed;
        if self.flip_degrees < FLIP_DEGREES {
            return false;
        }

        self.transform.rotation_y = TAU;
        self.flip_degrees = 0.0;
        self.state = FlipState::Idle;
        self.flips_completed += 1;
        true
    }

    pub(crate) fn register(&self, scene: &mut Scene) {
        scene.add_surface(&self.front);
        scene.add_surface(&self.back);
    }

    /// Emits the front quad and its half-turned twin carrying the back image.
    pub(crate) fn collect(&self, parent: Mat4, draw_list: &mut DrawList) {
        let model = parent * self.transform.matrix();
        draw_list.push(QuadDraw {
            model,
            size: self.size,
            surface: self.front.key(),
        });
        draw_list.push(QuadDraw {
            model: model * Mat4::from_rotation_y(PI),
            size: self.size,
            surface: self.back.key(),
        });
    }
}
