use sceneconfig::PositionSetting;

/// Which side of the frame the grid composition sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScreenPosition {
    #[default]
    Left,
    Right,
    Center,
}

impl std::fmt::Display for ScreenPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScreenPosition::Left => f.write_str("left"),
            ScreenPosition::Right => f.write_str("right"),
            ScreenPosition::Center => f.write_str("center"),
        }
    }
}

impl From<PositionSetting> for ScreenPosition {
    fn from(value: PositionSetting) -> Self {
        match value {
            PositionSetting::Left => ScreenPosition::Left,
            PositionSetting::Right => ScreenPosition::Right,
            PositionSetting::Center => ScreenPosition::Center,
        }
    }
}

/// Logical screen geometry plus the composition position.
///
/// The camera view-window offset is a pure function of `width` and the
/// position; nothing else is cached here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub position: ScreenPosition,
}

impl Viewport {
    pub fn new(width: f32, height: f32, position: ScreenPosition) -> Self {
        Self {
            width,
            height,
            position,
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width / self.height.max(f32::EPSILON)
    }

    pub fn update(&mut self, width: f32, height: f32) -> &mut Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Horizontal view-window offset, in pixels, implied by `position`.
    pub fn offset(&self, position: ScreenPosition) -> f32 {
        match position {
            ScreenPosition::Left => self.width / 4.0,
            ScreenPosition::Right => -(self.width / 4.0),
            ScreenPosition::Center => 0.0,
        }
    }

    pub fn current_offset(&self) -> f32 {
        self.offset(self.position)
    }

    /// Stores `position` and returns its offset.
    pub fn update_offset(&mut self, position: ScreenPosition) -> f32 {
        self.position = position;
        self.offset(position)
    }
}
