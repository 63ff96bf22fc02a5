use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Upper bound for any single animation duration or delay.
pub const MAX_ANIMATION_DURATION: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Horizontal composition the camera frames the grid in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSetting {
    #[default]
    Left,
    Right,
    Center,
}

impl std::str::FromStr for PositionSetting {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(Self::Left),
            "right" | "r" => Ok(Self::Right),
            "center" | "centre" | "c" => Ok(Self::Center),
            other => Err(format!(
                "invalid position '{other}'; expected 'left', 'right' or 'center'"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EasingSetting {
    Linear,
    Smoothstep,
    EaseInOut,
    EaseInCubic,
    EaseInOutBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AntialiasSetting {
    Auto,
    Off,
    Samples2,
    Samples4,
    Samples8,
    Samples16,
}

impl Default for AntialiasSetting {
    fn default() -> Self {
        Self::Auto
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SceneConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub camera: CameraConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub stats: bool,
    #[serde(deserialize_with = "deserialize_antialias")]
    pub antialias: AntialiasSetting,
    pub background: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "flipgrid".into(),
            stats: false,
            antialias: AntialiasSetting::Auto,
            background: "#f0f0f0".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GridConfig {
    pub width: f32,
    pub height: f32,
    pub columns: u32,
    pub rows: u32,
    pub gap: f32,
    pub position: PositionSetting,
    pub front: Option<PathBuf>,
    pub back: Option<PathBuf>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            columns: 9,
            rows: 5,
            gap: 10.0,
            position: PositionSetting::Left,
            front: None,
            back: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnimationConfig {
    #[serde(deserialize_with = "deserialize_duration")]
    pub flip_delay: Duration,
    pub delay_multiplier: f32,
    /// Degrees advanced per rendered frame while a tile flips.
    pub flip_speed: f32,
    #[serde(deserialize_with = "deserialize_duration")]
    pub seed_delay: Duration,
    pub rotation_degrees: f32,
    #[serde(deserialize_with = "deserialize_duration")]
    pub rotation_duration: Duration,
    pub rotation_easing: EasingSetting,
    #[serde(deserialize_with = "deserialize_duration")]
    pub pan_duration: Duration,
    pub pan_easing: EasingSetting,
    pub drift_amplitude: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            flip_delay: Duration::from_millis(175),
            delay_multiplier: 2.0,
            flip_speed: 1.5,
            seed_delay: Duration::from_millis(50),
            rotation_degrees: 4.0,
            rotation_duration: Duration::from_millis(2000),
            rotation_easing: EasingSetting::EaseInCubic,
            pan_duration: Duration::from_millis(3000),
            pan_easing: EasingSetting::EaseInOutBack,
            drift_amplitude: 25.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub distance: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 90.0,
            near: 1.0,
            far: 2000.0,
            distance: 900.0,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            window: WindowConfig::default(),
            grid: GridConfig::default(),
            animation: AnimationConfig::default(),
            camera: CameraConfig::default(),
        }
    }
}

fn default_version() -> u32 {
    1
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Duration::try_from_secs_f64(v)
                .map_err(|err| E::custom(format!("invalid duration {v}: {err}")))
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn deserialize_antialias<'de, D>(deserializer: D) -> Result<AntialiasSetting, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        Str(String),
        Num(i64),
    }

    match Helper::deserialize(deserializer)? {
        Helper::Str(raw) => parse_antialias(&raw).map_err(de::Error::custom),
        Helper::Num(value) => {
            if value < 0 {
                return Err(de::Error::custom("antialias value must be non-negative"));
            }
            parse_antialias(&value.to_string()).map_err(de::Error::custom)
        }
    }
}

pub fn parse_antialias(raw: &str) -> Result<AntialiasSetting, String> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "auto" | "max" | "default" => Ok(AntialiasSetting::Auto),
        "off" | "none" | "disable" | "disabled" | "0" | "1" => Ok(AntialiasSetting::Off),
        "2" => Ok(AntialiasSetting::Samples2),
        "4" => Ok(AntialiasSetting::Samples4),
        "8" => Ok(AntialiasSetting::Samples8),
        "16" => Ok(AntialiasSetting::Samples16),
        other => Err(format!("invalid antialias setting '{other}'")),
    }
}

/// Parses `#rrggbb` (the leading `#` is optional) into its byte components.
pub fn parse_hex_color(raw: &str) -> Result<[u8; 3], ConfigError> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if digits.len() != 6 || !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return Err(ConfigError::Invalid(format!(
            "colour '{raw}' must be written as #rrggbb"
        )));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map_err(|err| ConfigError::Invalid(format!("colour '{raw}': {err}")))
    };
    Ok([channel(0..2)?, channel(2..4)?, channel(4..6)?])
}

impl SceneConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: SceneConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Loads a config file and resolves image paths relative to its directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&contents)?;
        if let Some(dir) = path.parent() {
            config.grid.resolve_relative_to(dir);
        }
        Ok(config)
    }

    pub fn background_rgb(&self) -> Result<[u8; 3], ConfigError> {
        parse_hex_color(&self.window.background)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(
                "window width and height must be greater than zero".into(),
            ));
        }
        self.background_rgb()?;

        let grid = &self.grid;
        if !(grid.width > 0.0 && grid.height > 0.0) {
            return Err(ConfigError::Invalid(
                "grid width and height must be greater than zero".into(),
            ));
        }
        if grid.columns == 0 || grid.rows == 0 {
            return Err(ConfigError::Invalid(
                "grid columns and rows must be at least 1".into(),
            ));
        }
        if !(grid.gap >= 0.0) {
            return Err(ConfigError::Invalid("grid gap must be >= 0".into()));
        }

        let animation = &self.animation;
        for (name, value) in [
            ("flip_delay", animation.flip_delay),
            ("seed_delay", animation.seed_delay),
            ("rotation_duration", animation.rotation_duration),
            ("pan_duration", animation.pan_duration),
        ] {
            if value > MAX_ANIMATION_DURATION {
                return Err(ConfigError::Invalid(format!(
                    "animation {name} must be at most {} (got {})",
                    humantime::format_duration(MAX_ANIMATION_DURATION),
                    humantime::format_duration(value)
                )));
            }
        }
        if animation.flip_delay.is_zero() {
            return Err(ConfigError::Invalid(
                "animation flip_delay must be greater than zero".into(),
            ));
        }
        if !animation.delay_multiplier.is_finite() || animation.delay_multiplier < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "animation delay_multiplier must be >= 1 (got {})",
                animation.delay_multiplier
            )));
        }
        if !(animation.flip_speed > 0.0) || !animation.flip_speed.is_finite() {
            return Err(ConfigError::Invalid(
                "animation flip_speed must be a positive number of degrees".into(),
            ));
        }
        if !animation.rotation_degrees.is_finite() {
            return Err(ConfigError::Invalid(
                "animation rotation_degrees must be finite".into(),
            ));
        }
        if !(animation.drift_amplitude >= 0.0) {
            return Err(ConfigError::Invalid(
                "animation drift_amplitude must be >= 0".into(),
            ));
        }

        let camera = &self.camera;
        if !(camera.fov > 0.0 && camera.fov < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "camera fov must be between 0 and 180 degrees (got {})",
                camera.fov
            )));
        }
        if !(camera.near > 0.0) || camera.near >= camera.far {
            return Err(ConfigError::Invalid(format!(
                "camera near ({}) must be positive and less than far ({})",
                camera.near, camera.far
            )));
        }

        Ok(())
    }
}

impl GridConfig {
    /// Makes relative image paths absolute against `base`.
    pub fn resolve_relative_to(&mut self, base: &Path) {
        for path in [&mut self.front, &mut self.back].into_iter().flatten() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
version = 1

[window]
width = 1600
height = 900
stats = true
antialias = 4
background = "#101820"

[grid]
columns = 4
rows = 3
gap = 6
position = "right"
front = "images/pineapple.jpg"
back = "/srv/snow_road.jpg"

[animation]
flip_delay = "120ms"
delay_multiplier = 3
rotation_easing = "linear"
pan_duration = 2
"##;

    #[test]
    fn parses_sample_config() {
        let config = SceneConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.window.width, 1600);
        assert!(config.window.stats);
        assert_eq!(config.window.antialias, AntialiasSetting::Samples4);
        assert_eq!(config.grid.columns, 4);
        assert_eq!(config.grid.position, PositionSetting::Right);
        assert_eq!(config.animation.flip_delay, Duration::from_millis(120));
        assert_eq!(config.animation.delay_multiplier, 3.0);
        assert_eq!(config.animation.rotation_easing, EasingSetting::Linear);
        assert_eq!(config.animation.pan_duration, Duration::from_secs(2));
        assert_eq!(config.background_rgb().unwrap(), [0x10, 0x18, 0x20]);
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = SceneConfig::from_toml_str("").expect("defaults");
        assert_eq!(config.grid.columns, 9);
        assert_eq!(config.grid.rows, 5);
        assert_eq!(config.grid.gap, 10.0);
        assert_eq!(config.grid.position, PositionSetting::Left);
        assert_eq!(config.animation.flip_delay, Duration::from_millis(175));
        assert_eq!(config.animation.delay_multiplier, 2.0);
        assert_eq!(config.animation.flip_speed, 1.5);
        assert_eq!(config.animation.rotation_duration, Duration::from_secs(2));
        assert_eq!(config.animation.pan_duration, Duration::from_secs(3));
        assert_eq!(config.animation.pan_easing, EasingSetting::EaseInOutBack);
        assert_eq!(config.camera.distance, 900.0);
        assert_eq!(config.background_rgb().unwrap(), [0xf0, 0xf0, 0xf0]);
    }

    #[test]
    fn rejects_multiplier_below_one() {
        let err = SceneConfig::from_toml_str(
            r#"
[animation]
delay_multiplier = 0.5
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_non_finite_duration_while_parsing() {
        let err = SceneConfig::from_toml_str("[animation]\nflip_delay = inf").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err}");
        let err = SceneConfig::from_toml_str("[animation]\npan_duration = nan").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err}");
    }

    #[test]
    fn rejects_durations_past_the_bound() {
        let err = SceneConfig::from_toml_str("[animation]\nflip_delay = 1e18").unwrap_err();
        match err {
            ConfigError::Invalid(message) => assert!(message.contains("flip_delay"), "{message}"),
            other => panic!("unexpected error {other}"),
        }
        let err = SceneConfig::from_toml_str("[animation]\nrotation_duration = \"2h\"")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(SceneConfig::from_toml_str("[animation]\npan_duration = \"1h\"").is_ok());
    }

    #[test]
    fn rejects_zero_columns() {
        let err = SceneConfig::from_toml_str(
            r#"
[grid]
columns = 0
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_version_and_bad_colour() {
        assert!(matches!(
            SceneConfig::from_toml_str("version = 2").unwrap_err(),
            ConfigError::Invalid(_)
        ));
        assert!(matches!(
            SceneConfig::from_toml_str("[window]\nbackground = \"teal\"").unwrap_err(),
            ConfigError::Invalid(_)
        ));
    }

    #[test]
    fn rejects_inverted_clip_planes() {
        let err = SceneConfig::from_toml_str(
            r#"
[camera]
near = 10
far = 5
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn resolves_relative_image_paths() {
        let mut config = SceneConfig::from_toml_str(SAMPLE).unwrap();
        config.grid.resolve_relative_to(Path::new("/etc/flipgrid"));
        assert_eq!(
            config.grid.front.as_deref(),
            Some(Path::new("/etc/flipgrid/images/pineapple.jpg"))
        );
        assert_eq!(
            config.grid.back.as_deref(),
            Some(Path::new("/srv/snow_road.jpg"))
        );
    }

    #[test]
    fn parses_positions_from_cli_strings() {
        assert_eq!("Left".parse::<PositionSetting>(), Ok(PositionSetting::Left));
        assert_eq!("r".parse::<PositionSetting>(), Ok(PositionSetting::Right));
        assert_eq!(
            "centre".parse::<PositionSetting>(),
            Ok(PositionSetting::Center)
        );
        assert!("up".parse::<PositionSetting>().is_err());
    }
}
