use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use sceneconfig::{parse_antialias, AntialiasSetting, PositionSetting, SceneConfig};

#[derive(Parser, Debug)]
#[command(
    name = "flipgrid",
    author,
    version,
    about = "Flip-card tile wall sliced from two images",
    arg_required_else_help = false
)]
pub struct Cli {
    /// Configuration file (defaults to `$FLIPGRID_CONFIG_DIR/flipgrid.toml`).
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (`-v` debug, `-vv` trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Command-line values that take precedence over the config file.
#[derive(Parser, Debug, Default)]
pub struct Overrides {
    /// Image shown on the front of the tiles.
    #[arg(long, value_name = "PATH", global = true)]
    pub front: Option<PathBuf>,

    /// Image revealed when a tile flips.
    #[arg(long, value_name = "PATH", global = true)]
    pub back: Option<PathBuf>,

    /// Starting composition: `left`, `right` or `center`.
    #[arg(long, value_name = "SIDE", global = true)]
    pub position: Option<PositionSetting>,

    /// Window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size, global = true)]
    pub size: Option<(u32, u32)>,

    /// Number of tile columns.
    #[arg(long, value_name = "N", global = true)]
    pub columns: Option<u32>,

    /// Number of tile rows.
    #[arg(long, value_name = "N", global = true)]
    pub rows: Option<u32>,

    /// Spacing between tiles in world units.
    #[arg(long, value_name = "UNITS", global = true)]
    pub gap: Option<f32>,

    /// Anti-aliasing policy: `auto`, `off`, or an MSAA sample count.
    #[arg(long, value_name = "MODE", value_parser = parse_antialias, global = true)]
    pub antialias: Option<AntialiasSetting>,

    /// Show frame rate in the window title.
    #[arg(long, global = true)]
    pub stats: bool,
}

impl Overrides {
    pub fn apply(&self, config: &mut SceneConfig) {
        if let Some(front) = &self.front {
            config.grid.front = Some(front.clone());
        }
        if let Some(back) = &self.back {
            config.grid.back = Some(back.clone());
        }
        if let Some(position) = self.position {
            config.grid.position = position;
        }
        if let Some((width, height)) = self.size {
            config.window.width = width;
            config.window.height = height;
        }
        if let Some(columns) = self.columns {
            config.grid.columns = columns;
        }
        if let Some(rows) = self.rows {
            config.grid.rows = rows;
        }
        if let Some(gap) = self.gap {
            config.grid.gap = gap;
        }
        if let Some(antialias) = self.antialias {
            config.window.antialias = antialias;
        }
        if self.stats {
            config.window.stats = true;
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the grid without a window and print every tile.
    Layout(LayoutArgs),
    /// Validate the configuration and images, then exit.
    Check,
}

#[derive(Parser, Debug)]
pub struct LayoutArgs {
    /// Emit JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid width '{}'", w.trim()))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid height '{}'", h.trim()))?;
    if width == 0 || height == 0 {
        return Err("size must be greater than zero".into());
    }
    Ok((width, height))
}
