use std::time::Instant;

use anyhow::{Context, Result};
use renderer::{GridOptions, ImageGrid, Renderer, RendererConfig, SceneElement};
use sceneconfig::SceneConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::images::load_faces;
use crate::layout::LayoutReport;
use crate::paths::{load_config, ConfigSource};

pub fn initialise_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    // stdout is reserved for `layout` output
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the config, layers command-line overrides on top and validates the result.
pub fn resolve_config(cli: &Cli) -> Result<(SceneConfig, ConfigSource)> {
    let (mut config, source) = load_config(cli.config.as_deref())?;
    cli.overrides.apply(&mut config);
    config
        .validate()
        .context("invalid configuration after applying command-line overrides")?;
    tracing::debug!(
        ?source,
        columns = config.grid.columns,
        rows = config.grid.rows,
        position = ?config.grid.position,
        "resolved configuration"
    );
    Ok((config, source))
}

pub fn build_grid(config: &SceneConfig, now: Instant) -> Result<ImageGrid> {
    let (front, back) = load_faces(&config.grid)?;
    let options =
        GridOptions::from_config(&config.grid, &config.animation).with_images(front, back);
    ImageGrid::init(options, now).context("failed to build image grid")
}

pub fn run(cli: &Cli) -> Result<()> {
    let (config, _) = resolve_config(cli)?;
    let background = config.background_rgb()?;
    let grid = build_grid(&config, Instant::now())?;
    tracing::info!(
        tiles = grid.tiles().len(),
        position = ?config.grid.position,
        "launching flipgrid"
    );

    let elements: Vec<Box<dyn SceneElement>> = vec![Box::new(grid)];
    let mut renderer = Renderer::new(RendererConfig::from_scene_config(&config, background));
    renderer.run(elements)
}

pub fn layout(cli: &Cli, json: bool) -> Result<()> {
    let (config, _) = resolve_config(cli)?;
    let grid = build_grid(&config, Instant::now())?;
    let report = LayoutReport::from_grid(&grid);
    if json {
        let rendered =
            serde_json::to_string_pretty(&report).context("failed to serialise layout")?;
        println!("{rendered}");
    } else {
        print!("{}", report.to_table());
    }
    Ok(())
}

pub fn check(cli: &Cli) -> Result<()> {
    let (config, source) = resolve_config(cli)?;
    let grid = build_grid(&config, Instant::now())?;
    let origin = match &source {
        ConfigSource::Explicit(path) | ConfigSource::Discovered(path) => {
            path.display().to_string()
        }
        ConfigSource::Defaults => "built-in defaults".to_string(),
    };
    println!(
        "configuration ok: {} tiles ({}x{}) from {origin}",
        grid.tiles().len(),
        config.grid.columns,
        config.grid.rows
    );
    Ok(())
}
