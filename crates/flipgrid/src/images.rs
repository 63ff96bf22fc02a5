use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::RgbaImage;
use sceneconfig::GridConfig;

/// Decodes `path` into RGBA8, whatever its on-disk format.
pub fn load_rgba(path: &Path) -> Result<RgbaImage> {
    let image =
        image::open(path).with_context(|| format!("couldn't load image {}", path.display()))?;
    let rgba = image.to_rgba8();
    tracing::debug!(
        path = %path.display(),
        width = rgba.width(),
        height = rgba.height(),
        "loaded image"
    );
    Ok(rgba)
}

/// Loads the front and back images named by the grid config.
pub fn load_faces(grid: &GridConfig) -> Result<(RgbaImage, RgbaImage)> {
    let front = grid
        .front
        .as_deref()
        .ok_or_else(|| anyhow!("no front image configured; set grid.front or pass --front"))?;
    let back = grid
        .back
        .as_deref()
        .ok_or_else(|| anyhow!("no back image configured; set grid.back or pass --back"))?;
    Ok((load_rgba(front)?, load_rgba(back)?))
}
