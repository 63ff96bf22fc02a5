use std::fmt::Write as _;

use renderer::ImageGrid;
use serde::Serialize;

/// Snapshot of a freshly initialised grid, printed by `flipgrid layout`.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutReport {
    pub columns: u32,
    pub rows: u32,
    pub gap: f32,
    pub width: f32,
    pub height: f32,
    pub tile_width: f32,
    pub tile_height: f32,
    pub rotation_radians: f32,
    pub tiles: Vec<TileReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TileReport {
    pub index: usize,
    pub row: u32,
    pub column: u32,
    /// Top-left corner in world units.
    pub x: f32,
    pub y: f32,
    pub centre_x: f32,
    pub centre_y: f32,
    pub seed_delay_ms: u64,
}

impl LayoutReport {
    pub fn from_grid(grid: &ImageGrid) -> Self {
        let layout = grid.layout();
        let tile_size = grid.tile_size();
        let tiles = grid
            .tiles()
            .iter()
            .map(|tile| TileReport {
                index: tile.index(),
                row: tile.row(),
                column: tile.column(),
                x: tile.position().x,
                y: tile.position().y,
                centre_x: tile.centre().x,
                centre_y: tile.centre().y,
                seed_delay_ms: tile.seed_delay().as_millis() as u64,
            })
            .collect();
        Self {
            columns: layout.columns,
            rows: layout.rows,
            gap: layout.gap,
            width: grid.size().x,
            height: grid.size().y,
            tile_width: tile_size.x,
            tile_height: tile_size.y,
            rotation_radians: grid.rotation().current(),
            tiles,
        }
    }

    pub fn to_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} tiles ({} columns x {} rows), tile {:.2}x{:.2}, gap {}",
            self.tiles.len(),
            self.columns,
            self.rows,
            self.tile_width,
            self.tile_height,
            self.gap
        );
        let _ = writeln!(
            out,
            "  {:>5} {:>4} {:>4} {:>10} {:>10} {:>10} {:>10} {:>8}",
            "tile", "row", "col", "x", "y", "centre_x", "centre_y", "seed_ms"
        );
        for tile in &self.tiles {
            let _ = writeln!(
                out,
                "  {:>5} {:>4} {:>4} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>8}",
                tile.index,
                tile.row,
                tile.column,
                tile.x,
                tile.y,
                tile.centre_x,
                tile.centre_y,
                tile.seed_delay_ms
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use image::{Rgba, RgbaImage};
    use renderer::{GridLayout, GridOptions, ScreenPosition};
    use std::time::Instant;

    fn two_tile_grid() -> ImageGrid {
        let mut options = GridOptions::new(Vec2::new(200.0, 100.0));
        options.layout = GridLayout {
            columns: 2,
            rows: 1,
            gap: 0.0,
        };
        options.position = ScreenPosition::Center;
        let options = options.with_images(
            RgbaImage::from_pixel(200, 100, Rgba([255, 0, 0, 255])),
            RgbaImage::from_pixel(200, 100, Rgba([0, 0, 255, 255])),
        );
        ImageGrid::init(options, Instant::now()).unwrap()
    }

    #[test]
    fn report_lists_tile_centres() {
        let report = LayoutReport::from_grid(&two_tile_grid());
        assert_eq!(report.tiles.len(), 2);
        assert_eq!(report.tile_width, 100.0);
        assert_eq!(report.tiles[0].centre_x, -50.0);
        assert_eq!(report.tiles[1].centre_x, 50.0);
        assert_eq!(report.tiles[1].centre_y, 0.0);
        assert_eq!(report.tiles[1].seed_delay_ms, 50);
        assert_eq!(report.rotation_radians, 0.0);
    }

    #[test]
    fn table_has_one_line_per_tile() {
        let table = LayoutReport::from_grid(&two_tile_grid()).to_table();
        assert!(table.starts_with("2 tiles (2 columns x 1 rows)"));
        assert_eq!(table.lines().count(), 4);
    }
}
