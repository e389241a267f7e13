use log::info;

use crate::{coords::Geometry, error::ConfigError, grid::Grid};

/// Passability at full pixel resolution.
///
/// Every cell is replicated into a `cell_size x cell_size` block, so hit
/// testing a click is a single lookup. This costs one byte per image pixel;
/// dividing by the cell size on every query would need no extra memory but
/// couples hit testing to the render geometry.
#[derive(Debug, Clone)]
pub struct OccupancyIndex {
    width: u32,
    height: u32,
    pixels: Vec<bool>,
}

impl OccupancyIndex {
    pub fn build(grid: &Grid, cell_size: u32) -> Result<Self, ConfigError> {
        let geometry = Geometry::for_grid(grid, cell_size)?;
        let width = geometry.pixel_width();
        let height = geometry.pixel_height();
        let cell_size = cell_size as usize;
        let mut pixels = vec![false; width as usize * height as usize];

        for (point, cell) in grid.iter() {
            if !cell.is_passable() {
                continue;
            }
            for r in 0..cell_size {
                let start = (point.row * cell_size + r) * width as usize + point.col * cell_size;
                pixels[start..start + cell_size].fill(true);
            }
        }

        info!(
            "built {}x{} occupancy index ({} bytes)",
            width,
            height,
            pixels.len()
        );

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Out-of-bounds pixels are reported as not passable.
    pub fn is_passable(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.pixels[y as usize * self.width as usize + x as usize]
    }
}
