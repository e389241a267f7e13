use std::{fmt::Display, str::FromStr};

use image::{Rgb, RgbImage};
use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};
use serde::{Deserialize, Serialize};

use crate::{coords::Geometry, error::ConfigError, grid::Grid};

/// An opaque RGB color, written as `#rrggbb` in config files.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const BLACK: Color = Color([0, 0, 0]);
    pub const GREEN: Color = Color([0, 128, 0]);
    pub const RED: Color = Color([255, 0, 0]);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    pub fn to_pixel(self) -> Rgb<u8> {
        Rgb(self.0)
    }
}

impl FromStr for Color {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidColor(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }

        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Color([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl TryFrom<String> for Color {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MazeStyle {
    pub background_color: Color,
    pub wall_color: Color,
    pub grid_line_color: Color,
    pub draw_grid_lines: bool,
}

impl Default for MazeStyle {
    fn default() -> Self {
        Self {
            background_color: Color::rgb(0xb0, 0xbc, 0xbf),
            wall_color: Color::rgb(0x08, 0x08, 0x08),
            grid_line_color: Color::rgb(0x0a, 0x0a, 0x0a),
            draw_grid_lines: true,
        }
    }
}

/// Rasterizes the grid into the base maze image.
///
/// The output only depends on the grid, cell size and style, so two calls with
/// the same inputs produce identical bytes and the result can be cached.
pub fn render(grid: &Grid, cell_size: u32, style: &MazeStyle) -> Result<RgbImage, ConfigError> {
    let geometry = Geometry::for_grid(grid, cell_size)?;
    let width = geometry.pixel_width();
    let height = geometry.pixel_height();

    let mut image = RgbImage::from_pixel(width, height, style.background_color.to_pixel());

    let wall = style.wall_color.to_pixel();
    for (point, cell) in grid.iter() {
        if cell.is_passable() {
            continue;
        }
        let rect = Rect::at(
            (point.col as u32 * cell_size) as i32,
            (point.row as u32 * cell_size) as i32,
        )
        .of_size(cell_size, cell_size);
        draw_filled_rect_mut(&mut image, rect, wall);
    }

    if style.draw_grid_lines {
        let line = style.grid_line_color.to_pixel();
        for x in (0..width).step_by(cell_size as usize) {
            for y in 0..height {
                image.put_pixel(x, y, line);
            }
        }
        for y in (0..height).step_by(cell_size as usize) {
            for x in 0..width {
                image.put_pixel(x, y, line);
            }
        }
    }

    Ok(image)
}
