use image::RgbImage;
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};
use serde::{Deserialize, Serialize};

use crate::{
    coords::Geometry,
    error::{ConfigError, RangeError},
    grid::Point,
    render::Color,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayStyle {
    pub path_color: Color,
    pub start_color: Color,
    pub end_color: Color,
    /// Stroke width of the path in pixels.
    pub line_width: u32,
}

impl OverlayStyle {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.line_width == 0 {
            return Err(ConfigError::LineWidth(self.line_width));
        }
        Ok(())
    }
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            path_color: Color::rgb(0x15, 0x65, 0xc0),
            start_color: Color::GREEN,
            end_color: Color::RED,
            line_width: 5,
        }
    }
}

/// The selected endpoints to mark. Falls back to the ends of the path when unset.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Endpoints {
    pub start: Option<Point>,
    pub end: Option<Point>,
}

impl Endpoints {
    pub fn new(start: Option<Point>, end: Option<Point>) -> Self {
        Self { start, end }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Shape {
    Segment {
        from: (u32, u32),
        to: (u32, u32),
        width: u32,
        color: Color,
    },
    Marker {
        center: (u32, u32),
        radius: u32,
        color: Color,
    },
}

/// Lays out the shapes of an overlay in drawing order: path segments, a
/// marker on every path cell, then the start marker and the end marker last.
pub fn plan(
    geometry: &Geometry,
    path: &[Point],
    endpoints: Endpoints,
    style: &OverlayStyle,
) -> Result<Vec<Shape>, RangeError> {
    let centers = path
        .iter()
        .map(|p| geometry.cell_to_pixel_center(*p))
        .collect::<Result<Vec<_>, _>>()?;

    let mut shapes = Vec::with_capacity(centers.len() * 2 + 2);

    for pair in centers.windows(2) {
        shapes.push(Shape::Segment {
            from: pair[0],
            to: pair[1],
            width: style.line_width,
            color: style.path_color,
        });
    }

    let path_radius = (geometry.cell_size() / 4).max(1);
    for center in &centers {
        shapes.push(Shape::Marker {
            center: *center,
            radius: path_radius,
            color: style.path_color,
        });
    }

    let endpoint_radius = (geometry.cell_size() / 3).max(1);
    let start = endpoints.start.or_else(|| path.first().copied());
    let end = endpoints.end.or_else(|| path.last().copied());
    for (point, color) in [(start, style.start_color), (end, style.end_color)] {
        if let Some(point) = point {
            shapes.push(Shape::Marker {
                center: geometry.cell_to_pixel_center(point)?,
                radius: endpoint_radius,
                color,
            });
        }
    }

    Ok(shapes)
}

/// Draws shapes onto an image in order.
pub fn rasterize(image: &mut RgbImage, shapes: &[Shape]) {
    for shape in shapes {
        match *shape {
            Shape::Segment {
                from,
                to,
                width,
                color,
            } => {
                // square brush: repeat the one pixel line over the stroke footprint
                let reach = (width / 2) as i64;
                let lo = -reach;
                let hi = width as i64 - 1 - reach;
                for dx in lo..=hi {
                    for dy in lo..=hi {
                        draw_line_segment_mut(
                            image,
                            ((from.0 as i64 + dx) as f32, (from.1 as i64 + dy) as f32),
                            ((to.0 as i64 + dx) as f32, (to.1 as i64 + dy) as f32),
                            color.to_pixel(),
                        );
                    }
                }
            }
            Shape::Marker {
                center,
                radius,
                color,
            } => {
                draw_filled_circle_mut(
                    image,
                    (center.0 as i32, center.1 as i32),
                    radius as i32,
                    color.to_pixel(),
                );
            }
        }
    }
}

/// Composites a path onto a copy of `base`. The base image is never modified,
/// so calling this again with the same inputs gives the same picture.
pub fn overlay(
    base: &RgbImage,
    geometry: &Geometry,
    path: &[Point],
    endpoints: Endpoints,
    style: &OverlayStyle,
) -> Result<RgbImage, RangeError> {
    let shapes = plan(geometry, path, endpoints, style)?;
    let mut composite = base.clone();
    rasterize(&mut composite, &shapes);
    Ok(composite)
}
