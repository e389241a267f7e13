//! Conversions between the three coordinate spaces of the maze:
//! scrolled screen pixels, logical cells and remote service points.
//!
//! [`Geometry`] is a small `Copy` value, so every conversion is a pure
//! function of its arguments and can be called from any thread.

use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, RangeError},
    grid::{Grid, Point},
};

/// A point in the path service's convention: `x` is the row, `y` the column.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ServicePoint {
    pub x: i32,
    pub y: i32,
}

/// How far the visible viewport has been scrolled into the maze image, in pixels.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ScrollOffset {
    pub x: i32,
    pub y: i32,
}

impl ScrollOffset {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Geometry {
    rows: usize,
    columns: usize,
    cell_size: u32,
}

impl Geometry {
    pub fn new(rows: usize, columns: usize, cell_size: u32) -> Result<Self, ConfigError> {
        if cell_size == 0 {
            return Err(ConfigError::CellSize(cell_size));
        }
        let fits = |cells: usize| {
            u32::try_from(cells)
                .ok()
                .and_then(|cells| cells.checked_mul(cell_size))
                .is_some()
        };
        if !fits(rows) || !fits(columns) {
            return Err(ConfigError::TooLarge {
                rows,
                columns,
                cell_size,
            });
        }

        Ok(Self {
            rows,
            columns,
            cell_size,
        })
    }

    pub fn for_grid(grid: &Grid, cell_size: u32) -> Result<Self, ConfigError> {
        Self::new(grid.rows(), grid.columns(), cell_size)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    pub fn pixel_width(&self) -> u32 {
        self.columns as u32 * self.cell_size
    }

    pub fn pixel_height(&self) -> u32 {
        self.rows as u32 * self.cell_size
    }

    pub fn contains(&self, point: Point) -> bool {
        point.row < self.rows && point.col < self.columns
    }

    fn check_cell(&self, point: Point) -> Result<(), RangeError> {
        if self.contains(point) {
            Ok(())
        } else {
            Err(RangeError::Cell {
                row: point.row,
                col: point.col,
                rows: self.rows,
                columns: self.columns,
            })
        }
    }

    /// Adds the scroll offset to a viewport position and floors it into a cell.
    pub fn screen_to_cell(
        &self,
        screen_x: i32,
        screen_y: i32,
        scroll: ScrollOffset,
    ) -> Result<Point, RangeError> {
        let out_of_range = RangeError::Screen {
            x: screen_x,
            y: screen_y,
            scroll_x: scroll.x,
            scroll_y: scroll.y,
        };
        let x = i64::from(screen_x) + i64::from(scroll.x);
        let y = i64::from(screen_y) + i64::from(scroll.y);
        if x < 0 || y < 0 {
            return Err(out_of_range);
        }

        self.pixel_to_cell(x as u32, y as u32)
            .map_err(|_| out_of_range)
    }

    /// Absolute image pixel to the cell that contains it.
    pub fn pixel_to_cell(&self, x: u32, y: u32) -> Result<Point, RangeError> {
        if x >= self.pixel_width() || y >= self.pixel_height() {
            return Err(RangeError::Pixel {
                x: i64::from(x),
                y: i64::from(y),
                width: self.pixel_width(),
                height: self.pixel_height(),
            });
        }

        Ok(Point {
            row: (y / self.cell_size) as usize,
            col: (x / self.cell_size) as usize,
        })
    }

    /// Midpoint of the cell's pixel block as `(x, y)`.
    pub fn cell_to_pixel_center(&self, point: Point) -> Result<(u32, u32), RangeError> {
        self.check_cell(point)?;
        let half = self.cell_size / 2;
        Ok((
            point.col as u32 * self.cell_size + half,
            point.row as u32 * self.cell_size + half,
        ))
    }

    /// The only place where the engine's (row, col) order meets the service's (x, y).
    pub fn cell_to_service(&self, point: Point) -> Result<ServicePoint, RangeError> {
        self.check_cell(point)?;
        Ok(ServicePoint {
            x: point.row as i32,
            y: point.col as i32,
        })
    }

    pub fn service_to_cell(&self, point: ServicePoint) -> Result<Point, RangeError> {
        let out_of_range = RangeError::Service {
            x: point.x,
            y: point.y,
            rows: self.rows,
            columns: self.columns,
        };
        let (Ok(row), Ok(col)) = (usize::try_from(point.x), usize::try_from(point.y)) else {
            return Err(out_of_range);
        };
        let cell = Point { row, col };
        if self.contains(cell) {
            Ok(cell)
        } else {
            Err(out_of_range)
        }
    }
}

#[cfg(test)]
mod test {

    use super::*;

    fn geometry() -> Geometry {
        Geometry::new(2, 3, 10).unwrap()
    }

    #[test]
    fn test_rejects_zero_cell_size() {
        assert!(matches!(
            Geometry::new(2, 2, 0),
            Err(ConfigError::CellSize(0))
        ));
    }

    #[test]
    fn test_rejects_overflowing_image() {
        assert!(matches!(
            Geometry::new(1, usize::MAX / 2, 10),
            Err(ConfigError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_screen_to_cell_floors() {
        let g = geometry();
        assert_eq!(
            g.screen_to_cell(9, 9, ScrollOffset::default()),
            Ok(Point::new(0, 0))
        );
        assert_eq!(
            g.screen_to_cell(10, 19, ScrollOffset::default()),
            Ok(Point::new(1, 1))
        );
        assert_eq!(
            g.screen_to_cell(29, 0, ScrollOffset::default()),
            Ok(Point::new(0, 2))
        );
    }

    #[test]
    fn test_screen_to_cell_applies_scroll() {
        let g = geometry();
        assert_eq!(
            g.screen_to_cell(5, 5, ScrollOffset::new(20, 10)),
            Ok(Point::new(1, 2))
        );
        // a negative viewport position can still land inside once scrolled
        assert_eq!(
            g.screen_to_cell(-5, 0, ScrollOffset::new(10, 0)),
            Ok(Point::new(0, 0))
        );
    }

    #[test]
    fn test_screen_to_cell_out_of_range() {
        let g = geometry();
        assert!(matches!(
            g.screen_to_cell(30, 0, ScrollOffset::default()),
            Err(RangeError::Screen { x: 30, .. })
        ));
        assert!(matches!(
            g.screen_to_cell(0, 15, ScrollOffset::new(0, 5)),
            Err(RangeError::Screen { .. })
        ));
        assert!(matches!(
            g.screen_to_cell(-1, 0, ScrollOffset::default()),
            Err(RangeError::Screen { .. })
        ));
    }

    #[test]
    fn test_cell_to_pixel_center() {
        let g = geometry();
        assert_eq!(g.cell_to_pixel_center(Point::new(0, 0)), Ok((5, 5)));
        assert_eq!(g.cell_to_pixel_center(Point::new(1, 2)), Ok((25, 15)));
        assert!(matches!(
            g.cell_to_pixel_center(Point::new(2, 0)),
            Err(RangeError::Cell { row: 2, .. })
        ));
    }

    #[test]
    fn test_round_trip_through_center() {
        for cell_size in [1, 2, 3, 7, 10] {
            let g = Geometry::new(4, 5, cell_size).unwrap();
            for row in 0..4 {
                for col in 0..5 {
                    let p = Point::new(row, col);
                    let (x, y) = g.cell_to_pixel_center(p).unwrap();
                    assert_eq!(
                        g.screen_to_cell(x as i32, y as i32, ScrollOffset::default()),
                        Ok(p)
                    );
                }
            }
        }
    }

    #[test]
    fn test_service_convention() {
        let g = geometry();
        let p = Point::new(1, 2);
        let s = g.cell_to_service(p).unwrap();
        assert_eq!(s, ServicePoint { x: 1, y: 2 });
        assert_eq!(g.service_to_cell(s), Ok(p));
    }

    #[test]
    fn test_service_out_of_range() {
        let g = geometry();
        assert!(matches!(
            g.service_to_cell(ServicePoint { x: -1, y: 0 }),
            Err(RangeError::Service { x: -1, .. })
        ));
        assert!(matches!(
            g.service_to_cell(ServicePoint { x: 0, y: 3 }),
            Err(RangeError::Service { .. })
        ));
        assert!(matches!(
            g.cell_to_service(Point::new(0, 3)),
            Err(RangeError::Cell { .. })
        ));
    }
}
