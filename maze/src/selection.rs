use log::debug;

use crate::{
    coords::{Geometry, ScrollOffset},
    grid::Point,
    occupancy::OccupancyIndex,
};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Selection {
    #[default]
    Empty,
    StartSet {
        start: Point,
    },
    BothSet {
        start: Point,
        end: Point,
    },
}

impl Selection {
    pub fn start(&self) -> Option<Point> {
        match *self {
            Selection::Empty => None,
            Selection::StartSet { start } | Selection::BothSet { start, .. } => Some(start),
        }
    }

    pub fn end(&self) -> Option<Point> {
        match *self {
            Selection::BothSet { end, .. } => Some(end),
            _ => None,
        }
    }

    /// Both endpoints, if the selection is complete.
    pub fn endpoints(&self) -> Option<(Point, Point)> {
        match *self {
            Selection::BothSet { start, end } => Some((start, end)),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ClickOutcome {
    StartSet(Point),
    EndSet(Point),
    /// The click hit a wall.
    Blocked(Point),
    /// The click landed outside the maze image.
    OutOfBounds,
    /// Both endpoints are already chosen; waiting for a reset.
    Ignored,
}

/// Two-click start/end selection: `Empty -> StartSet -> BothSet`, back to
/// `Empty` only through [`SelectionController::reset`].
#[derive(Debug, Default)]
pub struct SelectionController {
    selection: Selection,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn click(
        &mut self,
        screen_x: i32,
        screen_y: i32,
        scroll: ScrollOffset,
        geometry: &Geometry,
        occupancy: &OccupancyIndex,
    ) -> ClickOutcome {
        if let Selection::BothSet { .. } = self.selection {
            debug!("ignoring click at ({screen_x}, {screen_y}): selection complete");
            return ClickOutcome::Ignored;
        }

        let point = match geometry.screen_to_cell(screen_x, screen_y, scroll) {
            Ok(point) => point,
            Err(err) => {
                debug!("ignoring click: {err}");
                return ClickOutcome::OutOfBounds;
            }
        };

        // screen_to_cell succeeded, so the pixel is non-negative and in range
        let pixel_x = (screen_x + scroll.x) as u32;
        let pixel_y = (screen_y + scroll.y) as u32;
        if !occupancy.is_passable(pixel_x, pixel_y) {
            debug!("ignoring click on blocked cell {point}");
            return ClickOutcome::Blocked(point);
        }

        match self.selection {
            Selection::Empty => {
                self.selection = Selection::StartSet { start: point };
                ClickOutcome::StartSet(point)
            }
            Selection::StartSet { start } => {
                self.selection = Selection::BothSet { start, end: point };
                ClickOutcome::EndSet(point)
            }
            Selection::BothSet { .. } => ClickOutcome::Ignored,
        }
    }

    pub fn reset(&mut self) {
        self.selection = Selection::Empty;
    }
}
