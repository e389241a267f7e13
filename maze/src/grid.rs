use std::{
    fmt::Display,
    fs::File,
    io::{BufRead, BufReader, Cursor},
    path::Path,
    str::FromStr,
};

use log::info;

use crate::error::LoadError;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Cell {
    Blocked,
    Passable,
}

impl Cell {
    pub fn is_passable(self) -> bool {
        self == Cell::Passable
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Cell::Blocked => "X",
                Cell::Passable => " ",
            }
        )
    }
}

/// A logical cell coordinate.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Point {
    pub row: usize,
    pub col: usize,
}

impl Point {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(row {}, col {})", self.row, self.col)
    }
}

/// Immutable occupancy grid, stored row-major in a single vec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    columns: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Builds a grid from nested rows. Used by tests and the benches; the
    /// rows must be rectangular and non-empty.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Result<Self, LoadError> {
        let columns = rows.first().map(Vec::len).unwrap_or(0);
        if rows.is_empty() || columns == 0 {
            return Err(LoadError::Empty);
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns {
                return Err(LoadError::RaggedRow {
                    line: i + 1,
                    expected: columns,
                    found: row.len(),
                });
            }
        }

        Ok(Self {
            rows: rows.len(),
            columns,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    /// Parses whitespace separated rows of `0` (blocked) and `1` (passable).
    /// Blank lines are skipped.
    pub fn load(source: impl BufRead) -> Result<Self, LoadError> {
        let mut cells = Vec::new();
        let mut columns: Option<usize> = None;
        let mut rows = 0;

        for (index, line) in source.lines().enumerate() {
            let line = line?;
            let line_number = index + 1;
            if line.trim().is_empty() {
                continue;
            }

            let mut found = 0;
            for (column, token) in line.split_whitespace().enumerate() {
                let value: i64 = token.parse().map_err(|_| LoadError::InvalidToken {
                    line: line_number,
                    token: token.to_string(),
                })?;
                let cell = match value {
                    0 => Cell::Blocked,
                    1 => Cell::Passable,
                    value => {
                        return Err(LoadError::InvalidValue {
                            line: line_number,
                            column: column + 1,
                            value,
                        })
                    }
                };
                cells.push(cell);
                found += 1;
            }

            match columns {
                None => columns = Some(found),
                Some(expected) if expected != found => {
                    return Err(LoadError::RaggedRow {
                        line: line_number,
                        expected,
                        found,
                    })
                }
                Some(_) => {}
            }
            rows += 1;
        }

        let columns = columns.ok_or(LoadError::Empty)?;
        Ok(Self {
            rows,
            columns,
            cells,
        })
    }

    pub fn load_path(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let file = File::open(path.as_ref())?;
        let grid = Self::load(BufReader::new(file))?;
        info!(
            "loaded {}x{} grid from {}",
            grid.rows,
            grid.columns,
            path.as_ref().display()
        );
        Ok(grid)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn is_valid(&self, point: Point) -> bool {
        point.row < self.rows && point.col < self.columns
    }

    /// Returns `None` for points outside the grid.
    pub fn get(&self, point: Point) -> Option<Cell> {
        if self.is_valid(point) {
            Some(self.cells[point.row * self.columns + point.col])
        } else {
            None
        }
    }

    pub fn is_passable(&self, point: Point) -> bool {
        self.get(point).is_some_and(Cell::is_passable)
    }

    /// Iterates over every cell together with its coordinate, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (Point, Cell)> + '_ {
        self.cells.iter().enumerate().map(|(i, cell)| {
            (
                Point {
                    row: i / self.columns,
                    col: i % self.columns,
                },
                *cell,
            )
        })
    }

    /// Scales the grid by the given factor, i.e. to make it twice as large, pass 2.
    /// Interpolates the cells by repeating the existing cells in the new grid.
    pub fn scale_up(&self, factor: usize) -> Self {
        let columns = self.columns * factor;
        let mut cells = vec![Cell::Blocked; self.rows * factor * columns];

        for (point, cell) in self.iter() {
            for r in 0..factor {
                for c in 0..factor {
                    cells[(point.row * factor + r) * columns + point.col * factor + c] = cell;
                }
            }
        }

        Self {
            rows: self.rows * factor,
            columns,
            cells,
        }
    }
}

impl FromStr for Grid {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Grid::load(Cursor::new(s))
    }
}

impl Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.cells.chunks(self.columns) {
            for cell in row {
                write!(f, "{}", cell)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
