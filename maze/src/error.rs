use std::fmt::Display;

use thiserror::Error;

use crate::coords::Geometry;

/// Problems reading the grid source. Fatal at startup, no partial grid is produced.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read grid source: {0}")]
    Io(#[from] std::io::Error),
    #[error("grid source contains no rows")]
    Empty,
    #[error("line {line}: `{token}` is not an integer")]
    InvalidToken { line: usize, token: String },
    #[error("line {line}, column {column}: cell value {value} is neither 0 nor 1")]
    InvalidValue {
        line: usize,
        column: usize,
        value: i64,
    },
    #[error("line {line}: expected {expected} cells but found {found}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },
}

/// Invalid rendering or client parameters, detected at construction time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cell size must be a positive integer, got {0}")]
    CellSize(u32),
    #[error("line width must be a positive integer, got {0}")]
    LineWidth(u32),
    #[error("`{0}` is not a #rrggbb color")]
    InvalidColor(String),
    #[error("grid of {rows}x{columns} cells at cell size {cell_size} does not fit in an image")]
    TooLarge {
        rows: usize,
        columns: usize,
        cell_size: u32,
    },
    #[error("path client was built for {client:?} but the maze is {maze:?}")]
    GeometryMismatch { maze: Geometry, client: Geometry },
    #[error("invalid path service address {0}")]
    InvalidAddress(String),
    #[error("unknown transport `{0}`, expected `grpc` or `http`")]
    InvalidTransport(String),
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A coordinate outside the maze. Always a caller bug, values are never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("screen position ({x}, {y}) with scroll ({scroll_x}, {scroll_y}) is outside the maze")]
    Screen {
        x: i32,
        y: i32,
        scroll_x: i32,
        scroll_y: i32,
    },
    #[error("pixel ({x}, {y}) is outside the {width}x{height} image")]
    Pixel {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },
    #[error("cell (row {row}, col {col}) is outside the {rows}x{columns} grid")]
    Cell {
        row: usize,
        col: usize,
        rows: usize,
        columns: usize,
    },
    #[error("service point (x {x}, y {y}) is outside the {rows}x{columns} grid")]
    Service {
        x: i32,
        y: i32,
        rows: usize,
        columns: usize,
    },
}

/// Errors reported by a [`crate::client::PathService`] implementation.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("cannot reach path service: {0}")]
    Connect(String),
    #[error("path service answered with status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("could not decode path service response: {0}")]
    Decode(String),
    #[error("path service call failed ({code}): {message}")]
    Rpc { code: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    Connectivity,
    Timeout,
    Service,
    MalformedResponse,
}

impl Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                FailureReason::Connectivity => "connectivity",
                FailureReason::Timeout => "timeout",
                FailureReason::Service => "service",
                FailureReason::MalformedResponse => "malformed response",
            }
        )
    }
}

/// A failed solve. Recoverable: the selection is kept so the user can retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} failure: {detail}")]
pub struct PathFailure {
    pub reason: FailureReason,
    pub detail: String,
}

impl PathFailure {
    pub fn new(reason: FailureReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }
}

impl From<ServiceError> for PathFailure {
    fn from(err: ServiceError) -> Self {
        let reason = match err {
            ServiceError::Connect(_) | ServiceError::Transport(_) => FailureReason::Connectivity,
            ServiceError::Status(_) | ServiceError::Rpc { .. } => FailureReason::Service,
            ServiceError::Decode(_) => FailureReason::MalformedResponse,
        };
        PathFailure::new(reason, err.to_string())
    }
}

/// Startup errors, any of which aborts initialization.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not start the path request runtime: {0}")]
    Runtime(std::io::Error),
}
