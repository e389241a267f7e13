//! Maze rendering, screen to cell mapping and path overlays for an
//! interactive maze solver. Paths come from a remote service, see [`grpc`]
//! and [`http`].

pub mod client;
pub mod config;
pub mod coords;
pub mod engine;
pub mod error;
pub mod grid;
pub mod grpc;
pub mod http;
pub mod occupancy;
pub mod overlay;
pub mod remote;
pub mod render;
pub mod selection;

pub use client::{PathClient, PathResult, PathService};
pub use config::{Config, Transport};
pub use coords::{Geometry, ScrollOffset, ServicePoint};
pub use engine::{Delivery, Engine, Maze, Notification, RenderState, SolveRequest};
pub use error::{ConfigError, Error, FailureReason, LoadError, PathFailure, RangeError, ServiceError};
pub use grid::{Cell, Grid, Point};
pub use grpc::GrpcPathService;
pub use http::HttpPathService;
pub use occupancy::OccupancyIndex;
pub use overlay::{Endpoints, OverlayStyle};
pub use remote::RemoteService;
pub use render::{Color, MazeStyle};
pub use selection::{ClickOutcome, Selection, SelectionController};
