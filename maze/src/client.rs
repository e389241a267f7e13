use std::{future::Future, time::Duration};

use log::{debug, warn};

use crate::{
    coords::{Geometry, ServicePoint},
    error::{FailureReason, PathFailure, ServiceError},
    grid::Point,
};

/// The remote path finder. Implementations only move points over the wire;
/// they know nothing about cells or screens.
pub trait PathService: Send + Sync + 'static {
    /// Returns the path from `start` to `end` inclusive, in traversal order.
    /// An empty path means the endpoints are not connected.
    fn find_path(
        &self,
        start: ServicePoint,
        end: ServicePoint,
    ) -> impl Future<Output = Result<Vec<ServicePoint>, ServiceError>> + Send;
}

/// An ordered, validated path. Empty means "no path exists".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathResult {
    points: Vec<Point>,
}

impl PathResult {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

pub struct PathClient<S> {
    service: S,
    geometry: Geometry,
    timeout: Option<Duration>,
}

impl<S: PathService> PathClient<S> {
    pub fn new(service: S, geometry: Geometry) -> Self {
        Self {
            service,
            geometry,
            timeout: None,
        }
    }

    /// Bounds every request by `timeout`. No timeout is applied by default.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// One round trip to the service. Either the whole path comes back
    /// converted to cells, or a single [`PathFailure`].
    pub async fn request_path(&self, start: Point, end: Point) -> Result<PathResult, PathFailure> {
        let invalid = |err: crate::error::RangeError| {
            PathFailure::new(FailureReason::Service, format!("invalid request: {err}"))
        };
        let service_start = self.geometry.cell_to_service(start).map_err(invalid)?;
        let service_end = self.geometry.cell_to_service(end).map_err(invalid)?;

        debug!("requesting path {start} -> {end}");
        let request = self.service.find_path(service_start, service_end);
        let response = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, request).await.map_err(|_| {
                PathFailure::new(
                    FailureReason::Timeout,
                    format!("no answer within {} ms", timeout.as_millis()),
                )
            })?,
            None => request.await,
        };

        let result = response
            .map_err(PathFailure::from)
            .and_then(|points| self.normalize(start, end, points));
        if let Err(failure) = &result {
            warn!("path request {start} -> {end} failed: {failure}");
        }
        result
    }

    fn normalize(
        &self,
        start: Point,
        end: Point,
        points: Vec<ServicePoint>,
    ) -> Result<PathResult, PathFailure> {
        let malformed = |detail: String| PathFailure::new(FailureReason::MalformedResponse, detail);

        let cells = self.geometry.rows() * self.geometry.columns();
        if points.len() > cells {
            return Err(malformed(format!(
                "{} points for a grid of {} cells",
                points.len(),
                cells
            )));
        }

        let path = points
            .into_iter()
            .map(|p| self.geometry.service_to_cell(p))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| malformed(err.to_string()))?;

        if let (Some(first), Some(last)) = (path.first(), path.last()) {
            if *first != start || *last != end {
                return Err(malformed(format!(
                    "path runs {first} -> {last}, expected {start} -> {end}"
                )));
            }
        }

        Ok(PathResult::new(path))
    }
}
