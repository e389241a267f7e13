use std::{collections::VecDeque, sync::Arc, time::Duration};

use image::RgbImage;
use log::{debug, info, warn};
use tokio::{
    runtime::Runtime,
    sync::mpsc::{self, error::TryRecvError},
};

use crate::{
    client::{PathClient, PathResult, PathService},
    config::Config,
    coords::{Geometry, ScrollOffset},
    error::{ConfigError, Error, FailureReason, PathFailure, RangeError},
    grid::{Grid, Point},
    occupancy::OccupancyIndex,
    overlay::{overlay, Endpoints, OverlayStyle},
    render::{render, MazeStyle},
    selection::{ClickOutcome, Selection, SelectionController},
};

const STATUS_SELECT: &str = "Select start and end points in the maze";

/// Oldest notifications are dropped once this many are waiting.
pub const MAX_NOTIFICATIONS: usize = 32;

/// Read-only maze data, built once at startup and shared with worker threads.
#[derive(Debug)]
pub struct Maze {
    grid: Grid,
    geometry: Geometry,
    occupancy: OccupancyIndex,
    base: RgbImage,
}

impl Maze {
    pub fn new(grid: Grid, cell_size: u32, style: &MazeStyle) -> Result<Self, Error> {
        let geometry = Geometry::for_grid(&grid, cell_size)?;
        let occupancy = OccupancyIndex::build(&grid, cell_size)?;
        let base = render(&grid, cell_size, style)?;
        info!(
            "maze ready: {}x{} cells, {}x{} pixels",
            geometry.rows(),
            geometry.columns(),
            geometry.pixel_width(),
            geometry.pixel_height()
        );

        Ok(Self {
            grid,
            geometry,
            occupancy,
            base,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn occupancy(&self) -> &OccupancyIndex {
        &self.occupancy
    }

    pub fn base_image(&self) -> &RgbImage {
        &self.base
    }
}

/// What is currently on screen.
#[derive(Debug, Clone, Default)]
pub enum RenderState {
    #[default]
    Base,
    Composite(RgbImage),
}

/// Messages for the host, e.g. to refresh status text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    SelectionChanged(Selection),
    SolveStarted { generation: u64 },
    SelectionIncomplete,
    PathRendered { len: usize },
    NoPath,
    SolveFailed(PathFailure),
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveRequest {
    Started { generation: u64 },
    Incomplete,
}

/// What happened to a response taken off the hand-off channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Applied,
    Stale,
}

/// A finished request, sent from the worker back to the UI thread.
#[derive(Debug)]
struct SolveOutcome {
    generation: u64,
    result: Result<PathResult, PathFailure>,
}

/// Everything the UI thread mutates. Never touched by the worker.
#[derive(Debug)]
pub struct EngineState {
    selection: SelectionController,
    render: RenderState,
    revision: u64,
    generation: u64,
    pending: Option<u64>,
    status: String,
    notifications: VecDeque<Notification>,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            selection: SelectionController::new(),
            render: RenderState::Base,
            revision: 0,
            generation: 0,
            pending: None,
            status: STATUS_SELECT.to_string(),
            notifications: VecDeque::new(),
        }
    }
}

impl EngineState {
    fn replace_render(&mut self, render: RenderState) {
        self.render = render;
        self.revision += 1;
    }

    fn notify(&mut self, notification: Notification) {
        if self.notifications.len() == MAX_NOTIFICATIONS {
            self.notifications.pop_front();
        }
        self.notifications.push_back(notification);
    }
}

type RepaintCallback = Arc<dyn Fn() + Send + Sync>;

/// The UI-facing side of the maze: selection, solving and the displayed image.
///
/// All methods are meant to be called from the thread that owns user input.
/// Path requests run on a private tokio runtime and come back through a
/// channel drained by [`Engine::poll`] or [`Engine::wait`].
pub struct Engine<S: PathService> {
    maze: Arc<Maze>,
    client: Arc<PathClient<S>>,
    overlay_style: OverlayStyle,
    state: EngineState,
    runtime: Runtime,
    tx: mpsc::UnboundedSender<SolveOutcome>,
    rx: mpsc::UnboundedReceiver<SolveOutcome>,
    repaint: Option<RepaintCallback>,
}

impl<S: PathService> Engine<S> {
    pub fn new(maze: Arc<Maze>, client: PathClient<S>, overlay_style: OverlayStyle) -> Result<Self, Error> {
        overlay_style.validate()?;
        if client.geometry() != maze.geometry() {
            return Err(ConfigError::GeometryMismatch {
                maze: *maze.geometry(),
                client: *client.geometry(),
            }
            .into());
        }
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("path-client")
            .enable_all()
            .build()
            .map_err(Error::Runtime)?;
        let (tx, rx) = mpsc::unbounded_channel();

        Ok(Self {
            maze,
            client: Arc::new(client),
            overlay_style,
            state: EngineState::default(),
            runtime,
            tx,
            rx,
            repaint: None,
        })
    }

    /// Loads everything from a grid and a validated config.
    pub fn from_config(grid: Grid, service: S, config: &Config) -> Result<Self, Error> {
        config.validate()?;
        let maze = Arc::new(Maze::new(grid, config.render.cell_size, &config.render.style())?);
        let client = PathClient::new(service, *maze.geometry()).with_timeout(config.service.timeout());
        Self::new(maze, client, config.overlay)
    }

    pub fn maze(&self) -> &Arc<Maze> {
        &self.maze
    }

    /// Called from the worker thread after a response has been queued.
    pub fn set_repaint_callback(&mut self, callback: impl Fn() + Send + Sync + 'static) {
        self.repaint = Some(Arc::new(callback));
    }

    pub fn selection(&self) -> Selection {
        self.state.selection.selection()
    }

    pub fn status(&self) -> &str {
        &self.state.status
    }

    pub fn is_pending(&self) -> bool {
        self.state.pending.is_some()
    }

    pub fn render_state(&self) -> &RenderState {
        &self.state.render
    }

    /// The image to show: the base maze or the latest composite.
    pub fn display_image(&self) -> &RgbImage {
        match &self.state.render {
            RenderState::Base => self.maze.base_image(),
            RenderState::Composite(image) => image,
        }
    }

    /// Increases every time the displayed image is replaced.
    pub fn display_revision(&self) -> u64 {
        self.state.revision
    }

    /// Takes the oldest queued notification. Only the latest
    /// [`MAX_NOTIFICATIONS`] are kept for hosts that never drain the queue.
    pub fn pop_notification(&mut self) -> Option<Notification> {
        self.state.notifications.pop_front()
    }

    pub fn click(&mut self, screen_x: i32, screen_y: i32, scroll: ScrollOffset) -> ClickOutcome {
        let outcome = self.state.selection.click(
            screen_x,
            screen_y,
            scroll,
            self.maze.geometry(),
            self.maze.occupancy(),
        );

        match outcome {
            ClickOutcome::StartSet(point) => {
                debug!("start set at {point}");
                self.state.status = format!("Start set at {point}. Click to set end point");
            }
            ClickOutcome::EndSet(point) => {
                debug!("end set at {point}");
                self.state.status = format!("End set at {point}. Click 'Solve Maze' to find path");
            }
            _ => return outcome,
        }

        let selection = self.selection();
        // selected cells lie inside the grid, so their markers always fit
        self.show(&[], selection).ok();
        self.state.notify(Notification::SelectionChanged(selection));
        outcome
    }

    /// Starts a request for the current selection on the background runtime.
    /// A request that is still outstanding is superseded.
    pub fn solve(&mut self) -> SolveRequest {
        let Some((start, end)) = self.selection().endpoints() else {
            self.state.status = "Please set both start and end points".to_string();
            self.state.notify(Notification::SelectionIncomplete);
            return SolveRequest::Incomplete;
        };

        self.state.generation += 1;
        let generation = self.state.generation;
        self.state.pending = Some(generation);
        self.state.status = "Solving...".to_string();
        self.state.notify(Notification::SolveStarted { generation });

        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        let repaint = self.repaint.clone();
        self.runtime.spawn(async move {
            let result = client.request_path(start, end).await;
            // the receiver only goes away with the engine itself
            let _ = tx.send(SolveOutcome { generation, result });
            if let Some(repaint) = repaint {
                repaint();
            }
        });

        SolveRequest::Started { generation }
    }

    /// Clears the selection and shows the base image again. Responses to
    /// requests issued before the reset are dropped when they arrive.
    pub fn reset(&mut self) {
        self.state.selection.reset();
        self.state.generation += 1;
        self.state.pending = None;
        self.state.replace_render(RenderState::Base);
        self.state.status = STATUS_SELECT.to_string();
        self.state.notify(Notification::Reset);
    }

    /// Applies every response that has arrived, without blocking.
    pub fn poll(&mut self) -> Vec<Delivery> {
        let mut deliveries = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(outcome) => deliveries.push(self.apply(outcome)),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        deliveries
    }

    /// Blocks until one response arrives or `timeout` elapses.
    /// Must not be called from inside an async context.
    pub fn wait(&mut self, timeout: Duration) -> Option<Delivery> {
        let rx = &mut self.rx;
        let outcome = self
            .runtime
            .block_on(async { tokio::time::timeout(timeout, rx.recv()).await })
            .ok()
            .flatten()?;
        Some(self.apply(outcome))
    }

    fn apply(&mut self, outcome: SolveOutcome) -> Delivery {
        if outcome.generation != self.state.generation || self.state.pending != Some(outcome.generation) {
            debug!(
                "discarding stale response for request {} (current {})",
                outcome.generation, self.state.generation
            );
            return Delivery::Stale;
        }
        self.state.pending = None;

        let selection = self.selection();
        match outcome.result {
            Ok(path) if path.is_empty() => {
                self.show(&[], selection).ok();
                self.state.status = "No path found!".to_string();
                self.state.notify(Notification::NoPath);
            }
            Ok(path) => match self.show(path.points(), selection) {
                Ok(()) => {
                    self.state.status = "Path found!".to_string();
                    self.state.notify(Notification::PathRendered { len: path.len() });
                }
                Err(err) => self.fail(PathFailure::new(
                    FailureReason::MalformedResponse,
                    format!("could not draw path: {err}"),
                )),
            },
            Err(failure) => self.fail(failure),
        }
        Delivery::Applied
    }

    /// Keeps the selection and the displayed image so the user can retry.
    fn fail(&mut self, failure: PathFailure) {
        self.state.status = format!("Error: {failure}");
        self.state.notify(Notification::SolveFailed(failure));
    }

    /// Replaces the displayed image with a composite of `path` and the
    /// selection markers. On error the display is left untouched.
    fn show(&mut self, path: &[Point], selection: Selection) -> Result<(), RangeError> {
        let endpoints = Endpoints::new(selection.start(), selection.end());
        let composite = overlay(
            self.maze.base_image(),
            self.maze.geometry(),
            path,
            endpoints,
            &self.overlay_style,
        )
        .map_err(|err| {
            warn!("could not draw overlay: {err}");
            err
        })?;
        self.state.replace_render(RenderState::Composite(composite));
        Ok(())
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::{coords::ServicePoint, error::ServiceError};
    use std::future::Future;

    struct Echo;

    impl PathService for Echo {
        fn find_path(
            &self,
            start: ServicePoint,
            end: ServicePoint,
        ) -> impl Future<Output = Result<Vec<ServicePoint>, ServiceError>> + Send {
            async move {
                if start == end {
                    Ok(vec![start])
                } else {
                    Ok(vec![start, end])
                }
            }
        }
    }

    fn engine() -> Engine<Echo> {
        let grid: Grid = "1 1\n1 1\n".parse().unwrap();
        Engine::from_config(grid, Echo, &Config::default()).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let e = engine();
        assert_eq!(e.selection(), Selection::Empty);
        assert_eq!(e.status(), STATUS_SELECT);
        assert!(matches!(e.render_state(), RenderState::Base));
        assert_eq!(e.display_image().as_raw(), e.maze().base_image().as_raw());
    }

    #[test]
    fn test_selection_shows_markers() {
        let mut e = engine();
        let none = ScrollOffset::default();

        assert_eq!(e.click(5, 5, none), ClickOutcome::StartSet(Point::new(0, 0)));
        assert_eq!(e.display_revision(), 1);
        assert_eq!(
            *e.display_image().get_pixel(5, 5),
            OverlayStyle::default().start_color.to_pixel()
        );
        assert!(e.status().starts_with("Start set at (row 0, col 0)"));
        assert_eq!(
            e.pop_notification(),
            Some(Notification::SelectionChanged(Selection::StartSet {
                start: Point::new(0, 0)
            }))
        );
        assert_eq!(e.pop_notification(), None);
    }

    #[test]
    fn test_solve_incomplete() {
        let mut e = engine();
        assert_eq!(e.solve(), SolveRequest::Incomplete);
        assert_eq!(e.status(), "Please set both start and end points");
        assert!(!e.is_pending());

        e.click(5, 5, ScrollOffset::default());
        assert_eq!(e.solve(), SolveRequest::Incomplete);
    }

    #[test]
    fn test_solve_and_wait() {
        let mut e = engine();
        let none = ScrollOffset::default();
        e.click(5, 5, none);
        e.click(15, 5, none);

        assert!(matches!(e.solve(), SolveRequest::Started { .. }));
        assert!(e.is_pending());
        assert_eq!(e.wait(Duration::from_secs(5)), Some(Delivery::Applied));
        assert!(!e.is_pending());
        assert_eq!(e.status(), "Path found!");
        assert_eq!(
            *e.display_image().get_pixel(15, 5),
            OverlayStyle::default().end_color.to_pixel()
        );
    }

    #[test]
    fn test_resolve_supersedes() {
        let mut e = engine();
        let none = ScrollOffset::default();
        e.click(5, 5, none);
        e.click(15, 15, none);

        let first = e.solve();
        let second = e.solve();
        assert_ne!(first, second);

        let mut deliveries = vec![];
        while deliveries.len() < 2 {
            deliveries.extend(e.wait(Duration::from_secs(5)));
        }
        assert!(deliveries.contains(&Delivery::Stale));
        assert!(deliveries.contains(&Delivery::Applied));
        assert_eq!(e.status(), "Path found!");
    }

    #[test]
    fn test_reset_restores_base() {
        let mut e = engine();
        let none = ScrollOffset::default();
        e.click(5, 5, none);
        e.click(15, 15, none);
        e.solve();
        e.wait(Duration::from_secs(5));

        e.reset();
        assert_eq!(e.selection(), Selection::Empty);
        assert!(matches!(e.render_state(), RenderState::Base));
        assert_eq!(e.status(), STATUS_SELECT);
        assert_eq!(e.click(15, 5, none), ClickOutcome::StartSet(Point::new(0, 1)));
    }

    #[test]
    fn test_rejects_client_for_other_maze() {
        let grid: Grid = "1 1\n1 1\n".parse().unwrap();
        let maze = Arc::new(Maze::new(grid, 10, &MazeStyle::default()).unwrap());
        let client = PathClient::new(Echo, Geometry::new(3, 3, 10).unwrap());
        assert!(matches!(
            Engine::new(maze, client, OverlayStyle::default()),
            Err(Error::Config(ConfigError::GeometryMismatch { .. }))
        ));
    }

    #[test]
    fn test_notifications_are_bounded() {
        let mut e = engine();
        for _ in 0..MAX_NOTIFICATIONS {
            e.click(5, 5, ScrollOffset::default());
            e.reset();
        }

        let drained: Vec<_> = std::iter::from_fn(|| e.pop_notification()).collect();
        assert_eq!(drained.len(), MAX_NOTIFICATIONS);
        // the newest ones survive
        assert_eq!(drained.last(), Some(&Notification::Reset));
        assert_eq!(e.pop_notification(), None);
    }

    #[test]
    fn test_undrawable_path_is_reported() {
        let mut e = engine();
        let none = ScrollOffset::default();
        e.click(5, 5, none);
        e.click(15, 15, none);
        let generation = match e.solve() {
            SolveRequest::Started { generation } => generation,
            SolveRequest::Incomplete => unreachable!(),
        };
        let revision = e.display_revision();
        while e.pop_notification().is_some() {}

        let outcome = SolveOutcome {
            generation,
            result: Ok(PathResult::new(vec![Point::new(0, 0), Point::new(5, 5)])),
        };
        assert_eq!(e.apply(outcome), Delivery::Applied);
        assert!(e.status().starts_with("Error: "));
        assert_eq!(e.display_revision(), revision);
        assert!(matches!(
            e.pop_notification(),
            Some(Notification::SolveFailed(PathFailure {
                reason: FailureReason::MalformedResponse,
                ..
            }))
        ));
    }
}
