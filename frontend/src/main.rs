use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Parser;
use maze::{
    config::{DEFAULT_HOST, DEFAULT_PORT},
    Config, Engine, Grid, RemoteService, Transport,
};

mod app;

/// Interactive maze solver: click a start and an end cell, then solve.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Whitespace separated grid of 0 (wall) and 1 (open) cells.
    #[arg(default_value = "data/matrix.txt")]
    grid: PathBuf,
    /// TOML file with [render], [overlay] and [service] tables.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Path service host, overrides the config file (default localhost).
    #[arg(long)]
    host: Option<String>,
    /// Path service port, overrides the config file (default 9999).
    #[arg(long)]
    port: Option<u16>,
    /// Path service protocol, `grpc` or `http`, overrides the config file.
    #[arg(long, value_name = "PROTOCOL")]
    transport: Option<Transport>,
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).
    let args = CliArgs::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    if args.host.is_some() || args.port.is_some() {
        let host = args.host.as_deref().unwrap_or(DEFAULT_HOST);
        config.service.set_host_port(host, args.port.unwrap_or(DEFAULT_PORT));
    }
    if let Some(transport) = args.transport {
        config.service.transport = transport;
    }

    let grid = Grid::load_path(&args.grid).with_context(|| format!("loading {}", args.grid.display()))?;
    let service = RemoteService::from_config(&config.service)?;
    let engine = Engine::from_config(grid, service, &config)?;

    let geometry = *engine.maze().geometry();
    let width = (geometry.pixel_width() as f32 + 32.0).min(1200.0);
    let height = (geometry.pixel_height() as f32 + 96.0).min(900.0);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width, height])
            .with_min_inner_size([300.0, 220.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Maze Solver with Grid Snapping",
        native_options,
        Box::new(|cc| Box::new(app::App::new(cc, engine))),
    )
    .map_err(|err| anyhow!("{err}"))
}
