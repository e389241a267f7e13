use std::{path::PathBuf, time::Duration};

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use log::info;
use maze::{
    ClickOutcome, Config, Delivery, Engine, Grid, Point, RemoteService, ScrollOffset, SolveRequest, Transport,
};

/// Renders a maze grid to PNG and, given both endpoints, asks the path
/// service for a route and renders the overlay too.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Whitespace separated grid of 0 (wall) and 1 (open) cells.
    grid: PathBuf,
    /// TOML file with [render], [overlay] and [service] tables.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Where to write the rendered maze.
    #[arg(short, long, value_name = "FILE", default_value = "maze.png")]
    output: PathBuf,
    /// Start cell as ROW,COL.
    #[arg(long, value_name = "ROW,COL", value_parser = parse_point, requires = "end")]
    start: Option<Point>,
    /// End cell as ROW,COL.
    #[arg(long, value_name = "ROW,COL", value_parser = parse_point, requires = "start")]
    end: Option<Point>,
    /// Path service base address, overrides the config file.
    #[arg(long, value_name = "URL")]
    service: Option<String>,
    /// Path service protocol, `grpc` or `http`, overrides the config file.
    #[arg(long, value_name = "PROTOCOL")]
    transport: Option<Transport>,
    /// Where to write the maze with the path drawn on it.
    #[arg(long, value_name = "FILE", default_value = "solved.png")]
    overlay_output: PathBuf,
    /// Seconds to wait for the path service before giving up.
    #[arg(long, value_name = "SECONDS", default_value_t = 30)]
    wait: u64,
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (row, col) = s
        .split_once(',')
        .ok_or_else(|| format!("`{s}` is not ROW,COL"))?;
    let row = row.trim().parse().map_err(|_| format!("bad row in `{s}`"))?;
    let col = col.trim().parse().map_err(|_| format!("bad column in `{s}`"))?;
    Ok(Point::new(row, col))
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = CliArgs::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(address) = args.service {
        config.service.address = address;
    }
    if let Some(transport) = args.transport {
        config.service.transport = transport;
    }

    let grid = Grid::load_path(&args.grid).with_context(|| format!("loading {}", args.grid.display()))?;
    let service = RemoteService::from_config(&config.service)?;
    let mut engine = Engine::from_config(grid, service, &config)?;

    engine.display_image().save(&args.output)?;
    info!("wrote {}", args.output.display());

    let (Some(start), Some(end)) = (args.start, args.end) else {
        return Ok(());
    };

    let geometry = *engine.maze().geometry();
    for point in [start, end] {
        let (x, y) = geometry.cell_to_pixel_center(point)?;
        match engine.click(x as i32, y as i32, ScrollOffset::default()) {
            ClickOutcome::StartSet(_) | ClickOutcome::EndSet(_) => {}
            ClickOutcome::Blocked(_) => bail!("{point} is a wall"),
            outcome => bail!("could not select {point}: {outcome:?}"),
        }
    }

    if let SolveRequest::Incomplete = engine.solve() {
        bail!("{}", engine.status());
    }
    match engine.wait(Duration::from_secs(args.wait)) {
        Some(Delivery::Applied) => {}
        _ => return Err(anyhow!("no answer from {} within {}s", config.service.address, args.wait)),
    }
    println!("{}", engine.status());

    engine.display_image().save(&args.overlay_output)?;
    info!("wrote {}", args.overlay_output.display());

    Ok(())
}
