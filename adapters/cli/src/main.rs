#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that samples a collider scene into a walkability grid
//! and answers batched path queries against it.

mod config;
mod render;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use walkgrid_core::{CellCoord, Command, Event, OccupantId};
use walkgrid_scene::StaticScene;
use walkgrid_system_classification::CellClassifier;
use walkgrid_system_pathfinding::{
    BatchSummary, PathSearchScheduler, SearchOutcome, SearchRequest,
};
use walkgrid_system_sampling::EnvironmentSampler;
use walkgrid_world::{self as world, query, Grid};

use crate::config::WalkgridConfig;

/// Command-line arguments accepted by the walkgrid binary.
#[derive(Debug, Parser)]
#[command(
    name = "walkgrid",
    version,
    about = "Samples a collider scene into a walkability grid and answers path queries"
)]
struct CliArgs {
    /// Path to the TOML configuration describing grid, sampler and scene.
    #[arg(long, short)]
    config: PathBuf,
    /// Number of sampling refreshes to run before answering queries.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    refreshes: u32,
    /// Simulated frame duration in milliseconds that drives the refresh schedule.
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u64).range(1..))]
    frame_ms: u64,
    /// Path query written as `x1,y1:x2,y2`; may be repeated.
    #[arg(long = "query", value_parser = parse_query)]
    queries: Vec<SearchRequest>,
    /// Occupancy assignment written as `x,y=id`; may be repeated.
    #[arg(long = "occupy", value_parser = parse_occupancy)]
    occupancy: Vec<(CellCoord, OccupantId)>,
    /// Prints the classified grid once all refreshes completed.
    #[arg(long)]
    print_grid: bool,
}

/// Entry point for the walkgrid command-line interface.
fn main() -> Result<()> {
    init_logging();
    let args = CliArgs::parse();
    run(&args)
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(args: &CliArgs) -> Result<()> {
    let config = WalkgridConfig::load(&args.config)?;
    let layout = config.grid.layout()?;
    let scene = config.scene()?;
    let sampler = config.sampling.sampler()?;
    let mut schedule = config.sampling.schedule()?;
    let scheduler = PathSearchScheduler::new(config.search.engine());

    let mut grid = Grid::new(layout);
    let mut events = Vec::new();
    info!(
        width = layout.width(),
        height = layout.height(),
        colliders = scene.colliders().len(),
        "grid created"
    );

    let target = if schedule.interval().is_some() {
        args.refreshes
    } else {
        if args.refreshes > 1 {
            warn!("periodic refresh disabled; sampling the scene once");
        }
        1
    };

    let frame = Duration::from_millis(args.frame_ms);
    let mut simulated = Duration::ZERO;
    let mut completed = 0;
    while completed < target {
        let due = schedule.advance(frame) || schedule.interval().is_none();
        simulated += frame;
        if !due {
            continue;
        }
        refresh_grid(&mut grid, &sampler, &scene, &mut events)?;
        completed += 1;
        report(&mut events);
    }
    info!(
        refreshes = completed,
        ?simulated,
        walkable = query::walkable_count(&grid),
        "sampling finished"
    );

    for &(cell, occupant) in &args.occupancy {
        world::apply(&mut grid, Command::SetOccupier { cell, occupant }, &mut events);
    }
    report(&mut events);

    let snapshot = query::path_snapshot(&grid).context("grid is not ready for path searches")?;
    let results = scheduler.submit_batch(&snapshot, &args.queries);
    let mut highlighted = Vec::new();
    for (request, result) in args.queries.iter().zip(&results) {
        let line = match result {
            Ok(SearchOutcome::Found(path)) => {
                highlighted.extend_from_slice(path.cells());
                let cells: Vec<String> = path.cells().iter().map(ToString::to_string).collect();
                format!("cost {} via {}", path.cost(), cells.join(" "))
            }
            Ok(SearchOutcome::NoPath) => "no path".to_owned(),
            Ok(SearchOutcome::LimitReached { expanded }) => {
                format!("gave up after {expanded} expansions")
            }
            Ok(SearchOutcome::Cancelled) => "cancelled".to_owned(),
            Err(error) => format!("rejected: {error}"),
        };
        println!("{} -> {}: {line}", request.start, request.goal);
    }
    if !args.queries.is_empty() {
        let summary = BatchSummary::from_results(&results);
        println!(
            "{} queries: {} found, {} without path, {} limited, {} rejected",
            summary.total(),
            summary.found,
            summary.no_path,
            summary.limit_reached,
            summary.rejected
        );
    }

    if args.print_grid {
        print!("{}", render::render_grid(&grid, &highlighted));
    }
    Ok(())
}

/// Samples the scene and rewrites derived flags when walkability changed.
fn refresh_grid(
    grid: &mut Grid,
    sampler: &EnvironmentSampler,
    scene: &StaticScene,
    events: &mut Vec<Event>,
) -> Result<()> {
    let survey = sampler
        .refresh(grid.layout(), scene)
        .context("sampling refresh failed")?;
    world::apply(grid, Command::ApplySurvey { survey }, events);
    if grid.needs_reclassification() {
        let command = CellClassifier.command_for(&query::walkability(grid));
        world::apply(grid, command, events);
    }
    Ok(())
}

fn report(events: &mut Vec<Event>) {
    for event in events.drain(..) {
        match event {
            Event::SurveyApplied {
                walkable,
                changed,
                failed_probes,
            } => info!(walkable, changed, failed_probes, "survey applied"),
            Event::EdgesReclassified {
                walkable_edges,
                grid_edges,
            } => info!(walkable_edges, grid_edges, "edges reclassified"),
            Event::OccupierSet {
                cell,
                occupant,
                previous,
            } => info!(%cell, occupant = occupant.get(), ?previous, "occupier set"),
            Event::OccupierCleared { cell, previous } => {
                info!(%cell, ?previous, "occupier cleared");
            }
            Event::SurveyRejected { reason }
            | Event::ClassificationRejected { reason }
            | Event::OccupancyRejected { reason, .. } => warn!(%reason, "command rejected"),
        }
    }
}

fn parse_cell(value: &str) -> Result<CellCoord, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, found `{value}`"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<i32>()
            .map_err(|error| format!("invalid coordinate `{part}`: {error}"))
    };
    Ok(CellCoord::new(parse(x)?, parse(y)?))
}

fn parse_query(value: &str) -> Result<SearchRequest, String> {
    let (start, goal) = value
        .split_once(':')
        .ok_or_else(|| format!("expected `x1,y1:x2,y2`, found `{value}`"))?;
    Ok(SearchRequest::new(parse_cell(start)?, parse_cell(goal)?))
}

fn parse_occupancy(value: &str) -> Result<(CellCoord, OccupantId), String> {
    let (cell, id) = value
        .split_once('=')
        .ok_or_else(|| format!("expected `x,y=id`, found `{value}`"))?;
    let id = id
        .trim()
        .parse::<u64>()
        .map_err(|error| format!("invalid occupant id `{id}`: {error}"))?;
    Ok((parse_cell(cell)?, OccupantId::new(id)))
}
