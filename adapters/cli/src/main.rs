#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for querying and editing Waypath grids.

mod input;
mod render;

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use waypath_core::{CellCoord, CellRect, CellRectSize, Heuristic};
use waypath_grid::{CostLayers, Grid};
use waypath_system_pathing::{PathEngine, PathingConfig};
use waypath_system_placement::{MovementClass, PlacementPlanner, Route};

#[derive(Parser, Debug)]
#[command(name = "waypath", version, about = "Weighted grid routing for tower-defence maps")]
struct Cli {
    /// TOML file with search settings.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log search internals to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report whether the start marker can reach the goal marker.
    Check {
        /// Terrain grid file.
        terrain: PathBuf,
        #[command(flatten)]
        layers: LayerArgs,
        /// Allow diagonal steps.
        #[arg(long)]
        diagonal: bool,
    },
    /// Print the cheapest path between two cells.
    Route {
        /// Terrain grid file.
        terrain: PathBuf,
        #[command(flatten)]
        layers: LayerArgs,
        /// Start cell as `X,Y`; defaults to the start marker.
        #[arg(long, value_parser = input::parse_cell)]
        from: Option<CellCoord>,
        /// Destination cell as `X,Y`; defaults to the goal marker.
        #[arg(long, value_parser = input::parse_cell)]
        to: Option<CellCoord>,
        /// Heuristic scale.
        #[arg(long)]
        h_modifier: Option<f64>,
        /// Heuristic strategy.
        #[arg(long)]
        heuristic: Option<Heuristic>,
        /// Allow diagonal steps.
        #[arg(long)]
        diagonal: bool,
        /// Draw the grid with the path overlaid.
        #[arg(long)]
        render: bool,
    },
    /// Parse a grid and write it back out in canonical form.
    Normalize {
        /// Terrain grid file.
        terrain: PathBuf,
        /// Destination file; stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Preview a structure placement for ground and flying movers.
    Place {
        /// Ground terrain grid file.
        terrain: PathBuf,
        #[command(flatten)]
        layers: LayerArgs,
        /// Upper-left cell of the footprint as `X,Y`.
        #[arg(long, value_parser = input::parse_cell)]
        at: CellCoord,
        /// Footprint size as `WxH`.
        #[arg(long, value_parser = input::parse_size, default_value = "1x1")]
        size: CellRectSize,
        /// Terrain grid used by flying movers.
        #[arg(long)]
        flying_terrain: Option<PathBuf>,
        /// Allow diagonal steps.
        #[arg(long)]
        diagonal: bool,
    },
}

#[derive(Args, Debug)]
struct LayerArgs {
    /// Filter layer file; zero weights when omitted.
    #[arg(long)]
    filter: Option<PathBuf>,
    /// Influence layer file; zero weights when omitted.
    #[arg(long)]
    influence: Option<PathBuf>,
}

impl LayerArgs {
    fn load(&self, terrain: &Path) -> Result<CostLayers> {
        input::load_layers(terrain, self.filter.as_deref(), self.influence.as_deref())
    }
}

/// Entry point for the Waypath command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = input::load_config(cli.config.as_deref())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Check {
            terrain,
            layers,
            diagonal,
        } => {
            config.allow_diagonal |= diagonal;
            let layers = layers.load(&terrain)?;
            let engine = PathEngine::from_layers(&layers, &config)?;
            if engine.exists_path() {
                writeln!(out, "path exists")?;
            } else {
                writeln!(out, "no path")?;
            }
        }
        Command::Route {
            terrain,
            layers,
            from,
            to,
            h_modifier,
            heuristic,
            diagonal,
            render,
        } => {
            config.allow_diagonal |= diagonal;
            if let Some(heuristic) = heuristic {
                config.heuristic = heuristic;
            }
            if let Some(h_modifier) = h_modifier {
                config.h_modifier = h_modifier;
            }
            input::validate_config(&config).context("invalid --h-modifier")?;
            let layers = layers.load(&terrain)?;
            route(&mut out, &layers, &config, from, to, render)?;
        }
        Command::Normalize { terrain, output } => {
            let grid = input::load_grid(&terrain)?;
            match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    grid.write_text(BufWriter::new(file))
                        .with_context(|| format!("failed to write {}", path.display()))?;
                }
                None => grid.write_text(&mut out)?,
            }
        }
        Command::Place {
            terrain,
            layers,
            at,
            size,
            flying_terrain,
            diagonal,
        } => {
            config.allow_diagonal |= diagonal;
            let ground = layers.load(&terrain)?;
            let flying = flying_terrain
                .map(|path| flying_layers(&path, &ground))
                .transpose()?;
            let mut routes = vec![Route::new(MovementClass::Ground, ground)];
            routes.extend(flying.map(|layers| Route::new(MovementClass::Flying, layers)));

            let planner = PlacementPlanner::new(config);
            let footprint = CellRect::from_origin_and_size(at, size);
            let preview = planner.preview(&routes, footprint, &[]);
            match preview.rejection {
                None => writeln!(out, "placeable")?,
                Some(rejection) => writeln!(out, "rejected: {rejection}")?,
            }
        }
    }

    Ok(())
}

fn route(
    out: &mut impl Write,
    layers: &CostLayers,
    config: &PathingConfig,
    from: Option<CellCoord>,
    to: Option<CellCoord>,
    draw: bool,
) -> Result<()> {
    let mut engine = PathEngine::from_layers(layers, config)?;
    let mut request = config.request();
    if let Some(cell) = from {
        request = request.starting_at(cell);
    }
    if let Some(cell) = to {
        request = request.ending_at(cell);
    }

    let path = engine.find_path(request).context("route query failed")?;
    for node in path.nodes() {
        writeln!(out, "{} {} {}", node.x(), node.y(), node.weight())?;
    }
    let total: u64 = path.nodes().iter().map(|node| u64::from(node.weight())).sum();
    writeln!(out, "nodes {} weight {} cost {}", path.len(), total, path.cost())?;

    if draw {
        writeln!(out)?;
        write!(
            out,
            "{}",
            render::render(layers.terrain(), layers.filter(), Some(&path))
        )?;
    }
    Ok(())
}

/// Flying movers share the ground filter so structures block them too.
fn flying_layers(path: &Path, ground: &CostLayers) -> Result<CostLayers> {
    let terrain = input::load_grid(path)?;
    let (rows, columns) = terrain.dimensions();
    CostLayers::new(terrain, ground.filter().clone(), Grid::filled(rows, columns, 0))
        .context("flying terrain must match the ground terrain's shape")
}
