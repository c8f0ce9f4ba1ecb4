//! Loading of grids and search settings plus parsing of coordinate flags.

use std::{
    fs::{self, File},
    io::BufReader,
    path::Path,
};

use anyhow::{bail, Context, Result};
use waypath_core::{CellCoord, CellRectSize};
use waypath_grid::{CostLayers, Grid};
use waypath_system_pathing::PathingConfig;

/// Reads search settings from `path`, or returns the defaults without one.
pub(crate) fn load_config(path: Option<&Path>) -> Result<PathingConfig> {
    let Some(path) = path else {
        return Ok(PathingConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("invalid config at {}", path.display()))
}

pub(crate) fn parse_config(contents: &str) -> Result<PathingConfig> {
    let config: PathingConfig =
        toml::from_str(contents).context("failed to parse search settings toml contents")?;
    validate_config(&config)?;
    Ok(config)
}

/// Rejects scales that would break the search ordering. Runs again after
/// command-line overrides are applied.
pub(crate) fn validate_config(config: &PathingConfig) -> Result<()> {
    ensure_scale("h_modifier", config.h_modifier)?;
    ensure_scale("influence_multiplier", config.influence_multiplier)
}

fn ensure_scale(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        bail!("{name} must be a non-negative number, found {value}");
    }
    Ok(())
}

/// Reads a terrain grid in the text format from `path`.
pub(crate) fn load_grid(path: &Path) -> Result<Grid> {
    let file =
        File::open(path).with_context(|| format!("failed to open grid at {}", path.display()))?;
    let grid = Grid::read_text(BufReader::new(file))
        .with_context(|| format!("failed to parse grid at {}", path.display()))?;
    log_loaded(&grid, path);
    Ok(grid)
}

/// Reads a filter or influence layer, keeping zero weights.
fn load_layer(path: &Path) -> Result<Grid> {
    let file =
        File::open(path).with_context(|| format!("failed to open layer at {}", path.display()))?;
    let grid = Grid::read_layer_text(BufReader::new(file))
        .with_context(|| format!("failed to parse layer at {}", path.display()))?;
    log_loaded(&grid, path);
    Ok(grid)
}

fn log_loaded(grid: &Grid, path: &Path) {
    log::debug!(
        "loaded {}x{} grid from {}",
        grid.columns(),
        grid.rows(),
        path.display()
    );
}

/// Loads the terrain and optional filter and influence layers. Layers left
/// out default to zero weights in the terrain's shape.
pub(crate) fn load_layers(
    terrain: &Path,
    filter: Option<&Path>,
    influence: Option<&Path>,
) -> Result<CostLayers> {
    let terrain = load_grid(terrain)?;
    let filter = load_optional_layer(&terrain, filter)?;
    let influence = load_optional_layer(&terrain, influence)?;
    CostLayers::new(terrain, filter, influence).context("layer grids must share the terrain's shape")
}

fn load_optional_layer(terrain: &Grid, path: Option<&Path>) -> Result<Grid> {
    match path {
        Some(path) => load_layer(path),
        None => Ok(Grid::filled(terrain.rows(), terrain.columns(), 0)),
    }
}

/// Parses an `X,Y` cell.
pub(crate) fn parse_cell(value: &str) -> Result<CellCoord, String> {
    let Some((x, y)) = value.split_once(',') else {
        return Err(format!("expected `X,Y`, found `{value}`"));
    };
    let x = parse_component(x, "x")?;
    let y = parse_component(y, "y")?;
    Ok(CellCoord::new(x, y))
}

/// Parses a `WxH` footprint size.
pub(crate) fn parse_size(value: &str) -> Result<CellRectSize, String> {
    let Some((width, height)) = value.split_once(|c| c == 'x' || c == 'X') else {
        return Err(format!("expected `WxH`, found `{value}`"));
    };
    let width = parse_component(width, "width")?;
    let height = parse_component(height, "height")?;
    if width == 0 || height == 0 {
        return Err(format!("footprint `{value}` must cover at least one cell"));
    }
    Ok(CellRectSize::new(width, height))
}

fn parse_component(value: &str, name: &str) -> Result<u32, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("{name} `{}` is not a non-negative integer", value.trim()))
}
