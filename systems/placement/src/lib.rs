#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure placement system deciding whether a structure footprint may be
//! committed without cutting any mover off from the goal.

use std::fmt;

use waypath_core::{CellCoord, CellRect, GridError};
use waypath_grid::{CostLayers, Grid};
use waypath_system_pathing::{PathEngine, PathingConfig};

/// How a class of movers traverses the lattice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MovementClass {
    /// Movers that walk the terrain and are stopped by walls.
    Ground,
    /// Movers with their own, usually open, terrain.
    Flying,
}

impl fmt::Display for MovementClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ground => f.write_str("ground"),
            Self::Flying => f.write_str("flying"),
        }
    }
}

/// Cost layers a movement class routes over.
#[derive(Clone, Debug)]
pub struct Route {
    class: MovementClass,
    layers: CostLayers,
}

impl Route {
    /// Binds `layers` to `class`.
    #[must_use]
    pub const fn new(class: MovementClass, layers: CostLayers) -> Self {
        Self { class, layers }
    }

    /// Movement class served by the route.
    #[must_use]
    pub const fn class(&self) -> MovementClass {
        self.class
    }

    /// Cost layers of the route.
    #[must_use]
    pub const fn layers(&self) -> &CostLayers {
        &self.layers
    }

    /// Mutable access to the cost layers.
    pub fn layers_mut(&mut self) -> &mut CostLayers {
        &mut self.layers
    }
}

/// An agent currently standing on the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mover {
    /// How the agent moves.
    pub class: MovementClass,
    /// Cell the agent occupies.
    pub cell: CellCoord,
}

impl Mover {
    /// Creates a mover descriptor.
    #[must_use]
    pub const fn new(class: MovementClass, cell: CellCoord) -> Self {
        Self { class, cell }
    }
}

/// Reason a footprint may not be committed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlacementRejection {
    /// The route's filter or influence layer no longer matches its terrain.
    MismatchedLayers(MovementClass),
    /// Part of the footprint lies outside a route's grid.
    OutOfBounds,
    /// The footprint covers a start or goal marker.
    CoversEndpoint(CellCoord),
    /// A covered cell already carries a structure.
    Occupied(CellCoord),
    /// The start marker of the class's route could no longer reach its goal.
    SealsRoute(MovementClass),
    /// The mover standing on this cell could no longer reach its goal.
    StrandsMover(CellCoord),
}

impl fmt::Display for PlacementRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MismatchedLayers(class) => {
                write!(f, "{class} route layers do not share the terrain's shape")
            }
            Self::OutOfBounds => f.write_str("footprint leaves the grid"),
            Self::CoversEndpoint(cell) => write!(f, "footprint covers the endpoint at {cell}"),
            Self::Occupied(cell) => write!(f, "cell {cell} is already occupied"),
            Self::SealsRoute(class) => write!(f, "{class} movers could no longer reach the goal"),
            Self::StrandsMover(cell) => write!(f, "the mover at {cell} would be stranded"),
        }
    }
}

/// Declarative placement preview describing a potential construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacementPreview {
    /// Region of cells the structure would occupy.
    pub region: CellRect,
    /// Indicates whether the preview represents a valid placement.
    pub placeable: bool,
    /// First reason the placement was refused, if any.
    pub rejection: Option<PlacementRejection>,
}

impl PlacementPreview {
    fn accepted(region: CellRect) -> Self {
        Self {
            region,
            placeable: true,
            rejection: None,
        }
    }

    fn rejected(region: CellRect, rejection: PlacementRejection) -> Self {
        log::debug!(
            "placement at {} rejected: {rejection}",
            region.origin()
        );
        Self {
            region,
            placeable: false,
            rejection: Some(rejection),
        }
    }
}

/// Placement system validating and stamping structure footprints.
#[derive(Clone, Debug, Default)]
pub struct PlacementPlanner {
    config: PathingConfig,
}

impl PlacementPlanner {
    /// Creates a planner whose reachability checks use `config`.
    #[must_use]
    pub const fn new(config: PathingConfig) -> Self {
        Self { config }
    }

    /// Search settings used for validation.
    #[must_use]
    pub const fn config(&self) -> &PathingConfig {
        &self.config
    }

    /// Evaluates `footprint` against every route and mover without mutating
    /// anything.
    ///
    /// Checks run in a fixed order and the first failure is reported: layer
    /// shapes, bounds, endpoint coverage, occupancy, per-route reachability
    /// and finally each mover's own route to the goal. A mover whose class has
    /// no route is ignored.
    #[must_use]
    pub fn preview(&self, routes: &[Route], footprint: CellRect, movers: &[Mover]) -> PlacementPreview {
        for route in routes {
            if let Err(error) = route.layers.ensure_consistent() {
                log::warn!("cannot evaluate {} route: {error}", route.class);
                return PlacementPreview::rejected(
                    footprint,
                    PlacementRejection::MismatchedLayers(route.class),
                );
            }
        }

        if routes
            .iter()
            .any(|route| !covers_in_bounds(route.layers.terrain(), footprint))
        {
            return PlacementPreview::rejected(footprint, PlacementRejection::OutOfBounds);
        }

        for route in routes {
            let terrain = route.layers.terrain();
            if let Some(cell) = [terrain.start(), terrain.goal()]
                .into_iter()
                .flatten()
                .find(|cell| footprint.contains(*cell))
            {
                return PlacementPreview::rejected(
                    footprint,
                    PlacementRejection::CoversEndpoint(cell),
                );
            }
        }

        for route in routes {
            let filter = route.layers.filter();
            if let Some(cell) = footprint
                .cells()
                .find(|cell| filter.is_blocked(*cell).unwrap_or(true))
            {
                return PlacementPreview::rejected(footprint, PlacementRejection::Occupied(cell));
            }
        }

        let mut engines = Vec::with_capacity(routes.len());
        for route in routes {
            let engine = match self.stamped_engine(route, footprint) {
                Ok(engine) => engine,
                Err(error) => {
                    log::warn!("could not evaluate {} route: {error}", route.class);
                    return PlacementPreview::rejected(
                        footprint,
                        PlacementRejection::MismatchedLayers(route.class),
                    );
                }
            };
            if !engine.exists_path() {
                return PlacementPreview::rejected(
                    footprint,
                    PlacementRejection::SealsRoute(route.class),
                );
            }
            engines.push((route.class, engine));
        }

        for mover in movers {
            let Some((_, engine)) = engines.iter_mut().find(|(class, _)| *class == mover.class)
            else {
                log::trace!("no {} route for mover at {}", mover.class, mover.cell);
                continue;
            };
            let request = self.config.request().starting_at(mover.cell);
            if let Err(error) = engine.find_path(request) {
                log::trace!("mover at {} failed to route: {error}", mover.cell);
                return PlacementPreview::rejected(
                    footprint,
                    PlacementRejection::StrandsMover(mover.cell),
                );
            }
        }

        PlacementPreview::accepted(footprint)
    }

    /// Blocks `footprint` in the filter of every route.
    ///
    /// Each covered filter node caches its current weight, so a later
    /// [`PlacementPlanner::remove`] restores it. Committing over cells that
    /// are already blocked leaves them and their cached weight untouched.
    /// Nothing is written unless the footprint fits every route's grid.
    pub fn commit(&self, routes: &mut [Route], footprint: CellRect) -> Result<(), GridError> {
        self.write_footprint(routes, footprint, true)
    }

    /// Unblocks `footprint` in the filter of every route, restoring the
    /// weights cached when it was committed.
    pub fn remove(&self, routes: &mut [Route], footprint: CellRect) -> Result<(), GridError> {
        self.write_footprint(routes, footprint, false)
    }

    fn write_footprint(
        &self,
        routes: &mut [Route],
        footprint: CellRect,
        blocked: bool,
    ) -> Result<(), GridError> {
        for route in routes.iter() {
            ensure_in_bounds(route.layers.filter(), footprint)?;
        }
        for route in routes.iter_mut() {
            let filter = route.layers.filter_mut();
            for cell in footprint.cells() {
                filter.set_blockage(cell, blocked)?;
            }
        }
        log::debug!(
            "set blockage {blocked} over {}x{} footprint at {}",
            footprint.size().width(),
            footprint.size().height(),
            footprint.origin()
        );
        Ok(())
    }

    fn stamped_engine(&self, route: &Route, footprint: CellRect) -> Result<PathEngine, GridError> {
        let mut filter = route.layers.filter().clone();
        for cell in footprint.cells() {
            filter.set_blockage(cell, true)?;
        }
        let engine = PathEngine::new(
            route.layers.terrain().clone(),
            filter,
            route.layers.influence().clone(),
            self.config.allow_diagonal,
            self.config.heuristic,
        )?;
        Ok(engine.with_influence_multiplier(self.config.influence_multiplier))
    }
}

fn covers_in_bounds(grid: &Grid, footprint: CellRect) -> bool {
    ensure_in_bounds(grid, footprint).is_ok()
}

fn ensure_in_bounds(grid: &Grid, footprint: CellRect) -> Result<(), GridError> {
    let size = footprint.size();
    let origin = footprint.origin();
    let far = origin
        .x()
        .checked_add(size.width())
        .zip(origin.y().checked_add(size.height()));
    match far {
        Some((x, y)) if x as usize <= grid.columns() && y as usize <= grid.rows() => Ok(()),
        _ => Err(GridError::OutOfBounds {
            cell: origin,
            columns: grid.columns(),
            rows: grid.rows(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypath_core::CellRectSize;

    fn rect(x: u32, y: u32, width: u32, height: u32) -> CellRect {
        CellRect::from_origin_and_size(CellCoord::new(x, y), CellRectSize::new(width, height))
    }

    #[test]
    fn footprint_touching_the_far_edge_is_in_bounds() {
        let grid = Grid::filled(4, 5, 1);
        assert!(covers_in_bounds(&grid, rect(3, 2, 2, 2)));
        assert!(!covers_in_bounds(&grid, rect(4, 2, 2, 2)));
        assert!(!covers_in_bounds(&grid, rect(0, 3, 1, 2)));
    }

    #[test]
    fn overflowing_footprint_is_out_of_bounds() {
        let grid = Grid::filled(4, 4, 1);
        assert!(!covers_in_bounds(&grid, rect(u32::MAX, 0, 2, 1)));
    }

    #[test]
    fn rejection_messages_name_the_cell() {
        let message = PlacementRejection::StrandsMover(CellCoord::new(3, 1)).to_string();
        assert!(message.contains("(3, 1)"));
        assert_eq!(
            PlacementRejection::SealsRoute(MovementClass::Flying).to_string(),
            "flying movers could no longer reach the goal"
        );
        assert_eq!(
            PlacementRejection::MismatchedLayers(MovementClass::Ground).to_string(),
            "ground route layers do not share the terrain's shape"
        );
    }
}
