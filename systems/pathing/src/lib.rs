#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Path queries over the three-layer cost model.
//!
//! A [`PathEngine`] owns private copies of the terrain, filter and influence
//! grids captured when it is built. It answers two questions: whether the
//! terrain's start marker can reach its goal marker at all
//! ([`PathEngine::exists_path`]), and which cell sequence is cheapest between
//! two cells ([`PathEngine::find_path`]). Every query is a full recomputation;
//! build a fresh engine to pick up later changes to the live grids.

mod config;
mod search;

use waypath_core::{CellCoord, GridError, Heuristic, Marker, Node, PathError};
use waypath_grid::{CostLayers, Grid};

pub use config::PathingConfig;

use search::{Layers, SearchParams};

/// Search orchestrator holding owned snapshots of the cost layers.
#[derive(Clone, Debug)]
pub struct PathEngine {
    terrain: Grid,
    filter: Grid,
    influence: Grid,
    allow_diagonal: bool,
    heuristic: Heuristic,
    influence_multiplier: f64,
}

impl PathEngine {
    /// Builds an engine from owned layers, failing when their shapes differ.
    pub fn new(
        terrain: Grid,
        filter: Grid,
        influence: Grid,
        allow_diagonal: bool,
        heuristic: Heuristic,
    ) -> Result<Self, GridError> {
        terrain.ensure_same_shape(&filter)?;
        terrain.ensure_same_shape(&influence)?;
        Ok(Self {
            terrain,
            filter,
            influence,
            allow_diagonal,
            heuristic,
            influence_multiplier: 1.0,
        })
    }

    /// Builds an engine from copies of `layers` using `config`.
    pub fn from_layers(layers: &CostLayers, config: &PathingConfig) -> Result<Self, GridError> {
        let engine = Self::new(
            layers.terrain().clone(),
            layers.filter().clone(),
            layers.influence().clone(),
            config.allow_diagonal,
            config.heuristic,
        )?;
        Ok(engine.with_influence_multiplier(config.influence_multiplier))
    }

    /// Overrides the scale applied to influence weights.
    #[must_use]
    pub fn with_influence_multiplier(mut self, multiplier: f64) -> Self {
        self.influence_multiplier = multiplier;
        self
    }

    /// Terrain snapshot held by the engine.
    #[must_use]
    pub fn terrain(&self) -> &Grid {
        &self.terrain
    }

    /// Filter snapshot held by the engine.
    #[must_use]
    pub fn filter(&self) -> &Grid {
        &self.filter
    }

    /// Influence snapshot held by the engine.
    #[must_use]
    pub fn influence(&self) -> &Grid {
        &self.influence
    }

    /// Whether diagonal steps are allowed.
    #[must_use]
    pub const fn allow_diagonal(&self) -> bool {
        self.allow_diagonal
    }

    /// Heuristic strategy used by [`PathEngine::find_path`].
    #[must_use]
    pub const fn heuristic(&self) -> Heuristic {
        self.heuristic
    }

    /// Reports whether the terrain's start marker can reach its goal marker.
    ///
    /// Costs are ignored; only blockage matters. A terrain without both
    /// markers has no path.
    #[must_use]
    pub fn exists_path(&self) -> bool {
        let (Some(start), Some(goal)) = (self.terrain.start(), self.terrain.goal()) else {
            log::warn!("reachability queried on a terrain without start and goal markers");
            return false;
        };

        match search::reachable(self.layers(), self.allow_diagonal, start, goal) {
            Ok(found) => {
                log::debug!("reachability {start} -> {goal}: {found}");
                found
            }
            Err(error) => {
                log::warn!("reachability query failed: {error}");
                false
            }
        }
    }

    /// Finds the cheapest path for `request`.
    ///
    /// Unset endpoints fall back to the terrain markers. When the request
    /// names a start other than the start marker, that cell is unblocked on
    /// the terrain and filter snapshots for the duration of the call and
    /// restored afterwards, so a search may begin inside an occupied cell.
    pub fn find_path(&mut self, request: PathRequest) -> Result<Path, PathError> {
        let start = request
            .start()
            .or(self.terrain.start())
            .ok_or(PathError::MissingEndpoint(Marker::Start))?;
        let goal = request
            .goal()
            .or(self.terrain.goal())
            .ok_or(PathError::MissingEndpoint(Marker::Goal))?;
        let _ = self.terrain.node(goal)?;

        let saved = if request.start().is_some() && self.terrain.start() != Some(start) {
            let saved = (*self.terrain.node(start)?, *self.filter.node(start)?);
            self.terrain.set_blockage(start, false)?;
            self.filter.set_blockage(start, false)?;
            log::debug!("temporarily unblocked override start {start}");
            Some(saved)
        } else {
            None
        };

        let params = SearchParams {
            allow_diagonal: self.allow_diagonal,
            heuristic: self.heuristic,
            h_modifier: request.h_modifier(),
            influence_multiplier: self.influence_multiplier,
        };
        let result = search::reversed_astar(self.layers(), params, start, goal);

        if let Some((terrain_node, filter_node)) = saved {
            *self.terrain.node_mut(start)? = terrain_node;
            *self.filter.node_mut(start)? = filter_node;
        }

        result
    }

    fn layers(&self) -> Layers<'_> {
        Layers {
            terrain: &self.terrain,
            filter: &self.filter,
            influence: &self.influence,
        }
    }
}

/// Parameters of a single [`PathEngine::find_path`] call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathRequest {
    h_modifier: f64,
    start: Option<CellCoord>,
    goal: Option<CellCoord>,
}

impl Default for PathRequest {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl PathRequest {
    /// Request between the terrain markers with the given heuristic scale.
    #[must_use]
    pub const fn new(h_modifier: f64) -> Self {
        Self {
            h_modifier,
            start: None,
            goal: None,
        }
    }

    /// Begins the path at `cell` instead of the start marker.
    #[must_use]
    pub fn starting_at(mut self, cell: CellCoord) -> Self {
        self.start = Some(cell);
        self
    }

    /// Ends the path at `cell` instead of the goal marker.
    #[must_use]
    pub fn ending_at(mut self, cell: CellCoord) -> Self {
        self.goal = Some(cell);
        self
    }

    /// Scale applied to the heuristic term. Values above one trade optimality
    /// for fewer expansions; zero degenerates to a pure cost search.
    #[must_use]
    pub const fn h_modifier(&self) -> f64 {
        self.h_modifier
    }

    /// Explicit start, if any.
    #[must_use]
    pub const fn start(&self) -> Option<CellCoord> {
        self.start
    }

    /// Explicit goal, if any.
    #[must_use]
    pub const fn goal(&self) -> Option<CellCoord> {
        self.goal
    }
}

/// Ordered node snapshots from start to goal.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    nodes: Vec<Node>,
    cost: u64,
    deterrent: f64,
}

impl Path {
    pub(crate) fn new(nodes: Vec<Node>, cost: u64, deterrent: f64) -> Self {
        Self {
            nodes,
            cost,
            deterrent,
        }
    }

    /// Number of nodes, endpoints included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false for paths produced by a search.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node snapshots in travel order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Start node.
    #[must_use]
    pub fn first(&self) -> Option<&Node> {
        self.nodes.first()
    }

    /// Goal node.
    #[must_use]
    pub fn last(&self) -> Option<&Node> {
        self.nodes.last()
    }

    /// Cells in travel order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.nodes.iter().map(Node::coord)
    }

    /// Accumulated terrain cost `g` of the search, excluding deterrent and
    /// heuristic terms.
    #[must_use]
    pub const fn cost(&self) -> u64 {
        self.cost
    }

    /// Scaled influence summed over the same nodes as [`Path::cost`].
    #[must_use]
    pub const fn deterrent(&self) -> f64 {
        self.deterrent
    }
}

impl IntoIterator for Path {
    type Item = Node;
    type IntoIter = std::vec::IntoIter<Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}
