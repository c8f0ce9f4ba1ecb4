//! The three-layer cost model consumed by path searches.

use waypath_core::GridError;

use crate::Grid;

/// Terrain grid together with its same-shaped filter and influence overlays.
///
/// The filter is summed with terrain weight to decide blockage; the influence
/// layer only feeds the deterrent cost term and never blocks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CostLayers {
    terrain: Grid,
    filter: Grid,
    influence: Grid,
}

impl CostLayers {
    /// Bundles three layers, failing when their dimensions differ.
    pub fn new(terrain: Grid, filter: Grid, influence: Grid) -> Result<Self, GridError> {
        let layers = Self {
            terrain,
            filter,
            influence,
        };
        layers.ensure_consistent()?;
        Ok(layers)
    }

    /// Bundles a terrain grid with empty filter and influence layers.
    #[must_use]
    pub fn open(terrain: Grid) -> Self {
        let (rows, columns) = terrain.dimensions();
        Self {
            filter: Grid::filled(rows, columns, 0),
            influence: Grid::filled(rows, columns, 0),
            terrain,
        }
    }

    /// Permanent traversal costs and the start/goal markers.
    #[must_use]
    pub fn terrain(&self) -> &Grid {
        &self.terrain
    }

    /// Transient obstacle overlay.
    #[must_use]
    pub fn filter(&self) -> &Grid {
        &self.filter
    }

    /// Deterrent scores.
    #[must_use]
    pub fn influence(&self) -> &Grid {
        &self.influence
    }

    /// Mutable terrain. Consumers revalidate shapes when building engines.
    pub fn terrain_mut(&mut self) -> &mut Grid {
        &mut self.terrain
    }

    /// Mutable filter overlay.
    pub fn filter_mut(&mut self) -> &mut Grid {
        &mut self.filter
    }

    /// Mutable influence overlay.
    pub fn influence_mut(&mut self) -> &mut Grid {
        &mut self.influence
    }

    /// Checks that the overlays still share the terrain's shape, which the
    /// mutable accessors cannot guarantee.
    pub fn ensure_consistent(&self) -> Result<(), GridError> {
        self.terrain.ensure_same_shape(&self.filter)?;
        self.terrain.ensure_same_shape(&self.influence)
    }

    /// Splits the bundle into `(terrain, filter, influence)`.
    #[must_use]
    pub fn into_parts(self) -> (Grid, Grid, Grid) {
        (self.terrain, self.filter, self.influence)
    }
}
