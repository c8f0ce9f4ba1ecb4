#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Weighted lattice state for Waypath.
//!
//! A [`Grid`] is a row-major matrix of [`Node`]s with optional start and goal
//! markers. Markers are stored as coordinates resolved against whichever grid
//! is in scope, so grids can be cloned freely without aliasing. The
//! [`CostLayers`] bundle pairs a terrain grid with its same-shaped filter and
//! influence overlays.

mod layers;
mod text;

use serde::{Deserialize, Serialize};
use waypath_core::{CellCoord, GridError, Marker, Node, BLOCKED_THRESHOLD};

pub use layers::CostLayers;

const ORTHOGONAL_AND_DIAGONAL: [(i32, i32); 8] = [
    (0, -1),
    (-1, 0),
    (1, 0),
    (0, 1),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (1, 1),
];

/// Rectangular matrix of weighted nodes with optional endpoint markers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GridSnapshot", into = "GridSnapshot")]
pub struct Grid {
    rows: usize,
    columns: usize,
    nodes: Vec<Node>,
    start: Option<CellCoord>,
    goal: Option<CellCoord>,
}

impl Grid {
    /// Creates an empty grid with no cells and no markers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a grid of uniform weight.
    #[must_use]
    pub fn filled(rows: usize, columns: usize, weight: u32) -> Self {
        let mut grid = Self::new();
        grid.clear_with_dimensions(rows, columns, weight);
        grid
    }

    /// Creates a grid from an explicit table of rows.
    pub fn from_weights(table: &[Vec<u32>]) -> Result<Self, GridError> {
        let columns = table.first().map_or(0, Vec::len);
        let mut nodes = Vec::with_capacity(table.len().saturating_mul(columns));

        for (y, row) in table.iter().enumerate() {
            if row.len() != columns {
                return Err(GridError::RaggedRow {
                    row: y,
                    expected: columns,
                    found: row.len(),
                });
            }
            nodes.extend(
                row.iter()
                    .enumerate()
                    .map(|(x, &weight)| Node::new(coord_at(x, y), weight)),
            );
        }

        Ok(Self {
            rows: table.len(),
            columns,
            nodes,
            start: None,
            goal: None,
        })
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// `(rows, columns)` pair used for shape comparisons.
    #[must_use]
    pub const fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    /// Total number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Reports whether the grid has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        self.index(cell).is_some()
    }

    /// Row-major offset of a cell, `y * columns + x`.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        let x = usize::try_from(cell.x()).ok()?;
        let y = usize::try_from(cell.y()).ok()?;
        if x >= self.columns || y >= self.rows {
            return None;
        }
        y.checked_mul(self.columns)?.checked_add(x)
    }

    /// Node stored at the cell.
    pub fn node(&self, cell: CellCoord) -> Result<&Node, GridError> {
        let index = self.checked_index(cell)?;
        Ok(&self.nodes[index])
    }

    /// Mutable node stored at the cell.
    pub fn node_mut(&mut self, cell: CellCoord) -> Result<&mut Node, GridError> {
        let index = self.checked_index(cell)?;
        Ok(&mut self.nodes[index])
    }

    /// Weight stored at the cell.
    pub fn weight(&self, cell: CellCoord) -> Result<u32, GridError> {
        self.node(cell).map(Node::weight)
    }

    /// Overwrites the weight of a cell, caching the previous value.
    pub fn set_weight(&mut self, cell: CellCoord, weight: u32) -> Result<(), GridError> {
        self.node_mut(cell)?.set_weight(weight);
        Ok(())
    }

    /// Raises the weight of a cell, saturating at `u32::MAX`.
    ///
    /// Used to accumulate deterrent scores on an influence layer.
    pub fn add_weight(&mut self, cell: CellCoord, delta: u32) -> Result<(), GridError> {
        let node = self.node_mut(cell)?;
        let raised = node.weight().saturating_add(delta);
        node.set_weight(raised);
        Ok(())
    }

    /// Toggles blockage of a cell. See [`Node::set_blockage`].
    pub fn set_blockage(&mut self, cell: CellCoord, blocked: bool) -> Result<(), GridError> {
        self.node_mut(cell)?.set_blockage(blocked);
        Ok(())
    }

    /// Reports whether the cell's own weight blocks it.
    pub fn is_blocked(&self, cell: CellCoord) -> Result<bool, GridError> {
        self.node(cell).map(Node::is_blocked)
    }

    /// Reports whether the cell stays below the threshold once the filter
    /// weight is added to its own.
    pub fn is_passable_with(&self, cell: CellCoord, filter: &Grid) -> Result<bool, GridError> {
        let node = self.node(cell)?;
        Ok(combined_weight(node, filter) < BLOCKED_THRESHOLD)
    }

    /// Start marker, if set.
    #[must_use]
    pub const fn start(&self) -> Option<CellCoord> {
        self.start
    }

    /// Goal marker, if set.
    #[must_use]
    pub const fn goal(&self) -> Option<CellCoord> {
        self.goal
    }

    /// Coordinate held by the requested marker.
    #[must_use]
    pub const fn marker(&self, marker: Marker) -> Option<CellCoord> {
        match marker {
            Marker::Start => self.start,
            Marker::Goal => self.goal,
        }
    }

    /// Reports whether the cell is the start or goal marker.
    #[must_use]
    pub fn is_marker(&self, cell: CellCoord) -> bool {
        self.start == Some(cell) || self.goal == Some(cell)
    }

    /// Binds the start marker to a cell.
    pub fn set_start(&mut self, cell: CellCoord) -> Result<(), GridError> {
        let _ = self.checked_index(cell)?;
        self.start = Some(cell);
        Ok(())
    }

    /// Binds the goal marker to a cell.
    pub fn set_goal(&mut self, cell: CellCoord) -> Result<(), GridError> {
        let _ = self.checked_index(cell)?;
        self.goal = Some(cell);
        Ok(())
    }

    /// Replaces every cell with `weight`, keeping the dimensions, and drops
    /// both markers.
    pub fn clear(&mut self, weight: u32) {
        self.clear_with_dimensions(self.rows, self.columns, weight);
    }

    /// Rebuilds the grid with new dimensions and a uniform weight, dropping
    /// both markers.
    pub fn clear_with_dimensions(&mut self, rows: usize, columns: usize, weight: u32) {
        self.rows = rows;
        self.columns = columns;
        self.nodes.clear();
        for y in 0..rows {
            for x in 0..columns {
                self.nodes.push(Node::new(coord_at(x, y), weight));
            }
        }
        self.start = None;
        self.goal = None;
    }

    /// Iterator over every node in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Nodes of a single row.
    #[must_use]
    pub fn row(&self, y: usize) -> Option<&[Node]> {
        if y >= self.rows {
            return None;
        }
        let offset = y * self.columns;
        self.nodes.get(offset..offset + self.columns)
    }

    /// Fails with [`GridError::ShapeMismatch`] unless `other` has this grid's
    /// dimensions.
    pub fn ensure_same_shape(&self, other: &Grid) -> Result<(), GridError> {
        if self.dimensions() == other.dimensions() {
            return Ok(());
        }
        Err(GridError::ShapeMismatch {
            expected_columns: self.columns,
            expected_rows: self.rows,
            found_columns: other.columns,
            found_rows: other.rows,
        })
    }

    /// Cells adjacent to `cell` that a mover may enter.
    ///
    /// Candidates are the four orthogonal offsets, followed by the four
    /// diagonal ones when `include_diagonals` is set. A candidate is kept when
    /// its own weight plus the `filter` weight stays below
    /// [`BLOCKED_THRESHOLD`], or when it is this grid's start or goal marker.
    /// The filter must share this grid's dimensions.
    pub fn neighbors<'a>(
        &'a self,
        cell: CellCoord,
        filter: &Grid,
        include_diagonals: bool,
    ) -> Result<Neighbors<'a>, GridError> {
        let _ = self.checked_index(cell)?;
        debug_assert_eq!(
            self.dimensions(),
            filter.dimensions(),
            "filter layer must share the terrain's dimensions"
        );

        let offsets = if include_diagonals {
            &ORTHOGONAL_AND_DIAGONAL[..]
        } else {
            &ORTHOGONAL_AND_DIAGONAL[..4]
        };

        let mut neighbors = Neighbors::default();
        for &(dx, dy) in offsets {
            let Some(candidate) = cell.offset(dx, dy) else {
                continue;
            };
            let Some(index) = self.index(candidate) else {
                continue;
            };

            let node = &self.nodes[index];
            if combined_weight(node, filter) < BLOCKED_THRESHOLD || self.is_marker(candidate) {
                neighbors.push(node);
            }
        }

        Ok(neighbors)
    }

    fn checked_index(&self, cell: CellCoord) -> Result<usize, GridError> {
        self.index(cell).ok_or(GridError::OutOfBounds {
            cell,
            columns: self.columns,
            rows: self.rows,
        })
    }
}

/// Fixed-capacity iterator over the neighbors of a cell.
#[derive(Clone, Debug, Default)]
pub struct Neighbors<'a> {
    buffer: [Option<&'a Node>; 8],
    len: usize,
    cursor: usize,
}

impl<'a> Neighbors<'a> {
    fn push(&mut self, node: &'a Node) {
        if self.len < self.buffer.len() {
            self.buffer[self.len] = Some(node);
            self.len += 1;
        }
    }
}

impl<'a> Iterator for Neighbors<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len {
            return None;
        }

        let value = self.buffer[self.cursor];
        self.cursor += 1;
        value
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.cursor;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Neighbors<'_> {}

fn combined_weight(node: &Node, filter: &Grid) -> u32 {
    let overlay = filter.node(node.coord()).map_or(0, Node::weight);
    node.weight().saturating_add(overlay)
}

fn coord_at(x: usize, y: usize) -> CellCoord {
    let x = u32::try_from(x).unwrap_or(u32::MAX);
    let y = u32::try_from(y).unwrap_or(u32::MAX);
    CellCoord::new(x, y)
}

/// Flat serde form of a grid, validated on the way back in.
#[derive(Serialize, Deserialize)]
struct GridSnapshot {
    rows: usize,
    columns: usize,
    weights: Vec<u32>,
    previous_weights: Vec<u32>,
    start: Option<CellCoord>,
    goal: Option<CellCoord>,
}

impl From<Grid> for GridSnapshot {
    fn from(grid: Grid) -> Self {
        Self {
            rows: grid.rows,
            columns: grid.columns,
            weights: grid.nodes.iter().map(Node::weight).collect(),
            previous_weights: grid.nodes.iter().map(Node::previous_weight).collect(),
            start: grid.start,
            goal: grid.goal,
        }
    }
}

impl TryFrom<GridSnapshot> for Grid {
    type Error = GridError;

    fn try_from(snapshot: GridSnapshot) -> Result<Self, Self::Error> {
        let mut grid = snapshot_layer(&snapshot.weights, snapshot.rows, snapshot.columns)?;
        let cached = snapshot_layer(&snapshot.previous_weights, snapshot.rows, snapshot.columns)?;
        for (node, previous) in grid.nodes.iter_mut().zip(&cached.nodes) {
            *node = Node::with_previous_weight(node.coord(), node.weight(), previous.weight());
        }

        if let Some(start) = snapshot.start {
            grid.set_start(start)?;
        }
        if let Some(goal) = snapshot.goal {
            grid.set_goal(goal)?;
        }
        Ok(grid)
    }
}

/// Rebuilds one row-major weight vector into a grid of the given shape.
fn snapshot_layer(weights: &[u32], rows: usize, columns: usize) -> Result<Grid, GridError> {
    let table: Vec<Vec<u32>> = if columns == 0 {
        vec![Vec::new(); rows]
    } else {
        weights.chunks(columns).map(<[u32]>::to_vec).collect()
    };

    if table.len() != rows {
        return Err(GridError::ShapeMismatch {
            expected_columns: columns,
            expected_rows: rows,
            found_columns: columns,
            found_rows: table.len(),
        });
    }

    let mut grid = Grid::from_weights(&table)?;
    grid.columns = columns;
    Ok(grid)
}
