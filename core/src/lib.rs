#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Waypath routing engine.
//!
//! This crate defines the vocabulary that connects the weighted grid, the
//! search systems and the adapters: cell coordinates, lattice [`Node`]s with
//! their blockage semantics, the selectable [`Heuristic`] strategies and the
//! error types every other crate reports through.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Combined weight at or above which a cell is impassable.
pub const BLOCKED_THRESHOLD: u32 = 100;

/// Location of a single lattice cell expressed as column (`x`) and row (`y`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: u32,
    y: u32,
}

impl CellCoord {
    /// Creates a new cell coordinate from a zero-based column and row.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Absolute column and row deltas between two coordinates.
    #[must_use]
    pub fn deltas(self, other: CellCoord) -> (u32, u32) {
        (self.x.abs_diff(other.x), self.y.abs_diff(other.y))
    }

    /// Applies a signed offset, returning `None` when either axis underflows
    /// or overflows.
    #[must_use]
    pub fn offset(self, dx: i32, dy: i32) -> Option<CellCoord> {
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        Some(CellCoord::new(x, y))
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned rectangle expressed in cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    origin: CellCoord,
    size: CellRectSize,
}

impl CellRect {
    /// Constructs a rectangle from an origin cell and size.
    #[must_use]
    pub const fn from_origin_and_size(origin: CellCoord, size: CellRectSize) -> Self {
        Self { origin, size }
    }

    /// Upper-left cell that anchors the rectangle.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Dimensions of the rectangle measured in whole cells.
    #[must_use]
    pub const fn size(&self) -> CellRectSize {
        self.size
    }

    /// Reports whether the rectangle covers the provided cell.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.x() >= self.origin.x()
            && cell.y() >= self.origin.y()
            && cell.x() - self.origin.x() < self.size.width()
            && cell.y() - self.origin.y() < self.size.height()
    }

    /// Iterates every covered cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let origin = self.origin;
        let size = self.size;
        (0..size.height()).flat_map(move |dy| {
            (0..size.width()).filter_map(move |dx| {
                Some(CellCoord::new(
                    origin.x().checked_add(dx)?,
                    origin.y().checked_add(dy)?,
                ))
            })
        })
    }
}

/// Size of a [`CellRect`] measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRectSize {
    width: u32,
    height: u32,
}

impl CellRectSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of the rectangle in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// A single lattice cell: its position and the cost of entering it.
///
/// A node is blocked exactly when its weight reaches [`BLOCKED_THRESHOLD`].
/// Every weight change caches the prior weight so that toggling blockage off
/// restores what was there before it was switched on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    coord: CellCoord,
    weight: u32,
    previous_weight: u32,
}

impl Node {
    /// Creates a node at `coord` whose cached weight equals its weight.
    #[must_use]
    pub const fn new(coord: CellCoord, weight: u32) -> Self {
        Self {
            coord,
            weight,
            previous_weight: weight,
        }
    }

    /// Creates a node with an explicit cached weight, as restored from a
    /// snapshot.
    #[must_use]
    pub const fn with_previous_weight(coord: CellCoord, weight: u32, previous_weight: u32) -> Self {
        Self {
            coord,
            weight,
            previous_weight,
        }
    }

    /// Position of the node within its grid.
    #[must_use]
    pub const fn coord(&self) -> CellCoord {
        self.coord
    }

    /// Zero-based column of the node.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.coord.x()
    }

    /// Zero-based row of the node.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.coord.y()
    }

    /// Cost of entering the node.
    #[must_use]
    pub const fn weight(&self) -> u32 {
        self.weight
    }

    /// Weight cached by the most recent change.
    #[must_use]
    pub const fn previous_weight(&self) -> u32 {
        self.previous_weight
    }

    /// Reports whether the node's own weight makes it impassable.
    #[must_use]
    pub const fn is_blocked(&self) -> bool {
        self.weight >= BLOCKED_THRESHOLD
    }

    /// Overwrites the weight after caching the current one.
    pub fn set_weight(&mut self, weight: u32) {
        self.previous_weight = self.weight;
        self.weight = weight;
    }

    /// Switches blockage on or off by swapping the weight with its cached
    /// value.
    ///
    /// Requests matching the current state are ignored. When the swapped-in
    /// value would not reach the requested state (a node that has never held
    /// a different weight), blocking falls back to [`BLOCKED_THRESHOLD`] and
    /// unblocking falls back to zero.
    pub fn set_blockage(&mut self, blocked: bool) {
        if blocked == self.is_blocked() {
            return;
        }

        std::mem::swap(&mut self.weight, &mut self.previous_weight);
        if blocked && self.weight < BLOCKED_THRESHOLD {
            self.weight = BLOCKED_THRESHOLD;
        } else if !blocked && self.weight >= BLOCKED_THRESHOLD {
            self.weight = 0;
        }
    }
}

/// Strategies estimating the remaining cost between two cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Heuristic {
    /// `|dx| + |dy|`.
    #[default]
    Manhattan,
    /// Chebyshev distance corrected for the extra length of diagonal steps.
    Diagonal,
    /// Straight-line distance.
    Euclidean,
    /// `max(|dx|, |dy|)`.
    MaxComponent,
}

/// Pure estimate over absolute column and row deltas.
pub type Estimate = fn(f64, f64) -> f64;

const STRATEGIES: [(Heuristic, &str, Estimate); 4] = [
    (Heuristic::Manhattan, "manhattan", manhattan),
    (Heuristic::Diagonal, "diagonal", diagonal),
    (Heuristic::Euclidean, "euclidean", euclidean),
    (Heuristic::MaxComponent, "max_component", max_component),
];

fn manhattan(dx: f64, dy: f64) -> f64 {
    dx + dy
}

fn diagonal(dx: f64, dy: f64) -> f64 {
    dx.max(dy) + (std::f64::consts::SQRT_2 - 1.0) * dx.min(dy)
}

fn euclidean(dx: f64, dy: f64) -> f64 {
    dx.hypot(dy)
}

fn max_component(dx: f64, dy: f64) -> f64 {
    dx.max(dy)
}

impl Heuristic {
    /// Every selectable strategy in declaration order.
    pub const ALL: [Heuristic; 4] = [
        Heuristic::Manhattan,
        Heuristic::Diagonal,
        Heuristic::Euclidean,
        Heuristic::MaxComponent,
    ];

    /// Pure function implementing the strategy.
    #[must_use]
    pub fn strategy(self) -> Estimate {
        STRATEGIES[self.table_index()].2
    }

    /// Canonical lowercase name used in configuration files and flags.
    #[must_use]
    pub fn name(self) -> &'static str {
        STRATEGIES[self.table_index()].1
    }

    /// Estimated cost between two cells, before any scaling.
    #[must_use]
    pub fn estimate(self, from: CellCoord, to: CellCoord) -> f64 {
        let (dx, dy) = from.deltas(to);
        (self.strategy())(f64::from(dx), f64::from(dy))
    }

    const fn table_index(self) -> usize {
        match self {
            Self::Manhattan => 0,
            Self::Diagonal => 1,
            Self::Euclidean => 2,
            Self::MaxComponent => 3,
        }
    }
}

impl fmt::Display for Heuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Heuristic {
    type Err = UnknownHeuristic;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        STRATEGIES
            .iter()
            .find(|(_, name, _)| *name == normalized)
            .map(|(heuristic, _, _)| *heuristic)
            .ok_or_else(|| UnknownHeuristic(value.to_owned()))
    }
}

/// Raised when a heuristic name does not match any strategy.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown heuristic `{0}`; expected manhattan, diagonal, euclidean or max_component")]
pub struct UnknownHeuristic(pub String);

/// The two endpoint markers a grid may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Marker {
    /// Where movers enter the lattice.
    Start,
    /// Where movers are heading.
    Goal,
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::Goal => f.write_str("goal"),
        }
    }
}

/// Failures raised while building, accessing or serialising grids.
#[derive(Debug, Error)]
pub enum GridError {
    /// A cell lies outside `[0, columns) x [0, rows)`.
    #[error("cell {cell} lies outside the {columns}x{rows} grid")]
    OutOfBounds {
        /// Offending cell.
        cell: CellCoord,
        /// Width of the grid.
        columns: usize,
        /// Height of the grid.
        rows: usize,
    },
    /// An explicit weight table had rows of differing length.
    #[error("row {row} holds {found} weights but the grid is {expected} columns wide")]
    RaggedRow {
        /// Index of the offending row.
        row: usize,
        /// Width established by the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// Two layers that must share a shape do not.
    #[error("layer is {found_columns}x{found_rows} but terrain is {expected_columns}x{expected_rows}")]
    ShapeMismatch {
        /// Terrain width.
        expected_columns: usize,
        /// Terrain height.
        expected_rows: usize,
        /// Width of the mismatching layer.
        found_columns: usize,
        /// Height of the mismatching layer.
        found_rows: usize,
    },
    /// The grid cannot be serialised without both markers.
    #[error("grid has no {0} marker")]
    MissingMarker(Marker),
    /// The text form of a grid was malformed.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Writing the text form failed.
    #[error("failed to write grid text")]
    Io(#[from] std::io::Error),
}

/// A malformed or truncated serialised grid, tagged with its source line.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    line: usize,
    kind: ParseErrorKind,
}

impl ParseError {
    /// Creates a parse error for the 1-based `line`.
    #[must_use]
    pub const fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }

    /// 1-based line the error was detected on.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// What went wrong.
    #[must_use]
    pub const fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }
}

/// Specific reasons a serialised grid was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// The stream did not open with a `<rows> <cols>` line.
    #[error("expected a `<rows> <cols>` header")]
    MissingHeader,
    /// A token was not a non-negative integer.
    #[error("`{0}` is not a non-negative integer")]
    InvalidNumber(String),
    /// A line held the wrong number of values.
    #[error("expected {expected} values but found {found}")]
    ValueCount {
        /// Values the line should hold.
        expected: usize,
        /// Values actually present.
        found: usize,
    },
    /// The header declared more cells than can be addressed.
    #[error("a {rows}x{columns} grid has more cells than can be addressed")]
    TooLarge {
        /// Rows declared by the header.
        rows: usize,
        /// Columns declared by the header.
        columns: usize,
    },
    /// The stream ended before every declared row was read.
    #[error("expected {expected} weight rows but found {found}")]
    RowCount {
        /// Rows declared by the header.
        expected: usize,
        /// Rows actually read.
        found: usize,
    },
    /// The stream ended before a marker line.
    #[error("stream ended before the {0} marker")]
    MissingMarker(Marker),
    /// A marker named a cell outside the declared grid.
    #[error("{marker} marker {cell} lies outside the grid")]
    MarkerOutOfBounds {
        /// Marker being read.
        marker: Marker,
        /// Cell it named.
        cell: CellCoord,
    },
    /// Non-blank content followed the goal marker.
    #[error("unexpected data after the goal marker")]
    TrailingData,
    /// The underlying reader failed.
    #[error("failed to read input: {0}")]
    Read(String),
}

/// Failures raised by path queries.
#[derive(Debug, Error)]
pub enum PathError {
    /// The open set was exhausted before the destination was reached.
    #[error("no path found from {start} to {goal}")]
    NoPathFound {
        /// Cell the path was meant to begin at.
        start: CellCoord,
        /// Cell the path was meant to end at.
        goal: CellCoord,
    },
    /// No explicit coordinate was supplied and the terrain lacks the marker.
    #[error("no {0} coordinate supplied and the terrain has no {0} marker")]
    MissingEndpoint(Marker),
    /// A grid operation failed.
    #[error(transparent)]
    Grid(#[from] GridError),
}

#[cfg(test)]
mod tests {
    use super::{
        CellCoord, CellRect, CellRectSize, Heuristic, Marker, Node, BLOCKED_THRESHOLD,
    };
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn offset_rejects_underflow() {
        let origin = CellCoord::new(0, 2);
        assert_eq!(origin.offset(-1, 0), None);
        assert_eq!(origin.offset(1, -1), Some(CellCoord::new(1, 1)));
    }

    #[test]
    fn rect_contains_only_covered_cells() {
        let rect =
            CellRect::from_origin_and_size(CellCoord::new(2, 3), CellRectSize::new(2, 2));
        assert!(rect.contains(CellCoord::new(2, 3)));
        assert!(rect.contains(CellCoord::new(3, 4)));
        assert!(!rect.contains(CellCoord::new(4, 4)));
        assert!(!rect.contains(CellCoord::new(1, 3)));
        assert_eq!(rect.cells().count(), 4);
    }

    #[test]
    fn blocked_matches_threshold() {
        let mut node = Node::new(CellCoord::new(0, 0), BLOCKED_THRESHOLD - 1);
        assert!(!node.is_blocked());
        node.set_weight(BLOCKED_THRESHOLD);
        assert!(node.is_blocked());
        assert_eq!(node.previous_weight(), BLOCKED_THRESHOLD - 1);
    }

    #[test]
    fn blockage_toggle_restores_cached_weight() {
        let mut node = Node::new(CellCoord::new(1, 1), 3);
        node.set_weight(BLOCKED_THRESHOLD);
        node.set_blockage(false);
        assert_eq!(node.weight(), 3);
        assert!(!node.is_blocked());

        node.set_blockage(true);
        assert_eq!(node.weight(), BLOCKED_THRESHOLD);
        assert_eq!(node.previous_weight(), 3);
    }

    #[test]
    fn blockage_requests_matching_state_are_ignored() {
        let mut node = Node::new(CellCoord::new(1, 1), 4);
        node.set_weight(7);
        node.set_blockage(false);
        assert_eq!(node.weight(), 7);
        assert_eq!(node.previous_weight(), 4);
    }

    #[test]
    fn fresh_nodes_still_reach_requested_blockage() {
        let mut open = Node::new(CellCoord::new(0, 0), 2);
        open.set_blockage(true);
        assert!(open.is_blocked());
        open.set_blockage(false);
        assert_eq!(open.weight(), 2);

        let mut wall = Node::new(CellCoord::new(0, 0), BLOCKED_THRESHOLD);
        wall.set_blockage(false);
        assert_eq!(wall.weight(), 0);
    }

    #[test]
    fn heuristics_match_their_formulas() {
        let from = CellCoord::new(0, 0);
        let to = CellCoord::new(3, 4);
        assert!((Heuristic::Manhattan.estimate(from, to) - 7.0).abs() < 1e-9);
        assert!((Heuristic::Euclidean.estimate(from, to) - 5.0).abs() < 1e-9);
        assert!((Heuristic::MaxComponent.estimate(from, to) - 4.0).abs() < 1e-9);
        let expected = 4.0 + (std::f64::consts::SQRT_2 - 1.0) * 3.0;
        assert!((Heuristic::Diagonal.estimate(from, to) - expected).abs() < 1e-9);
    }

    #[test]
    fn heuristic_names_parse_back() {
        for heuristic in Heuristic::ALL {
            assert_eq!(heuristic.name().parse::<Heuristic>(), Ok(heuristic));
        }
        assert_eq!("Max-Component".parse::<Heuristic>(), Ok(Heuristic::MaxComponent));
        assert!("octile".parse::<Heuristic>().is_err());
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn node_round_trips_through_bincode() {
        let mut node = Node::new(CellCoord::new(5, 7), 12);
        node.set_weight(BLOCKED_THRESHOLD);
        assert_round_trip(&node);
    }

    #[test]
    fn heuristic_and_marker_round_trip_through_bincode() {
        assert_round_trip(&Heuristic::Diagonal);
        assert_round_trip(&Marker::Goal);
    }
}
