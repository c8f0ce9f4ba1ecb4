//! Breadth-first reachability and the reversed A* search.

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap, VecDeque},
};

use waypath_core::{CellCoord, GridError, Heuristic, Node, PathError};
use waypath_grid::Grid;

use crate::Path;

/// Borrowed view of the three cost layers for the duration of one query.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Layers<'a> {
    pub(crate) terrain: &'a Grid,
    pub(crate) filter: &'a Grid,
    pub(crate) influence: &'a Grid,
}

/// Scalars steering the shortest-path search.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SearchParams {
    pub(crate) allow_diagonal: bool,
    pub(crate) heuristic: Heuristic,
    pub(crate) h_modifier: f64,
    pub(crate) influence_multiplier: f64,
}

/// Unweighted breadth-first search from `start` that succeeds the moment
/// `goal` is dequeued.
pub(crate) fn reachable(
    layers: Layers<'_>,
    allow_diagonal: bool,
    start: CellCoord,
    goal: CellCoord,
) -> Result<bool, GridError> {
    let terrain = layers.terrain;
    let mut visited = vec![false; terrain.len()];
    let mut queue = VecDeque::new();

    let Some(start_index) = terrain.index(start) else {
        return Err(out_of_bounds(terrain, start));
    };
    visited[start_index] = true;
    queue.push_back(start);

    while let Some(cell) = queue.pop_front() {
        if cell == goal {
            return Ok(true);
        }

        for neighbor in terrain.neighbors(cell, layers.filter, allow_diagonal)? {
            let Some(index) = terrain.index(neighbor.coord()) else {
                continue;
            };
            if visited[index] {
                continue;
            }
            visited[index] = true;
            queue.push_back(neighbor.coord());
        }
    }

    Ok(false)
}

/// A* directed from `goal` toward `start`, so the parent chain of the start
/// node already reads start-first.
pub(crate) fn reversed_astar(
    layers: Layers<'_>,
    params: SearchParams,
    start: CellCoord,
    goal: CellCoord,
) -> Result<Path, PathError> {
    let terrain = layers.terrain;
    let mut search = OpenSet::new(terrain.len());

    let origin = *terrain.node(goal)?;
    let seed = SearchNode {
        node: origin,
        parent: None,
        g: 0,
        h: estimate(params, goal, start),
        j: 0.0,
    };
    search.offer(terrain, seed);

    let mut expanded = 0usize;
    while let Some(slot) = search.pop_unresolved(terrain) {
        expanded += 1;
        let current = search.arena[slot];
        let cell = current.node.coord();

        if cell == start {
            log::debug!("path {start} -> {goal} resolved after expanding {expanded} cells");
            return Ok(search.reconstruct(slot));
        }

        for neighbor in terrain.neighbors(cell, layers.filter, params.allow_diagonal)? {
            if search.is_resolved(terrain, neighbor.coord()) {
                continue;
            }

            let candidate = SearchNode {
                node: *neighbor,
                parent: Some(slot),
                g: current.g + u64::from(neighbor.weight()),
                h: estimate(params, neighbor.coord(), start),
                j: current.j + deterrent(layers, params, neighbor.coord()),
            };
            search.offer(terrain, candidate);
        }
    }

    log::debug!("open set exhausted after expanding {expanded} cells; {start} cannot reach {goal}");
    Err(PathError::NoPathFound { start, goal })
}

fn estimate(params: SearchParams, from: CellCoord, to: CellCoord) -> f64 {
    params.heuristic.estimate(from, to) * params.h_modifier
}

fn deterrent(layers: Layers<'_>, params: SearchParams, cell: CellCoord) -> f64 {
    let score = layers.influence.node(cell).map_or(0, Node::weight);
    f64::from(score) * params.influence_multiplier
}

fn out_of_bounds(grid: &Grid, cell: CellCoord) -> GridError {
    GridError::OutOfBounds {
        cell,
        columns: grid.columns(),
        rows: grid.rows(),
    }
}

/// Node wrapper living for a single search: a snapshot of the lattice node,
/// its parent slot in the arena and the cost terms.
#[derive(Clone, Copy, Debug)]
struct SearchNode {
    node: Node,
    parent: Option<usize>,
    /// Cumulative terrain cost from the search origin.
    g: u64,
    /// Scaled heuristic estimate to the search target.
    h: f64,
    /// Cumulative influence deterrent over the same nodes as `g`.
    j: f64,
}

impl SearchNode {
    fn f(&self) -> f64 {
        self.g as f64 + self.h + self.j
    }
}

/// Heap entry pointing at an arena slot, ordered so the smallest `f` pops
/// first and ties pop in insertion order.
#[derive(Clone, Copy, Debug)]
struct OpenEntry {
    f: f64,
    sequence: u64,
    slot: usize,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Arena of search nodes plus the heap and best-known `f` per cell index.
///
/// Cells are re-pushed only when a strictly better `f` turns up; older heap
/// entries for a cell are skipped once the cell is resolved.
struct OpenSet {
    arena: Vec<SearchNode>,
    heap: BinaryHeap<OpenEntry>,
    best_f: HashMap<usize, f64>,
    resolved: Vec<bool>,
    sequence: u64,
}

impl OpenSet {
    fn new(cells: usize) -> Self {
        Self {
            arena: Vec::new(),
            heap: BinaryHeap::new(),
            best_f: HashMap::new(),
            resolved: vec![false; cells],
            sequence: 0,
        }
    }

    fn offer(&mut self, grid: &Grid, candidate: SearchNode) {
        let Some(index) = grid.index(candidate.node.coord()) else {
            return;
        };
        let f = candidate.f();
        if self.best_f.get(&index).is_some_and(|&best| best <= f) {
            return;
        }

        let _ = self.best_f.insert(index, f);
        self.arena.push(candidate);
        self.heap.push(OpenEntry {
            f,
            sequence: self.sequence,
            slot: self.arena.len() - 1,
        });
        self.sequence += 1;
    }

    /// Pops the cheapest entry whose cell is not yet resolved and marks it
    /// resolved.
    fn pop_unresolved(&mut self, grid: &Grid) -> Option<usize> {
        while let Some(entry) = self.heap.pop() {
            let cell = self.arena[entry.slot].node.coord();
            let Some(index) = grid.index(cell) else {
                continue;
            };
            if self.resolved[index] {
                continue;
            }
            self.resolved[index] = true;
            return Some(entry.slot);
        }
        None
    }

    fn is_resolved(&self, grid: &Grid, cell: CellCoord) -> bool {
        grid.index(cell)
            .is_some_and(|index| self.resolved[index])
    }

    fn reconstruct(&self, slot: usize) -> Path {
        let SearchNode { g, j, .. } = self.arena[slot];
        let mut nodes = Vec::new();
        let mut cursor = Some(slot);
        while let Some(current) = cursor {
            let entry = &self.arena[current];
            nodes.push(entry.node);
            cursor = entry.parent;
        }
        Path::new(nodes, g, j)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(f: f64, sequence: u64) -> OpenEntry {
        OpenEntry {
            f,
            sequence,
            slot: 0,
        }
    }

    #[test]
    fn heap_pops_lowest_f_first() {
        let mut heap = BinaryHeap::new();
        heap.push(entry(5.0, 0));
        heap.push(entry(1.5, 1));
        heap.push(entry(3.0, 2));

        let order: Vec<f64> = std::iter::from_fn(|| heap.pop().map(|entry| entry.f)).collect();
        assert_eq!(order, vec![1.5, 3.0, 5.0]);
    }

    #[test]
    fn ties_pop_in_insertion_order() {
        let mut heap = BinaryHeap::new();
        heap.push(entry(2.0, 3));
        heap.push(entry(2.0, 1));
        heap.push(entry(2.0, 2));

        let order: Vec<u64> =
            std::iter::from_fn(|| heap.pop().map(|entry| entry.sequence)).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn offer_ignores_candidates_that_do_not_improve() {
        let grid = Grid::filled(1, 2, 1);
        let node = *grid.node(CellCoord::new(1, 0)).expect("in bounds");
        let mut open = OpenSet::new(grid.len());

        let candidate = |g: u64| SearchNode {
            node,
            parent: None,
            g,
            h: 0.0,
            j: 0.0,
        };
        open.offer(&grid, candidate(4));
        open.offer(&grid, candidate(6));
        open.offer(&grid, candidate(4));
        assert_eq!(open.arena.len(), 1);

        open.offer(&grid, candidate(2));
        assert_eq!(open.arena.len(), 2);

        let slot = open.pop_unresolved(&grid).expect("entry queued");
        assert_eq!(open.arena[slot].g, 2);
        assert_eq!(open.pop_unresolved(&grid), None, "stale entry must be skipped");
    }

    #[test]
    fn reachability_rejects_out_of_bounds_start() {
        let grid = Grid::filled(2, 2, 1);
        let layers = Layers {
            terrain: &grid,
            filter: &grid,
            influence: &grid,
        };
        assert!(reachable(layers, false, CellCoord::new(5, 5), CellCoord::new(0, 0)).is_err());
    }
}
