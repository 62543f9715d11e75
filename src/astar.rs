//! A* search over a [CellGrid] with per-step caller notification. The frontier
//! orders by estimated total cost and breaks ties by insertion sequence, which
//! keeps exploration reproducible without needing an ordering on the cells
//! themselves.
use fxhash::{FxBuildHasher, FxHashMap, FxHashSet};
use indexmap::IndexMap;
use log::info;

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use grid_util::point::Point;

use crate::CellGrid;

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

struct FrontierEntry {
    estimated_cost: i32,
    sequence: usize,
    cell: Point,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.estimated_cost == other.estimated_cost && self.sequence == other.sequence
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Inverted for the max-heap: lowest estimated cost pops first, and on
        // equal cost the entry that joined the frontier earliest wins.
        match other.estimated_cost.cmp(&self.estimated_cost) {
            Ordering::Equal => other.sequence.cmp(&self.sequence),
            s => s,
        }
    }
}

/// Verdict returned by the step callback, checked once per expansion. The
/// search stops with [SearchOutcome::Aborted] when the host asks for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepControl {
    Continue,
    Abort,
}

/// Result of a [search](Pathfinder::search) call. `NotFound` and `Aborted` are
/// ordinary outcomes, not errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The shortest path, ordered from start to end, both inclusive.
    Found(Vec<Point>),
    /// The frontier was exhausted without reaching the end cell.
    NotFound,
    /// The step callback requested cancellation.
    Aborted,
}

impl SearchOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::Found(_))
    }

    pub fn path(&self) -> Option<&[Point]> {
        match self {
            SearchOutcome::Found(path) => Some(path),
            _ => None,
        }
    }

    pub fn into_path(self) -> Option<Vec<Point>> {
        match self {
            SearchOutcome::Found(path) => Some(path),
            _ => None,
        }
    }
}

/// Estimate of the remaining cost between two cells. Shortest-path guarantees
/// hold for estimates that never overestimate the true cost and satisfy the
/// triangle inequality across grid edges.
pub trait Heuristic {
    fn estimate(&self, from: Point, to: Point) -> i32;
}

/// Manhattan distance, admissible and consistent for 4-directional unit-cost
/// movement.
#[derive(Clone, Copy, Debug, Default)]
pub struct Manhattan;

impl Heuristic for Manhattan {
    fn estimate(&self, from: Point, to: Point) -> i32 {
        (from.x - to.x).abs() + (from.y - to.y).abs()
    }
}

/// Runs A* searches over a [CellGrid]. Stateless between calls; all search
/// bookkeeping lives inside [search](Self::search) and is discarded when it
/// returns.
#[derive(Clone, Debug)]
pub struct Pathfinder<H: Heuristic = Manhattan> {
    heuristic: H,
}

impl Pathfinder {
    pub fn new() -> Pathfinder {
        Pathfinder {
            heuristic: Manhattan,
        }
    }
}

impl Default for Pathfinder {
    fn default() -> Pathfinder {
        Pathfinder::new()
    }
}

impl<H: Heuristic> Pathfinder<H> {
    pub fn with_heuristic(heuristic: H) -> Pathfinder<H> {
        Pathfinder { heuristic }
    }

    /// Searches for a shortest path from `start` to `end`, expanding cells in
    /// order of increasing estimated total cost.
    ///
    /// `on_step` is invoked once after every expansion so the caller can
    /// redraw; its return value is the cooperative cancellation check. On
    /// success the predecessor chain is revealed one cell at a time, with a
    /// notification per revealed cell, before the end marker is re-asserted
    /// and the full path returned.
    ///
    /// Cells entering the frontier are marked [Open](crate::CellState::Open)
    /// and expanded cells other than `start` are marked
    /// [Closed](crate::CellState::Closed). The grid's topology must not change
    /// while the call runs, which the exclusive borrow enforces.
    ///
    /// Both endpoints must be in bounds and passable.
    pub fn search<F>(
        &self,
        grid: &mut CellGrid,
        start: Point,
        end: Point,
        mut on_step: F,
    ) -> SearchOutcome
    where
        F: FnMut(&CellGrid) -> StepControl,
    {
        assert!(
            grid.in_bounds(start) && grid.in_bounds(end),
            "search endpoints must be in bounds"
        );
        assert!(
            !grid.state(start).is_barrier() && !grid.state(end).is_barrier(),
            "search endpoints must be passable"
        );

        let mut frontier = BinaryHeap::new();
        let mut came_from: FxIndexMap<Point, Point> = FxIndexMap::default();
        let mut g_score: FxHashMap<Point, i32> = FxHashMap::default();
        let mut f_score: FxHashMap<Point, i32> = FxHashMap::default();
        let mut in_frontier: FxHashSet<Point> = FxHashSet::default();
        let mut sequence: usize = 0;

        g_score.insert(start, 0);
        f_score.insert(start, self.heuristic.estimate(start, end));
        frontier.push(FrontierEntry {
            estimated_cost: f_score[&start],
            sequence,
            cell: start,
        });
        in_frontier.insert(start);

        let mut expansions: usize = 0;
        while let Some(FrontierEntry { cell: current, .. }) = frontier.pop() {
            in_frontier.remove(&current);
            if current == end {
                let path = reveal_path(grid, &came_from, end, &mut on_step);
                info!(
                    "found a path of {} cells after {} expansions",
                    path.len(),
                    expansions
                );
                return SearchOutcome::Found(path);
            }
            for neighbour in grid.neighbours_of(current) {
                let tentative_g = g_score[&current] + 1;
                if tentative_g < g_score.get(&neighbour).copied().unwrap_or(i32::MAX) {
                    came_from.insert(neighbour, current);
                    g_score.insert(neighbour, tentative_g);
                    f_score.insert(
                        neighbour,
                        tentative_g + self.heuristic.estimate(neighbour, end),
                    );
                    // A cell already in the frontier keeps its queued entry;
                    // the improved scores take effect when it pops.
                    if in_frontier.insert(neighbour) {
                        sequence += 1;
                        frontier.push(FrontierEntry {
                            estimated_cost: f_score[&neighbour],
                            sequence,
                            cell: neighbour,
                        });
                        grid.mark_open(neighbour);
                    }
                }
            }
            expansions += 1;
            if on_step(grid) == StepControl::Abort {
                info!("search aborted after {} expansions", expansions);
                return SearchOutcome::Aborted;
            }
            if current != start {
                grid.mark_closed(current);
            }
        }
        info!(
            "frontier exhausted after {} expansions, {} is unreachable",
            expansions, end
        );
        SearchOutcome::NotFound
    }
}

/// Walks the predecessor chain back from the end cell, marking each revealed
/// cell and notifying the caller per cell, then re-asserts the end marker.
/// Returns the path reordered from start to end.
fn reveal_path<F>(
    grid: &mut CellGrid,
    came_from: &FxIndexMap<Point, Point>,
    end: Point,
    on_step: &mut F,
) -> Vec<Point>
where
    F: FnMut(&CellGrid) -> StepControl,
{
    let mut path = vec![end];
    let mut current = end;
    while let Some(&previous) = came_from.get(&current) {
        current = previous;
        grid.mark_path(current);
        on_step(grid);
        path.push(current);
    }
    path.reverse();
    grid.mark_end(end);
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellState;

    fn searchable_grid(rows: usize, start: Point, end: Point) -> CellGrid {
        let mut grid = CellGrid::new(rows, rows * 16);
        grid.set_start(start);
        grid.set_end(end);
        grid
    }

    fn run(grid: &mut CellGrid, start: Point, end: Point) -> SearchOutcome {
        Pathfinder::new().search(grid, start, end, |_| StepControl::Continue)
    }

    #[test]
    fn manhattan_distance() {
        let h = Manhattan;
        assert_eq!(h.estimate(Point::new(0, 0), Point::new(3, 4)), 7);
        assert_eq!(h.estimate(Point::new(4, 1), Point::new(1, 2)), 4);
        assert_eq!(h.estimate(Point::new(2, 2), Point::new(2, 2)), 0);
    }

    /// Asserts that the case in which start and goal are equal is handled
    /// correctly, with no step notifications at all.
    #[test]
    fn equal_start_goal() {
        let start = Point::new(0, 0);
        let mut grid = CellGrid::new(1, 16);
        grid.set_start(start);
        let mut steps = 0;
        let outcome = Pathfinder::new().search(&mut grid, start, start, |_| {
            steps += 1;
            StepControl::Continue
        });
        assert_eq!(outcome, SearchOutcome::Found(vec![start]));
        assert_eq!(steps, 0);
    }

    /// On a barrier-free grid the path length equals the Manhattan distance
    /// plus one.
    #[test]
    fn solve_empty_grid() {
        let start = Point::new(0, 0);
        let end = Point::new(4, 4);
        let mut grid = searchable_grid(5, start, end);
        grid.rebuild_neighbours();
        let path = run(&mut grid, start, end).into_path().unwrap();
        assert_eq!(path.len(), 9);
        assert_eq!(path[0], start);
        assert_eq!(*path.last().unwrap(), end);
        for pair in path.windows(2) {
            assert_eq!(Manhattan.estimate(pair[0], pair[1]), 1);
        }
    }

    /// A wall across the middle row with a single gap forces the path through
    /// the gap exactly once.
    #[test]
    fn wall_with_single_gap() {
        //  _____
        // |S....|
        // |.....|
        // |##.##|
        // |.....|
        // |....E|
        //  _____
        let start = Point::new(0, 0);
        let end = Point::new(4, 4);
        let gap = Point::new(2, 2);
        let mut grid = searchable_grid(5, start, end);
        for x in [0, 1, 3, 4] {
            grid.set_barrier(Point::new(x, 2));
        }
        let path = run(&mut grid, start, end).into_path().unwrap();
        assert_eq!(path.len(), 9);
        assert_eq!(path.iter().filter(|&&p| p == gap).count(), 1);
    }

    /// A fully enclosed end is reported unreachable only once the frontier is
    /// exhausted, after every reachable cell has been expanded.
    #[test]
    fn walled_off_end_is_not_found() {
        //  ___
        // |S..|
        // |..#|
        // |.#E|
        //  ___
        let start = Point::new(0, 0);
        let end = Point::new(2, 2);
        let mut grid = searchable_grid(3, start, end);
        grid.set_barrier(Point::new(2, 1));
        grid.set_barrier(Point::new(1, 2));
        let mut steps = 0;
        let outcome = Pathfinder::new().search(&mut grid, start, end, |_| {
            steps += 1;
            StepControl::Continue
        });
        assert_eq!(outcome, SearchOutcome::NotFound);
        // All six passable cells on the start side get expanded.
        assert_eq!(steps, 6);
    }

    /// Locks in the deterministic tie-break: of two equally cheap routes on a
    /// 2x2 grid, the one discovered first is explored and returned.
    #[test]
    fn tie_break_follows_insertion_order() {
        let start = Point::new(0, 0);
        let end = Point::new(1, 1);
        let mut grid = searchable_grid(2, start, end);
        let mut steps = 0;
        let outcome = Pathfinder::new().search(&mut grid, start, end, |_| {
            steps += 1;
            StepControl::Continue
        });
        assert_eq!(
            outcome,
            SearchOutcome::Found(vec![start, Point::new(0, 1), end])
        );
        // Three expansions plus two revealed path cells.
        assert_eq!(steps, 5);
    }

    /// Running the same search twice on an unmodified grid explores and
    /// returns identically. The transient markers left by the first run do
    /// not affect adjacency.
    #[test]
    fn idempotent_reruns() {
        let start = Point::new(0, 0);
        let end = Point::new(6, 5);
        let mut grid = searchable_grid(7, start, end);
        for p in [
            Point::new(2, 0),
            Point::new(2, 1),
            Point::new(2, 2),
            Point::new(4, 4),
            Point::new(4, 5),
            Point::new(5, 3),
        ] {
            grid.set_barrier(p);
        }
        let mut first_steps = 0;
        let first = Pathfinder::new().search(&mut grid, start, end, |_| {
            first_steps += 1;
            StepControl::Continue
        });
        let mut second_steps = 0;
        let second = Pathfinder::new().search(&mut grid, start, end, |_| {
            second_steps += 1;
            StepControl::Continue
        });
        assert_eq!(first, second);
        assert_eq!(first_steps, second_steps);
    }

    #[test]
    fn aborts_on_request() {
        let start = Point::new(0, 0);
        let end = Point::new(4, 4);
        let mut grid = searchable_grid(5, start, end);
        let outcome = Pathfinder::new().search(&mut grid, start, end, |_| StepControl::Abort);
        assert_eq!(outcome, SearchOutcome::Aborted);
    }

    /// A search that succeeds on its first pop never reaches the cancellation
    /// checkpoint.
    #[test]
    fn immediate_success_beats_abort() {
        let start = Point::new(0, 0);
        let mut grid = CellGrid::new(2, 32);
        grid.set_start(start);
        let outcome = Pathfinder::new().search(&mut grid, start, start, |_| StepControl::Abort);
        assert_eq!(outcome, SearchOutcome::Found(vec![start]));
    }

    /// After a successful search the revealed chain carries path markers, the
    /// end keeps its own marker, and expanded cells are closed.
    #[test]
    fn search_markers_after_success() {
        let start = Point::new(0, 0);
        let end = Point::new(4, 4);
        let mut grid = searchable_grid(5, start, end);
        for x in [0, 1, 3, 4] {
            grid.set_barrier(Point::new(x, 2));
        }
        let path = run(&mut grid, start, end).into_path().unwrap();
        assert_eq!(grid.state(end), CellState::End);
        for &p in &path[..path.len() - 1] {
            assert_eq!(grid.state(p), CellState::Path);
        }
        assert!(grid.iter().any(|(_, state)| state.is_closed()));
    }

    /// A zero heuristic degrades the search to Dijkstra but still yields a
    /// shortest path.
    #[test]
    fn pluggable_heuristic() {
        struct NoEstimate;
        impl Heuristic for NoEstimate {
            fn estimate(&self, _from: Point, _to: Point) -> i32 {
                0
            }
        }
        let start = Point::new(0, 0);
        let end = Point::new(4, 4);
        let mut grid = searchable_grid(5, start, end);
        let path = Pathfinder::with_heuristic(NoEstimate)
            .search(&mut grid, start, end, |_| StepControl::Continue)
            .into_path()
            .unwrap();
        assert_eq!(path.len(), 9);
    }

    #[test]
    #[should_panic(expected = "must be passable")]
    fn barrier_endpoint_is_rejected() {
        let start = Point::new(0, 0);
        let end = Point::new(2, 2);
        let mut grid = searchable_grid(3, start, Point::new(2, 0));
        grid.set_barrier(end);
        run(&mut grid, start, end);
    }

    #[test]
    #[should_panic(expected = "in bounds")]
    fn out_of_bounds_endpoint_is_rejected() {
        let start = Point::new(0, 0);
        let mut grid = CellGrid::new(3, 300);
        grid.set_start(start);
        run(&mut grid, start, Point::new(5, 5));
    }
}
