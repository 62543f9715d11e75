//! # grid_astar
//!
//! The model half of an interactive pathfinding editor: an editable grid of
//! cells and an [A*](https://en.wikipedia.org/wiki/A*_search_algorithm) search
//! that explores it one expansion at a time. An external editor paints
//! barriers and designates start and end cells, then runs a search which
//! notifies the caller after every expansion so current state can be redrawn.
//! Ties on estimated cost are broken by frontier insertion order, so identical
//! grids always explore and return identically.
mod astar;

pub use astar::{Heuristic, Manhattan, Pathfinder, SearchOutcome, StepControl};

use core::fmt;
use grid_util::grid::{Grid, SimpleGrid};
use grid_util::point::Point;
use itertools::iproduct;

/// Marker carried by every cell. [Empty](CellState::Empty), [Barrier](CellState::Barrier),
/// [Start](CellState::Start) and [End](CellState::End) are placed by the editor;
/// [Open](CellState::Open), [Closed](CellState::Closed) and [Path](CellState::Path) are
/// transient markers applied by the search for the benefit of whatever renders the grid.
/// Only [Barrier](CellState::Barrier) affects adjacency.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CellState {
    #[default]
    Empty,
    Barrier,
    Start,
    End,
    /// In the search frontier, discovered but not yet expanded.
    Open,
    /// Fully expanded.
    Closed,
    /// On the reconstructed shortest path.
    Path,
}

impl CellState {
    pub fn is_empty(self) -> bool {
        self == CellState::Empty
    }
    /// The one predicate adjacency is built from. Everything else on this type
    /// exists for renderers and editors.
    pub fn is_barrier(self) -> bool {
        self == CellState::Barrier
    }
    pub fn is_start(self) -> bool {
        self == CellState::Start
    }
    pub fn is_end(self) -> bool {
        self == CellState::End
    }
    pub fn is_open(self) -> bool {
        self == CellState::Open
    }
    pub fn is_closed(self) -> bool {
        self == CellState::Closed
    }
    pub fn is_path(self) -> bool {
        self == CellState::Path
    }
    /// One-character marker used by the [Display](fmt::Display) rendering of a
    /// [CellGrid]. A real front end maps states to colors instead.
    pub fn glyph(self) -> char {
        match self {
            CellState::Empty => '.',
            CellState::Barrier => '#',
            CellState::Start => 'S',
            CellState::End => 'E',
            CellState::Open => 'o',
            CellState::Closed => 'x',
            CellState::Path => '*',
        }
    }
}

/// Offsets of the four cardinal neighbours, indexed by the bit they occupy in
/// the neighbour mask. Opposite directions differ in the lowest bit (`dir ^ 1`).
const NEIGHBOUR_OFFSETS: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

const PASSABLE_ALL: u8 = 0b1111;

fn neighbour_point(p: Point, dir: usize) -> Point {
    let (dx, dy) = NEIGHBOUR_OFFSETS[dir];
    Point::new(p.x + dx, p.y + dy)
}

/// A square, editable grid of [CellState] values. Cells are addressed by
/// [Point] with `x` as the column and `y` as the row; all cells live in a
/// single owning array and refer to each other by index only.
///
/// [CellGrid] records passable neighbours in [u8] format for fast lookups
/// during search: bit `dir` of a cell's mask is set when the neighbour in that
/// direction is in bounds and not a barrier. The masks are kept current on
/// every barrier edit, and [rebuild_neighbours](Self::rebuild_neighbours)
/// recomputes them all from scratch.
///
/// At most one cell is designated as start and at most one as end, never the
/// same cell. Mutators enforce this and out-of-bounds access panics; both are
/// caller bugs rather than runtime conditions.
#[derive(Clone, Debug)]
pub struct CellGrid {
    cells: SimpleGrid<CellState>,
    neighbours: SimpleGrid<u8>,
    rows: usize,
    cell_span: usize,
    start: Option<Point>,
    end: Option<Point>,
}

impl CellGrid {
    /// Creates a `rows` x `rows` grid of empty cells. `width` is the pixel
    /// width of the window the grid will be drawn in; it only determines
    /// [cell_span](Self::cell_span).
    pub fn new(rows: usize, width: usize) -> CellGrid {
        assert!(rows > 0, "grid needs at least one row");
        let mut grid = CellGrid {
            cells: SimpleGrid::new(rows, rows, CellState::Empty),
            neighbours: SimpleGrid::new(rows, rows, PASSABLE_ALL),
            rows,
            cell_span: width / rows,
            start: None,
            end: None,
        };
        // Emulates placing a ring of barriers around the border so border
        // cells never list out-of-bounds neighbours.
        for i in -1..=(rows as i32) {
            grid.update_neighbours(i, -1, true);
            grid.update_neighbours(i, rows as i32, true);
            grid.update_neighbours(-1, i, true);
            grid.update_neighbours(rows as i32, i, true);
        }
        grid
    }

    /// Number of rows (and columns).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Side length of a drawn cell, `width / rows` from construction. Core
    /// logic never reads this; it exists for the rendering collaborator.
    pub fn cell_span(&self) -> usize {
        self.cell_span
    }

    pub fn in_bounds(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && (p.x as usize) < self.rows && (p.y as usize) < self.rows
    }

    pub fn state(&self, p: Point) -> CellState {
        assert!(self.in_bounds(p), "cell {p} is out of bounds");
        self.cells.get_point(p)
    }

    /// The designated start cell, if any.
    pub fn start(&self) -> Option<Point> {
        self.start
    }

    /// The designated end cell, if any.
    pub fn end(&self) -> Option<Point> {
        self.end
    }

    /// Designates `p` as the start cell. The cell must be empty and no other
    /// start may exist.
    pub fn set_start(&mut self, p: Point) {
        assert!(self.start.is_none(), "a start cell is already designated");
        assert!(self.state(p).is_empty(), "start placed on non-empty cell {p}");
        self.cells.set_point(p, CellState::Start);
        self.start = Some(p);
    }

    /// Designates `p` as the end cell. The cell must be empty and no other
    /// end may exist.
    pub fn set_end(&mut self, p: Point) {
        assert!(self.end.is_none(), "an end cell is already designated");
        assert!(self.state(p).is_empty(), "end placed on non-empty cell {p}");
        self.cells.set_point(p, CellState::End);
        self.end = Some(p);
    }

    /// Turns an empty cell into a barrier and removes it from the neighbour
    /// masks of its adjacent cells.
    pub fn set_barrier(&mut self, p: Point) {
        assert!(self.state(p).is_empty(), "barrier placed on non-empty cell {p}");
        self.cells.set_point(p, CellState::Barrier);
        self.update_neighbours(p.x, p.y, true);
    }

    /// Returns any cell to [Empty](CellState::Empty) unconditionally, clearing
    /// a matching start or end designation.
    pub fn reset(&mut self, p: Point) {
        let old = self.state(p);
        self.cells.set_point(p, CellState::Empty);
        if old.is_barrier() {
            self.update_neighbours(p.x, p.y, false);
        }
        if self.start == Some(p) {
            self.start = None;
        }
        if self.end == Some(p) {
            self.end = None;
        }
    }

    /// Clears the whole grid back to its freshly constructed state.
    pub fn reset_all(&mut self) {
        for (x, y) in iproduct!(0..self.rows, 0..self.rows) {
            self.cells.set(x, y, CellState::Empty);
        }
        self.start = None;
        self.end = None;
        self.rebuild_neighbours();
    }

    /// Recomputes every cell's neighbour mask from current barrier state.
    ///
    /// Masks are already maintained on each edit, so this is a refresh
    /// guarantee rather than a requirement between edits. Editors mirroring
    /// the classic flow call it once before each search.
    pub fn rebuild_neighbours(&mut self) {
        for (x, y) in iproduct!(0..self.rows, 0..self.rows) {
            let p = Point::new(x as i32, y as i32);
            let mut mask = 0u8;
            for dir in 0..4 {
                let neighbour = neighbour_point(p, dir);
                if self.in_bounds(neighbour) && !self.state(neighbour).is_barrier() {
                    mask |= 1 << dir;
                }
            }
            self.neighbours.set_point(p, mask);
        }
    }

    /// The in-bounds, non-barrier neighbours of `p` in up, down, left, right
    /// order, read from the cached mask.
    pub fn neighbours_of(&self, p: Point) -> Vec<Point> {
        assert!(self.in_bounds(p), "cell {p} is out of bounds");
        let mask = self.neighbours.get_point(p);
        (0..4)
            .filter(|dir| mask & (1 << dir) != 0)
            .map(|dir| neighbour_point(p, dir))
            .collect::<Vec<Point>>()
    }

    /// Iterates over every cell and its state, row by row. Intended for
    /// renderers.
    pub fn iter(&self) -> impl Iterator<Item = (Point, CellState)> + '_ {
        iproduct!(0..self.rows, 0..self.rows).map(|(y, x)| {
            let p = Point::new(x as i32, y as i32);
            (p, self.cells.get_point(p))
        })
    }

    /// Updates the masks of the cells around (`x`, `y`) after its barrier
    /// status changed. The position itself may lie outside the grid; only
    /// in-bounds neighbours are touched.
    fn update_neighbours(&mut self, x: i32, y: i32, blocked: bool) {
        let p = Point::new(x, y);
        for dir in 0..4 {
            let neighbour = neighbour_point(p, dir);
            if self.in_bounds(neighbour) {
                let back = dir ^ 1;
                let mut mask = self.neighbours.get_point(neighbour);
                if blocked {
                    mask &= !(1 << back);
                } else {
                    mask |= 1 << back;
                }
                self.neighbours.set_point(neighbour, mask);
            }
        }
    }

    pub(crate) fn mark_open(&mut self, p: Point) {
        if self.state(p).is_empty() {
            self.cells.set_point(p, CellState::Open);
        }
    }

    pub(crate) fn mark_closed(&mut self, p: Point) {
        self.cells.set_point(p, CellState::Closed);
    }

    pub(crate) fn mark_path(&mut self, p: Point) {
        self.cells.set_point(p, CellState::Path);
    }

    pub(crate) fn mark_end(&mut self, p: Point) {
        self.cells.set_point(p, CellState::End);
    }
}

impl fmt::Display for CellGrid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for y in 0..self.rows as i32 {
            for x in 0..self.rows as i32 {
                write!(f, "{}", self.cells.get_point(Point::new(x, y)).glyph())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
