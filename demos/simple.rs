use grid_astar::{CellGrid, Pathfinder, StepControl};
use grid_util::point::Point;

// In this demo a path is found on a 3x3 grid with shape
//  ___
// |S  |
// | # |
// |  E|
//  ___
// where
// - # marks a barrier
// - S marks the start
// - E marks the end
//
// Cells have a 4-neighbourhood

fn main() {
    let start = Point::new(0, 0);
    let end = Point::new(2, 2);
    let mut grid = CellGrid::new(3, 300);
    grid.set_start(start);
    grid.set_end(end);
    grid.set_barrier(Point::new(1, 1));
    grid.rebuild_neighbours();
    let outcome = Pathfinder::new().search(&mut grid, start, end, |_| StepControl::Continue);
    println!("{}", grid);
    println!("Path:");
    for p in outcome.path().unwrap() {
        println!("{:?}", p);
    }
}
