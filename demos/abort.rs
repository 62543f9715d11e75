use grid_astar::{CellGrid, Pathfinder, SearchOutcome, StepControl};
use grid_util::point::Point;

// A host that wants to shut down mid-search returns Abort from the step
// callback and the search stops with an Aborted outcome instead of a path.

fn main() {
    let start = Point::new(0, 0);
    let end = Point::new(49, 49);
    let mut grid = CellGrid::new(50, 800);
    grid.set_start(start);
    grid.set_end(end);
    let mut budget = 25;
    let outcome = Pathfinder::new().search(&mut grid, start, end, |_| {
        budget -= 1;
        if budget == 0 {
            StepControl::Abort
        } else {
            StepControl::Continue
        }
    });
    assert_eq!(outcome, SearchOutcome::Aborted);
    println!("search stopped early: {:?}", outcome);
}
