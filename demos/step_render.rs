use grid_astar::{CellGrid, Pathfinder, StepControl};
use grid_util::point::Point;

// Replays the editor flow: paint a wall with a single gap, refresh the
// neighbour lists and watch the search explore the grid frame by frame.
// A real front end would draw colored cells where this prints glyphs.

fn main() {
    let rows = 10;
    let start = Point::new(0, 0);
    let end = Point::new(9, 9);
    let mut grid = CellGrid::new(rows, 800);
    grid.set_start(start);
    grid.set_end(end);
    for x in 0..rows as i32 {
        if x != 6 {
            grid.set_barrier(Point::new(x, 4));
        }
    }
    grid.rebuild_neighbours();
    let mut frame = 0;
    let outcome = Pathfinder::new().search(&mut grid, start, end, |grid| {
        frame += 1;
        println!("frame {frame}:\n{grid}");
        StepControl::Continue
    });
    println!("{:?}", outcome);
}
