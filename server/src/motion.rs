//! Per-tick movement rules for a single snake

use shared::{Grid, Position, Segment, Snake};

/// Moves `snake` one cell along its heading.
///
/// The head steps one cell; every other segment takes the position and heading
/// its predecessor had before the move. A head that would leave the board is
/// put on `respawn` instead, and the body trails after it on later ticks.
///
/// Returns true when the head was respawned.
pub fn advance(snake: &mut Snake, grid: &Grid, respawn: Position) -> bool {
    let previous = snake.body.clone();
    let candidate = snake.head().step(snake.heading, grid.cell_size);
    let out_of_bounds = !grid.is_in_bounds(candidate);
    let head = if out_of_bounds { respawn } else { candidate };

    snake.body[0] = Segment::new(snake.heading, head.row, head.col);
    for (segment, leader) in snake.body.iter_mut().skip(1).zip(previous.iter()) {
        *segment = *leader;
    }

    out_of_bounds
}

/// Appends one segment a cell behind the tail, opposite to the heading.
pub fn grow(snake: &mut Snake, grid: &Grid) {
    let tail = snake.body[snake.body.len() - 1].position();
    let behind = tail.step(snake.heading.opposite(), grid.cell_size);
    snake
        .body
        .push(Segment::new(snake.heading, behind.row, behind.col));
}
