use std::time::{SystemTime, UNIX_EPOCH};

use crate::grid::Position;
use crate::maze::Maze;

pub(super) fn now_ms() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    now as u64
}

pub(super) fn remaining_ms(until_ms: u64, now_ms: u64) -> u64 {
    until_ms.saturating_sub(now_ms)
}

/// Open cells accepted by `keep`, in row-major order.
pub(super) fn open_cells_where(maze: &Maze, keep: impl Fn(Position) -> bool) -> Vec<Position> {
    maze.open_cells().into_iter().filter(|pos| keep(*pos)).collect()
}
