use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::grid::Position;
use crate::maze::Maze;

/// Shortest 4-directional path from `start` to `goal` over open cells.
///
/// The result excludes `start`, ends at `goal`, and is empty when the goal is
/// unreachable or equal to the start. Frontier entries are ordered by
/// `(f, position)`, so equal scores resolve to the lexicographically smallest
/// cell and the same query always yields the same path. The frontier keeps no
/// membership set: a cell may be queued more than once after its cost improves,
/// and stale copies are skipped once the cell is closed.
pub fn find_path(maze: &Maze, start: Position, goal: Position) -> Vec<Position> {
    if start == goal || !maze.is_open(goal) || !maze.in_bounds(start) {
        return Vec::new();
    }

    let mut frontier = BinaryHeap::new();
    let mut closed = HashSet::new();
    let mut came_from: HashMap<Position, Position> = HashMap::new();
    let mut g_score: HashMap<Position, i32> = HashMap::new();

    g_score.insert(start, 0);
    frontier.push(Reverse((start.manhattan(goal), start)));

    while let Some(Reverse((_, current))) = frontier.pop() {
        if !closed.insert(current) {
            // stale entry left behind by a later improvement
            continue;
        }

        if current == goal {
            return rebuild_path(&came_from, current);
        }

        let current_g = g_score.get(&current).copied().unwrap_or(i32::MAX);
        for next in current.neighbors() {
            if !maze.is_open(next) || closed.contains(&next) {
                continue;
            }
            let tentative = current_g + 1;
            if tentative < g_score.get(&next).copied().unwrap_or(i32::MAX) {
                came_from.insert(next, current);
                g_score.insert(next, tentative);
                frontier.push(Reverse((tentative + next.manhattan(goal), next)));
            }
        }
    }

    Vec::new()
}

fn rebuild_path(came_from: &HashMap<Position, Position>, mut current: Position) -> Vec<Position> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        current = prev;
        path.push(current);
    }
    path.pop();
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};

    use proptest::prelude::*;

    use super::find_path;
    use crate::constants::{MAZE_HEIGHT, MAZE_WIDTH};
    use crate::grid::Position;
    use crate::maze::{generate_maze, Maze};
    use crate::rng::SimRng;

    fn bfs_distance(maze: &Maze, start: Position, goal: Position) -> Option<usize> {
        let mut dist = HashMap::new();
        let mut queue = VecDeque::new();
        dist.insert(start, 0usize);
        queue.push_back(start);
        while let Some(pos) = queue.pop_front() {
            if pos == goal {
                return dist.get(&pos).copied();
            }
            let d = dist[&pos];
            for next in pos.neighbors() {
                if maze.is_open(next) && !dist.contains_key(&next) {
                    dist.insert(next, d + 1);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    fn assert_valid_steps(maze: &Maze, start: Position, path: &[Position]) {
        let mut prev = start;
        for step in path {
            assert_eq!(prev.manhattan(*step), 1, "non-orthogonal step {prev:?} -> {step:?}");
            assert!(maze.is_open(*step), "step through wall at {step:?}");
            prev = *step;
        }
    }

    #[test]
    fn path_excludes_start_and_ends_at_goal() {
        let maze = Maze::from_rows(&["#####", "#...#", "###.#", "#...#", "#####"]);
        let start = Position::new(1, 1);
        let goal = Position::new(1, 3);
        let path = find_path(&maze, start, goal);
        assert_eq!(
            path,
            vec![
                Position::new(2, 1),
                Position::new(3, 1),
                Position::new(3, 2),
                Position::new(3, 3),
                Position::new(2, 3),
                Position::new(1, 3),
            ]
        );
    }

    #[test]
    fn same_start_and_goal_is_empty() {
        let maze = Maze::from_rows(&["###", "#.#", "###"]);
        let p = Position::new(1, 1);
        assert!(find_path(&maze, p, p).is_empty());
    }

    #[test]
    fn walled_off_goal_is_unreachable() {
        let maze = Maze::from_rows(&["#######", "#..#..#", "#..#..#", "#######"]);
        assert!(find_path(&maze, Position::new(1, 1), Position::new(5, 2)).is_empty());
        assert!(find_path(&maze, Position::new(1, 1), Position::new(3, 1)).is_empty());
        assert!(find_path(&maze, Position::new(1, 1), Position::new(40, -3)).is_empty());
    }

    #[test]
    fn repeated_queries_are_identical() {
        let maze = Maze::from_rows(&["#######", "#.....#", "#.....#", "#.....#", "#######"]);
        let first = find_path(&maze, Position::new(1, 1), Position::new(5, 3));
        for _ in 0..10 {
            assert_eq!(find_path(&maze, Position::new(1, 1), Position::new(5, 3)), first);
        }
        assert_eq!(first.len(), 6);
    }

    #[test]
    fn generated_mazes_match_bfs_distance() {
        for seed in 0..10u64 {
            let maze = generate_maze(MAZE_WIDTH, MAZE_HEIGHT, &mut SimRng::new(seed));
            let open = maze.open_cells();
            let mut rng = SimRng::new(seed + 1_000);
            for _ in 0..40 {
                let start = rng.choose(&open).unwrap();
                let goal = rng.choose(&open).unwrap();
                let path = find_path(&maze, start, goal);
                let expected = bfs_distance(&maze, start, goal).unwrap();
                assert_eq!(path.len(), expected, "seed={seed} {start:?}->{goal:?}");
                assert_valid_steps(&maze, start, &path);
                if start != goal {
                    assert_eq!(path.last().copied(), Some(goal));
                }
            }
        }
    }

    proptest! {
        #[test]
        fn astar_length_equals_bfs(seed in 0u64..500, a in 0usize..10_000, b in 0usize..10_000) {
            let maze = generate_maze(MAZE_WIDTH, MAZE_HEIGHT, &mut SimRng::new(seed));
            let open = maze.open_cells();
            let start = open[a % open.len()];
            let goal = open[b % open.len()];
            let path = find_path(&maze, start, goal);
            prop_assert_eq!(Some(path.len()), bfs_distance(&maze, start, goal));
            let mut prev = start;
            for step in &path {
                prop_assert_eq!(prev.manhattan(*step), 1);
                prop_assert!(maze.is_open(*step));
                prev = *step;
            }
        }
    }
}
