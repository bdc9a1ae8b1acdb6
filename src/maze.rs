use std::collections::{BTreeSet, HashSet, VecDeque};

use crate::grid::Position;
use crate::rng::SimRng;

pub const START: Position = Position::new(1, 1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    Wall,
    Open,
}

/// Fixed-size walled grid. Built once per session and only read afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Maze {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
}

impl Maze {
    pub fn filled(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            cells: vec![Cell::Wall; (width * height) as usize],
        }
    }

    /// Builds a maze from text rows where `#` is a wall and anything else is open.
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len() as i32;
        let width = rows.iter().map(|row| row.len()).max().unwrap_or(0) as i32;
        let mut maze = Maze::filled(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, byte) in row.bytes().enumerate() {
                if byte != b'#' {
                    maze.set(Position::new(x as i32, y as i32), Cell::Open);
                }
            }
        }
        maze
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    pub fn cell(&self, pos: Position) -> Option<Cell> {
        if !self.in_bounds(pos) {
            return None;
        }
        self.cells.get(self.index(pos)).copied()
    }

    pub fn is_open(&self, pos: Position) -> bool {
        self.cell(pos) == Some(Cell::Open)
    }

    pub fn is_wall(&self, pos: Position) -> bool {
        self.cell(pos) == Some(Cell::Wall)
    }

    pub fn open_cells(&self) -> Vec<Position> {
        let mut out = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let pos = Position::new(x, y);
                if self.is_open(pos) {
                    out.push(pos);
                }
            }
        }
        out
    }

    /// Open cells one step inside the outer wall, deduplicated at the corners.
    pub fn border_ring_open_cells(&self) -> Vec<Position> {
        let mut ring = BTreeSet::new();
        if self.width < 3 || self.height < 3 {
            return Vec::new();
        }
        for x in 1..self.width - 1 {
            ring.insert(Position::new(x, 1));
            ring.insert(Position::new(x, self.height - 2));
        }
        for y in 1..self.height - 1 {
            ring.insert(Position::new(1, y));
            ring.insert(Position::new(self.width - 2, y));
        }
        ring.into_iter().filter(|pos| self.is_open(*pos)).collect()
    }

    pub fn is_on_border_ring(&self, pos: Position) -> bool {
        self.in_bounds(pos)
            && (pos.x == 1 || pos.y == 1 || pos.x == self.width - 2 || pos.y == self.height - 2)
            && pos.x >= 1
            && pos.y >= 1
            && pos.x <= self.width - 2
            && pos.y <= self.height - 2
    }

    pub fn random_open_cell(&self, rng: &mut SimRng) -> Option<Position> {
        rng.choose(&self.open_cells())
    }

    /// Open cells 4-connected to `start`, including `start` when open.
    pub fn reachable_from(&self, start: Position) -> HashSet<Position> {
        let mut out = HashSet::new();
        if !self.is_open(start) {
            return out;
        }
        let mut queue = VecDeque::new();
        out.insert(start);
        queue.push_back(start);
        while let Some(pos) = queue.pop_front() {
            for next in pos.neighbors() {
                if self.is_open(next) && out.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        out
    }

    pub fn to_rows(&self) -> Vec<String> {
        (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| {
                        if self.is_open(Position::new(x, y)) {
                            '.'
                        } else {
                            '#'
                        }
                    })
                    .collect()
            })
            .collect()
    }

    pub(crate) fn set(&mut self, pos: Position, cell: Cell) {
        if self.in_bounds(pos) {
            let idx = self.index(pos);
            self.cells[idx] = cell;
        }
    }

    fn index(&self, pos: Position) -> usize {
        (pos.y * self.width + pos.x) as usize
    }
}

/// Randomized depth-first carving from (1,1) followed by a loop pass that
/// knocks out `width * height / 20` sampled walls bordering two or more open cells.
pub fn generate_maze(width: i32, height: i32, rng: &mut SimRng) -> Maze {
    let mut maze = Maze::filled(width, height);
    carve_passages(&mut maze, rng);
    add_loops(&mut maze, rng);
    maze.set(START, Cell::Open);
    maze
}

fn carve_passages(maze: &mut Maze, rng: &mut SimRng) {
    if !maze.in_bounds(START) {
        return;
    }
    maze.set(START, Cell::Open);
    let mut stack = vec![START];
    let jumps = [(0, 2), (2, 0), (0, -2), (-2, 0)];

    while let Some(&current) = stack.last() {
        let mut candidates = Vec::with_capacity(4);
        for (dx, dy) in jumps {
            let next = Position::new(current.x + dx, current.y + dy);
            let strictly_inside = next.x >= 1
                && next.y >= 1
                && next.x < maze.width - 1
                && next.y < maze.height - 1;
            if strictly_inside && maze.is_wall(next) {
                let between = Position::new(current.x + dx / 2, current.y + dy / 2);
                candidates.push((next, between));
            }
        }

        match rng.choose(&candidates) {
            Some((next, between)) => {
                maze.set(next, Cell::Open);
                maze.set(between, Cell::Open);
                stack.push(next);
            }
            None => {
                stack.pop();
            }
        }
    }
}

fn add_loops(maze: &mut Maze, rng: &mut SimRng) {
    if maze.width < 3 || maze.height < 3 {
        return;
    }
    let attempts = maze.width * maze.height / 20;
    for _ in 0..attempts {
        let pos = Position::new(
            rng.range(1, maze.width - 2),
            rng.range(1, maze.height - 2),
        );
        if !maze.is_wall(pos) {
            continue;
        }
        let open_neighbors = pos
            .neighbors()
            .into_iter()
            .filter(|next| maze.is_open(*next))
            .count();
        if open_neighbors >= 2 {
            maze.set(pos, Cell::Open);
        }
    }
}
