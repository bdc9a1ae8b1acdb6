use std::ops::Add;

use serde::Serialize;

/// Integer cell coordinate. Ordering is lexicographic on `(x, y)`, which the
/// pathfinder relies on to break frontier ties deterministically.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Straight-line distance, used for vision and placement radii.
    pub fn distance_to(self, other: Position) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn manhattan(self, other: Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn offset(self, dir: Direction) -> Position {
        self + dir.delta()
    }

    pub fn neighbors(self) -> [Position; 4] {
        [
            Position::new(self.x, self.y + 1),
            Position::new(self.x + 1, self.y),
            Position::new(self.x, self.y - 1),
            Position::new(self.x - 1, self.y),
        ]
    }

    pub fn scaled(self, factor: i32) -> Position {
        Position::new(self.x * factor, self.y * factor)
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, other: Position) -> Position {
        Position::new(self.x + other.x, self.y + other.y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    #[default]
    None,
}

impl Direction {
    pub const CARDINALS: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit vector with y growing downward.
    pub fn delta(self) -> Position {
        match self {
            Direction::Up => Position::new(0, -1),
            Direction::Down => Position::new(0, 1),
            Direction::Left => Position::new(-1, 0),
            Direction::Right => Position::new(1, 0),
            Direction::None => Position::new(0, 0),
        }
    }

    pub fn from_delta(dx: i32, dy: i32) -> Option<Direction> {
        match (dx, dy) {
            (0, -1) => Some(Direction::Up),
            (0, 1) => Some(Direction::Down),
            (-1, 0) => Some(Direction::Left),
            (1, 0) => Some(Direction::Right),
            (0, 0) => Some(Direction::None),
            _ => None,
        }
    }

    pub fn between(from: Position, to: Position) -> Option<Direction> {
        Direction::from_delta(to.x - from.x, to.y - from.y)
    }
}

/// Eight-way bearing shown next to each uncollected star.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Compass {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Compass {
    pub fn bearing(from: Position, to: Position) -> Compass {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let (ax, ay) = (dx.abs(), dy.abs());

        if ax > ay {
            // x-dominant: pure east/west unless dy is at least half of dx
            let diagonal = 2 * ay >= ax;
            match (dx > 0, diagonal, dy > 0) {
                (true, false, _) => Compass::East,
                (true, true, true) => Compass::SouthEast,
                (true, true, false) => Compass::NorthEast,
                (false, false, _) => Compass::West,
                (false, true, true) => Compass::SouthWest,
                (false, true, false) => Compass::NorthWest,
            }
        } else {
            let diagonal = 2 * ax >= ay;
            match (dy > 0, diagonal, dx > 0) {
                (true, false, _) => Compass::South,
                (true, true, true) => Compass::SouthEast,
                (true, true, false) => Compass::SouthWest,
                (false, false, _) => Compass::North,
                (false, true, true) => Compass::NorthEast,
                (false, true, false) => Compass::NorthWest,
            }
        }
    }
}
