use crate::grid::{Direction, Position};
use crate::maze::Maze;
use crate::pathfinding::find_path;
use crate::session::Session;
use crate::types::{GamePhase, TickInput};

const STEALTH_THREAT_STEPS: i32 = 2;
const SPRINT_THREAT_STEPS: i32 = 4;

/// Scripted input source for headless runs: heads for the nearest star, then
/// the exit, and reacts to pursuers closing in.
#[derive(Clone, Copy, Debug, Default)]
pub struct Autopilot;

impl Autopilot {
    pub fn decide(&self, session: &Session) -> TickInput {
        match session.phase() {
            GamePhase::Menu => TickInput {
                start: true,
                ..TickInput::default()
            },
            GamePhase::Playing => self.drive(session),
            GamePhase::Won | GamePhase::Lost => TickInput::default(),
        }
    }

    fn drive(&self, session: &Session) -> TickInput {
        let player = session.player();
        let now_ms = session.now_ms();

        let targets: Vec<Position> = if session.stars().is_empty() {
            session.exit().into_iter().collect()
        } else {
            session.stars().to_vec()
        };
        let mut input = next_direction(session.maze(), player.pos, &targets)
            .map(TickInput::moving)
            .unwrap_or_default();

        let threat = session
            .pursuers()
            .iter()
            .map(|pursuer| pursuer.pos.manhattan(player.pos))
            .min();
        let (stealth, sprint) = react_to_threat(
            threat,
            player.is_stealthed(now_ms),
            player.stealth_charges,
        );
        input.stealth = stealth;
        input.sprint = sprint;
        input
    }
}

/// First step toward whichever target has the shortest path. Earlier targets
/// win ties.
pub fn next_direction(maze: &Maze, from: Position, targets: &[Position]) -> Option<Direction> {
    let mut best: Option<Vec<Position>> = None;
    for target in targets {
        let path = find_path(maze, from, *target);
        if path.is_empty() {
            continue;
        }
        if best.as_ref().is_none_or(|current| path.len() < current.len()) {
            best = Some(path);
        }
    }
    let next = best?.first().copied()?;
    Direction::between(from, next)
}

/// Returns `(stealth, sprint)` for the nearest pursuer distance in steps.
pub fn react_to_threat(nearest: Option<i32>, stealthed: bool, charges: u32) -> (bool, bool) {
    let Some(distance) = nearest else {
        return (false, false);
    };
    let stealth = distance <= STEALTH_THREAT_STEPS && !stealthed && charges > 0;
    let sprint = distance <= SPRINT_THREAT_STEPS;
    (stealth, sprint)
}
