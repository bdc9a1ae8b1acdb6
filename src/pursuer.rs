use std::collections::VecDeque;

use crate::constants::{
    sped_up_delay_ms, DETECTOR_MOVE_DELAY_MS, ENHANCED_MOVE_DELAY_MS, PATROL_MOVE_DELAY_MS,
    PATROL_STRIDE, PATROL_VISION_RADIUS, PATROL_WAYPOINTS, PREDICTION_STEPS,
};
use crate::grid::{Direction, Position};
use crate::maze::Maze;
use crate::pathfinding::find_path;
use crate::rng::SimRng;
use crate::types::{PursuerKind, PursuerView};

/// What a pursuer may know about the world during one tick. Built fresh by the
/// session each tick so every pursuer sees the same instant.
#[derive(Clone, Copy, Debug)]
pub struct PursuitContext<'a> {
    pub maze: &'a Maze,
    pub now_ms: u64,
    pub player_pos: Position,
    pub player_stealthed: bool,
    pub player_last_direction: Direction,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatrolState {
    pub waypoints: Vec<Position>,
    pub index: usize,
    pub chasing: bool,
    pub last_seen: Option<Position>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnhancedState {
    pub last_known: Option<Position>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Behavior {
    Patrol(PatrolState),
    Detector,
    Enhanced(EnhancedState),
}

impl Behavior {
    pub fn kind(&self) -> PursuerKind {
        match self {
            Behavior::Patrol(_) => PursuerKind::Patrol,
            Behavior::Detector => PursuerKind::Detector,
            Behavior::Enhanced(_) => PursuerKind::Enhanced,
        }
    }

    fn base_delay_ms(&self) -> u64 {
        match self {
            Behavior::Patrol(_) => PATROL_MOVE_DELAY_MS,
            Behavior::Detector => DETECTOR_MOVE_DELAY_MS,
            Behavior::Enhanced(_) => ENHANCED_MOVE_DELAY_MS,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Pursuer {
    pub id: String,
    pub pos: Position,
    pub behavior: Behavior,
    pub base_move_delay_ms: u64,
    pub move_delay_ms: u64,
    path: VecDeque<Position>,
    path_target: Option<Position>,
    last_move_at: Option<u64>,
}

impl Pursuer {
    pub fn new(id: String, pos: Position, behavior: Behavior) -> Self {
        let base = behavior.base_delay_ms();
        Self {
            id,
            pos,
            behavior,
            base_move_delay_ms: base,
            move_delay_ms: base,
            path: VecDeque::new(),
            path_target: None,
            last_move_at: None,
        }
    }

    pub fn patrol(id: String, pos: Position, waypoints: Vec<Position>) -> Self {
        Self::new(
            id,
            pos,
            Behavior::Patrol(PatrolState {
                waypoints,
                index: 0,
                chasing: false,
                last_seen: None,
            }),
        )
    }

    pub fn detector(id: String, pos: Position) -> Self {
        Self::new(id, pos, Behavior::Detector)
    }

    pub fn enhanced(id: String, pos: Position) -> Self {
        Self::new(id, pos, Behavior::Enhanced(EnhancedState::default()))
    }

    pub fn kind(&self) -> PursuerKind {
        self.behavior.kind()
    }

    pub fn pending_path(&self) -> impl Iterator<Item = &Position> {
        self.path.iter()
    }

    pub fn is_chasing(&self) -> bool {
        match &self.behavior {
            Behavior::Patrol(state) => state.chasing,
            Behavior::Detector => !self.path.is_empty(),
            Behavior::Enhanced(state) => state.last_known.is_some(),
        }
    }

    pub fn speed_up(&mut self) {
        self.move_delay_ms = sped_up_delay_ms(self.base_move_delay_ms);
    }

    pub fn restore_speed(&mut self) {
        self.move_delay_ms = self.base_move_delay_ms;
    }

    /// Rate gate. A granted slot is consumed even if the behaviour ends up
    /// standing still.
    pub fn can_move(&mut self, now_ms: u64) -> bool {
        if let Some(last) = self.last_move_at {
            if now_ms.saturating_sub(last) < self.move_delay_ms {
                return false;
            }
        }
        self.last_move_at = Some(now_ms);
        true
    }

    /// Runs one behaviour step. Returns `true` when the pursuer changed cell.
    pub fn advance(&mut self, ctx: &PursuitContext<'_>, rng: &mut SimRng) -> bool {
        if !self.can_move(ctx.now_ms) {
            return false;
        }
        match self.behavior {
            Behavior::Patrol(_) => self.patrol_step(ctx),
            Behavior::Detector => self.detector_step(ctx),
            Behavior::Enhanced(_) => self.enhanced_step(ctx, rng),
        }
    }

    fn patrol_step(&mut self, ctx: &PursuitContext<'_>) -> bool {
        let Behavior::Patrol(state) = &mut self.behavior else {
            return false;
        };
        let in_sight = !ctx.player_stealthed
            && self.pos.distance_to(ctx.player_pos) < PATROL_VISION_RADIUS;

        let mut chase_target = None;
        if in_sight {
            if !state.chasing || state.last_seen != Some(ctx.player_pos) {
                state.chasing = true;
                state.last_seen = Some(ctx.player_pos);
                chase_target = Some(ctx.player_pos);
            }
        } else if state.chasing {
            if Some(self.pos) == state.last_seen || self.path.is_empty() {
                state.chasing = false;
                state.last_seen = None;
                self.path.clear();
                self.path_target = None;
            } else {
                // keep heading for where the player was last seen
                return self.step_along(ctx.maze);
            }
        }

        let chasing = state.chasing;
        let mut patrol_target = None;
        if !chasing && !state.waypoints.is_empty() {
            if state.index >= state.waypoints.len() {
                state.index = 0;
            }
            if self.pos == state.waypoints[state.index] {
                state.index = (state.index + 1) % state.waypoints.len();
            }
            patrol_target = Some(state.waypoints[state.index]);
        }

        if let Some(target) = chase_target {
            self.replan(ctx.maze, target, true);
        } else if let Some(target) = patrol_target {
            self.replan(ctx.maze, target, false);
        }
        self.step_along(ctx.maze)
    }

    fn detector_step(&mut self, ctx: &PursuitContext<'_>) -> bool {
        if !ctx.player_stealthed {
            self.replan(ctx.maze, ctx.player_pos, false);
        } else if self.path.is_empty() {
            // hold position instead of wandering blind
            let here = self.pos;
            self.replan(ctx.maze, here, false);
        }
        self.step_along(ctx.maze)
    }

    fn enhanced_step(&mut self, ctx: &PursuitContext<'_>, rng: &mut SimRng) -> bool {
        let Behavior::Enhanced(state) = &mut self.behavior else {
            return false;
        };

        let mut target = None;
        if !ctx.player_stealthed {
            let predicted = ctx.player_pos
                + ctx.player_last_direction.delta().scaled(PREDICTION_STEPS);
            target = Some(if ctx.maze.is_open(predicted) {
                predicted
            } else {
                ctx.player_pos
            });
            state.last_known = Some(ctx.player_pos);
        } else if let Some(last_known) = state.last_known {
            if self.pos == last_known {
                state.last_known = None;
                self.path.clear();
                self.path_target = None;
            } else {
                target = Some(last_known);
            }
        } else if self.path.is_empty() {
            target = ctx.maze.random_open_cell(rng);
        }

        if let Some(target) = target {
            self.replan(ctx.maze, target, false);
        }
        self.step_along(ctx.maze)
    }

    /// Recomputes the pending path only when the target moved, the old path
    /// ran out, or `force` is set.
    fn replan(&mut self, maze: &Maze, target: Position, force: bool) {
        if !force && self.path_target == Some(target) && !self.path.is_empty() {
            return;
        }
        self.path = find_path(maze, self.pos, target).into();
        self.path_target = Some(target);
    }

    fn step_along(&mut self, maze: &Maze) -> bool {
        let Some(next) = self.path.front().copied() else {
            return false;
        };
        if !maze.is_open(next) || self.pos.manhattan(next) != 1 {
            self.path.clear();
            self.path_target = None;
            return false;
        }
        self.pos = next;
        self.path.pop_front();
        true
    }

    pub fn view(&self) -> PursuerView {
        PursuerView {
            id: self.id.clone(),
            x: self.pos.x,
            y: self.pos.y,
            kind: self.kind(),
            chasing: self.is_chasing(),
        }
    }
}

/// Random walk in strides of three cells; each stop must land on an open cell.
/// The walk starts at `start` and adds up to eight further stops.
pub fn generate_patrol_route(maze: &Maze, start: Position, rng: &mut SimRng) -> Vec<Position> {
    let mut route = vec![start];
    let mut current = start;
    for _ in 0..PATROL_WAYPOINTS {
        let options: Vec<Position> = Direction::CARDINALS
            .iter()
            .map(|dir| current + dir.delta().scaled(PATROL_STRIDE))
            .filter(|pos| maze.is_open(*pos))
            .collect();
        if let Some(next) = rng.choose(&options) {
            route.push(next);
            current = next;
        }
    }
    route
}
