use crate::constants::{
    player_move_delay_ms, SPRINT_COOLDOWN_MS, STAR_COUNT, STEALTH_CHARGES, STEALTH_DURATION_MS,
};
use crate::grid::{Direction, Position};
use crate::maze::Maze;
use crate::types::PlayerView;

/// Player position, pickups and timed abilities.
///
/// Every timer is an absolute session instant in milliseconds. A timer is
/// active while `now_ms < until`; zero never counts as active.
#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Position,
    pub stars_collected: u32,
    pub stealth_charges: u32,
    pub stealth_until: u64,
    pub invincible_until: u64,
    pub wall_pass_until: u64,
    pub sprint_cooldown_until: u64,
    pub last_move_direction: Direction,
    last_move_at: Option<u64>,
}

impl Player {
    pub fn new(pos: Position) -> Self {
        Self {
            pos,
            stars_collected: 0,
            stealth_charges: STEALTH_CHARGES,
            stealth_until: 0,
            invincible_until: 0,
            wall_pass_until: 0,
            sprint_cooldown_until: 0,
            last_move_direction: Direction::None,
            last_move_at: None,
        }
    }

    pub fn can_sprint(&self, now_ms: u64) -> bool {
        now_ms >= self.sprint_cooldown_until
    }

    /// Attempts one step. Returns `false` without touching any state when the
    /// move delay has not elapsed, the target is off-grid, or it is a wall
    /// while wall-pass is inactive. A successful sprinted step arms the sprint
    /// cooldown.
    pub fn try_move(&mut self, dir: Direction, sprint_held: bool, maze: &Maze, now_ms: u64) -> bool {
        if dir == Direction::None {
            return false;
        }
        let sprinting = sprint_held && self.can_sprint(now_ms);
        if let Some(last) = self.last_move_at {
            if now_ms.saturating_sub(last) < player_move_delay_ms(sprinting) {
                return false;
            }
        }

        let target = self.pos.offset(dir);
        if !maze.in_bounds(target) {
            return false;
        }
        if !maze.is_open(target) && !self.is_wall_passing(now_ms) {
            return false;
        }

        self.pos = target;
        self.last_move_at = Some(now_ms);
        self.last_move_direction = dir;
        if sprinting {
            self.sprint_cooldown_until = now_ms + SPRINT_COOLDOWN_MS;
        }
        true
    }

    /// Spends a charge and opens a stealth window. Fails when out of charges or
    /// still stealthed at `now_ms`. A lapsed window is replaced, so callers
    /// that report expiry run `expire_stealth` first.
    pub fn activate_stealth(&mut self, now_ms: u64) -> bool {
        if self.stealth_charges == 0 || self.is_stealthed(now_ms) {
            return false;
        }
        self.stealth_until = now_ms + STEALTH_DURATION_MS;
        self.stealth_charges -= 1;
        true
    }

    /// Clears a lapsed stealth window. Returns `true` exactly once per window,
    /// on the first call at or after its expiry.
    pub fn expire_stealth(&mut self, now_ms: u64) -> bool {
        if self.stealth_until != 0 && now_ms >= self.stealth_until {
            self.stealth_until = 0;
            return true;
        }
        false
    }

    pub fn is_stealthed(&self, now_ms: u64) -> bool {
        now_ms < self.stealth_until
    }

    pub fn is_invincible(&self, now_ms: u64) -> bool {
        now_ms < self.invincible_until
    }

    pub fn is_wall_passing(&self, now_ms: u64) -> bool {
        now_ms < self.wall_pass_until
    }

    pub fn has_all_stars(&self) -> bool {
        self.stars_collected >= STAR_COUNT
    }

    pub fn view(&self, now_ms: u64) -> PlayerView {
        PlayerView {
            x: self.pos.x,
            y: self.pos.y,
            stars_collected: self.stars_collected,
            stealth_charges: self.stealth_charges,
            stealth_remaining_ms: remaining(self.stealth_until, now_ms),
            invincible_remaining_ms: remaining(self.invincible_until, now_ms),
            wall_pass_remaining_ms: remaining(self.wall_pass_until, now_ms),
            sprint_cooldown_remaining_ms: remaining(self.sprint_cooldown_until, now_ms),
            last_move_direction: self.last_move_direction,
        }
    }
}

fn remaining(until: u64, now_ms: u64) -> u64 {
    until.saturating_sub(now_ms)
}
