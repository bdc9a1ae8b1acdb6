use serde::Serialize;

use crate::grid::{Compass, Direction, Position};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Menu,
    Playing,
    Won,
    Lost,
}

impl GamePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, GamePhase::Won | GamePhase::Lost)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PursuerKind {
    Patrol,
    Detector,
    Enhanced,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalEventKind {
    Invincible,
    WallPass,
    MapDark,
    EnemySpeedUp,
}

impl GlobalEventKind {
    pub const ALL: [GlobalEventKind; 4] = [
        GlobalEventKind::Invincible,
        GlobalEventKind::WallPass,
        GlobalEventKind::MapDark,
        GlobalEventKind::EnemySpeedUp,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GlobalEventKind::Invincible => "Invincible",
            GlobalEventKind::WallPass => "Wall pass",
            GlobalEventKind::MapDark => "Darkness",
            GlobalEventKind::EnemySpeedUp => "Enemies sped up",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeReason {
    Escaped,
    Caught,
    Timeout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacedItem {
    Star,
    MinimapItem,
    EventBox,
    Pursuer,
}

/// Movement intents and discrete triggers gathered by the input collaborator
/// for a single tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub sprint: bool,
    pub stealth: bool,
    pub start: bool,
    pub reset: bool,
}

impl TickInput {
    pub fn moving(dir: Direction) -> Self {
        let mut input = Self::default();
        match dir {
            Direction::Up => input.up = true,
            Direction::Down => input.down = true,
            Direction::Left => input.left = true,
            Direction::Right => input.right = true,
            Direction::None => {}
        }
        input
    }

    /// Only one direction is honoured per tick: up, then down, left, right.
    pub fn direction(&self) -> Direction {
        if self.up {
            Direction::Up
        } else if self.down {
            Direction::Down
        } else if self.left {
            Direction::Left
        } else if self.right {
            Direction::Right
        } else {
            Direction::None
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: i32,
    pub y: i32,
    #[serde(rename = "starsCollected")]
    pub stars_collected: u32,
    #[serde(rename = "stealthCharges")]
    pub stealth_charges: u32,
    #[serde(rename = "stealthRemainingMs")]
    pub stealth_remaining_ms: u64,
    #[serde(rename = "invincibleRemainingMs")]
    pub invincible_remaining_ms: u64,
    #[serde(rename = "wallPassRemainingMs")]
    pub wall_pass_remaining_ms: u64,
    #[serde(rename = "sprintCooldownRemainingMs")]
    pub sprint_cooldown_remaining_ms: u64,
    #[serde(rename = "lastMoveDirection")]
    pub last_move_direction: Direction,
}

#[derive(Clone, Debug, Serialize)]
pub struct PursuerView {
    pub id: String,
    pub x: i32,
    pub y: i32,
    #[serde(rename = "type")]
    pub kind: PursuerKind,
    pub chasing: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct StarView {
    pub x: i32,
    pub y: i32,
    pub bearing: Compass,
}

#[derive(Clone, Debug, Serialize)]
pub struct ActiveEventView {
    #[serde(rename = "type")]
    pub kind: GlobalEventKind,
    #[serde(rename = "remainingMs")]
    pub remaining_ms: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct Notice {
    pub text: String,
    #[serde(rename = "postedAtMs")]
    pub posted_at_ms: u64,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
}

impl Notice {
    pub fn is_visible(&self, now_ms: u64) -> bool {
        now_ms < self.posted_at_ms.saturating_add(self.duration_ms)
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    PhaseChanged {
        phase: GamePhase,
    },
    StarCollected {
        x: i32,
        y: i32,
        total: u32,
    },
    MinimapCollected,
    EventBoxOpened {
        #[serde(rename = "eventType")]
        kind: GlobalEventKind,
    },
    GlobalEventStarted {
        #[serde(rename = "eventType")]
        kind: GlobalEventKind,
    },
    GlobalEventEnded {
        #[serde(rename = "eventType")]
        kind: GlobalEventKind,
    },
    StealthStarted {
        #[serde(rename = "chargesLeft")]
        charges_left: u32,
    },
    StealthEnded,
    EnhancedPursuerSpawned {
        #[serde(rename = "pursuerId")]
        pursuer_id: String,
        x: i32,
        y: i32,
    },
    ExitRevealed {
        x: i32,
        y: i32,
        fallback: bool,
    },
    ExitUnavailable,
    PlacementShortfall {
        item: PlacedItem,
        wanted: usize,
        placed: usize,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub phase: GamePhase,
    #[serde(rename = "elapsedMs")]
    pub elapsed_ms: u64,
    #[serde(rename = "timeLeftMs")]
    pub time_left_ms: u64,
    pub maze: Vec<String>,
    pub player: PlayerView,
    pub pursuers: Vec<PursuerView>,
    pub stars: Vec<StarView>,
    #[serde(rename = "minimapItem")]
    pub minimap_item: Option<Position>,
    #[serde(rename = "minimapRemainingMs")]
    pub minimap_remaining_ms: u64,
    #[serde(rename = "eventBox")]
    pub event_box: Option<Position>,
    pub exit: Option<Position>,
    #[serde(rename = "activeEvent")]
    pub active_event: Option<ActiveEventView>,
    pub notices: Vec<Notice>,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionSummary {
    pub reason: Option<OutcomeReason>,
    pub phase: GamePhase,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
    #[serde(rename = "starsCollected")]
    pub stars_collected: u32,
    #[serde(rename = "stealthUsed")]
    pub stealth_used: u32,
    #[serde(rename = "enhancedSpawned")]
    pub enhanced_spawned: bool,
    #[serde(rename = "exitRevealed")]
    pub exit_revealed: bool,
    #[serde(rename = "eventsTriggered")]
    pub events_triggered: Vec<GlobalEventKind>,
}
