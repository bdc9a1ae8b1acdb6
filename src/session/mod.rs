use crate::constants::{
    exit_min_distance, pursuer_max_distance, ENHANCED_MIN_DISTANCE, ENHANCED_UNLOCK_STARS,
    EVENT_BOX_MIN_DISTANCE, GLOBAL_EVENT_DURATION_MS, MAZE_HEIGHT, MAZE_WIDTH,
    MINIMAP_DURATION_MS, MINIMAP_MIN_DISTANCE, NOTICE_ANOMALY_MS, NOTICE_LONG_MS, NOTICE_MS,
    NOTICE_PLACEMENT_MS, PURSUER_MIN_DISTANCE, STAR_COUNT, STAR_MIN_DISTANCE, STEALTH_CHARGES,
    TIME_LIMIT_MS,
};
use crate::grid::{Compass, Position};
use crate::maze::{generate_maze, Maze, START};
use crate::player::Player;
use crate::pursuer::{generate_patrol_route, Pursuer, PursuitContext};
use crate::rng::SimRng;
use crate::types::{
    ActiveEventView, GamePhase, GlobalEventKind, Notice, OutcomeReason, PlacedItem,
    RuntimeEvent, SessionSummary, Snapshot, StarView, TickInput,
};

mod event_system;
mod spawn_system;
mod utils;

use self::utils::{now_ms, open_cells_where, remaining_ms};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ActiveEvent {
    kind: GlobalEventKind,
    until_ms: u64,
}

#[derive(Clone, Debug)]
pub struct SessionOptions {
    pub width: i32,
    pub height: i32,
    pub time_limit_ms: u64,
    pub seed: u64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            width: MAZE_WIDTH,
            height: MAZE_HEIGHT,
            time_limit_ms: TIME_LIMIT_MS,
            seed: now_ms(),
        }
    }
}

/// Owns the maze, the player and every pursuer, and advances them one tick
/// at a time against a single simulation clock.
#[derive(Clone, Debug)]
pub struct Session {
    pub options: SessionOptions,

    rng: SimRng,
    phase: GamePhase,
    maze: Maze,
    player: Player,
    pursuers: Vec<Pursuer>,
    stars: Vec<Position>,
    minimap_item: Option<Position>,
    minimap_active_until: u64,
    event_box: Option<Position>,
    exit: Option<Position>,
    exit_attempted: bool,
    active_event: Option<ActiveEvent>,
    enhanced_spawned: bool,
    notices: Vec<Notice>,
    events: Vec<RuntimeEvent>,
    events_triggered: Vec<GlobalEventKind>,

    elapsed_ms: u64,
    tick_counter: u64,
    end_reason: Option<OutcomeReason>,
    next_id_counter: u64,
}

impl Session {
    pub fn new(options: SessionOptions) -> Self {
        let rng = SimRng::new(options.seed);
        let mut session = Self {
            options,
            rng,
            phase: GamePhase::Menu,
            maze: Maze::filled(0, 0),
            player: Player::new(START),
            pursuers: Vec::new(),
            stars: Vec::new(),
            minimap_item: None,
            minimap_active_until: 0,
            event_box: None,
            exit: None,
            exit_attempted: false,
            active_event: None,
            enhanced_spawned: false,
            notices: Vec::new(),
            events: Vec::new(),
            events_triggered: Vec::new(),
            elapsed_ms: 0,
            tick_counter: 0,
            end_reason: None,
            next_id_counter: 0,
        };
        session.build_world();
        session
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn now_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn pursuers(&self) -> &[Pursuer] {
        &self.pursuers
    }

    pub fn stars(&self) -> &[Position] {
        &self.stars
    }

    pub fn exit(&self) -> Option<Position> {
        self.exit
    }

    pub fn is_minimap_active(&self) -> bool {
        self.elapsed_ms < self.minimap_active_until
    }

    /// Menu -> Playing. Ignored in any other phase.
    pub fn start(&mut self) -> bool {
        if self.phase != GamePhase::Menu {
            return false;
        }
        self.begin_playing();
        true
    }

    /// Won/Lost -> a freshly generated Playing session. Ignored otherwise.
    pub fn reset(&mut self) -> bool {
        if !self.phase.is_terminal() {
            return false;
        }
        self.build_world();
        self.begin_playing();
        true
    }

    /// Fire-and-forget announcement, visible for `duration_ms` of simulation time.
    pub fn notify(&mut self, text: impl Into<String>, duration_ms: u64) {
        self.notices.push(Notice {
            text: text.into(),
            posted_at_ms: self.elapsed_ms,
            duration_ms,
        });
    }

    pub fn step(&mut self, dt_ms: u64, input: &TickInput) {
        if input.start && self.start() {
            return;
        }
        if input.reset && self.reset() {
            return;
        }
        if self.phase != GamePhase::Playing {
            return;
        }

        self.tick_counter += 1;
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        let now_ms = self.elapsed_ms;

        if self.player.expire_stealth(now_ms) {
            self.events.push(RuntimeEvent::StealthEnded);
            self.notify("Stealth off", NOTICE_MS);
        }
        if input.stealth {
            self.try_stealth(now_ms);
        }
        self.player
            .try_move(input.direction(), input.sprint, &self.maze, now_ms);

        if self.elapsed_ms > self.options.time_limit_ms {
            self.finish(GamePhase::Lost, OutcomeReason::Timeout);
            return;
        }

        self.collect_stars();
        self.collect_minimap_item(now_ms);
        self.open_event_box(now_ms);
        self.expire_event(now_ms);

        if self.player.has_all_stars() && self.exit == Some(self.player.pos) {
            self.finish(GamePhase::Won, OutcomeReason::Escaped);
            return;
        }

        self.update_pursuers(now_ms);
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let now_ms = self.elapsed_ms;
        self.notices.retain(|notice| notice.is_visible(now_ms));
        let player_pos = self.player.pos;

        Snapshot {
            tick: self.tick_counter,
            phase: self.phase,
            elapsed_ms: now_ms,
            time_left_ms: self.options.time_limit_ms.saturating_sub(now_ms),
            maze: self.maze.to_rows(),
            player: self.player.view(now_ms),
            pursuers: self.pursuers.iter().map(Pursuer::view).collect(),
            stars: self
                .stars
                .iter()
                .map(|star| StarView {
                    x: star.x,
                    y: star.y,
                    bearing: Compass::bearing(player_pos, *star),
                })
                .collect(),
            minimap_item: self.minimap_item,
            minimap_remaining_ms: remaining_ms(self.minimap_active_until, now_ms),
            event_box: self.event_box,
            exit: self.exit,
            active_event: self.active_event.map(|active| ActiveEventView {
                kind: active.kind,
                remaining_ms: remaining_ms(active.until_ms, now_ms),
            }),
            notices: self.notices.clone(),
            events: if include_events {
                std::mem::take(&mut self.events)
            } else {
                Vec::new()
            },
        }
    }

    pub fn build_summary(&self) -> SessionSummary {
        SessionSummary {
            reason: self.end_reason,
            phase: self.phase,
            duration_ms: self.elapsed_ms,
            stars_collected: self.player.stars_collected,
            stealth_used: STEALTH_CHARGES.saturating_sub(self.player.stealth_charges),
            enhanced_spawned: self.enhanced_spawned,
            exit_revealed: self.exit.is_some(),
            events_triggered: self.events_triggered.clone(),
        }
    }

    fn build_world(&mut self) {
        self.maze = generate_maze(self.options.width, self.options.height, &mut self.rng);
        self.player = Player::new(START);
        self.pursuers.clear();
        self.stars.clear();
        self.minimap_item = None;
        self.minimap_active_until = 0;
        self.event_box = None;
        self.exit = None;
        self.exit_attempted = false;
        self.active_event = None;
        self.enhanced_spawned = false;
        self.notices.clear();
        self.events.clear();
        self.events_triggered.clear();
        self.elapsed_ms = 0;
        self.tick_counter = 0;
        self.end_reason = None;
        self.next_id_counter = 0;

        self.place_stars();
        self.place_minimap_item();
        self.place_event_box();
        self.place_pursuers();
    }

    fn begin_playing(&mut self) {
        self.phase = GamePhase::Playing;
        self.events.push(RuntimeEvent::PhaseChanged {
            phase: GamePhase::Playing,
        });
        self.notify("Welcome to the star maze!", NOTICE_MS);
        self.notify(
            format!("Collect {STAR_COUNT} stars to summon the exit!"),
            NOTICE_LONG_MS,
        );
    }

    fn finish(&mut self, phase: GamePhase, reason: OutcomeReason) {
        self.phase = phase;
        self.end_reason = Some(reason);
        self.events.push(RuntimeEvent::PhaseChanged { phase });
        let text = match reason {
            OutcomeReason::Escaped => "You escaped!",
            OutcomeReason::Caught => "Caught!",
            OutcomeReason::Timeout => "Time is up!",
        };
        self.notify(text, NOTICE_LONG_MS);
    }

    fn try_stealth(&mut self, now_ms: u64) {
        if !self.player.activate_stealth(now_ms) {
            return;
        }
        let charges_left = self.player.stealth_charges;
        self.events.push(RuntimeEvent::StealthStarted { charges_left });
        self.notify(format!("Stealth on! ({charges_left} left)"), NOTICE_MS);
    }

    fn collect_stars(&mut self) {
        let pos = self.player.pos;
        let before = self.stars.len();
        self.stars.retain(|star| *star != pos);
        if self.stars.len() == before {
            return;
        }

        self.player.stars_collected += 1;
        let total = self.player.stars_collected;
        self.events.push(RuntimeEvent::StarCollected {
            x: pos.x,
            y: pos.y,
            total,
        });
        self.notify(format!("Star collected! ({total}/{STAR_COUNT})"), NOTICE_MS);

        if total == ENHANCED_UNLOCK_STARS {
            self.spawn_enhanced_pursuer();
        }
        if total == STAR_COUNT && self.exit.is_none() {
            self.generate_exit();
        }
    }

    fn collect_minimap_item(&mut self, now_ms: u64) {
        if self.minimap_item != Some(self.player.pos) {
            return;
        }
        self.minimap_item = None;
        self.minimap_active_until = now_ms.saturating_add(MINIMAP_DURATION_MS);
        self.events.push(RuntimeEvent::MinimapCollected);
        self.notify("Minimap on! The whole maze is visible for 5 seconds", NOTICE_LONG_MS);
    }

    fn open_event_box(&mut self, now_ms: u64) {
        if self.event_box != Some(self.player.pos) {
            return;
        }
        self.event_box = None;
        let Some(kind) = self.rng.choose(&GlobalEventKind::ALL) else {
            return;
        };
        self.events.push(RuntimeEvent::EventBoxOpened { kind });
        self.activate_event(kind, now_ms);
    }

    fn update_pursuers(&mut self, now_ms: u64) {
        let player_pos = self.player.pos;
        let stealthed = self.player.is_stealthed(now_ms);
        let immune = stealthed || self.player.is_invincible(now_ms);
        let ctx = PursuitContext {
            maze: &self.maze,
            now_ms,
            player_pos,
            player_stealthed: stealthed,
            player_last_direction: self.player.last_move_direction,
        };

        let mut caught = false;
        for pursuer in &mut self.pursuers {
            pursuer.advance(&ctx, &mut self.rng);
            if pursuer.pos == player_pos && !immune {
                caught = true;
                break;
            }
        }
        if caught {
            self.finish(GamePhase::Lost, OutcomeReason::Caught);
        }
    }

    fn make_id(&mut self, prefix: &str) -> String {
        let id = format!("{}_{}", prefix, self.next_id_counter);
        self.next_id_counter = self.next_id_counter.saturating_add(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::{Session, SessionOptions};
    use crate::constants::{
        pursuer_max_distance, DETECTOR_MOVE_DELAY_MS, ENHANCED_MIN_DISTANCE,
        EVENT_BOX_MIN_DISTANCE, GLOBAL_EVENT_DURATION_MS, MAZE_HEIGHT, MAZE_WIDTH,
        MINIMAP_DURATION_MS, MINIMAP_MIN_DISTANCE, PATROL_MOVE_DELAY_MS, PURSUER_MIN_DISTANCE,
        STAR_COUNT, STAR_MIN_DISTANCE, STEALTH_CHARGES, STEALTH_DURATION_MS, TICK_MS,
    };
    use crate::grid::Position;
    use crate::maze::START;
    use crate::pursuer::Pursuer;
    use crate::types::{
        GamePhase, GlobalEventKind, OutcomeReason, PursuerKind, RuntimeEvent, TickInput,
    };

    fn make_session(seed: u64) -> Session {
        Session::new(SessionOptions {
            width: MAZE_WIDTH,
            height: MAZE_HEIGHT,
            time_limit_ms: 60_000,
            seed,
        })
    }

    /// Playing session with no pursuers so nothing can end it by accident.
    fn quiet_session(seed: u64) -> Session {
        let mut session = make_session(seed);
        assert!(session.start());
        session.pursuers.clear();
        session
    }

    fn idle(session: &mut Session, ticks: usize) {
        for _ in 0..ticks {
            session.step(TICK_MS, &TickInput::default());
        }
    }

    fn count_events(events: &[RuntimeEvent], pred: impl Fn(&RuntimeEvent) -> bool) -> usize {
        events.iter().filter(|event| pred(event)).count()
    }

    #[test]
    fn menu_waits_for_start_trigger() {
        let mut session = make_session(1);
        assert_eq!(session.phase(), GamePhase::Menu);
        idle(&mut session, 5);
        assert_eq!(session.now_ms(), 0);
        assert!(!session.reset());

        session.step(
            TICK_MS,
            &TickInput {
                start: true,
                ..TickInput::default()
            },
        );
        assert_eq!(session.phase(), GamePhase::Playing);
        assert!(!session.start());
    }

    #[test]
    fn same_seed_builds_same_world() {
        let a = make_session(42);
        let b = make_session(42);
        assert_eq!(a.maze, b.maze);
        assert_eq!(a.stars, b.stars);
        assert_eq!(a.minimap_item, b.minimap_item);
        assert_eq!(a.event_box, b.event_box);
        let a_pos: Vec<Position> = a.pursuers.iter().map(|p| p.pos).collect();
        let b_pos: Vec<Position> = b.pursuers.iter().map(|p| p.pos).collect();
        assert_eq!(a_pos, b_pos);
    }

    #[test]
    fn initial_placement_respects_distance_rules() {
        for seed in 0..40u64 {
            let session = make_session(seed);
            let player = session.player.pos;
            assert_eq!(player, START);

            assert_eq!(session.stars.len(), STAR_COUNT as usize);
            for star in &session.stars {
                assert!(session.maze.is_open(*star));
                assert!(star.distance_to(player) > STAR_MIN_DISTANCE, "seed={seed}");
            }

            let minimap = session.minimap_item.expect("minimap placed");
            assert!(session.maze.is_open(minimap));
            assert!(minimap.distance_to(player) >= MINIMAP_MIN_DISTANCE);
            assert!(!session.stars.contains(&minimap));

            let event_box = session.event_box.expect("event box placed");
            assert!(event_box.distance_to(player) >= EVENT_BOX_MIN_DISTANCE);
            assert!(!session.stars.contains(&event_box));
            assert_ne!(event_box, minimap);

            let kinds: Vec<PursuerKind> = session.pursuers.iter().map(Pursuer::kind).collect();
            assert_eq!(kinds, vec![PursuerKind::Patrol, PursuerKind::Detector]);
            assert_ne!(session.pursuers[0].pos, session.pursuers[1].pos);
            for pursuer in &session.pursuers {
                let distance = pursuer.pos.distance_to(player);
                assert!(distance >= PURSUER_MIN_DISTANCE);
                assert!(distance <= pursuer_max_distance(MAZE_WIDTH));
                assert_ne!(pursuer.pos, minimap);
                assert_ne!(pursuer.pos, event_box);
            }
        }
    }

    #[test]
    fn build_snapshot_drains_events_when_requested() {
        let mut session = quiet_session(3);
        let first = session.build_snapshot(false);
        assert!(first.events.is_empty());
        let second = session.build_snapshot(true);
        assert!(!second.events.is_empty());
        let third = session.build_snapshot(true);
        assert!(third.events.is_empty());
    }

    #[test]
    fn fifth_star_reveals_exit_once_and_exit_wins() {
        let mut session = quiet_session(7);
        session.build_snapshot(true);
        session.player.stars_collected = STAR_COUNT - 1;
        session.stars = vec![START];

        idle(&mut session, 1);
        assert_eq!(session.player.stars_collected, STAR_COUNT);
        let exit = session.exit.expect("exit generated");
        assert!(session.maze.is_on_border_ring(exit));
        assert!(session.maze.is_open(exit));

        idle(&mut session, 10);
        assert_eq!(session.exit, Some(exit));
        let events = session.build_snapshot(true).events;
        assert_eq!(
            count_events(&events, |e| matches!(e, RuntimeEvent::ExitRevealed { .. })),
            1
        );

        session.player.pos = exit;
        idle(&mut session, 1);
        assert_eq!(session.phase(), GamePhase::Won);
        assert_eq!(session.build_summary().reason, Some(OutcomeReason::Escaped));
    }

    #[test]
    fn exit_cell_without_all_stars_does_not_win() {
        let mut session = quiet_session(8);
        let ring = session.maze.border_ring_open_cells();
        let spot = *ring.last().expect("ring has open cells");
        session.exit = Some(spot);
        session.player.pos = spot;
        session.player.stars_collected = STAR_COUNT - 1;
        session.stars.retain(|star| *star != spot);
        idle(&mut session, 3);
        assert_eq!(session.phase(), GamePhase::Playing);

        session.exit = None;
        session.player.stars_collected = STAR_COUNT;
        idle(&mut session, 3);
        assert_eq!(session.phase(), GamePhase::Playing);
    }

    #[test]
    fn enhanced_pursuer_unlocks_exactly_once_at_three_stars() {
        let mut session = quiet_session(11);
        session.player.invincible_until = u64::MAX;

        session.player.stars_collected = 1;
        session.stars = vec![START];
        idle(&mut session, 1);
        assert_eq!(session.player.stars_collected, 2);
        assert!(session.pursuers.is_empty());

        session.stars = vec![START];
        idle(&mut session, 1);
        assert_eq!(session.player.stars_collected, 3);
        assert_eq!(session.pursuers.len(), 1);
        let enhanced = &session.pursuers[0];
        assert_eq!(enhanced.kind(), PursuerKind::Enhanced);

        session.stars = vec![START];
        idle(&mut session, 10);
        assert_eq!(session.player.stars_collected, 4);
        assert_eq!(session.pursuers.len(), 1);
        let events = session.build_snapshot(true).events;
        assert_eq!(
            count_events(&events, |e| {
                matches!(e, RuntimeEvent::EnhancedPursuerSpawned { .. })
            }),
            1
        );
        assert!(session.build_summary().enhanced_spawned);
    }

    #[test]
    fn enhanced_spawns_far_from_player() {
        for seed in 0..20u64 {
            let mut session = quiet_session(seed);
            session.player.stars_collected = 2;
            session.spawn_enhanced_pursuer();
            let enhanced = session.pursuers.last().expect("enhanced spawned");
            assert!(enhanced.pos.distance_to(session.player.pos) > ENHANCED_MIN_DISTANCE);
        }
    }

    #[test]
    fn stealth_and_invincibility_block_capture() {
        let mut session = quiet_session(13);
        let here = session.player.pos;
        session
            .pursuers
            .push(Pursuer::detector("detector_x".to_string(), here));

        session.player.invincible_until = 400;
        idle(&mut session, 2);
        assert_eq!(session.phase(), GamePhase::Playing);

        session.step(
            TICK_MS,
            &TickInput {
                stealth: true,
                ..TickInput::default()
            },
        );
        assert_eq!(session.phase(), GamePhase::Playing);
        assert_eq!(session.player.stealth_charges, STEALTH_CHARGES - 1);

        // stealth ends; invincibility ran out long before
        let ticks = (STEALTH_DURATION_MS / TICK_MS) as usize + 1;
        idle(&mut session, ticks);
        assert_eq!(session.phase(), GamePhase::Lost);
        assert_eq!(session.build_summary().reason, Some(OutcomeReason::Caught));
    }

    #[test]
    fn stealth_start_and_end_are_reported_once() {
        let mut session = quiet_session(14);
        session.build_snapshot(true);
        session.step(
            TICK_MS,
            &TickInput {
                stealth: true,
                ..TickInput::default()
            },
        );
        // repeated trigger while active is ignored
        session.step(
            TICK_MS,
            &TickInput {
                stealth: true,
                ..TickInput::default()
            },
        );
        idle(&mut session, (STEALTH_DURATION_MS / TICK_MS) as usize + 2);
        let events = session.build_snapshot(true).events;
        assert_eq!(
            count_events(&events, |e| matches!(e, RuntimeEvent::StealthStarted { .. })),
            1
        );
        assert_eq!(
            count_events(&events, |e| matches!(e, RuntimeEvent::StealthEnded)),
            1
        );
        assert_eq!(session.build_summary().stealth_used, 1);
    }

    #[test]
    fn stealth_pressed_on_the_lapse_tick_restarts_it() {
        let mut session = quiet_session(15);
        let press = TickInput {
            stealth: true,
            ..TickInput::default()
        };
        session.step(TICK_MS, &press);
        let until = session.player.stealth_until;
        assert_eq!(until, TICK_MS + STEALTH_DURATION_MS);
        session.build_snapshot(true);
        while session.now_ms() + TICK_MS < until {
            session.step(TICK_MS, &TickInput::default());
        }
        assert!(session.player.is_stealthed(session.now_ms()));

        let charges_before = session.player.stealth_charges;
        session.step(TICK_MS, &press);
        assert_eq!(session.now_ms(), until);
        assert_eq!(session.player.stealth_charges, charges_before - 1);
        assert!(session.player.is_stealthed(session.now_ms()));
        let events = session.build_snapshot(true).events;
        let ended = events
            .iter()
            .position(|e| matches!(e, RuntimeEvent::StealthEnded));
        let started = events
            .iter()
            .position(|e| matches!(e, RuntimeEvent::StealthStarted { .. }));
        assert!(ended.is_some());
        assert!(ended < started);
    }

    #[test]
    fn time_limit_ends_session_with_timeout() {
        let mut session = Session::new(SessionOptions {
            width: MAZE_WIDTH,
            height: MAZE_HEIGHT,
            time_limit_ms: 1_000,
            seed: 5,
        });
        session.start();
        session.pursuers.clear();

        idle(&mut session, (1_000 / TICK_MS) as usize);
        assert_eq!(session.phase(), GamePhase::Playing);
        idle(&mut session, 1);
        assert_eq!(session.phase(), GamePhase::Lost);
        assert_eq!(session.build_summary().reason, Some(OutcomeReason::Timeout));

        // terminal phases ignore further ticks
        let frozen = session.now_ms();
        idle(&mut session, 5);
        assert_eq!(session.now_ms(), frozen);
    }

    #[test]
    fn invincible_event_sets_and_clears_player_timer() {
        let mut session = quiet_session(17);
        idle(&mut session, 1);
        let now = session.now_ms();
        session.activate_event(GlobalEventKind::Invincible, now);
        assert!(session.player.is_invincible(now));
        assert_eq!(session.player.invincible_until, now + GLOBAL_EVENT_DURATION_MS);

        idle(&mut session, (GLOBAL_EVENT_DURATION_MS / TICK_MS) as usize);
        assert!(session.active_event_kind().is_none());
        assert_eq!(session.player.invincible_until, 0);
        let events = session.build_snapshot(true).events;
        assert_eq!(
            count_events(&events, |e| matches!(
                e,
                RuntimeEvent::GlobalEventEnded {
                    kind: GlobalEventKind::Invincible
                }
            )),
            1
        );
    }

    #[test]
    fn speed_up_halves_and_restores_pursuer_delays() {
        let mut session = make_session(19);
        session.start();
        session.player.invincible_until = u64::MAX;
        session.activate_event(GlobalEventKind::EnemySpeedUp, 0);
        assert_eq!(session.pursuers[0].move_delay_ms, PATROL_MOVE_DELAY_MS / 2);
        assert_eq!(session.pursuers[1].move_delay_ms, DETECTOR_MOVE_DELAY_MS / 2);

        // an enhanced pursuer joining mid-event starts sped up too
        session.spawn_enhanced_pursuer();
        let enhanced = session.pursuers.last().expect("enhanced spawned");
        assert_eq!(enhanced.move_delay_ms, enhanced.base_move_delay_ms / 2);

        session.expire_event(GLOBAL_EVENT_DURATION_MS);
        for pursuer in &session.pursuers {
            assert_eq!(pursuer.move_delay_ms, pursuer.base_move_delay_ms);
        }
    }

    #[test]
    fn new_event_replaces_running_one() {
        let mut session = quiet_session(21);
        session.activate_event(GlobalEventKind::WallPass, 100);
        assert!(session.player.is_wall_passing(100));
        session.activate_event(GlobalEventKind::MapDark, 200);
        assert!(!session.player.is_wall_passing(200));
        assert!(session.is_map_dark());
        assert_eq!(
            session.build_summary().events_triggered,
            vec![GlobalEventKind::WallPass, GlobalEventKind::MapDark]
        );
    }

    #[test]
    fn event_box_pickup_starts_an_event() {
        let mut session = quiet_session(23);
        session.event_box = Some(session.player.pos);
        idle(&mut session, 1);
        assert!(session.event_box.is_none());
        let snapshot = session.build_snapshot(true);
        let active = snapshot.active_event.expect("event running");
        assert!(active.remaining_ms <= GLOBAL_EVENT_DURATION_MS);
        assert_eq!(
            count_events(&snapshot.events, |e| matches!(e, RuntimeEvent::EventBoxOpened { .. })),
            1
        );
    }

    #[test]
    fn minimap_pickup_opens_visibility_window() {
        let mut session = quiet_session(29);
        session.minimap_item = Some(session.player.pos);
        idle(&mut session, 1);
        assert!(session.minimap_item.is_none());
        assert!(session.is_minimap_active());
        assert_eq!(session.build_snapshot(false).minimap_remaining_ms, MINIMAP_DURATION_MS);
        idle(&mut session, (MINIMAP_DURATION_MS / TICK_MS) as usize);
        assert!(!session.is_minimap_active());
    }

    #[test]
    fn reset_only_from_terminal_phase_and_rebuilds_world() {
        let mut session = quiet_session(31);
        assert!(!session.reset());
        session.player.stars_collected = 2;
        session.finish(GamePhase::Lost, OutcomeReason::Caught);

        session.step(
            TICK_MS,
            &TickInput {
                reset: true,
                ..TickInput::default()
            },
        );
        assert_eq!(session.phase(), GamePhase::Playing);
        assert_eq!(session.now_ms(), 0);
        assert_eq!(session.player.stars_collected, 0);
        assert_eq!(session.stars.len(), STAR_COUNT as usize);
        assert_eq!(session.pursuers.len(), 2);
        assert!(session.build_summary().reason.is_none());

        // undrained events from the previous round do not carry over
        let events = session.build_snapshot(true).events;
        assert!(!events.iter().any(|e| matches!(
            e,
            RuntimeEvent::PhaseChanged {
                phase: GamePhase::Lost
            }
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            RuntimeEvent::PhaseChanged {
                phase: GamePhase::Playing
            }
        )));
    }

    #[test]
    fn expired_notices_drop_out_of_snapshots() {
        let mut session = quiet_session(37);
        session.notices.clear();
        session.notify("short", 100);
        assert_eq!(session.build_snapshot(false).notices.len(), 1);
        idle(&mut session, 1);
        assert_eq!(session.build_snapshot(false).notices.len(), 1);
        idle(&mut session, 1);
        assert!(session.build_snapshot(false).notices.is_empty());
    }

    #[test]
    fn snapshot_reports_star_bearings_and_time_left() {
        let mut session = quiet_session(41);
        idle(&mut session, 4);
        let snapshot = session.build_snapshot(false);
        assert_eq!(snapshot.stars.len(), STAR_COUNT as usize);
        assert_eq!(snapshot.time_left_ms, 60_000 - 4 * TICK_MS);
        assert_eq!(snapshot.maze.len(), MAZE_HEIGHT as usize);
        assert_eq!(snapshot.player.stealth_charges, STEALTH_CHARGES);
    }
}
