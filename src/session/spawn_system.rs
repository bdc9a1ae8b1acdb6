use super::*;

impl Session {
    pub(super) fn place_stars(&mut self) {
        let player = self.player.pos;
        let wanted = STAR_COUNT as usize;
        let mut pool = open_cells_where(&self.maze, |pos| {
            pos.distance_to(player) > STAR_MIN_DISTANCE
        });
        if pool.len() < wanted {
            pool = open_cells_where(&self.maze, |pos| pos != player);
        }
        self.stars = self.rng.sample(&pool, wanted);
        if self.stars.len() < wanted {
            self.report_shortfall(PlacedItem::Star, wanted, self.stars.len());
        }
    }

    pub(super) fn place_minimap_item(&mut self) {
        let player = self.player.pos;
        let stars = &self.stars;
        let spot = pick_spot(
            &self.maze,
            &mut self.rng,
            |pos| {
                pos != player
                    && pos.distance_to(player) >= MINIMAP_MIN_DISTANCE
                    && !stars.contains(&pos)
            },
            |pos| pos != player && !stars.contains(&pos),
        );
        self.minimap_item = spot;
        if spot.is_some() {
            self.notify("A minimap item has appeared!", NOTICE_PLACEMENT_MS);
        } else {
            self.report_shortfall(PlacedItem::MinimapItem, 1, 0);
        }
    }

    pub(super) fn place_event_box(&mut self) {
        let player = self.player.pos;
        let stars = &self.stars;
        let minimap = self.minimap_item;
        let spot = pick_spot(
            &self.maze,
            &mut self.rng,
            |pos| {
                pos != player
                    && pos.distance_to(player) >= EVENT_BOX_MIN_DISTANCE
                    && !stars.contains(&pos)
                    && minimap != Some(pos)
            },
            |pos| pos != player && !stars.contains(&pos) && minimap != Some(pos),
        );
        self.event_box = spot;
        if spot.is_some() {
            self.notify("A mystery box has appeared!", NOTICE_PLACEMENT_MS);
        } else {
            self.report_shortfall(PlacedItem::EventBox, 1, 0);
        }
    }

    /// One Patrol and one Detector on distinct cells inside the starting
    /// distance band.
    pub(super) fn place_pursuers(&mut self) {
        const WANTED: usize = 2;
        let player = self.player.pos;
        let max_distance = pursuer_max_distance(self.maze.width());
        let blocked = [self.minimap_item, self.event_box];

        let mut pool = open_cells_where(&self.maze, |pos| {
            let distance = pos.distance_to(player);
            (PURSUER_MIN_DISTANCE..=max_distance).contains(&distance)
                && !blocked.contains(&Some(pos))
        });
        if pool.len() < WANTED {
            pool = open_cells_where(&self.maze, |pos| {
                pos != player && !blocked.contains(&Some(pos))
            });
        }

        let spots = self.rng.sample(&pool, WANTED);
        if let Some(&patrol_at) = spots.first() {
            let route = generate_patrol_route(&self.maze, patrol_at, &mut self.rng);
            let id = self.make_id("patrol");
            self.pursuers.push(Pursuer::patrol(id, patrol_at, route));
        }
        if let Some(&detector_at) = spots.get(1) {
            let id = self.make_id("detector");
            self.pursuers.push(Pursuer::detector(id, detector_at));
        }
        if spots.len() < WANTED {
            self.report_shortfall(PlacedItem::Pursuer, WANTED, spots.len());
        }
    }

    pub(super) fn spawn_enhanced_pursuer(&mut self) {
        if self.enhanced_spawned {
            return;
        }
        let player = self.player.pos;
        let spot = pick_spot(
            &self.maze,
            &mut self.rng,
            |pos| pos.distance_to(player) > ENHANCED_MIN_DISTANCE,
            |pos| pos != player,
        );
        let Some(spot) = spot else {
            self.report_shortfall(PlacedItem::Pursuer, 1, 0);
            return;
        };

        let id = self.make_id("enhanced");
        let mut pursuer = Pursuer::enhanced(id.clone(), spot);
        if self.active_event_kind() == Some(GlobalEventKind::EnemySpeedUp) {
            pursuer.speed_up();
        }
        self.pursuers.push(pursuer);
        self.enhanced_spawned = true;
        self.events.push(RuntimeEvent::EnhancedPursuerSpawned {
            pursuer_id: id,
            x: spot.x,
            y: spot.y,
        });
        self.notify("An enhanced pursuer has appeared!", NOTICE_LONG_MS);
    }

    /// Picks the exit on the inner border ring, preferring cells outside the
    /// player's sight. Runs at most once per session.
    pub(super) fn generate_exit(&mut self) {
        if self.exit_attempted {
            return;
        }
        self.exit_attempted = true;

        let player = self.player.pos;
        let ring = self.maze.border_ring_open_cells();
        let far: Vec<Position> = ring
            .iter()
            .copied()
            .filter(|pos| pos.distance_to(player) > exit_min_distance())
            .collect();

        let (spot, fallback) = match self.rng.choose(&far) {
            Some(pos) => (Some(pos), false),
            None => (self.rng.choose(&ring), true),
        };

        match spot {
            Some(pos) => {
                self.exit = Some(pos);
                self.events.push(RuntimeEvent::ExitRevealed {
                    x: pos.x,
                    y: pos.y,
                    fallback,
                });
                if fallback {
                    self.notify("The exit has appeared! (warning: it is close by)", NOTICE_LONG_MS);
                } else {
                    self.notify("The exit has appeared! Find it!", NOTICE_LONG_MS);
                }
            }
            None => {
                self.events.push(RuntimeEvent::ExitUnavailable);
                self.notify("Error: no cell available for the exit", NOTICE_ANOMALY_MS);
            }
        }
    }

    fn report_shortfall(&mut self, item: PlacedItem, wanted: usize, placed: usize) {
        self.events.push(RuntimeEvent::PlacementShortfall {
            item,
            wanted,
            placed,
        });
        self.notify(
            format!("Could only place {placed}/{wanted} {}", shortfall_label(item)),
            NOTICE_ANOMALY_MS,
        );
    }
}

fn pick_spot(
    maze: &Maze,
    rng: &mut SimRng,
    preferred: impl Fn(Position) -> bool,
    fallback: impl Fn(Position) -> bool,
) -> Option<Position> {
    let candidates = open_cells_where(maze, preferred);
    if let Some(pos) = rng.choose(&candidates) {
        return Some(pos);
    }
    rng.choose(&open_cells_where(maze, fallback))
}

fn shortfall_label(item: PlacedItem) -> &'static str {
    match item {
        PlacedItem::Star => "stars",
        PlacedItem::MinimapItem => "minimap items",
        PlacedItem::EventBox => "mystery boxes",
        PlacedItem::Pursuer => "pursuers",
    }
}
