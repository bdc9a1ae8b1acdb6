use super::*;

impl Session {
    /// Starts `kind` for the standard event window. A still-running event is
    /// ended first so its effects are reversed before the new one applies.
    pub(super) fn activate_event(&mut self, kind: GlobalEventKind, now_ms: u64) {
        if let Some(active) = self.active_event.take() {
            self.end_event(active.kind);
        }

        let until_ms = now_ms.saturating_add(GLOBAL_EVENT_DURATION_MS);
        match kind {
            GlobalEventKind::Invincible => self.player.invincible_until = until_ms,
            GlobalEventKind::WallPass => self.player.wall_pass_until = until_ms,
            GlobalEventKind::MapDark => {}
            GlobalEventKind::EnemySpeedUp => {
                for pursuer in &mut self.pursuers {
                    pursuer.speed_up();
                }
            }
        }

        self.active_event = Some(ActiveEvent { kind, until_ms });
        self.events_triggered.push(kind);
        self.events.push(RuntimeEvent::GlobalEventStarted { kind });
        self.notify(format!("Event: {}!", kind.label()), NOTICE_LONG_MS);
    }

    pub(super) fn expire_event(&mut self, now_ms: u64) {
        let Some(active) = self.active_event else {
            return;
        };
        if now_ms >= active.until_ms {
            self.active_event = None;
            self.end_event(active.kind);
        }
    }

    // Player timers are cleared outright, even if something else extended them.
    fn end_event(&mut self, kind: GlobalEventKind) {
        match kind {
            GlobalEventKind::Invincible => self.player.invincible_until = 0,
            GlobalEventKind::WallPass => self.player.wall_pass_until = 0,
            GlobalEventKind::MapDark => {}
            GlobalEventKind::EnemySpeedUp => {
                for pursuer in &mut self.pursuers {
                    pursuer.restore_speed();
                }
            }
        }
        self.events.push(RuntimeEvent::GlobalEventEnded { kind });
        self.notify("Event over!", NOTICE_MS);
    }

    pub fn active_event_kind(&self) -> Option<GlobalEventKind> {
        self.active_event.map(|active| active.kind)
    }

    pub fn is_map_dark(&self) -> bool {
        self.active_event_kind() == Some(GlobalEventKind::MapDark)
    }
}
