use chrono::{SecondsFormat, Utc};
use clap::Parser;
use serde::Serialize;
use serde_json::{json, Value};
use star_maze_sim::autopilot::Autopilot;
use star_maze_sim::constants::{
    GLOBAL_EVENT_DURATION_MS, MAZE_HEIGHT, MAZE_WIDTH, STAR_COUNT, STEALTH_CHARGES,
    STEALTH_DURATION_MS, TICK_MS, TIME_LIMIT_MS,
};
use star_maze_sim::logging::{runtime_event_level, LogLevel, Logger};
use star_maze_sim::session::{Session, SessionOptions};
use star_maze_sim::types::{GamePhase, OutcomeReason, PursuerKind, Snapshot};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = 1)]
    runs: usize,
    #[arg(long)]
    width: Option<i32>,
    #[arg(long)]
    height: Option<i32>,
    #[arg(long)]
    time_limit_secs: Option<u64>,
    /// Pace ticks against the wall clock instead of running them back to back.
    #[arg(long)]
    realtime: bool,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug)]
struct RunPlan {
    run: usize,
    seed: u64,
    width: i32,
    height: i32,
    time_limit_ms: u64,
}

#[derive(Clone, Debug, Serialize)]
struct RunResultLine {
    run: usize,
    seed: u64,
    phase: GamePhase,
    reason: Option<OutcomeReason>,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    #[serde(rename = "starsCollected")]
    stars_collected: u32,
    #[serde(rename = "stealthUsed")]
    stealth_used: u32,
    #[serde(rename = "enhancedSpawned")]
    enhanced_spawned: bool,
    #[serde(rename = "exitRevealed")]
    exit_revealed: bool,
    #[serde(rename = "eventsTriggered")]
    events_triggered: usize,
    ticks: u64,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct RunOutcome {
    result: RunResultLine,
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "runCount")]
    run_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageDurationMs")]
    average_duration_ms: u64,
    #[serde(rename = "reasonCounts")]
    reason_counts: BTreeMap<String, usize>,
    runs: Vec<RunResultLine>,
}

/// One session plus the bookkeeping needed to watch it tick by tick.
struct RunDriver<'a> {
    plan: &'a RunPlan,
    logger: &'a Logger,
    session: Session,
    pilot: Autopilot,
    anomalies: Vec<String>,
    anomaly_records: Vec<AnomalyRecord>,
    anomaly_seen: HashSet<String>,
    last_time_left_ms: u64,
    ticks: u64,
}

impl<'a> RunDriver<'a> {
    fn new(plan: &'a RunPlan, logger: &'a Logger) -> Self {
        let session = Session::new(SessionOptions {
            width: plan.width,
            height: plan.height,
            time_limit_ms: plan.time_limit_ms,
            seed: plan.seed,
        });
        Self {
            plan,
            logger,
            session,
            pilot: Autopilot,
            anomalies: Vec::new(),
            anomaly_records: Vec::new(),
            anomaly_seen: HashSet::new(),
            last_time_left_ms: plan.time_limit_ms,
            ticks: 0,
        }
    }

    fn tick_limit(&self) -> u64 {
        self.plan.time_limit_ms / TICK_MS + 100
    }

    /// Runs one tick. Returns `false` once the session is over.
    fn tick(&mut self) -> bool {
        let input = self.pilot.decide(&self.session);
        self.session.step(TICK_MS, &input);
        self.ticks += 1;

        let snapshot = self.session.build_snapshot(true);
        for event in &snapshot.events {
            self.logger.emit_log(
                runtime_event_level(event),
                "runtime_event",
                Some(self.plan.run),
                Some(self.plan.seed),
                Some(snapshot.tick),
                serde_json::to_value(event).unwrap_or(Value::Null),
            );
        }

        let mut found = collect_snapshot_anomalies(&snapshot);
        if snapshot.time_left_ms > self.last_time_left_ms {
            found.push(format!(
                "time left went backwards: {} -> {}",
                self.last_time_left_ms, snapshot.time_left_ms
            ));
        }
        self.last_time_left_ms = snapshot.time_left_ms;
        for message in found {
            push_anomaly(
                &mut self.anomalies,
                &mut self.anomaly_records,
                &mut self.anomaly_seen,
                snapshot.tick,
                message,
            );
        }

        if self.ticks > self.tick_limit() {
            push_anomaly(
                &mut self.anomalies,
                &mut self.anomaly_records,
                &mut self.anomaly_seen,
                snapshot.tick,
                "tick safety limit exceeded".to_string(),
            );
            return false;
        }
        !snapshot.phase.is_terminal()
    }

    fn finish(self) -> RunOutcome {
        let summary = self.session.build_summary();
        RunOutcome {
            result: RunResultLine {
                run: self.plan.run,
                seed: self.plan.seed,
                phase: summary.phase,
                reason: summary.reason,
                duration_ms: summary.duration_ms,
                stars_collected: summary.stars_collected,
                stealth_used: summary.stealth_used,
                enhanced_spawned: summary.enhanced_spawned,
                exit_revealed: summary.exit_revealed,
                events_triggered: summary.events_triggered.len(),
                ticks: self.ticks,
                anomalies: self.anomalies,
            },
            anomaly_records: self.anomaly_records,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let started_at = Utc::now();
    let base_seed = cli
        .seed
        .unwrap_or_else(|| started_at.timestamp_millis().max(0) as u64);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(base_seed, started_at.timestamp_millis()));
    let logger = Logger::new(LogLevel::from_env(), match_id);
    let plans = resolve_runs(&cli, base_seed);

    let runtime = if cli.realtime {
        match tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
        {
            Ok(runtime) => Some(runtime),
            Err(error) => {
                logger.emit_log(
                    LogLevel::Error,
                    "runtime_start_failed",
                    None,
                    None,
                    None,
                    json!({ "error": error.to_string() }),
                );
                std::process::exit(2);
            }
        }
    } else {
        None
    };

    let mut has_anomaly = false;
    let mut results = Vec::new();
    let mut reason_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_duration_ms = 0u64;
    let mut total_anomalies = 0usize;

    for plan in &plans {
        logger.emit_log(
            LogLevel::Info,
            "run_started",
            Some(plan.run),
            Some(plan.seed),
            None,
            json!({
                "width": plan.width,
                "height": plan.height,
                "timeLimitMs": plan.time_limit_ms,
                "realtime": runtime.is_some(),
            }),
        );

        let mut driver = RunDriver::new(plan, &logger);
        match runtime.as_ref() {
            Some(runtime) => runtime.block_on(run_realtime(&mut driver)),
            None => while driver.tick() {},
        }
        let outcome = driver.finish();

        for anomaly in &outcome.anomaly_records {
            logger.emit_log(
                LogLevel::Warn,
                "anomaly_detected",
                Some(plan.run),
                Some(plan.seed),
                Some(anomaly.tick),
                json!({ "message": anomaly.message }),
            );
        }

        if !outcome.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += outcome.anomaly_records.len();
        total_duration_ms += outcome.result.duration_ms;
        *reason_counts
            .entry(reason_key(outcome.result.reason).to_string())
            .or_insert(0) += 1;

        logger.emit_log(
            LogLevel::Info,
            "run_finished",
            Some(plan.run),
            Some(plan.seed),
            Some(outcome.result.ticks),
            json!({
                "phase": outcome.result.phase,
                "reason": outcome.result.reason,
                "durationMs": outcome.result.duration_ms,
                "starsCollected": outcome.result.stars_collected,
                "anomalyCount": outcome.anomaly_records.len(),
            }),
        );

        match serde_json::to_string(&outcome.result) {
            Ok(line) => println!("{line}"),
            Err(error) => logger.emit_log(
                LogLevel::Error,
                "result_serialize_failed",
                Some(plan.run),
                Some(plan.seed),
                None,
                json!({ "error": error.to_string() }),
            ),
        }
        results.push(outcome.result);
    }

    let summary = build_run_summary(
        logger.match_id().to_string(),
        format_timestamp(started_at),
        format_timestamp(Utc::now()),
        results,
        reason_counts,
        total_anomalies,
        total_duration_ms,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            logger.emit_log(
                LogLevel::Error,
                "summary_write_failed",
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    logger.emit_log(
        LogLevel::Info,
        "simulation_finished",
        None,
        None,
        None,
        json!({
            "runCount": summary.run_count,
            "anomalyCount": summary.anomaly_count,
            "averageDurationMs": summary.average_duration_ms,
            "reasonCounts": summary.reason_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

async fn run_realtime(driver: &mut RunDriver<'_>) {
    let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        if !driver.tick() {
            break;
        }
    }
}

fn resolve_runs(cli: &Cli, base_seed: u64) -> Vec<RunPlan> {
    let width = cli.width.unwrap_or(MAZE_WIDTH).clamp(5, 101);
    let height = cli.height.unwrap_or(MAZE_HEIGHT).clamp(5, 101);
    let time_limit_ms = cli
        .time_limit_secs
        .map(|secs| secs.clamp(1, 3_600) * 1_000)
        .unwrap_or(TIME_LIMIT_MS);
    (0..cli.runs.clamp(1, 1_000))
        .map(|run| RunPlan {
            run,
            seed: base_seed.wrapping_add(run as u64),
            width,
            height,
            time_limit_ms,
        })
        .collect()
}

fn collect_snapshot_anomalies(snapshot: &Snapshot) -> Vec<String> {
    let mut anomalies = Vec::new();
    let height = snapshot.maze.len() as i32;
    let width = snapshot.maze.first().map(|row| row.len()).unwrap_or(0) as i32;
    let is_open = |x: i32, y: i32| {
        x >= 0
            && y >= 0
            && snapshot
                .maze
                .get(y as usize)
                .and_then(|row| row.as_bytes().get(x as usize))
                .is_some_and(|cell| *cell == b'.')
    };

    let player = &snapshot.player;
    if player.x < 0 || player.y < 0 || player.x >= width || player.y >= height {
        anomalies.push(format!("player off grid: ({},{})", player.x, player.y));
    }
    if player.stars_collected > STAR_COUNT {
        anomalies.push(format!("too many stars collected: {}", player.stars_collected));
    }
    if player.stars_collected as usize + snapshot.stars.len() > STAR_COUNT as usize {
        anomalies.push(format!(
            "star count mismatch: collected={} remaining={}",
            player.stars_collected,
            snapshot.stars.len()
        ));
    }
    if player.stealth_charges > STEALTH_CHARGES {
        anomalies.push(format!("stealth charges overflow: {}", player.stealth_charges));
    }
    if player.stealth_remaining_ms > STEALTH_DURATION_MS {
        anomalies.push(format!(
            "stealth window too long: {}ms",
            player.stealth_remaining_ms
        ));
    }

    if let Some(exit) = snapshot.exit {
        if player.stars_collected < STAR_COUNT {
            anomalies.push(format!(
                "exit revealed with {} stars collected",
                player.stars_collected
            ));
        }
        let on_ring = exit.x == 1 || exit.y == 1 || exit.x == width - 2 || exit.y == height - 2;
        if !on_ring || !is_open(exit.x, exit.y) {
            anomalies.push(format!("exit off the border ring: ({},{})", exit.x, exit.y));
        }
    }

    for pursuer in &snapshot.pursuers {
        if !is_open(pursuer.x, pursuer.y) {
            anomalies.push(format!(
                "pursuer inside wall: {} at ({},{})",
                pursuer.id, pursuer.x, pursuer.y
            ));
        }
    }
    let enhanced = snapshot
        .pursuers
        .iter()
        .filter(|pursuer| pursuer.kind == PursuerKind::Enhanced)
        .count();
    if enhanced > 1 {
        anomalies.push(format!("duplicate enhanced pursuers: {enhanced}"));
    }

    if let Some(active) = &snapshot.active_event {
        if active.remaining_ms > GLOBAL_EVENT_DURATION_MS {
            anomalies.push(format!("event window too long: {}ms", active.remaining_ms));
        }
    }
    anomalies
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u64, timestamp_ms: i64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn format_timestamp(at: chrono::DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn reason_key(reason: Option<OutcomeReason>) -> &'static str {
    match reason {
        Some(OutcomeReason::Escaped) => "escaped",
        Some(OutcomeReason::Caught) => "caught",
        Some(OutcomeReason::Timeout) => "timeout",
        None => "unfinished",
    }
}

fn build_run_summary(
    match_id: String,
    started_at: String,
    finished_at: String,
    runs: Vec<RunResultLine>,
    reason_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_duration_ms: u64,
) -> RunSummary {
    let run_count = runs.len();
    let average_duration_ms = if run_count == 0 {
        0
    } else {
        total_duration_ms / run_count as u64
    };
    RunSummary {
        match_id,
        started_at,
        finished_at,
        run_count,
        anomaly_count,
        average_duration_ms,
        reason_counts,
        runs,
    }
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
