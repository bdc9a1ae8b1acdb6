use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::types::RuntimeEvent;

pub const LOG_LEVEL_ENV: &str = "SIM_LOG_LEVEL";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    pub fn from_env() -> Self {
        std::env::var(LOG_LEVEL_ENV)
            .ok()
            .as_deref()
            .and_then(LogLevel::parse)
            .unwrap_or(LogLevel::Info)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct StructuredLogLine {
    pub timestamp: String,
    pub level: LogLevel,
    pub event: String,
    #[serde(rename = "matchId")]
    pub match_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick: Option<u64>,
    pub details: Value,
}

/// JSON-lines logger on stderr. Lines below `threshold` are dropped.
#[derive(Clone, Debug)]
pub struct Logger {
    threshold: LogLevel,
    match_id: String,
}

impl Logger {
    pub fn new(threshold: LogLevel, match_id: impl Into<String>) -> Self {
        Self {
            threshold,
            match_id: match_id.into(),
        }
    }

    pub fn match_id(&self) -> &str {
        &self.match_id
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.threshold
    }

    pub fn line(
        &self,
        level: LogLevel,
        event: &str,
        run: Option<usize>,
        seed: Option<u64>,
        tick: Option<u64>,
        details: Value,
    ) -> StructuredLogLine {
        StructuredLogLine {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level,
            event: event.to_string(),
            match_id: self.match_id.clone(),
            run,
            seed,
            tick,
            details,
        }
    }

    pub fn emit_log(
        &self,
        level: LogLevel,
        event: &str,
        run: Option<usize>,
        seed: Option<u64>,
        tick: Option<u64>,
        details: Value,
    ) {
        if !self.enabled(level) {
            return;
        }
        let log_line = self.line(level, event, run, seed, tick, details);
        if let Ok(text) = serde_json::to_string(&log_line) {
            eprintln!("{text}");
        }
    }
}

/// Level a drained runtime event is logged at.
pub fn runtime_event_level(event: &RuntimeEvent) -> LogLevel {
    match event {
        RuntimeEvent::PlacementShortfall { .. } | RuntimeEvent::ExitUnavailable => LogLevel::Warn,
        RuntimeEvent::PhaseChanged { .. }
        | RuntimeEvent::EnhancedPursuerSpawned { .. }
        | RuntimeEvent::ExitRevealed { .. } => LogLevel::Info,
        _ => LogLevel::Debug,
    }
}
