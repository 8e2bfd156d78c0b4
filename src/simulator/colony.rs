//! Synthetic colony used by the simulator.
//!
//! Counts follow smooth deterministic waveforms of the time since detection
//! started, and the varroa share of unique objects climbs over the first
//! minute so every risk level shows up during a demo.

use std::collections::VecDeque;
use std::f64::consts::TAU;
use std::time::{Duration, Instant};

use chrono::Local;

use crate::model::{
    CommandResponse, CommandStatus, MetricRecord, RiskLevel, SessionRecord, Snapshot, TimeSeries,
};

/// Points kept in the time series.
pub const MAX_DATA_POINTS: usize = 100;
/// Spacing of time series samples.
pub const SAMPLE_PERIOD: Duration = Duration::from_secs(1);
/// A metrics row is persisted every this many samples.
const METRICS_EVERY: u64 = 10;
const NOMINAL_FPS: f64 = 30.0;

#[derive(Debug, Default)]
struct Series {
    timestamps: VecDeque<String>,
    bee_counts: VecDeque<u64>,
    varroa_counts: VecDeque<u64>,
    infestation_ratio: VecDeque<f64>,
}

impl Series {
    fn push(&mut self, timestamp: String, bees: u64, varroa: u64, ratio: f64) {
        if self.timestamps.len() == MAX_DATA_POINTS {
            self.timestamps.pop_front();
            self.bee_counts.pop_front();
            self.varroa_counts.pop_front();
            self.infestation_ratio.pop_front();
        }
        self.timestamps.push_back(timestamp);
        self.bee_counts.push_back(bees);
        self.varroa_counts.push_back(varroa);
        self.infestation_ratio.push_back(ratio);
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    fn to_wire(&self) -> TimeSeries {
        TimeSeries {
            timestamps: self.timestamps.iter().cloned().collect(),
            bee_counts: self.bee_counts.iter().copied().collect(),
            varroa_counts: self.varroa_counts.iter().copied().collect(),
            infestation_ratio: self.infestation_ratio.iter().copied().collect(),
        }
    }
}

/// Simulated detection state, sessions and stored metrics.
#[derive(Debug, Default)]
pub struct Colony {
    stats: Snapshot,
    series: Series,
    started: Option<Instant>,
    samples: u64,
    sessions: Vec<SessionRecord>,
    metrics: Vec<MetricRecord>,
}

impl Colony {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.started.is_some()
    }

    /// `POST /start_detection`
    pub fn start(&mut self, now: Instant) -> CommandResponse {
        if self.is_active() {
            return CommandResponse::new(CommandStatus::AlreadyRunning);
        }
        self.stats = Snapshot::default();
        self.series.clear();
        self.samples = 0;
        self.started = Some(now);

        let session_id = self.sessions.last().map_or(1, |s| s.session_id + 1);
        self.sessions.push(SessionRecord {
            session_id,
            start_time: timestamp_now(),
            end_time: None,
            source: "simulator".to_string(),
            notes: Some("Automatic detection".to_string()),
            email_sent: false,
        });

        CommandResponse::new(CommandStatus::Started)
    }

    /// `POST /stop_detection`
    pub fn stop(&mut self, now: Instant) -> CommandResponse {
        if !self.is_active() {
            return CommandResponse::new(CommandStatus::AlreadyStopped);
        }
        self.advance(now);
        self.started = None;
        if let Some(session) = self.sessions.last_mut() {
            session.end_time = Some(timestamp_now());
        }
        CommandResponse::new(CommandStatus::Stopped)
    }

    /// `GET /get_stats`
    pub fn stats(&mut self, now: Instant) -> Snapshot {
        self.advance(now);
        self.stats.clone()
    }

    /// `GET /get_time_series`
    pub fn time_series(&mut self, now: Instant) -> TimeSeries {
        self.advance(now);
        self.series.to_wire()
    }

    /// `GET /api/sessions`, newest first.
    pub fn sessions(&self, limit: usize) -> Vec<SessionRecord> {
        self.sessions.iter().rev().take(limit).cloned().collect()
    }

    /// `GET /api/metrics`, newest first.
    pub fn metrics(&self, limit: usize, session_id: Option<i64>) -> Vec<MetricRecord> {
        self.metrics
            .iter()
            .rev()
            .filter(|m| session_id.is_none_or(|id| m.session_id == id))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Bring the simulation up to `now`.
    fn advance(&mut self, now: Instant) {
        let Some(started) = self.started else {
            return;
        };
        let t = now.saturating_duration_since(started).as_secs_f64();

        let stats = &mut self.stats;
        stats.fps = NOMINAL_FPS - 0.5 + 0.5 * (t * TAU / 7.0).sin();
        stats.total_frames = (t * NOMINAL_FPS) as u64;
        stats.current_bees = (12.0 + 6.0 * (t * TAU / 20.0).sin()).round() as u64;
        stats.current_varroa = (1.5 + 1.5 * (t * TAU / 13.0 + 1.0).sin()).round() as u64;

        let unique_bees = ((t * 0.8) as u64).max(stats.current_bees);
        let varroa_share = 0.02 + 0.16 * (t / 60.0).min(1.0);
        stats.unique_bees = unique_bees;
        stats.unique_varroa = (unique_bees as f64 * varroa_share).round() as u64;
        stats.total_bees = stats.unique_bees;
        stats.total_varroa = stats.unique_varroa;

        let due = (t / SAMPLE_PERIOD.as_secs_f64()) as u64;
        while self.samples < due {
            self.samples += 1;
            self.sample();
        }
    }

    /// Append one time series point, recompute the ratio and risk, and
    /// persist a metrics row every few samples.
    fn sample(&mut self) {
        let stats = &mut self.stats;
        let ratio = if stats.unique_bees > 0 {
            stats.unique_varroa as f64 / stats.unique_bees as f64
        } else {
            0.0
        };
        stats.infestation_ratio = ratio;
        stats.infestation_risk_level = RiskLevel::from_ratio(ratio);

        self.series.push(
            Local::now().format("%H:%M:%S").to_string(),
            stats.current_bees,
            stats.current_varroa,
            ratio,
        );

        if self.samples % METRICS_EVERY == 0
            && let Some(session) = self.sessions.last()
        {
            let metric_id = self.metrics.last().map_or(1, |m| m.metric_id + 1);
            self.metrics.push(MetricRecord {
                metric_id,
                session_id: session.session_id,
                timestamp: timestamp_now(),
                unique_bee_count: stats.unique_bees,
                unique_varroa_count: stats.unique_varroa,
                infestation_ratio: ratio,
                frame_count: stats.total_frames,
                fps: Some(stats.fps),
            });
        }
    }
}

fn timestamp_now() -> String {
    Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S").to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
