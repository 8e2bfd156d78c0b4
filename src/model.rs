//! Wire types shared by the backend client, the dashboard and the simulator.
//!
//! Field names follow the backend's JSON exactly. Unknown fields are ignored
//! so the backend can add diagnostics (`last_update`, `last_frame`, ...)
//! without breaking the dashboard.

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Risk level
// ---------------------------------------------------------------------------

/// Ratio below which a colony counts as low risk.
pub const RISK_LOW_BELOW: f64 = 0.05;
/// Ratio below which a colony counts as moderate risk.
pub const RISK_MODERATE_BELOW: f64 = 0.10;
/// Ratio below which a colony counts as high risk; anything above is critical.
pub const RISK_HIGH_BELOW: f64 = 0.15;

/// Categorical colony health derived from the varroa:bee ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
    #[default]
    #[serde(other)]
    Unknown,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 5] = [
        Self::Unknown,
        Self::Low,
        Self::Moderate,
        Self::High,
        Self::Critical,
    ];

    /// Classify an infestation ratio.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < RISK_LOW_BELOW {
            Self::Low
        } else if ratio < RISK_MODERATE_BELOW {
            Self::Moderate
        } else if ratio < RISK_HIGH_BELOW {
            Self::High
        } else {
            Self::Critical
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "Unknown"),
            Self::Low => write!(f, "Low"),
            Self::Moderate => write!(f, "Moderate"),
            Self::High => write!(f, "High"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot / time series
// ---------------------------------------------------------------------------

/// One poll's worth of aggregate detection statistics (`GET /get_stats`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub current_bees: u64,
    pub current_varroa: u64,
    pub total_bees: u64,
    pub total_varroa: u64,
    pub total_frames: u64,
    pub fps: f64,
    pub infestation_ratio: f64,
    #[serde(default)]
    pub infestation_risk_level: RiskLevel,
    pub unique_bees: u64,
    pub unique_varroa: u64,
}

/// Trend history for the charts (`GET /get_time_series`).
///
/// All four sequences are indexed by timestamp and must have equal length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub timestamps: Vec<String>,
    pub bee_counts: Vec<u64>,
    pub varroa_counts: Vec<u64>,
    pub infestation_ratio: Vec<f64>,
}

impl TimeSeries {
    /// Whether every sequence has the same length as `timestamps`.
    pub fn is_consistent(&self) -> bool {
        let n = self.timestamps.len();
        self.bee_counts.len() == n && self.varroa_counts.len() == n && self.infestation_ratio.len() == n
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Start / stop commands
// ---------------------------------------------------------------------------

/// Status reported by `POST /start_detection` and `POST /stop_detection`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    Started,
    AlreadyRunning,
    Stopped,
    AlreadyStopped,
    Other(String),
}

impl CommandStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Started => "started",
            Self::AlreadyRunning => "already_running",
            Self::Stopped => "stopped",
            Self::AlreadyStopped => "already_stopped",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for CommandStatus {
    fn from(s: &str) -> Self {
        match s {
            "started" => Self::Started,
            "already_running" => Self::AlreadyRunning,
            "stopped" => Self::Stopped,
            "already_stopped" => Self::AlreadyStopped,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CommandStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CommandStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

/// Response body of the start/stop endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub status: CommandStatus,
}

impl CommandResponse {
    pub fn new(status: impl Into<CommandStatus>) -> Self {
        Self {
            status: status.into(),
        }
    }
}

impl From<String> for CommandStatus {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

// ---------------------------------------------------------------------------
// Recording sessions and stored metrics
// ---------------------------------------------------------------------------

/// A recording session as stored by the backend (`GET /api/sessions`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: i64,
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "bool_or_int")]
    pub email_sent: bool,
}

/// A persisted metrics sample (`GET /api/metrics`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub metric_id: i64,
    pub session_id: i64,
    pub timestamp: String,
    pub unique_bee_count: u64,
    pub unique_varroa_count: u64,
    pub infestation_ratio: f64,
    pub frame_count: u64,
    #[serde(default)]
    pub fps: Option<f64>,
}

/// Outcome of `GET /test-email`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailTestResult {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub error_details: String,
}

/// SQLite-backed services report booleans as `0`/`1`.
fn bool_or_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Null(()),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(n) => n != 0,
        Flag::Null(()) => false,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
