//! Client side of the detection service contract.
//!
//! The dashboard only ever talks to the service through [`Backend`], so the
//! runtime can drive the real HTTP client while tests substitute a scripted
//! one.

mod http;

use anyhow::Result;

use crate::model::{
    CommandResponse, EmailTestResult, MetricRecord, SessionRecord, Snapshot, TimeSeries,
};

pub use http::HttpBackend;

/// Operations the detection service exposes.
pub trait Backend: Send + Sync {
    /// `GET /get_stats`
    fn get_stats(&self) -> Result<Snapshot>;

    /// `GET /get_time_series`
    fn get_time_series(&self) -> Result<TimeSeries>;

    /// `POST /start_detection`
    fn start_detection(&self) -> Result<CommandResponse>;

    /// `POST /stop_detection`
    fn stop_detection(&self) -> Result<CommandResponse>;

    /// `GET /api/sessions?limit=N`
    fn sessions(&self, limit: u32) -> Result<Vec<SessionRecord>>;

    /// `GET /api/metrics?limit=N[&session_id=S]`
    fn metrics(&self, limit: u32, session_id: Option<i64>) -> Result<Vec<MetricRecord>>;

    /// `GET /test-email`
    fn test_email(&self) -> Result<EmailTestResult>;
}
