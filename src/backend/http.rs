//! HTTP client for the detection service.
//!
//! Uses the synchronous `ureq` client. Every call blocks its thread until
//! the service answers; the dashboard runtime therefore issues calls from
//! worker threads and never from the render loop.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use crate::config::schema::BackendConfig;
use crate::model::{
    CommandResponse, EmailTestResult, MetricRecord, SessionRecord, Snapshot, TimeSeries,
};

use super::Backend;

/// Synchronous client bound to one service base URL.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    agent: ureq::Agent,
    timeout: Option<Duration>,
}

impl HttpBackend {
    /// Build a client from the resolved `[backend]` config.
    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(&config.url, config.timeout())
    }

    pub fn new(base_url: &str, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        // "localhost" may resolve to ::1 first, which stalls when the
        // service only binds IPv4.
        let base_url = base_url
            .trim_end_matches('/')
            .replace("://localhost", "://127.0.0.1");

        Self {
            base_url,
            agent: builder.build(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let resp = self
            .agent
            .get(&url)
            .call()
            .with_context(|| format!("GET {url} failed"))?;
        resp.into_json()
            .with_context(|| format!("failed to parse response from GET {url}"))
    }

    fn post_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let resp = self
            .agent
            .post(&url)
            .call()
            .with_context(|| format!("POST {url} failed"))?;
        resp.into_json()
            .with_context(|| format!("failed to parse response from POST {url}"))
    }
}

impl Backend for HttpBackend {
    fn get_stats(&self) -> Result<Snapshot> {
        self.get_json("/get_stats")
    }

    fn get_time_series(&self) -> Result<TimeSeries> {
        self.get_json("/get_time_series")
    }

    fn start_detection(&self) -> Result<CommandResponse> {
        self.post_json("/start_detection")
    }

    fn stop_detection(&self) -> Result<CommandResponse> {
        self.post_json("/stop_detection")
    }

    fn sessions(&self, limit: u32) -> Result<Vec<SessionRecord>> {
        self.get_json(&format!("/api/sessions?limit={limit}"))
    }

    fn metrics(&self, limit: u32, session_id: Option<i64>) -> Result<Vec<MetricRecord>> {
        let path = match session_id {
            Some(id) => format!("/api/metrics?limit={limit}&session_id={id}"),
            None => format!("/api/metrics?limit={limit}"),
        };
        self.get_json(&path)
    }

    fn test_email(&self) -> Result<EmailTestResult> {
        self.get_json("/test-email")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
