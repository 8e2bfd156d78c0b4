//! Configuration schema and defaults for hivewatch.
//!
//! Defines the TOML-serializable configuration structure with the
//! `[backend]`, `[dashboard]` and `[logging]` sections. Every field has a
//! built-in default; users only set what they want to override.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level hivewatch configuration.
///
/// Maps directly to `~/.hivewatch/config.toml` and `.hivewatch.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HivewatchConfig {
    pub backend: BackendConfig,
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [backend]
// ---------------------------------------------------------------------------

/// Where the detection backend lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the detection service.
    pub url: String,
    /// Per-request timeout in milliseconds. `0` disables the timeout.
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5000".to_string(),
            timeout_ms: 0,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

// ---------------------------------------------------------------------------
// [dashboard]
// ---------------------------------------------------------------------------

/// Timing of the polling loop and of every animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Refresh period while detection is active.
    pub poll_interval_ms: u64,
    /// Duration of a counter tween.
    pub counter_animation_ms: u64,
    /// Duration of each half (out / in) of a fade transition.
    pub fade_ms: u64,
    /// Chart redraw duration on every `full_animation_every`-th update.
    pub chart_full_animation_ms: u64,
    /// Chart redraw duration for all other updates.
    pub chart_short_animation_ms: u64,
    pub full_animation_every: u64,
    /// Delay before the loading overlay hides after a start/stop response.
    pub overlay_hide_delay_ms: u64,
    /// Terminal redraw cadence while something is animating.
    pub frame_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            counter_animation_ms: 800,
            fade_ms: 200,
            chart_full_animation_ms: 1000,
            chart_short_animation_ms: 300,
            full_animation_every: 5,
            overlay_hide_delay_ms: 500,
            frame_ms: 50,
        }
    }
}

impl DashboardConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn counter_animation(&self) -> Duration {
        Duration::from_millis(self.counter_animation_ms)
    }

    pub fn fade(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }

    pub fn overlay_hide_delay(&self) -> Duration {
        Duration::from_millis(self.overlay_hide_delay_ms)
    }

    pub fn frame(&self) -> Duration {
        Duration::from_millis(self.frame_ms.max(1))
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Event log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append events to `~/.hivewatch/dashboard.jsonl`.
    pub enabled: bool,
    /// Mirror log entries to stderr (one-shot commands only).
    pub echo: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            echo: false,
        }
    }
}

impl HivewatchConfig {
    /// Annotated default config written by `hivewatch config init`.
    pub fn default_toml() -> String {
        r#"# hivewatch configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (HIVEWATCH_*)
#   2. Project config (.hivewatch.toml in current directory)
#   3. User global config (~/.hivewatch/config.toml)
#   4. Built-in defaults

[backend]
url = "http://127.0.0.1:5000"   # Detection service base URL
timeout_ms = 0                  # 0 = no request timeout

[dashboard]
poll_interval_ms = 1000         # Refresh period while detection is active
counter_animation_ms = 800
fade_ms = 200
chart_full_animation_ms = 1000
chart_short_animation_ms = 300
full_animation_every = 5        # Every Nth chart update uses the full animation
overlay_hide_delay_ms = 500
frame_ms = 50

[logging]
enabled = true                  # ~/.hivewatch/dashboard.jsonl
echo = false                    # Mirror entries to stderr
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_toml_parses_back() {
        let config: HivewatchConfig = toml::from_str(&HivewatchConfig::default_toml()).unwrap();
        assert_eq!(config, HivewatchConfig::default());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config: HivewatchConfig = toml::from_str(
            r#"
[dashboard]
poll_interval_ms = 2500
"#,
        )
        .unwrap();
        assert_eq!(config.dashboard.poll_interval_ms, 2500);
        assert_eq!(config.dashboard.counter_animation_ms, 800);
        assert_eq!(config.backend.url, "http://127.0.0.1:5000");
    }

    #[test]
    fn zero_timeout_means_none() {
        let mut backend = BackendConfig::default();
        assert_eq!(backend.timeout(), None);
        backend.timeout_ms = 1500;
        assert_eq!(backend.timeout(), Some(Duration::from_millis(1500)));
    }
}
