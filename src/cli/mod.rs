//! CLI command implementations for hivewatch one-shot commands.
//!
//! Provides subcommand handlers for:
//! - `hivewatch status` / `history`: current snapshot and trend series
//! - `hivewatch start` / `stop`: detection commands
//! - `hivewatch sessions` / `metrics`: stored sessions and metric samples
//! - `hivewatch test-email`: ask the service to send a test alert
//! - `hivewatch health`: check service, config and log file
//! - `hivewatch config show|init|set|reset`: configuration management

use anyhow::{Result, bail};
use colored::{ColoredString, Colorize};

use crate::backend::{Backend, HttpBackend};
use crate::config::{self, HivewatchConfig};
use crate::dashboard::poller::{format_fps, format_ratio};
use crate::dashboard::{CommandKind, DetectionState};
use crate::logging::{self, EventLog};
use crate::model::{
    CommandResponse, MetricRecord, RiskLevel, SessionRecord, Snapshot, TimeSeries,
};

/// Output format for reporting commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

fn backend(config: &HivewatchConfig) -> HttpBackend {
    HttpBackend::from_config(&config.backend)
}

// ---------------------------------------------------------------------------
// hivewatch status
// ---------------------------------------------------------------------------

/// Print the current statistics snapshot.
pub fn run_status(config: &HivewatchConfig, format: OutputFormat) -> Result<()> {
    let snap = backend(config).get_stats()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&snap)?),
        OutputFormat::Csv => print!("{}", status_csv(&snap)),
        OutputFormat::Table => print_status_table(&snap),
    }
    Ok(())
}

fn print_status_table(snap: &Snapshot) {
    println!("{}", "Colony Status".bold().cyan());
    println!("{}", "=".repeat(44));
    println!();
    println!("  {} {}", "Current bees:     ".bold(), snap.current_bees);
    println!("  {} {}", "Current varroa:   ".bold(), snap.current_varroa);
    println!(
        "  {} {}",
        "Total bees:       ".bold(),
        format_number(snap.total_bees)
    );
    println!(
        "  {} {}",
        "Total varroa:     ".bold(),
        format_number(snap.total_varroa)
    );
    println!(
        "  {} {}",
        "Frames processed: ".bold(),
        format_number(snap.total_frames)
    );
    println!("  {} {}", "FPS:              ".bold(), format_fps(snap.fps));
    println!(
        "  {} {}",
        "Infestation ratio:".bold(),
        format_ratio(snap.infestation_ratio)
    );
    println!(
        "  {} {}",
        "Risk:             ".bold(),
        colorize_risk(snap.infestation_risk_level)
    );
}

fn status_csv(snap: &Snapshot) -> String {
    let mut out = String::from(
        "current_bees,current_varroa,total_bees,total_varroa,total_frames,fps,infestation_ratio,infestation_risk_level\n",
    );
    out.push_str(&format!(
        "{},{},{},{},{},{},{},{}\n",
        snap.current_bees,
        snap.current_varroa,
        snap.total_bees,
        snap.total_varroa,
        snap.total_frames,
        format_fps(snap.fps),
        format_ratio(snap.infestation_ratio),
        snap.infestation_risk_level,
    ));
    out
}

// ---------------------------------------------------------------------------
// hivewatch history
// ---------------------------------------------------------------------------

/// Print the time series the trend charts are drawn from.
pub fn run_history(config: &HivewatchConfig, format: OutputFormat) -> Result<()> {
    let series = backend(config).get_time_series()?;
    if !series.is_consistent() {
        bail!(
            "service returned a time series with mismatched lengths ({} timestamps)",
            series.timestamps.len()
        );
    }

    if series.is_empty() && format == OutputFormat::Table {
        println!(
            "{}",
            "No data yet. Start detection to collect a trend.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&series)?),
        OutputFormat::Csv => print!("{}", history_csv(&series)),
        OutputFormat::Table => print_history_table(&series),
    }
    Ok(())
}

fn print_history_table(series: &TimeSeries) {
    println!("{}", "Detection Trend".bold().cyan());
    println!(
        "  {:<10} {:>6} {:>8} {:>8}",
        "Time", "Bees", "Varroa", "Ratio"
    );
    println!("  {}", "-".repeat(35));

    for i in 0..series.len() {
        let ratio = series.infestation_ratio[i];
        let line = format!(
            "  {:<10} {:>6} {:>8} {:>8}",
            truncate(&series.timestamps[i], 10),
            series.bee_counts[i],
            series.varroa_counts[i],
            format_ratio(ratio),
        );
        if i % 2 == 0 {
            println!("{}", line);
        } else {
            println!("{}", line.dimmed());
        }
    }
}

fn history_csv(series: &TimeSeries) -> String {
    let mut out = String::from("timestamp,bee_count,varroa_count,infestation_ratio\n");
    for i in 0..series.len() {
        out.push_str(&format!(
            "{},{},{},{}\n",
            series.timestamps[i],
            series.bee_counts[i],
            series.varroa_counts[i],
            series.infestation_ratio[i],
        ));
    }
    out
}

// ---------------------------------------------------------------------------
// hivewatch start | stop
// ---------------------------------------------------------------------------

/// Send a start or stop command and report the resulting state.
pub fn run_command(config: &HivewatchConfig, kind: CommandKind) -> Result<()> {
    let log = EventLog::from_config(&config.logging);
    let backend = backend(config);
    let result = match kind {
        CommandKind::Start => backend.start_detection(),
        CommandKind::Stop => backend.stop_detection(),
    };

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            log.error("command", format!("{} detection failed: {e:#}", kind.verb()));
            return Err(e);
        }
    };

    match command_outcome(kind, &response) {
        Ok(state) => {
            log.info(
                "command",
                format!("{} answered '{}'", kind.verb(), response.status),
            );
            println!(
                "{} Detection {} ({})",
                "✓".green().bold(),
                colorize_state(state),
                response.status.as_str().dimmed()
            );
            Ok(())
        }
        Err(e) => {
            log.error("command", format!("{e:#}"));
            Err(e)
        }
    }
}

/// The state a command response leads to, or an error for an unexpected
/// status.
fn command_outcome(kind: CommandKind, response: &CommandResponse) -> Result<DetectionState> {
    let from = match kind {
        CommandKind::Start => DetectionState::Inactive,
        CommandKind::Stop => DetectionState::Active,
    };
    match from.transition(kind, &response.status) {
        Some(state) => Ok(state),
        None => bail!(
            "failed to {} detection: the service answered '{}'",
            kind.verb(),
            response.status
        ),
    }
}

// ---------------------------------------------------------------------------
// hivewatch sessions
// ---------------------------------------------------------------------------

/// List recording sessions, newest first.
pub fn run_sessions(config: &HivewatchConfig, limit: u32, format: OutputFormat) -> Result<()> {
    let sessions = backend(config).sessions(limit)?;

    if sessions.is_empty() && format == OutputFormat::Table {
        println!("{}", "No recording sessions yet.".yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&sessions)?),
        OutputFormat::Csv => print!("{}", sessions_csv(&sessions)),
        OutputFormat::Table => print_sessions_table(&sessions),
    }
    Ok(())
}

fn print_sessions_table(sessions: &[SessionRecord]) {
    println!("{}", "Recording Sessions".bold().cyan());
    println!(
        "  {:>5} {:<20} {:<20} {:<12} Email",
        "ID", "Started", "Ended", "Source"
    );
    println!("  {}", "-".repeat(66));

    for (i, s) in sessions.iter().enumerate() {
        let ended = s.end_time.as_deref().unwrap_or("running");
        let line = format!(
            "  {:>5} {:<20} {:<20} {:<12} {}",
            s.session_id,
            truncate(&s.start_time, 20),
            truncate(ended, 20),
            truncate(&s.source, 12),
            if s.email_sent { "sent" } else { "-" },
        );
        if i % 2 == 0 {
            println!("{}", line);
        } else {
            println!("{}", line.dimmed());
        }
    }
}

fn sessions_csv(sessions: &[SessionRecord]) -> String {
    let mut out = String::from("session_id,start_time,end_time,source,notes,email_sent\n");
    for s in sessions {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            s.session_id,
            s.start_time,
            s.end_time.as_deref().unwrap_or(""),
            csv_field(&s.source),
            csv_field(s.notes.as_deref().unwrap_or("")),
            s.email_sent,
        ));
    }
    out
}

// ---------------------------------------------------------------------------
// hivewatch metrics
// ---------------------------------------------------------------------------

/// List stored metric samples, optionally for one session.
pub fn run_metrics(
    config: &HivewatchConfig,
    limit: u32,
    session_id: Option<i64>,
    format: OutputFormat,
) -> Result<()> {
    let metrics = backend(config).metrics(limit, session_id)?;

    if metrics.is_empty() && format == OutputFormat::Table {
        println!("{}", "No metrics recorded.".yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&metrics)?),
        OutputFormat::Csv => print!("{}", metrics_csv(&metrics)),
        OutputFormat::Table => print_metrics_table(&metrics),
    }
    Ok(())
}

fn print_metrics_table(metrics: &[MetricRecord]) {
    println!("{}", "Stored Metrics".bold().cyan());
    println!(
        "  {:<20} {:>7} {:>8} {:>8} {:>8} {:>10} {:>6}",
        "Timestamp", "Session", "Bees", "Varroa", "Ratio", "Frames", "FPS"
    );
    println!("  {}", "-".repeat(74));

    for (i, m) in metrics.iter().enumerate() {
        let line = format!(
            "  {:<20} {:>7} {:>8} {:>8} {:>8} {:>10} {:>6}",
            truncate(&m.timestamp, 20),
            m.session_id,
            m.unique_bee_count,
            m.unique_varroa_count,
            format_ratio(m.infestation_ratio),
            format_number(m.frame_count),
            m.fps.map(format_fps).unwrap_or_else(|| "-".to_string()),
        );
        if i % 2 == 0 {
            println!("{}", line);
        } else {
            println!("{}", line.dimmed());
        }
    }
}

fn metrics_csv(metrics: &[MetricRecord]) -> String {
    let mut out = String::from(
        "metric_id,session_id,timestamp,unique_bee_count,unique_varroa_count,infestation_ratio,frame_count,fps\n",
    );
    for m in metrics {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{}\n",
            m.metric_id,
            m.session_id,
            m.timestamp,
            m.unique_bee_count,
            m.unique_varroa_count,
            m.infestation_ratio,
            m.frame_count,
            m.fps.map(|f| f.to_string()).unwrap_or_default(),
        ));
    }
    out
}

// ---------------------------------------------------------------------------
// hivewatch test-email
// ---------------------------------------------------------------------------

/// Ask the service to send a test alert email.
pub fn run_test_email(config: &HivewatchConfig) -> Result<()> {
    let result = backend(config).test_email()?;
    if result.status != "success" {
        if result.error_details.is_empty() {
            bail!("test email failed: {}", result.message);
        }
        bail!(
            "test email failed: {} ({})",
            result.message,
            result.error_details
        );
    }
    println!("{} {}", "✓".green().bold(), result.message);
    Ok(())
}

// ---------------------------------------------------------------------------
// hivewatch health
// ---------------------------------------------------------------------------

/// Check service reachability, config files and the event log.
pub fn run_health(config: &HivewatchConfig) -> Result<()> {
    println!("{}", "hivewatch Health Check".bold().cyan());
    println!("{}", "=".repeat(50));

    // 1. Detection service
    let backend = backend(config);
    match backend.get_stats() {
        Ok(snap) => {
            let state = if snap.fps > 0.0 {
                "detecting"
            } else {
                "idle"
            };
            print_health_item(
                "Detection service",
                true,
                &format!("reachable at {} ({state})", backend.base_url()),
            );
        }
        Err(e) => print_health_item(
            "Detection service",
            false,
            &format!("not reachable at {}: {}", backend.base_url(), root_cause(&e)),
        ),
    }

    // 2. Config files
    let global = config::global_config_file();
    let global_exists = global.as_ref().is_some_and(|p| p.exists());
    print_health_item(
        "Global config",
        true,
        &match (&global, global_exists) {
            (Some(p), true) => p.display().to_string(),
            _ => "not found (using defaults)".to_string(),
        },
    );
    let project_exists = config::project_config_file().is_some_and(|p| p.exists());
    print_health_item(
        "Project config",
        true,
        if project_exists {
            ".hivewatch.toml"
        } else {
            "not found"
        },
    );

    // 3. Event log
    if !config.logging.enabled {
        print_health_item("Event log", true, "disabled");
    } else {
        let path = logging::log_path();
        let entries = path
            .as_ref()
            .filter(|p| p.exists())
            .map(|p| logging::read_entries(p).len());
        print_health_item(
            "Event log",
            entries.is_some(),
            &match entries {
                Some(n) => format!("{n} entries"),
                None => "no log file yet".to_string(),
            },
        );
    }

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

fn root_cause(e: &anyhow::Error) -> String {
    e.root_cause().to_string()
}

// ---------------------------------------------------------------------------
// hivewatch config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective hivewatch Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let sources = [
        (
            config::global_config_file().is_some_and(|p| p.exists()),
            "~/.hivewatch/config.toml",
        ),
        (
            config::project_config_file().is_some_and(|p| p.exists()),
            ".hivewatch.toml",
        ),
    ];
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    for (exists, name) in sources {
        if exists {
            println!("  {} {}", "✓".green(), name.dimmed());
        } else {
            println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
        }
    }
    println!(
        "  {} {}",
        "·".dimmed(),
        "HIVEWATCH_* environment variables".dimmed()
    );

    Ok(())
}

/// Initialize a default config file at `~/.hivewatch/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!(
        "  {}",
        "Edit the file to point hivewatch at your detection service.".dimmed()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Format a number with comma separators for readability.
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

/// Quote a CSV field when it contains a separator or quote.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn colorize_risk(level: RiskLevel) -> ColoredString {
    let text = format!("{level} Risk");
    match level {
        RiskLevel::Low => text.green().bold(),
        RiskLevel::Moderate => text.yellow().bold(),
        RiskLevel::High => text.red().bold(),
        RiskLevel::Critical => text.white().on_red().bold(),
        RiskLevel::Unknown => text.dimmed(),
    }
}

fn colorize_state(state: DetectionState) -> ColoredString {
    match state {
        DetectionState::Active => "active".green().bold(),
        DetectionState::Inactive => "inactive".yellow(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CommandStatus;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("2024-05-01T10:00:00", 10), "2024-05-0…");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("csv")), OutputFormat::Csv);
        assert_eq!(
            OutputFormat::from_str_opt(Some("yaml")),
            OutputFormat::Table
        );
    }

    #[test]
    fn command_outcome_accepts_expected_statuses() {
        let started = CommandResponse::new(CommandStatus::Started);
        let running = CommandResponse::new(CommandStatus::AlreadyRunning);
        let stopped = CommandResponse::new(CommandStatus::AlreadyStopped);
        assert_eq!(
            command_outcome(CommandKind::Start, &started).unwrap(),
            DetectionState::Active
        );
        assert_eq!(
            command_outcome(CommandKind::Start, &running).unwrap(),
            DetectionState::Active
        );
        assert_eq!(
            command_outcome(CommandKind::Stop, &stopped).unwrap(),
            DetectionState::Inactive
        );
    }

    #[test]
    fn command_outcome_rejects_unexpected_status() {
        let err = command_outcome(CommandKind::Start, &CommandResponse::new("error")).unwrap_err();
        assert!(err.to_string().contains("failed to start detection"));
        assert!(err.to_string().contains("'error'"));
        assert!(command_outcome(CommandKind::Stop, &CommandResponse::new("started")).is_err());
    }

    #[test]
    fn csv_outputs_have_headers_and_rows() {
        let snap = Snapshot {
            current_bees: 5,
            current_varroa: 1,
            infestation_ratio: 0.2,
            infestation_risk_level: RiskLevel::High,
            ..Snapshot::default()
        };
        let csv = status_csv(&snap);
        assert!(csv.starts_with("current_bees,"));
        assert!(csv.lines().nth(1).unwrap().starts_with("5,1,"));
        assert!(csv.trim_end().ends_with("0.20,High"));

        let series = TimeSeries {
            timestamps: vec!["10:00:00".into(), "10:00:01".into()],
            bee_counts: vec![3, 4],
            varroa_counts: vec![0, 1],
            infestation_ratio: vec![0.0, 0.25],
        };
        assert_eq!(history_csv(&series).lines().count(), 3);
    }

    #[test]
    fn csv_field_quotes_when_needed() {
        assert_eq!(csv_field("camera"), "camera");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
