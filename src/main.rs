use anyhow::Result;
use clap::{Parser, Subcommand};

use hivewatch::cli::{self, OutputFormat};
use hivewatch::config;
use hivewatch::dashboard::{self, CommandKind, WatchOptions};
use hivewatch::simulator;

#[derive(Debug, Parser)]
#[command(name = "hivewatch")]
#[command(about = "Live dashboard for a bee and varroa mite detection service")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Interactive dashboard: live counters, trend charts, detection toggle
    Watch {
        /// Send a start command on launch so polling begins immediately
        #[arg(long)]
        attach: bool,
    },
    /// Show the current statistics snapshot
    Status {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show the detection trend time series
    History {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Start detection on the service
    Start,
    /// Stop detection on the service
    Stop,
    /// List recording sessions, newest first
    Sessions {
        /// Maximum number of sessions to list
        #[arg(long, default_value = "10")]
        limit: u32,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// List stored metric samples
    Metrics {
        /// Maximum number of samples to list
        #[arg(long, default_value = "100")]
        limit: u32,
        /// Only samples recorded during this session
        #[arg(long)]
        session_id: Option<i64>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Ask the service to send a test alert email
    TestEmail,
    /// Check service reachability, config and event log
    Health,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Serve a simulated detection service for demos and tests
    Simulate {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:5000")]
        addr: String,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective merged configuration
    Show,
    /// Write a default config to ~/.hivewatch/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `backend.url http://pi.local:5000`
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();
    let cfg = config::load();

    match app.command {
        Commands::Watch { attach } => dashboard::watch(&cfg, WatchOptions { attach }),
        Commands::Status { format } => {
            cli::run_status(&cfg, OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::History { format } => {
            cli::run_history(&cfg, OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Start => cli::run_command(&cfg, CommandKind::Start),
        Commands::Stop => cli::run_command(&cfg, CommandKind::Stop),
        Commands::Sessions { limit, format } => {
            cli::run_sessions(&cfg, limit, OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Metrics {
            limit,
            session_id,
            format,
        } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_metrics(&cfg, limit, session_id, fmt)
        }
        Commands::TestEmail => cli::run_test_email(&cfg),
        Commands::Health => cli::run_health(&cfg),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
        Commands::Simulate { addr } => simulator::serve(&addr),
    }
}
