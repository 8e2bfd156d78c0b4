//! Terminal dashboard for a detection service.
//!
//! - [`controller`]: all dashboard state and the detection toggle flow
//! - [`charts`]: detection trend, unique objects and infestation ratio
//! - [`surface`]: the keyed display elements the controller writes
//! - [`runtime`]: event loop, worker threads, keyboard input
//!
//! Launched via `hivewatch watch`.

pub mod animation;
pub mod charts;
pub mod controller;
pub mod poller;
pub mod render;
pub mod runtime;
pub mod surface;
pub mod timer;
pub mod toggle;

use std::sync::Arc;

use anyhow::Result;

use crate::backend::HttpBackend;
use crate::config::HivewatchConfig;
use crate::logging::EventLog;

pub use controller::{DashboardController, Notice, Request};
pub use runtime::{Event, Key, Runtime, WatchOptions};
pub use surface::{ElementId, Surface};
pub use toggle::{CommandKind, DetectionState};

/// Run the interactive dashboard against the configured backend until the
/// user quits.
pub fn watch(config: &HivewatchConfig, options: WatchOptions) -> Result<()> {
    let backend = Arc::new(HttpBackend::from_config(&config.backend));
    // The dashboard owns the terminal; log entries go to the file only.
    let log = EventLog::from_config(&config.logging).quiet();
    log.info(
        "watch",
        format!("dashboard started against {}", backend.base_url()),
    );

    let runtime = Runtime::new(backend, &config.dashboard, log, std::io::stdout());
    runtime::spawn_input_reader(runtime.sender());
    runtime.run(options)?;

    println!();
    Ok(())
}
