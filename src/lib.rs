//! hivewatch: terminal dashboard for a bee and varroa mite detection service.
//!
//! The binary (`src/main.rs`) wires these modules to `clap` subcommands;
//! integration tests under `tests/` use them directly.

pub mod backend;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod logging;
pub mod model;
pub mod simulator;
