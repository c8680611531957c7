use crate::{logging, tui};
use anyhow::Context;
use clap::Parser;
use scope_core::cache::{ResultCache, default_cache_path};
use scope_core::config::{AppConfig, default_config_path};
use scope_core::repo_status::GitStatusInspector;
use scope_core::scan::{ScanRequest, scan_with_cache};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod app;
mod args;
mod scan_cmd;

use args::*;

use scan_cmd::handle_scan;

pub fn run() -> anyhow::Result<()> {
    app::run()
}
