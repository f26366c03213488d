mod api;
mod app;
mod cache;
mod commands;
mod config;
mod error;
mod event;
mod list_query;
mod logging;
mod pagination;
mod query;
mod tasks;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing::info;

use crate::api::{ApiClient, CachedApi};
use crate::cache::{MemoryStorage, SharedCache};

#[derive(Parser, Debug)]
#[command(name = "madmin")]
#[command(about = "Terminal administration console for the Mentoons platform")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./madmin.yaml, then $XDG_CONFIG_HOME/madmin/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// API base URL, overrides config and MADMIN_API_URL
  #[arg(long)]
  api_url: Option<String>,

  /// Directory for log files (default: $XDG_DATA_HOME/madmin/logs)
  #[arg(long)]
  log_dir: Option<PathBuf>,

  /// Resource to open at start-up (jobs, users, calls, ...)
  #[arg(short, long, default_value = "jobs")]
  resource: String,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Refuse to start without identity provider credentials
  config::Config::get_publishable_key()?;

  let _log_guard = logging::init(args.log_dir.as_deref())?;

  let config = config::Config::load(args.config.as_deref(), args.api_url)?;
  info!(api = %config.api.base_url, "starting madmin");

  let cache = SharedCache::new(MemoryStorage::new())
    .with_stale_time(chrono::Duration::seconds(config.cache.stale_secs as i64))
    .with_gc_time(chrono::Duration::seconds(config.cache.gc_secs as i64));
  let api = CachedApi::new(ApiClient::new(&config)?, cache);

  let mut app = app::App::new(config, api);
  app.open_resource(&args.resource)?;
  app.run().await?;

  info!("madmin exited");
  Ok(())
}
