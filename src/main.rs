mod api;
mod app;
mod commands;
mod config;
mod credentials;
mod event;
mod logging;
mod query;
mod store;
mod ui;
mod viewmodel;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "exemplar")]
#[command(about = "List and create Example records from the terminal")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/exemplar/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// API base URL, overrides config and EXEMPLAR_API_BASE_URL
  #[arg(short, long)]
  base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let _log_guard = logging::init()?;

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Override base URL if specified on command line
  if let Some(base_url) = args.base_url {
    config.api.base_url = base_url;
  }

  let credentials = credentials::Credentials::from_env();
  info!(
    authenticated = credentials.is_authenticated(),
    "starting exemplar"
  );

  // Initialize and run the app
  let mut app = app::App::new(config, credentials)?;
  app.run().await?;

  Ok(())
}
