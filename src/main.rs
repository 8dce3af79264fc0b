mod app;
mod config;
mod event;
mod news;
mod store;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "newsdeck")]
#[command(about = "A terminal UI for top news headlines")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/newsdeck/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// News source to show headlines for (overrides the config)
  #[arg(short, long)]
  source: Option<String>,
}

/// Set up file-based logging. The alternate screen owns stdout, so logs go
/// to a file next to the cache database. Returns the guard that flushes the
/// writer on shutdown.
fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let dir = store::default_data_dir()?;
  std::fs::create_dir_all(&dir)?;

  let file_appender = tracing_appender::rolling::never(dir, "newsdeck.log");
  let (writer, guard) = tracing_appender::non_blocking(file_appender);

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let _log_guard = init_logging()?;

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  // Override source if specified on command line
  let config = if let Some(source) = args.source {
    config::Config {
      news: config::NewsConfig {
        source,
        ..config.news
      },
      ..config
    }
  } else {
    config
  };

  // Initialize and run the app
  let mut app = app::App::new(config)?;
  app.run().await?;

  Ok(())
}
