//! `census` server binary.
//!
//! Reads `census.toml` (or the path given with `--config`) and `CENSUS_*`
//! environment variables, opens the SQLite database and serves the API.
//!
//! ```text
//! census --bind=0.0.0.0:8080 --workers=8
//! census --codes --no-start
//! ```

use anyhow::Context as _;
use census_server::{Settings, launch::{Cli, codes_table}};
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  if cli.codes {
    print!("{}", codes_table());
  }

  let launch = match cli.launch() {
    Ok(launch) => launch,
    Err(e) => {
      eprintln!("{e}");
      std::process::exit(e.code());
    }
  };

  let mut settings = Settings::load(&cli.config)
    .with_context(|| format!("failed to load settings from {:?}", cli.config))?;
  if let Some((host, port)) = launch.bind {
    settings.bind = host;
    settings.port = port;
  }

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(settings.log_level().into())
        .from_env_lossy(),
    )
    .init();

  if cli.no_start {
    settings
      .database_path()
      .context("failed to resolve database path")?;
    tracing::info!(address = %settings.address(), "settings valid, not starting");
    return Ok(());
  }

  tokio::runtime::Builder::new_multi_thread()
    .worker_threads(launch.workers)
    .enable_all()
    .build()
    .context("failed to build runtime")?
    .block_on(serve(settings))
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
  let app = census_server::build(&settings)
    .await
    .context("failed to start application")?;
  let address = settings.address();

  tracing::info!("{} listening on http://{address}{}", settings.title, settings.url_prefix);
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
