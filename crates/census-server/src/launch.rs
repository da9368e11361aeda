//! Command-line arguments and their exit codes.

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

pub const DEFAULT_WORKERS: usize = 4;

#[derive(Debug, Parser)]
#[command(name = "census", author, version, about = "Census REST API server")]
pub struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "census.toml")]
  pub config: PathBuf,

  /// Listen address, e.g. `--bind=127.0.0.1:5000`.
  #[arg(long, num_args = 0..=1, default_missing_value = "")]
  pub bind: Option<String>,

  /// Runtime worker threads, e.g. `--workers=4`.
  #[arg(long, num_args = 0..=1, default_missing_value = "")]
  pub workers: Option<String>,

  /// Print the exit-code table.
  #[arg(long)]
  pub codes: bool,

  /// Validate arguments and settings, then exit without serving.
  #[arg(long)]
  pub no_start: bool,
}

/// A malformed argument. Each variant maps to a process exit code.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum LaunchError {
  #[error("Incorrect bind format, example: --bind=127.0.0.1:5000")]
  Bind,

  #[error("Incorrect workers format, example: --workers=4")]
  Workers,
}

impl LaunchError {
  pub const ALL: [LaunchError; 2] = [LaunchError::Bind, LaunchError::Workers];

  pub fn code(self) -> i32 {
    match self {
      LaunchError::Bind => -5,
      LaunchError::Workers => -6,
    }
  }
}

/// Validated launch parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
  pub bind:    Option<(String, u16)>,
  pub workers: usize,
}

impl Cli {
  pub fn launch(&self) -> Result<Launch, LaunchError> {
    let bind = self.bind.as_deref().map(parse_bind).transpose()?;
    let workers = match self.workers.as_deref() {
      Some(raw) => parse_workers(raw)?,
      None => DEFAULT_WORKERS,
    };
    Ok(Launch { bind, workers })
  }
}

pub fn parse_bind(raw: &str) -> Result<(String, u16), LaunchError> {
  let (host, port) = raw.trim().rsplit_once(':').ok_or(LaunchError::Bind)?;
  if host.is_empty() || host.contains(char::is_whitespace) {
    return Err(LaunchError::Bind);
  }
  let port = port.parse::<u16>().map_err(|_| LaunchError::Bind)?;
  Ok((host.to_string(), port))
}

pub fn parse_workers(raw: &str) -> Result<usize, LaunchError> {
  match raw.trim().parse::<usize>() {
    Ok(n) if n > 0 => Ok(n),
    _ => Err(LaunchError::Workers),
  }
}

pub fn codes_table() -> String {
  let rule = "━".repeat(48);
  let mut out = format!("┏━━━━━━━━┳{rule}\n┃Code\t ┃ Description\n┣━━━━━━━━╋{rule}\n");
  for e in LaunchError::ALL {
    out.push_str(&format!("┃{:03}\t ┃ {e}\n", e.code()));
  }
  out.push_str(&format!("┗━━━━━━━━┻{rule}\n"));
  out
}
