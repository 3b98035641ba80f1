//! carelog binary.
//!
//! Reads `carelog.toml` (or the path specified with `--config`), opens the
//! SQLite store, and either serves the JSON API or runs a one-off command.
//!
//! ```text
//! carelog serve
//! carelog import records.json
//! carelog stats --today 2024-05-01
//! carelog merge-duplicates --name 张三
//! ```

mod config;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::Router;
use carelog_core::{import::parse_batch, store::CareStore};
use carelog_store_sqlite::SqliteStore;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Carelog care-facility records")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "carelog.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API over HTTP.
  Serve,

  /// Import a JSON array of records.
  Import {
    file: PathBuf,
  },

  /// Print summary and age-bucket statistics.
  Stats {
    /// Compute ages as of this date (YYYY-MM-DD) instead of today.
    #[arg(long)]
    today: Option<NaiveDate>,
  },

  /// Merge persons sharing a name.
  MergeDuplicates {
    /// Only merge this name; every duplicate group otherwise.
    #[arg(long)]
    name: Option<String>,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(&cli.config)?;

  let store_path = cfg.store_path();
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command {
    Command::Serve => serve(store, &cfg).await,
    Command::Import { file } => {
      let json = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read {file:?}"))?;
      let records = parse_batch(&json).context("failed to parse import file")?;
      print_json(&store.import_records(records).await?)
    }
    Command::Stats { today } => {
      #[derive(Serialize)]
      struct Report<S, D> {
        summary:          S,
        age_distribution: D,
      }
      print_json(&Report {
        summary:          store.summary_statistics(today).await?,
        age_distribution: store.age_distribution(today).await?,
      })
    }
    Command::MergeDuplicates { name: Some(name) } => {
      let outcome = store
        .merge_duplicate_persons(&name)
        .await?
        .with_context(|| format!("no person named {name:?}"))?;
      print_json(&outcome)
    }
    Command::MergeDuplicates { name: None } => {
      print_json(&store.merge_all_duplicates().await?)
    }
  }
}

async fn serve(store: SqliteStore, cfg: &ServerConfig) -> anyhow::Result<()> {
  let app = Router::new().nest("/api", carelog_api::api_router(Arc::new(store)));
  let address = cfg.address();

  info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
