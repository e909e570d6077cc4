//! feria-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite store, and serves the booking API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `admin_password_hash`:
//!
//! ```text
//! cargo run -p feria-server -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use feria_api::ApiState;
use feria_core::booking::BookingService;
use feria_server::{ServerConfig, auth::{BasicAuth, hash_password}, mail::Mailer};
use feria_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "School fair reservation server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// Create the configured fair days and slots before serving.
  #[arg(long)]
  seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Helper mode: hash a password and exit.
  if cli.hash_password {
    let password = read_password()?;
    println!("{}", hash_password(&password)?);
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("FERIA").separator("__"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  server_cfg.validate()?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let mailer = Mailer::from_config(server_cfg.smtp.as_ref())
    .context("failed to configure smtp relay")?;
  let admin = BasicAuth::new(&server_cfg.admin_username, &server_cfg.admin_password_hash)?;

  let booking = BookingService::new(
    Arc::new(store),
    Arc::new(mailer),
    server_cfg.policy(),
    server_cfg.public_url.clone(),
  );

  if cli.seed {
    let created = booking
      .seed_fair("Feria", server_cfg.seed_dates.clone(), server_cfg.slot_capacity)
      .await
      .context("failed to seed fair days")?;
    tracing::info!(created, "seeded fair days");
  }

  let state = ApiState {
    booking,
    admin: Arc::new(admin),
    frontend_url: Arc::from(server_cfg.frontend_url.as_str()),
  };

  let app = feria_server::app(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password from a single line of stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
