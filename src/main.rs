//! colorbook: coloring-page site entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Resolve effective log level (CLI `-v` flags > env > config)
//!   4. Init logger once
//!   5. Spawn Ctrl-C → shutdown signal watcher
//!   6. Serve until shutdown

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tokio_util::sync::CancellationToken;
use tracing::info;

use colorbook::{config, error, logger, server};

#[derive(Parser, Debug)]
#[command(name = "colorbook", version, about = "Coloring-page catalog site")]
struct Args {
    /// Config file (default: config/default.toml when present)
    #[arg(short = 'f', long = "config", value_name = "FILE")]
    config: Option<String>,

    /// Site root holding pages.json, categories/ and app/
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:8080
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// Raise log verbosity (-v warn, -vv info, -vvv debug, -vvvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), error::AppError> {
    // Load .env if present; the file is optional.
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let mut config = config::load(args.config.as_deref())?;
    if let Some(root) = args.root {
        config.site.root = root;
    }
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    let cli_level = logger::verbosity_level(args.verbose);
    let effective_log_level = cli_level.unwrap_or(config.log_level.as_str());
    logger::init(effective_log_level, cli_level.is_some())?;

    info!(
        root = %config.site.root.display(),
        bind = %config.server.bind,
        configured_log_level = %config.log_level,
        effective_log_level = %effective_log_level,
        api_key = config.api_key.is_some(),
        "config loaded"
    );

    // Shared shutdown token: Ctrl-C cancels it.
    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, shutting down");
            ctrlc_token.cancel();
        }
    });

    server::run(&config, shutdown).await
}
