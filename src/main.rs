//! Taskboard Server
//!
//! HTTP server and CLI tools for task lists, per-user completion stats,
//! and the leaderboard.

use anyhow::Result;
use clap::Parser;
use std::fs::OpenOptions;
use taskboard::cli::{Cli, Command};
use taskboard::config::Config;
use taskboard::db::Database;
use taskboard::http;
use taskboard::service::TaskService;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    // Load configuration, then apply CLI overrides
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(),
    };
    if let Some(db_path) = &cli.database {
        config.server.db_path = db_path.into();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    config.ensure_db_dir()?;
    let db = Database::open(&config.server.db_path)?;
    let service = TaskService::with_event_capacity(db, config.server.event_capacity);

    match cli.command {
        Some(Command::Recount { user_id }) => {
            let stats = service.recount(&user_id)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Some(Command::Leaderboard) => {
            let ranked = service.leaderboard()?;
            for (pos, entry) in ranked.iter().enumerate() {
                println!(
                    "{:>3}. {:<40} {:>5} / {:<5}",
                    pos + 1,
                    entry.email,
                    entry.completed_tasks,
                    entry.total_tasks
                );
            }
        }
        Some(Command::Serve) | None => {
            info!("Starting taskboard server v{}", env!("CARGO_PKG_VERSION"));
            info!("Database: {:?}", config.server.db_path);

            let (shutdown_tx, addr) = http::start_server(service, config.server.port).await?;
            info!("Serving on http://{}", addr);

            tokio::signal::ctrl_c().await?;
            let _ = shutdown_tx.send(());
        }
    }

    Ok(())
}
