mod cli;
mod config;
mod db;
mod models;
mod prayer_times;
mod tui;
mod utils;

use std::fs::OpenOptions;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::Connection;

use cli::args::{Cli, Commands};
use cli::handlers;
use config::{AppConfig, BoardConfig};
use db::migrations::run_migrations;
use models::PrayerName;
use tui::app::View;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load().context("Loading config")?;
    init_logging(&config)?;

    if let Some(Commands::Config { action }) = &cli.command {
        return handlers::handle_config(&config, action);
    }

    // Ensure data directory exists and open DB
    AppConfig::ensure_data_dir()?;
    let db_path = AppConfig::db_path()?;
    let conn = Connection::open(&db_path)
        .with_context(|| format!("Opening database at {:?}", db_path))?;

    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    // Run migrations on every startup
    run_migrations(&conn)?;

    let mut board = BoardConfig::load(&conn).context("Loading board config")?;

    match cli.command {
        None => tui::run(conn, config, board, View::Board)?,
        Some(Commands::Iqamah { prayer }) => {
            let pinned = prayer.as_deref().map(PrayerName::from_str).transpose()?;
            if pinned.is_some_and(|p| !p.is_prayer()) {
                anyhow::bail!("Sunrise has no iqamah");
            }
            tui::run(conn, config, board, View::Iqamah { pinned })?;
        }
        Some(Commands::Times { at }) => {
            handlers::handle_times(&conn, &config, &board, at.as_deref())?;
        }
        Some(Commands::Hijri) => handlers::handle_hijri(&config)?,
        Some(Commands::Refresh) => handlers::handle_refresh(&conn, &config, &board)?,
        Some(Commands::Admin { section }) => {
            handlers::handle_admin(&conn, &mut board, &section)?;
        }
        Some(Commands::Config { .. }) => {}
    }

    Ok(())
}

/// `RUST_LOG` controls verbosity. With `[log] file` set, records go to that
/// file so they do not draw over the board.
fn init_logging(config: &AppConfig) -> Result<()> {
    let mut builder = env_logger::Builder::from_default_env();
    if let Some(path) = &config.log.file {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Opening log file {:?}", path))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}
