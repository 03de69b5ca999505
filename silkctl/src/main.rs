//! This is a command-line tool to collect Green Silk Road locations via [libsilk]
use crate::{cli::*, config::*};
use anyhow::{Result, anyhow};
use clap::Parser;
use libsilk::{session::Session, store::SqliteStore};
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod output;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("SILKCTL_LOG"))
        .with_writer(std::io::stderr)
        .init();
    let args = Cli::parse();
    let config_file = config_file()?;
    let config_db = Config::load_from_file(&config_file)
        .await
        .map(|cfg| cfg.database)
        .ok();

    match args.command {
        Commands::Admin { database, command } => {
            return commands::admin::handle_command(database.or(config_db), command, &config_file)
                .await;
        }
        Commands::Login { username, database } => {
            let username = username
                .or_else(|| inquire::Text::new("Username:").prompt().ok())
                .ok_or_else(|| anyhow!("No username specified"))?;
            let database = database
                .or_else(|| {
                    inquire::Text::new("Database path:")
                        .prompt()
                        .map(PathBuf::from)
                        .ok()
                })
                .ok_or_else(|| anyhow!("No database specified"))?;
            let pwd = inquire::Password::new("Password:")
                .with_display_toggle_enabled()
                .with_display_mode(inquire::PasswordDisplayMode::Masked)
                .without_confirmation()
                .prompt()?;
            let mut cfg = Config::new(username.clone(), pwd, database);
            // keep any map settings from an earlier login
            if let Ok(old) = Config::load_from_file(&config_file).await {
                cfg.tiles = old.tiles;
                cfg.view = old.view;
            }
            cfg.validate().await?;
            cfg.save_to_file(&config_file).await?;
            println!("Logged in as {username}");
            return Ok(());
        }
        Commands::Logout => {
            fs::remove_file(&config_file)
                .await
                .or_else(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => Ok(()),
                    _ => Err(anyhow::Error::from(e)),
                })?;
            println!("Logged out");
            return Ok(());
        }
        _ => (),
    };

    let cfg = Config::load_from_file(&config_file).await?;
    debug!(?cfg.username, ?cfg.database, "logging in");
    let (db, user) = cfg.validate().await?;
    let session = Session::signed_in(user);
    let store = SqliteStore::new(db);

    match args.command {
        // already handled above
        Commands::Login { .. } | Commands::Logout | Commands::Admin { .. } => Ok(()),
        Commands::Status => {
            println!("Using database '{}'", cfg.database.to_string_lossy());
            println!("Logged in as user '{}'", cfg.username);
            Ok(())
        }
        Commands::Locations { command } => {
            commands::locations::handle_command(command, &session, &store).await
        }
        Commands::Map { refresh, output } => {
            commands::map::handle_command(refresh, output, &cfg, &session, store).await
        }
    }
}
