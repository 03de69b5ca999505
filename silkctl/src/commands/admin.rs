//! Commands for administration of silkctl or the database itself
use crate::{
    cli::{AdminCommands, UserCommands},
    config::Config,
    output::{self, rows::UserRow},
};
use anyhow::{Context, Result, anyhow};
use libsilk::{
    catalog::seed_catalog,
    database::Database,
    session::Session,
    store::SqliteStore,
    user::User,
};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Get a password from the user, either from the file at the provided path, or
/// by reading input from stdin.
async fn get_password(path: Option<PathBuf>) -> Result<String> {
    let password = match path {
        None => {
            let query = inquire::Password::new("New Password:")
                .with_display_toggle_enabled()
                .with_display_mode(inquire::PasswordDisplayMode::Masked);
            query.prompt()?
        }
        Some(f) => fs::read_to_string(f).await?,
    };
    Ok(password.trim().to_string())
}

fn get_username(username: Option<String>) -> Result<String> {
    username
        .or_else(|| inquire::Text::new("Username:").prompt().ok())
        .ok_or_else(|| anyhow!("No username specified"))
}

async fn open(dbpath: Option<PathBuf>) -> Result<Database> {
    let dbpath = dbpath.ok_or_else(|| anyhow!("No database specified"))?;
    Database::open(&dbpath)
        .await
        .with_context(|| format!("Failed to open database {}", dbpath.display()))
}

/// Handle the `silkctl admin` command and its subcommands
pub(crate) async fn handle_command(
    dbpath: Option<PathBuf>,
    command: AdminCommands,
    config_file: &Path,
) -> Result<()> {
    match command {
        AdminCommands::Init {
            username,
            passwordfile,
        } => {
            if let Some(path) = dbpath.as_ref().filter(|p| p.exists()) {
                return Err(anyhow!("Database {} already exists", path.display()));
            }
            let dbpath = dbpath.ok_or_else(|| anyhow!("No database specified"))?;
            let db = Database::create(&dbpath)
                .await
                .with_context(|| format!("Failed to create database {}", dbpath.display()))?;
            let username = get_username(username)?;
            let password = get_password(passwordfile).await?;
            let user = db.init(username, password).await?;
            println!("Initialized database with user {}: {}", user.id, user.username);
            Ok(())
        }
        AdminCommands::Users { command } => {
            let db = open(dbpath).await?;
            match command {
                UserCommands::List { output } => {
                    let users = User::load_all(&db).await?;
                    let str = output::format_seq(users.iter().map(UserRow::new), output.format)?;
                    println!("{str}");
                    Ok(())
                }
                UserCommands::Add {
                    username,
                    passwordfile,
                } => {
                    let username = get_username(username)?;
                    let password = get_password(passwordfile).await?;
                    // hash the password
                    let pwhash = User::hash_password(&password)?;
                    let mut user = User::new(username.clone(), pwhash);
                    user.insert(&db).await?;
                    println!("Added user to database:");
                    println!("{}: {}", user.id, username);
                    Ok(())
                }
            }
        }
        AdminCommands::Seed => {
            let cfg = Config::load_from_file(config_file).await?;
            let (db, user) = match dbpath {
                Some(path) => {
                    let db = open(Some(path)).await?;
                    let user = db.authenticate(&cfg.username, &cfg.password).await?;
                    (db, user)
                }
                None => cfg.validate().await?,
            };
            debug!(username = %user.username, "seeding project catalog");
            let session = Session::signed_in(user);
            let count = seed_catalog(&session, &SqliteStore::new(db)).await?;
            println!("Added {count} projects");
            Ok(())
        }
    }
}
