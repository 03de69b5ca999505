//! Commands related to locations
use crate::{
    cli::LocationCommands,
    output::{
        self, OutputFormat,
        rows::{LocationRow, SkippedRowRow},
    },
};
use anyhow::{Result, anyhow};
use libsilk::{
    Error, UserId,
    contribute::{Contribution, Outcome, contribute_file, contribute_form},
    session::Session,
    store::{SqliteStore, sqlite::Filter},
    validate::RecordForm,
};
use tracing::debug;

fn print_contribution(contribution: &Contribution) -> Result<()> {
    println!("Added {} locations", contribution.accepted());
    if !contribution.skipped.is_empty() {
        println!("Skipped {} rows:", contribution.skipped.len());
        let str = output::format_seq(
            contribution.skipped.iter().map(SkippedRowRow::new),
            OutputFormat::Table,
        )?;
        println!("{str}");
    }
    Ok(())
}

/// Ask for every field of the entry form. Pressing <esc> leaves a field empty.
fn prompt_form() -> Result<RecordForm> {
    let text = |msg: &str| -> Result<String> {
        Ok(inquire::Text::new(msg)
            .prompt_skippable()?
            .unwrap_or_default())
    };
    Ok(RecordForm {
        name: text("Name:")?,
        latitude: text("Latitude:")?,
        longitude: text("Longitude:")?,
        description: text("Description:")?,
        kind: text("Type:")?,
    })
}

/// Handle the `silkctl locations` command and its subcommands
pub(crate) async fn handle_command(
    command: LocationCommands,
    session: &Session,
    store: &SqliteStore,
) -> Result<()> {
    match command {
        LocationCommands::List {
            filter,
            user,
            kind,
            output,
        } => {
            let mut filters = Vec::new();
            if let Some(text) = filter {
                filters.push(Filter::Text(text));
            }
            if let Some(id) = user {
                filters.push(Filter::UserId(UserId(id)));
            }
            if let Some(kind) = kind {
                filters.push(Filter::Kind(kind));
            }
            debug!(?filters, "listing locations");
            let records = store.load_matching(&filters).await?;
            let str = output::format_seq(records.iter().map(LocationRow::new), output.format)?;
            println!("{str}");
            Ok(())
        }
        LocationCommands::Upload { file } => {
            let result = contribute_file(&file, session, store).await;
            let outcome = Outcome::from(&result);
            match result {
                Ok(contribution) => print_contribution(&contribution),
                Err(_) => Err(anyhow!(
                    "Upload failed: {}",
                    outcome.reason.unwrap_or_default()
                )),
            }
        }
        LocationCommands::Add {
            name,
            latitude,
            longitude,
            description,
            kind,
        } => {
            let no_args = name.is_none()
                && latitude.is_none()
                && longitude.is_none()
                && description.is_none()
                && kind.is_none();
            let form = match no_args {
                true => prompt_form()?,
                false => RecordForm {
                    name: name.unwrap_or_default(),
                    latitude: latitude.unwrap_or_default(),
                    longitude: longitude.unwrap_or_default(),
                    description: description.unwrap_or_default(),
                    kind: kind.unwrap_or_default(),
                },
            };
            match contribute_form(&form, session, store).await {
                Ok(contribution) => {
                    for rec in &contribution.inserted {
                        println!("Added location to database:");
                        println!("{}", output::format_one(LocationRow::new(rec)));
                    }
                    Ok(())
                }
                Err(Error::Validation(errors)) => {
                    for (field, message) in errors.iter() {
                        eprintln!("{field}: {message}");
                    }
                    Err(anyhow!("Location was not added"))
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}
